//! Session search: one store query, then in-memory narrowing stages.

use crate::catalog::CatalogLookup;
use crate::error::Result;
use crate::records::{Session, SessionSearch};
use crate::store::DocumentStore;

use super::SessionService;

pub trait SessionQuery {
    /// Lists sessions matching every criterion of `search`.
    ///
    /// `paid` and `invoiced` always take part in the match, so an empty search
    /// returns only sessions that are neither. The code criteria are joined
    /// through the catalog; a session whose reference does not resolve is
    /// dropped. Results keep store order.
    fn list_sessions(&self, search: &SessionSearch) -> Result<Vec<Session>>;
}

impl<S: DocumentStore, C: CatalogLookup> SessionQuery for SessionService<'_, S, C> {
    fn list_sessions(&self, search: &SessionSearch) -> Result<Vec<Session>> {
        let mut sessions = self
            .store
            .query::<Session>()
            .eq("paid", search.paid)
            .eq("invoiced", search.invoiced)
            .all()?;

        if !search.category_code.is_empty() {
            sessions = retain_resolved(sessions, &search.category_code, |session| {
                self.catalog
                    .get_category_by_id(session.category_id)
                    .map(|c| c.code)
            })?;
        }

        if !search.client_code.is_empty() {
            sessions = retain_resolved(sessions, &search.client_code, |session| {
                self.catalog.get_client_by_id(session.client_id).map(|c| c.code)
            })?;
        }

        if !search.project_code.is_empty() {
            sessions = retain_resolved(sessions, &search.project_code, |session| {
                self.catalog
                    .get_project_by_id(session.project_id)
                    .map(|p| p.code)
            })?;
        }

        if search.session_id > 0 {
            sessions.retain(|session| session.session_id == search.session_id);
        }

        if !search.session_ids.is_empty() {
            sessions.retain(|session| search.session_ids.contains(&session.session_id));
        }

        Ok(sessions)
    }
}

/// Keeps sessions whose joined code equals `expected`.
///
/// A reference that no longer resolves drops the session; any other lookup
/// failure aborts the search.
fn retain_resolved<F>(sessions: Vec<Session>, expected: &str, code_of: F) -> Result<Vec<Session>>
where
    F: Fn(&Session) -> Result<String>,
{
    sessions
        .into_iter()
        .filter_map(|session| match code_of(&session) {
            Ok(code) => (code == expected).then_some(Ok(session)),
            Err(err) if err.is_not_found() => {
                tracing::debug!(
                    session_id = session.session_id,
                    error = %err,
                    "excluding session with unresolved reference"
                );
                None
            }
            Err(err) => Some(Err(err)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogService;
    use crate::error::Error;
    use crate::records::Category;
    use crate::session::fixtures::{insert_session, seed};
    use crate::testing::MemoryStore;

    fn ids_of(sessions: &[Session]) -> Vec<i64> {
        sessions.iter().map(|s| s.session_id).collect()
    }

    #[test]
    fn default_search_returns_only_unbilled_sessions() {
        let store = MemoryStore::default();
        let ids = seed(&store);
        let open = insert_session(&store, ids.site, ids.acme, ids.dev, false, false);
        insert_session(&store, ids.site, ids.acme, ids.dev, true, false);
        insert_session(&store, ids.site, ids.acme, ids.dev, true, true);
        insert_session(&store, ids.site, ids.acme, ids.dev, false, true);
        let catalog = CatalogService::new(&store);
        let sessions = SessionService::new(&store, &catalog);

        let found = sessions.list_sessions(&SessionSearch::default()).unwrap();
        assert_eq!(ids_of(&found), vec![open]);
    }

    #[test]
    fn flags_select_exact_billing_state() {
        let store = MemoryStore::default();
        let ids = seed(&store);
        insert_session(&store, ids.site, ids.acme, ids.dev, false, false);
        let invoiced = insert_session(&store, ids.site, ids.acme, ids.dev, true, false);
        let closed = insert_session(&store, ids.site, ids.acme, ids.dev, true, true);
        let catalog = CatalogService::new(&store);
        let sessions = SessionService::new(&store, &catalog);

        let search = SessionSearch {
            invoiced: true,
            ..SessionSearch::default()
        };
        assert_eq!(ids_of(&sessions.list_sessions(&search).unwrap()), vec![invoiced]);

        let search = SessionSearch {
            invoiced: true,
            paid: true,
            ..SessionSearch::default()
        };
        assert_eq!(ids_of(&sessions.list_sessions(&search).unwrap()), vec![closed]);
    }

    #[test]
    fn code_filters_compose_as_and() {
        let store = MemoryStore::default();
        let ids = seed(&store);
        let site_dev = insert_session(&store, ids.site, ids.acme, ids.dev, false, false);
        let site_mtg = insert_session(&store, ids.site, ids.acme, ids.mtg, false, false);
        let app_dev = insert_session(&store, ids.app, ids.zeta, ids.dev, false, false);
        let catalog = CatalogService::new(&store);
        let sessions = SessionService::new(&store, &catalog);

        let by_category = SessionSearch {
            category_code: "dev".to_string(),
            ..SessionSearch::default()
        };
        assert_eq!(
            ids_of(&sessions.list_sessions(&by_category).unwrap()),
            vec![site_dev, app_dev]
        );

        let by_client = SessionSearch {
            client_code: "acme".to_string(),
            ..SessionSearch::default()
        };
        assert_eq!(
            ids_of(&sessions.list_sessions(&by_client).unwrap()),
            vec![site_dev, site_mtg]
        );

        let combined = SessionSearch {
            category_code: "dev".to_string(),
            project_code: "site".to_string(),
            ..SessionSearch::default()
        };
        assert_eq!(ids_of(&sessions.list_sessions(&combined).unwrap()), vec![site_dev]);

        let disjoint = SessionSearch {
            client_code: "zeta".to_string(),
            project_code: "site".to_string(),
            ..SessionSearch::default()
        };
        assert!(sessions.list_sessions(&disjoint).unwrap().is_empty());
    }

    #[test]
    fn unresolved_reference_excludes_session_without_error() {
        let store = MemoryStore::default();
        let ids = seed(&store);
        let good = insert_session(&store, ids.site, ids.acme, ids.dev, false, false);
        insert_session(&store, ids.site, ids.acme, 404, false, false);
        let catalog = CatalogService::new(&store);
        let sessions = SessionService::new(&store, &catalog);

        let search = SessionSearch {
            category_code: "dev".to_string(),
            ..SessionSearch::default()
        };
        assert_eq!(ids_of(&sessions.list_sessions(&search).unwrap()), vec![good]);
    }

    #[test]
    fn unreadable_reference_fails_the_search() {
        let store = MemoryStore::default();
        let ids = seed(&store);
        store.insert_raw::<Category>("404", serde_json::json!({ "id": 404 }));
        insert_session(&store, ids.site, ids.acme, 404, false, false);
        let catalog = CatalogService::new(&store);
        let sessions = SessionService::new(&store, &catalog);

        let search = SessionSearch {
            category_code: "dev".to_string(),
            ..SessionSearch::default()
        };
        let err = sessions.list_sessions(&search).unwrap_err();
        assert!(matches!(err, Error::Persistence { .. }), "got {err:?}");
        assert_eq!(err.to_string(), "failed to query categories");
    }

    #[test]
    fn id_filters_narrow_previous_stages() {
        let store = MemoryStore::default();
        let ids = seed(&store);
        let a = insert_session(&store, ids.site, ids.acme, ids.dev, false, false);
        let b = insert_session(&store, ids.app, ids.zeta, ids.dev, false, false);
        let c = insert_session(&store, ids.site, ids.acme, ids.dev, false, false);
        let catalog = CatalogService::new(&store);
        let sessions = SessionService::new(&store, &catalog);

        let single = SessionSearch {
            session_id: b,
            ..SessionSearch::default()
        };
        assert_eq!(ids_of(&sessions.list_sessions(&single).unwrap()), vec![b]);

        let listed = SessionSearch {
            session_ids: vec![c, a],
            ..SessionSearch::default()
        };
        assert_eq!(ids_of(&sessions.list_sessions(&listed).unwrap()), vec![a, c]);

        let listed_for_zeta = SessionSearch {
            client_code: "zeta".to_string(),
            session_ids: vec![a, b],
            ..SessionSearch::default()
        };
        assert_eq!(
            ids_of(&sessions.list_sessions(&listed_for_zeta).unwrap()),
            vec![b]
        );
    }
}
