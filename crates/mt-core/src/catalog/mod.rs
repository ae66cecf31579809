//! Clients, categories and projects: lookups, creation, edits and listings.

pub mod search;

use crate::codes::create_auto_code;
use crate::error::{Error, Result};
use crate::records::{Category, CategorySearch, Client, ClientSearch, Project, ProjectSearch};
use crate::store::{Document, DocumentStore};

use self::search::{matches_name_or_code, retain_matching};

/// By-id and by-code lookups used to join sessions to their catalog records.
pub trait CatalogLookup {
    fn get_client_by_id(&self, id: i64) -> Result<Client>;
    fn get_client_by_code(&self, code: &str) -> Result<Client>;
    fn get_project_by_id(&self, id: i64) -> Result<Project>;
    fn get_project_by_code(&self, code: &str) -> Result<Project>;
    fn get_category_by_id(&self, id: i64) -> Result<Category>;
    fn get_category_by_code(&self, code: &str) -> Result<Category>;
}

/// Catalog operations over a document store.
pub struct CatalogService<'a, S> {
    store: &'a S,
}

impl<'a, S: DocumentStore> CatalogService<'a, S> {
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn create_client(&self, mut client: Client) -> Result<i64> {
        client.id = self.next_id::<Client>()?;
        if client.code.is_empty() {
            client.code = create_auto_code(&client.name);
        }
        self.insert(&client)?;
        tracing::debug!(id = client.id, code = %client.code, "created client");
        Ok(client.id)
    }

    pub fn create_category(&self, mut category: Category) -> Result<i64> {
        category.id = self.next_id::<Category>()?;
        if category.code.is_empty() {
            category.code = create_auto_code(&category.name);
        }
        self.insert(&category)?;
        tracing::debug!(id = category.id, code = %category.code, "created category");
        Ok(category.id)
    }

    /// Inserts a project. Its client and default category are not validated.
    pub fn create_project(&self, mut project: Project) -> Result<i64> {
        project.id = self.next_id::<Project>()?;
        if project.code.is_empty() {
            project.code = create_auto_code(&project.name);
        }
        self.insert(&project)?;
        tracing::debug!(id = project.id, code = %project.code, "created project");
        Ok(project.id)
    }

    pub fn update_client(&self, client: &Client) -> Result<()> {
        self.update(client)
    }

    pub fn update_category(&self, category: &Category) -> Result<()> {
        self.update(category)
    }

    pub fn update_project(&self, project: &Project) -> Result<()> {
        self.update(project)
    }

    pub fn archive_client(&self, code: &str) -> Result<Client> {
        let mut client = self.get_client_by_code(code)?;
        client.archived = true;
        self.update(&client)?;
        Ok(client)
    }

    pub fn archive_category(&self, code: &str) -> Result<Category> {
        let mut category = self.get_category_by_code(code)?;
        category.archived = true;
        self.update(&category)?;
        Ok(category)
    }

    pub fn archive_project(&self, code: &str) -> Result<Project> {
        let mut project = self.get_project_by_code(code)?;
        project.archived = true;
        self.update(&project)?;
        Ok(project)
    }

    pub fn list_clients(&self, search: &ClientSearch) -> Result<Vec<Client>> {
        let mut clients = self
            .store
            .query::<Client>()
            .eq("archived", search.archived)
            .all()?;
        retain_matching(&mut clients, &search.name);
        Ok(clients)
    }

    pub fn list_categories(&self, search: &CategorySearch) -> Result<Vec<Category>> {
        let mut categories = self
            .store
            .query::<Category>()
            .eq("archived", search.archived)
            .all()?;
        retain_matching(&mut categories, &search.name);
        Ok(categories)
    }

    /// Lists projects, optionally narrowed by the owning client's name or code.
    ///
    /// Each candidate costs one client lookup; projects whose client no longer
    /// exists are dropped from a client-filtered listing. A client record that
    /// cannot be read fails the listing.
    pub fn list_projects(&self, search: &ProjectSearch) -> Result<Vec<Project>> {
        let mut projects = self
            .store
            .query::<Project>()
            .eq("archived", search.archived)
            .all()?;
        retain_matching(&mut projects, &search.name);

        if search.client.is_empty() {
            return Ok(projects);
        }
        projects
            .into_iter()
            .filter_map(|project| match self.get_client_by_id(project.client_id) {
                Ok(client) => matches_name_or_code(&client, &search.client).then_some(Ok(project)),
                Err(err) if err.is_not_found() => None,
                Err(err) => Some(Err(err)),
            })
            .collect()
    }

    fn next_id<T: Document>(&self) -> Result<i64> {
        self.store.next_numeric_id::<T>().map_err(|e| {
            Error::persistence(format!("failed to allocate {} id", T::ENTITY), e)
        })
    }

    fn insert<T: Document>(&self, record: &T) -> Result<()> {
        self.store.insert(record).map_err(|e| {
            Error::persistence(format!("failed to insert {} {}", T::ENTITY, record.key()), e)
        })
    }

    fn update<T: Document>(&self, record: &T) -> Result<()> {
        self.store.update(record).map_err(|e| {
            Error::persistence(format!("failed to update {} {}", T::ENTITY, record.key()), e)
        })
    }
}

impl<S: DocumentStore> CatalogLookup for CatalogService<'_, S> {
    fn get_client_by_id(&self, id: i64) -> Result<Client> {
        self.store.query().eq(Client::ID_FIELD, id).first()
    }

    fn get_client_by_code(&self, code: &str) -> Result<Client> {
        self.store.query().eq("code", code).first()
    }

    fn get_project_by_id(&self, id: i64) -> Result<Project> {
        self.store.query().eq(Project::ID_FIELD, id).first()
    }

    fn get_project_by_code(&self, code: &str) -> Result<Project> {
        self.store.query().eq("code", code).first()
    }

    fn get_category_by_id(&self, id: i64) -> Result<Category> {
        self.store.query().eq(Category::ID_FIELD, id).first()
    }

    fn get_category_by_code(&self, code: &str) -> Result<Category> {
        self.store.query().eq("code", code).first()
    }
}
