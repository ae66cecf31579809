//! Name/code matching shared by the catalog listings.

use crate::records::{Category, Client, Project};

/// A catalog record searchable by name or code.
pub trait Named {
    fn name(&self) -> &str;
    fn code(&self) -> &str;
}

impl Named for Client {
    fn name(&self) -> &str {
        &self.name
    }

    fn code(&self) -> &str {
        &self.code
    }
}

impl Named for Category {
    fn name(&self) -> &str {
        &self.name
    }

    fn code(&self) -> &str {
        &self.code
    }
}

impl Named for Project {
    fn name(&self) -> &str {
        &self.name
    }

    fn code(&self) -> &str {
        &self.code
    }
}

/// Case-insensitive substring match against either the name or the code.
pub fn matches_name_or_code<N: Named + ?Sized>(record: &N, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    record.name().to_lowercase().contains(&needle) || record.code().to_lowercase().contains(&needle)
}

/// Keeps the records matching `needle`. An empty needle keeps everything.
pub fn retain_matching<N: Named>(records: &mut Vec<N>, needle: &str) {
    if needle.is_empty() {
        return;
    }
    records.retain(|record| matches_name_or_code(record, needle));
}
