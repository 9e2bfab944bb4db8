//! Read-only profile lookup by internal identifier.

use crate::error::Result;
use crate::person::Person;
use crate::storage::Storage;

/// Outcome of a profile lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileView {
    /// The stored record.
    Found(Person),
    /// No record has the requested identifier.
    NotFound,
}

impl ProfileView {
    /// The record, if found.
    #[must_use]
    pub fn person(&self) -> Option<&Person> {
        match self {
            Self::Found(person) => Some(person),
            Self::NotFound => None,
        }
    }
}

/// Resolves public profile identifiers to stored records.
#[derive(Debug, Clone)]
pub struct ProfileViewer {
    storage: Storage,
}

impl ProfileViewer {
    /// Create a viewer over `storage`.
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Look up the profile with the given identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lookup fails; an unknown identifier is
    /// [`ProfileView::NotFound`], not an error.
    pub fn view(&self, id: i64) -> Result<ProfileView> {
        Ok(self
            .storage
            .find_by_id(id)?
            .map_or(ProfileView::NotFound, ProfileView::Found))
    }
}
