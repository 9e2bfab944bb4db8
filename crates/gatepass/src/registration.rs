//! The registration workflow.
//!
//! A registration runs in three steps: [`start`] validates and normalizes the
//! raw gatepass number, [`Registrar::lookup`] loads the form for a token, and
//! [`Registrar::register`] stores the submitted fields. The QR artifact is
//! written only after a record has been created, never on update.

use std::path::PathBuf;

use tracing::info;

use crate::error::{Result, ValidationError};
use crate::person::{denormalize, normalize, Person, PersonFields};
use crate::qr::QrStore;
use crate::storage::Storage;

/// Validate a raw gatepass number and return the token for `/register/<token>`.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyGatepass`] if the input is empty or whitespace only.
pub fn start(raw_gatepass: &str) -> std::result::Result<String, ValidationError> {
    let gatepass_number = raw_gatepass.trim();
    if gatepass_number.is_empty() {
        return Err(ValidationError::EmptyGatepass);
    }
    Ok(normalize(gatepass_number))
}

/// Public profile URL for `id` under `origin`.
#[must_use]
pub fn profile_url(origin: &str, id: i64) -> String {
    format!("{}/profile/{id}", origin.trim_end_matches('/'))
}

/// What the registration form is pre-filled with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterForm {
    /// The real gatepass number carried by the token.
    pub gatepass_number: String,
    /// The existing record, if this gatepass number was seen before.
    pub person: Option<Person>,
}

impl RegisterForm {
    /// Field values to pre-fill; blank for a new gatepass number.
    #[must_use]
    pub fn fields(&self) -> PersonFields {
        self.person
            .as_ref()
            .map(|person| person.fields.clone())
            .unwrap_or_default()
    }
}

/// Outcome of a submitted registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// The record as stored.
    pub person: Person,
    /// Whether this submission created the record.
    pub created: bool,
    /// Public profile URL encoded in the QR artifact.
    pub profile_url: String,
    /// File name of the QR artifact.
    pub qr_filename: String,
    /// URL the QR image is served from.
    pub qr_url: String,
}

/// Runs the registration workflow against a store and a QR directory.
#[derive(Debug, Clone)]
pub struct Registrar {
    storage: Storage,
    qr: QrStore,
    qr_url_prefix: String,
}

impl Registrar {
    /// Create a registrar. `qr_url_prefix` is the URL path QR images are served under.
    #[must_use]
    pub fn new(storage: Storage, qr: QrStore, qr_url_prefix: impl Into<String>) -> Self {
        Self {
            storage,
            qr,
            qr_url_prefix: qr_url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    /// The underlying store.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// The QR artifact directory.
    #[must_use]
    pub fn qr_store(&self) -> &QrStore {
        &self.qr
    }

    /// URL path QR images are served under, without a trailing slash.
    #[must_use]
    pub fn qr_url_prefix(&self) -> &str {
        &self.qr_url_prefix
    }

    /// Load the form state for a token.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lookup fails.
    pub fn lookup(&self, token: &str) -> Result<RegisterForm> {
        let gatepass_number = denormalize(token);
        let person = self.storage.find_by_gatepass(&gatepass_number)?;
        Ok(RegisterForm {
            gatepass_number,
            person,
        })
    }

    /// Store the submitted fields for the gatepass number carried by `token`.
    ///
    /// Fields are trimmed before storing. When the record is new, the QR
    /// artifact for `<origin>/profile/<id>` is generated after the commit.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write or the QR write fails.
    pub fn register(&self, token: &str, fields: &PersonFields, origin: &str) -> Result<Registration> {
        let gatepass_number = denormalize(token);
        let outcome = self.storage.upsert(&gatepass_number, &fields.trimmed())?;
        let id = outcome.person.id;
        let profile_url = profile_url(origin, id);

        if outcome.created {
            self.qr.generate_and_persist(&profile_url, id)?;
            info!("Registered {} as person {}", gatepass_number, id);
        } else {
            info!("Updated registration {} (person {})", gatepass_number, id);
        }

        let qr_filename = outcome.person.qr_filename();
        Ok(Registration {
            qr_url: format!("{}/{qr_filename}", self.qr_url_prefix),
            qr_filename,
            profile_url,
            created: outcome.created,
            person: outcome.person,
        })
    }

    /// Rebuild the QR artifact for an existing record.
    ///
    /// Returns `None` if no record has that identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup or the QR write fails.
    pub fn regenerate_qr(&self, id: i64, origin: &str) -> Result<Option<PathBuf>> {
        if self.storage.find_by_id(id)?.is_none() {
            return Ok(None);
        }
        let path = self.qr.generate_and_persist(&profile_url(origin, id), id)?;
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_registrar() -> (tempfile::TempDir, Registrar) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path().join("gatepass.db")).unwrap();
        let qr = QrStore::new(dir.path().join("static/qrcodes")).with_module_size(2);
        (dir, Registrar::new(storage, qr, "/static/qrcodes/"))
    }

    fn fields(name: &str, company: &str) -> PersonFields {
        PersonFields {
            name: name.to_string(),
            company: company.to_string(),
            ..PersonFields::default()
        }
    }

    fn qr_file_count(registrar: &Registrar) -> usize {
        std::fs::read_dir(registrar.qr_store().dir())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    #[test]
    fn test_start_rejects_blank() {
        assert_eq!(start(""), Err(ValidationError::EmptyGatepass));
        assert_eq!(start("   \t\n"), Err(ValidationError::EmptyGatepass));
    }

    #[test]
    fn test_start_trims_and_normalizes() {
        assert_eq!(start("  A/123 ").unwrap(), "A_123");
    }

    #[test]
    fn test_profile_url() {
        assert_eq!(profile_url("http://localhost:5000/", 1), "http://localhost:5000/profile/1");
        assert_eq!(profile_url("https://gate.example.com", 12), "https://gate.example.com/profile/12");
    }

    #[test]
    fn test_lookup_unknown_is_blank() {
        let (_dir, registrar) = create_registrar();
        let form = registrar.lookup("A_123").unwrap();
        assert_eq!(form.gatepass_number, "A/123");
        assert!(form.person.is_none());
        assert_eq!(form.fields(), PersonFields::default());
    }

    #[test]
    fn test_register_new_creates_record_and_qr() {
        let (_dir, registrar) = create_registrar();

        let registration = registrar
            .register("A_123", &fields(" Asha ", "Acme"), "http://localhost")
            .unwrap();

        assert!(registration.created);
        assert_eq!(registration.person.id, 1);
        assert_eq!(registration.person.gatepass_number, "A/123");
        assert_eq!(registration.person.fields.name, "Asha");
        assert_eq!(registration.profile_url, "http://localhost/profile/1");
        assert_eq!(registration.qr_filename, "person_1.png");
        assert_eq!(registration.qr_url, "/static/qrcodes/person_1.png");
        assert!(registrar.qr_store().exists(1));
        assert_eq!(qr_file_count(&registrar), 1);
    }

    #[test]
    fn test_register_existing_updates_without_new_qr() {
        let (_dir, registrar) = create_registrar();
        registrar
            .register("A_123", &fields("Asha", "Acme"), "http://localhost")
            .unwrap();
        let original_qr = std::fs::read(registrar.qr_store().path_for(1)).unwrap();

        let registration = registrar
            .register("A_123", &fields("Asha K", "Globex"), "http://other-host")
            .unwrap();

        assert!(!registration.created);
        assert_eq!(registration.person.id, 1);
        assert_eq!(registrar.storage().count().unwrap(), 1);
        assert_eq!(qr_file_count(&registrar), 1);
        assert_eq!(
            std::fs::read(registrar.qr_store().path_for(1)).unwrap(),
            original_qr
        );

        let form = registrar.lookup("A_123").unwrap();
        assert_eq!(form.fields().company, "Globex");
    }

    #[test]
    fn test_update_does_not_recreate_deleted_qr() {
        let (_dir, registrar) = create_registrar();
        registrar
            .register("GP1", &fields("A", "B"), "http://localhost")
            .unwrap();
        std::fs::remove_file(registrar.qr_store().path_for(1)).unwrap();

        registrar
            .register("GP1", &fields("A", "C"), "http://localhost")
            .unwrap();
        assert!(!registrar.qr_store().exists(1));
    }

    #[test]
    fn test_regenerate_qr() {
        let (_dir, registrar) = create_registrar();
        assert!(registrar.regenerate_qr(1, "http://localhost").unwrap().is_none());

        registrar
            .register("GP1", &fields("A", "B"), "http://localhost")
            .unwrap();
        std::fs::remove_file(registrar.qr_store().path_for(1)).unwrap();

        let path = registrar.regenerate_qr(1, "http://localhost").unwrap().unwrap();
        assert!(path.ends_with("person_1.png"));
        assert!(registrar.qr_store().exists(1));
    }
}
