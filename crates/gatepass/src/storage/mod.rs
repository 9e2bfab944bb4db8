//! Storage layer for gatepass.
//!
//! This module provides `SQLite`-based persistent storage for registrants.
//! [`Storage`] is a connection factory: every operation opens its own
//! short-lived connection and releases it before returning, so a handle can be
//! cloned freely into request handlers.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::person::{Person, PersonFields};

use schema::PERSON_COLUMNS;

/// Default time a connection waits on a locked database before failing.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Storage engine for registrants.
#[derive(Debug, Clone)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// How long a connection waits for a competing writer.
    busy_timeout: Duration,
}

/// Result of [`Storage::upsert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// The record as stored after the write.
    pub person: Person,
    /// `true` if the record was inserted, `false` if an existing one was updated.
    pub created: bool,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist
    /// and initializes the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Like [`Storage::open`] with an explicit busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open_with_timeout(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let storage = Self { path, busy_timeout };

        let conn = storage.connect()?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database ready at {}", storage.path.display());
        Ok(storage)
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a fresh connection to the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database file cannot be opened.
    pub fn connect(&self) -> Result<Connection> {
        debug!("Opening connection to {}", self.path.display());
        let conn = Connection::open(&self.path).map_err(|source| Error::DatabaseOpen {
            path: self.path.clone(),
            source,
        })?;
        conn.busy_timeout(self.busy_timeout)?;
        conn.execute_batch("PRAGMA synchronous=NORMAL;")?;
        Ok(conn)
    }

    /// Find the record with the given gatepass number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_by_gatepass(&self, gatepass_number: &str) -> Result<Option<Person>> {
        let conn = self.connect()?;
        let person = conn
            .query_row(
                &format!("SELECT {PERSON_COLUMNS} FROM person WHERE gatepass_number = ?1"),
                [gatepass_number],
                Self::row_to_person,
            )
            .optional()?;
        Ok(person)
    }

    /// Find the record with the given internal identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_by_id(&self, id: i64) -> Result<Option<Person>> {
        let conn = self.connect()?;
        let person = conn
            .query_row(
                &format!("SELECT {PERSON_COLUMNS} FROM person WHERE id = ?1"),
                [id],
                Self::row_to_person,
            )
            .optional()?;
        Ok(person)
    }

    /// Insert a record for `gatepass_number`, or overwrite the fields of the
    /// existing one.
    ///
    /// The lookup and the write share one IMMEDIATE transaction, so concurrent
    /// submissions for the same new gatepass number serialize on the write
    /// lock and exactly one of them observes `created == true`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn upsert(&self, gatepass_number: &str, fields: &PersonFields) -> Result<UpsertOutcome> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM person WHERE gatepass_number = ?1",
                [gatepass_number],
                |row| row.get(0),
            )
            .optional()?;

        let (id, created) = if let Some(id) = existing {
            tx.execute(
                r"
                UPDATE person SET name = ?1, company = ?2, department = ?3,
                    emergency_contact = ?4, site_incharge = ?5, blood_group = ?6,
                    last_training_name = ?7, last_training_attended = ?8
                WHERE id = ?9
                ",
                params![
                    fields.name,
                    fields.company,
                    fields.department,
                    fields.emergency_contact,
                    fields.site_incharge,
                    fields.blood_group,
                    fields.last_training_name,
                    fields.last_training_attended,
                    id,
                ],
            )?;
            debug!("Updated person {} ({})", id, gatepass_number);
            (id, false)
        } else {
            tx.execute(
                r"
                INSERT INTO person (gatepass_number, name, company, department,
                    emergency_contact, site_incharge, blood_group,
                    last_training_name, last_training_attended)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ",
                params![
                    gatepass_number,
                    fields.name,
                    fields.company,
                    fields.department,
                    fields.emergency_contact,
                    fields.site_incharge,
                    fields.blood_group,
                    fields.last_training_name,
                    fields.last_training_attended,
                ],
            )?;
            let id = tx.last_insert_rowid();
            debug!("Inserted person {} ({})", id, gatepass_number);
            (id, true)
        };

        tx.commit()?;

        Ok(UpsertOutcome {
            person: Person {
                id,
                gatepass_number: gatepass_number.to_string(),
                fields: fields.clone(),
            },
            created,
        })
    }

    /// Count stored records.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM person", [], |row| row.get(0))?;
        Ok(count)
    }

    /// List records in identifier order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list(&self, limit: usize) -> Result<Vec<Person>> {
        let conn = self.connect()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {PERSON_COLUMNS} FROM person ORDER BY id LIMIT ?1"))?;

        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
        let people = stmt
            .query_map([limit_i64], Self::row_to_person)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(people)
    }

    /// Convert a database row to a Person struct.
    fn row_to_person(row: &rusqlite::Row) -> rusqlite::Result<Person> {
        Ok(Person {
            id: row.get(0)?,
            gatepass_number: row.get(1)?,
            fields: PersonFields {
                name: row.get(2)?,
                company: row.get(3)?,
                department: row.get(4)?,
                emergency_contact: row.get(5)?,
                site_incharge: row.get(6)?,
                blood_group: row.get(7)?,
                last_training_name: row.get(8)?,
                last_training_attended: row.get(9)?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};

    use super::*;

    fn create_test_storage() -> (tempfile::TempDir, Storage) {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = Storage::open(dir.path().join("gatepass.db")).expect("open storage");
        (dir, storage)
    }

    fn fields(name: &str, company: &str) -> PersonFields {
        PersonFields {
            name: name.to_string(),
            company: company.to_string(),
            ..PersonFields::default()
        }
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested/deeper/gatepass.db");

        let storage = Storage::open(&nested).unwrap();
        assert!(nested.exists());
        assert_eq!(storage.path(), nested);
    }

    #[test]
    fn test_upsert_creates_then_updates() {
        let (_dir, storage) = create_test_storage();

        let first = storage.upsert("A/123", &fields("Asha", "Acme")).unwrap();
        assert!(first.created);
        assert_eq!(first.person.id, 1);

        let second = storage.upsert("A/123", &fields("Asha K", "Globex")).unwrap();
        assert!(!second.created);
        assert_eq!(second.person.id, first.person.id);
        assert_eq!(storage.count().unwrap(), 1);

        let stored = storage.find_by_id(first.person.id).unwrap().unwrap();
        assert_eq!(stored.fields.name, "Asha K");
        assert_eq!(stored.fields.company, "Globex");
        assert_eq!(stored.gatepass_number, "A/123");
    }

    #[test]
    fn test_upsert_assigns_distinct_ids() {
        let (_dir, storage) = create_test_storage();

        let a = storage.upsert("GP-1", &fields("A", "X")).unwrap();
        let b = storage.upsert("GP-2", &fields("B", "Y")).unwrap();
        assert!(a.created && b.created);
        assert_ne!(a.person.id, b.person.id);
        assert_eq!(storage.count().unwrap(), 2);
    }

    #[test]
    fn test_find_by_gatepass() {
        let (_dir, storage) = create_test_storage();
        storage.upsert("A/1", &fields("Asha", "Acme")).unwrap();

        let found = storage.find_by_gatepass("A/1").unwrap().unwrap();
        assert_eq!(found.fields.name, "Asha");
        assert!(storage.find_by_gatepass("A_1").unwrap().is_none());
    }

    #[test]
    fn test_find_by_id_nonexistent() {
        let (_dir, storage) = create_test_storage();
        assert!(storage.find_by_id(99_999).unwrap().is_none());
    }

    #[test]
    fn test_list_in_id_order() {
        let (_dir, storage) = create_test_storage();
        for i in 0..5 {
            storage
                .upsert(&format!("GP-{i}"), &fields(&format!("P{i}"), "C"))
                .unwrap();
        }

        let people = storage.list(3).unwrap();
        assert_eq!(people.len(), 3);
        assert!(people.windows(2).all(|w| w[0].id < w[1].id));
        assert!(storage.list(0).unwrap().is_empty());
    }

    #[test]
    fn test_reopen_keeps_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gatepass.db");

        let storage = Storage::open(&path).unwrap();
        storage.upsert("A/1", &fields("Asha", "Acme")).unwrap();
        drop(storage);

        let storage = Storage::open(&path).unwrap();
        assert_eq!(storage.count().unwrap(), 1);
    }

    #[test]
    fn test_unicode_fields() {
        let (_dir, storage) = create_test_storage();
        let outcome = storage
            .upsert("ü/1", &fields("Jürgen 世界", "Ölwerk"))
            .unwrap();

        let stored = storage.find_by_id(outcome.person.id).unwrap().unwrap();
        assert_eq!(stored.fields.name, "Jürgen 世界");
        assert_eq!(stored.gatepass_number, "ü/1");
    }

    #[test]
    fn test_concurrent_upserts_create_once() {
        let (_dir, storage) = create_test_storage();
        let threads = 8;
        let barrier = Arc::new(Barrier::new(threads));

        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let storage = storage.clone();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    storage
                        .upsert("RACE/1", &fields(&format!("T{i}"), "C"))
                        .unwrap()
                })
            })
            .collect();

        let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(outcomes.iter().filter(|o| o.created).count(), 1);
        let id = outcomes[0].person.id;
        assert!(outcomes.iter().all(|o| o.person.id == id));
        assert_eq!(storage.count().unwrap(), 1);
    }
}
