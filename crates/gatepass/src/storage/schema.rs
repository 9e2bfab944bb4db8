//! `SQLite` schema definitions for gatepass.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the person table.
pub const CREATE_PERSON_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS person (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    gatepass_number TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL DEFAULT '',
    company TEXT NOT NULL DEFAULT '',
    department TEXT NOT NULL DEFAULT '',
    emergency_contact TEXT NOT NULL DEFAULT '',
    site_incharge TEXT NOT NULL DEFAULT '',
    blood_group TEXT NOT NULL DEFAULT '',
    last_training_name TEXT NOT NULL DEFAULT '',
    last_training_attended TEXT NOT NULL DEFAULT ''
)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[CREATE_PERSON_TABLE, CREATE_METADATA_TABLE];

/// Column list shared by every person query, in [`Person`](crate::Person) field order.
pub const PERSON_COLUMNS: &str = "id, gatepass_number, name, company, department, \
    emergency_contact, site_incharge, blood_group, last_training_name, last_training_attended";
