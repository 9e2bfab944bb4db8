//! `gatepass` - Visitor registration keyed by gatepass number
//!
//! This library stores registrant profiles in `SQLite`, issues a QR code that
//! links to each registrant's public profile page, and exposes the
//! registration workflow over HTTP.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod person;
pub mod profile;
pub mod qr;
pub mod registration;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result, ValidationError};
pub use http::{build_router, AppState};
pub use logging::init_logging;
pub use person::{Person, PersonFields};
pub use profile::{ProfileView, ProfileViewer};
pub use qr::QrStore;
pub use registration::{Registrar, Registration};
pub use storage::{Storage, UpsertOutcome};
