//! Core record types for gatepass.
//!
//! A [`Person`] is one registrant, keyed internally by a database-assigned
//! identifier and externally by a unique gatepass number. This module also
//! owns the reversible mapping between a gatepass number and the token that
//! carries it in a single URL path segment.

use serde::{Deserialize, Serialize};

/// Character that separates path segments and must not appear in a token.
const SEPARATOR: char = '/';

/// Placeholder written in place of [`SEPARATOR`].
const PLACEHOLDER: char = '_';

/// Escape introducer for literal placeholder and escape characters.
const ESCAPE: char = '~';

/// The editable profile attributes of a registrant.
///
/// Every field is free text. Missing form fields deserialize to empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonFields {
    /// Full name.
    pub name: String,
    /// Employing company.
    pub company: String,
    /// Department within the company.
    pub department: String,
    /// Emergency contact details.
    pub emergency_contact: String,
    /// Site in-charge responsible for the registrant.
    pub site_incharge: String,
    /// Blood group.
    pub blood_group: String,
    /// Name of the last safety training attended.
    pub last_training_name: String,
    /// When the last training was attended.
    pub last_training_attended: String,
}

impl PersonFields {
    /// Return a copy with leading and trailing whitespace removed from every field.
    #[must_use]
    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            company: self.company.trim().to_string(),
            department: self.department.trim().to_string(),
            emergency_contact: self.emergency_contact.trim().to_string(),
            site_incharge: self.site_incharge.trim().to_string(),
            blood_group: self.blood_group.trim().to_string(),
            last_training_name: self.last_training_name.trim().to_string(),
            last_training_attended: self.last_training_attended.trim().to_string(),
        }
    }

    /// Build fields from decoded form pairs.
    ///
    /// A repeated field keeps its first value; absent fields are empty and
    /// unknown keys are ignored.
    #[must_use]
    pub fn from_form_pairs(pairs: &[(String, String)]) -> Self {
        let first = |key: &str| first_form_value(pairs, key).unwrap_or_default().to_string();
        Self {
            name: first("name"),
            company: first("company"),
            department: first("department"),
            emergency_contact: first("emergency_contact"),
            site_incharge: first("site_incharge"),
            blood_group: first("blood_group"),
            last_training_name: first("last_training_name"),
            last_training_attended: first("last_training_attended"),
        }
    }
}

/// First value submitted for `key`, if any.
#[must_use]
pub fn first_form_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
}

/// A stored registrant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Internal identifier, assigned by the store and never changed.
    pub id: i64,
    /// Unique business key supplied by the user.
    pub gatepass_number: String,
    /// Profile attributes.
    #[serde(flatten)]
    pub fields: PersonFields,
}

impl Person {
    /// File name of this person's QR artifact.
    #[must_use]
    pub fn qr_filename(&self) -> String {
        qr_filename(self.id)
    }
}

/// File name of the QR artifact for the given identifier.
#[must_use]
pub fn qr_filename(id: i64) -> String {
    format!("person_{id}.png")
}

/// Turn a gatepass number into a token that fits in one URL path segment.
///
/// `/` becomes `_`; a literal `_` becomes `~u` and a literal `~` becomes `~~`
/// so that [`denormalize`] recovers the exact input.
#[must_use]
pub fn normalize(gatepass_number: &str) -> String {
    let mut token = String::with_capacity(gatepass_number.len());
    for c in gatepass_number.chars() {
        match c {
            SEPARATOR => token.push(PLACEHOLDER),
            PLACEHOLDER => {
                token.push(ESCAPE);
                token.push('u');
            }
            ESCAPE => {
                token.push(ESCAPE);
                token.push(ESCAPE);
            }
            other => token.push(other),
        }
    }
    token
}

/// Recover the gatepass number carried by a token.
///
/// Unknown or dangling `~` escapes are kept verbatim.
#[must_use]
pub fn denormalize(token: &str) -> String {
    let mut gatepass = String::with_capacity(token.len());
    let mut chars = token.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            PLACEHOLDER => gatepass.push(SEPARATOR),
            ESCAPE => match chars.peek() {
                Some('u') => {
                    chars.next();
                    gatepass.push(PLACEHOLDER);
                }
                Some(&ESCAPE) => {
                    chars.next();
                    gatepass.push(ESCAPE);
                }
                _ => gatepass.push(ESCAPE),
            },
            other => gatepass.push(other),
        }
    }
    gatepass
}
