use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Length of a host-format document identifier.
pub const ID_LENGTH: usize = 16;

/// Well-known identifier shared by every actor's "unnatural" skill.
///
/// Later rules (sanity loss, breaking point recalculation) look this skill up
/// by id, so the migration assigns the same id on every actor instead of
/// minting a fresh one.
pub const UNNATURAL_ID: &str = "unnaturalskill00";

/// A host-format document identifier: 16 alphanumeric characters.
///
/// The host store mints these for every document and embedded child; the
/// migration mints its own when synthesizing new children. Unlike the rest of
/// the domain this is a plain string newtype, not a UUID - the host's id
/// format predates us.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Wrap a string without validating it.
    ///
    /// For ids that came out of the host store, which are trusted.
    pub fn new_unchecked(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parse and validate an id from untrusted input.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        if s.len() != ID_LENGTH || !s.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DomainError::InvalidId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// The fixed id of the shared "unnatural" skill.
    pub fn unnatural() -> Self {
        Self(UNNATURAL_ID.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<DocumentId> for String {
    fn from(value: DocumentId) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_host_format_ids() {
        let id = DocumentId::parse("a1b2c3d4e5f6g7h8").unwrap();
        assert_eq!(id.as_str(), "a1b2c3d4e5f6g7h8");
    }

    #[test]
    fn parse_rejects_wrong_length_and_symbols() {
        assert!(DocumentId::parse("short").is_err());
        assert!(DocumentId::parse("a1b2c3d4e5f6g7h!").is_err());
    }

    #[test]
    fn unnatural_constant_is_a_valid_id() {
        assert!(DocumentId::parse(UNNATURAL_ID).is_ok());
    }
}
