//! Id minting port.
//!
//! Randomness is injected, never ambient, so transforms stay deterministic
//! under test.

use rand::distributions::Alphanumeric;
use rand::Rng;

use dossier_domain::{DocumentId, ID_LENGTH};

/// Source of fresh host-format document ids.
pub trait IdSource: Send + Sync {
    fn generate(&self) -> DocumentId;
}

/// Production id source: 16 random alphanumeric characters, matching the
/// host's own id format.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn generate(&self) -> DocumentId {
        let id: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(ID_LENGTH)
            .map(char::from)
            .collect();
        DocumentId::new_unchecked(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_ids_are_host_format() {
        let id = RandomIds.generate();
        assert!(DocumentId::parse(id.as_str()).is_ok());
    }
}
