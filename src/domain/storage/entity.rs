//! Storage entity traits and types

use std::fmt::Debug;

use serde::{de::DeserializeOwned, Serialize};

/// Trait for types that can be used as storage keys
pub trait StorageKey: Clone + Debug + Send + Sync + Eq + std::hash::Hash {
    /// Returns the key as a string for storage backends that require string keys
    fn as_str(&self) -> &str;
}

/// Trait for types that can be stored
pub trait StorageEntity: Clone + Debug + Send + Sync + Serialize + DeserializeOwned {
    /// The key type for this entity
    type Key: StorageKey;

    /// Returns the entity's key
    fn key(&self) -> &Self::Key;

    /// Secondary key used for filtered collection queries (e.g. the owning team)
    fn partition_key(&self) -> Option<&str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    struct NoteKey(String);

    impl StorageKey for NoteKey {
        fn as_str(&self) -> &str {
            &self.0
        }
    }

    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    struct Note {
        id: NoteKey,
        team: Option<String>,
    }

    impl StorageEntity for Note {
        type Key = NoteKey;

        fn key(&self) -> &Self::Key {
            &self.id
        }

        fn partition_key(&self) -> Option<&str> {
            self.team.as_deref()
        }
    }

    #[test]
    fn test_partition_key() {
        let scoped = Note {
            id: NoteKey("n-1".to_string()),
            team: Some("core".to_string()),
        };
        assert_eq!(scoped.key().as_str(), "n-1");
        assert_eq!(scoped.partition_key(), Some("core"));

        let unscoped = Note {
            id: NoteKey("n-2".to_string()),
            team: None,
        };
        assert_eq!(unscoped.partition_key(), None);
    }
}
