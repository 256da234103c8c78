//! Document store ports, one per host document class.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use dossier_domain::{DocumentId, DocumentUpdate, NewDocument, RawDocument, SceneRecord};

use super::error::StoreError;

/// Metadata for a compendium pack, as reported by the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackInfo {
    /// Fully-qualified collection name, e.g. `world.pregens`.
    pub collection: String,
    /// Owning package. Only `world`-owned packs are migrated.
    pub package: String,
    /// Document class the pack contains, as the host names it. Packs of
    /// classes the migration does not know are skipped.
    pub kind: String,
    /// Current lock state; restored after migration.
    pub locked: bool,
}

/// Top-level actor documents in the current world.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActorStore: Send + Sync {
    /// Enumerate all world actors with their raw stored data.
    async fn list(&self) -> Result<Vec<RawDocument>, StoreError>;

    /// Apply a partial update (dotted-path merge, deletes honored) to an
    /// actor and its embedded items, and persist it.
    async fn apply_update(&self, update: DocumentUpdate) -> Result<(), StoreError>;

    /// Create new embedded child documents under an actor.
    async fn create_embedded(
        &self,
        parent: DocumentId,
        items: Vec<NewDocument>,
    ) -> Result<(), StoreError>;
}

/// Top-level item documents in the current world.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn list(&self) -> Result<Vec<RawDocument>, StoreError>;
    async fn apply_update(&self, update: DocumentUpdate) -> Result<(), StoreError>;
}

/// Scene documents and their embedded token data.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SceneStore: Send + Sync {
    async fn list(&self) -> Result<Vec<SceneRecord>, StoreError>;

    /// Replace the actor-data delta blob of one token, addressed by its
    /// position in the scene's token list.
    async fn update_token_actor_data(
        &self,
        scene: DocumentId,
        token_index: usize,
        actor_data: Value,
    ) -> Result<(), StoreError>;
}

/// Compendium packs: portable, lockable document containers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompendiumStore: Send + Sync {
    async fn list_packs(&self) -> Result<Vec<PackInfo>, StoreError>;

    async fn set_locked(&self, collection: &str, locked: bool) -> Result<(), StoreError>;

    /// Trigger the host's own built-in schema-migration step for a pack.
    async fn migrate(&self, collection: &str) -> Result<(), StoreError>;

    /// Fetch every document inside a pack as raw JSON. The caller decodes
    /// according to the pack's document class.
    async fn documents(&self, collection: &str) -> Result<Vec<Value>, StoreError>;

    /// Apply a partial update to an actor or item document inside a pack.
    async fn apply_update(
        &self,
        collection: &str,
        update: DocumentUpdate,
    ) -> Result<(), StoreError>;

    /// Create new embedded child documents under an actor inside a pack.
    async fn create_embedded(
        &self,
        collection: &str,
        parent: DocumentId,
        items: Vec<NewDocument>,
    ) -> Result<(), StoreError>;

    /// Replace the actor-data delta blob of one token on a scene inside a
    /// pack.
    async fn update_scene_token(
        &self,
        collection: &str,
        scene: DocumentId,
        token_index: usize,
        actor_data: Value,
    ) -> Result<(), StoreError>;
}

/// World-scoped settings storage. The engine persists exactly one value
/// here: the schema version counter.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// The schema generation already applied to this world. Zero for a
    /// freshly-created world.
    async fn schema_version(&self) -> Result<u32, StoreError>;

    async fn set_schema_version(&self, version: u32) -> Result<(), StoreError>;
}
