//! Version-to-version data migrations.
//!
//! Each migration pairs a version predicate with a transformation procedure
//! over every document the world holds: actors, items, scene token deltas,
//! and world-owned compendium packs. The [`MigrationRunner`] decides which
//! migrations are due, gates them behind a confirmation dialog, and advances
//! the persisted schema version counter exactly once per completed pass.

mod error;
mod runner;
pub mod sanitize;
pub mod v1v2;

pub use error::MigrationError;
pub use runner::{MigrationOutcome, MigrationPlan, MigrationRunner, PlannedMigration};

use std::sync::Arc;

use async_trait::async_trait;

use crate::infrastructure::ports::{
    ActorStore, CompendiumStore, IdSource, ItemStore, SceneStore,
};

/// Everything a migration needs to do its work: the host stores and an id
/// source for synthesizing new documents.
#[derive(Clone)]
pub struct MigrationContext {
    pub actors: Arc<dyn ActorStore>,
    pub items: Arc<dyn ItemStore>,
    pub scenes: Arc<dyn SceneStore>,
    pub packs: Arc<dyn CompendiumStore>,
    pub ids: Arc<dyn IdSource>,
}

/// Per-pass document counters, surfaced in the completion banner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Documents transformed and persisted.
    pub migrated: u32,
    /// Documents that failed and were skipped; details are in the log.
    pub failed: u32,
    /// Documents that needed no changes.
    pub unchanged: u32,
}

impl RunStats {
    pub fn absorb(&mut self, other: RunStats) {
        self.migrated += other.migrated;
        self.failed += other.failed;
        self.unchanged += other.unchanged;
    }
}

/// One version-to-version migration.
///
/// Migrations are applied in ascending version order: each may assume its
/// input is in the shape the previous one produced.
#[async_trait]
pub trait Migration: Send + Sync {
    /// The schema generation this migration produces.
    fn version(&self) -> u32;

    /// Short human-readable label for the confirmation dialog.
    fn label(&self) -> &'static str;

    /// Whether this migration is due, given the persisted counter.
    fn should_run(&self, counter: u32) -> bool {
        counter < self.version()
    }

    /// Run the transformation across every document class.
    ///
    /// Individual document failures must be logged and counted, not
    /// returned: an error from this method means the pass itself could not
    /// proceed (e.g. document enumeration failed) and leaves the version
    /// counter untouched.
    async fn run(&self, ctx: &MigrationContext) -> Result<RunStats, MigrationError>;
}
