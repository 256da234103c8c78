//! Dossier engine.
//!
//! Runs the plugin's one-time data migrations against the host document
//! layer. The host owns persistence, rendering, and the event loop; this
//! crate only reads raw documents through port traits, computes
//! schema-conformant updates, and hands them back.
//!
//! ## Structure
//!
//! - `infrastructure/` - Port traits for the host document layer
//! - `use_cases/` - The migration orchestrator and the migrations themselves

pub mod infrastructure;
pub mod use_cases;

pub use use_cases::migration::{
    Migration, MigrationContext, MigrationError, MigrationOutcome, MigrationPlan, MigrationRunner,
    RunStats,
};
