//! Use cases - user story orchestration.

pub mod migration;

pub use migration::MigrationRunner;
