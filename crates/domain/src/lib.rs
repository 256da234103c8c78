//! Dossier domain types.
//!
//! Passive data model for the Dossier ruleset plugin: document identifiers,
//! raw document shapes as the host store hands them to us, declarative schema
//! models, and the update-instruction-set algebra the migration engine builds
//! on. No I/O lives here.

pub mod document;
pub mod error;
pub mod ids;
pub mod schema;
pub mod update;

pub use document::{
    ActorKind, DocumentKind, ItemKind, NewDocument, RawDocument, SceneRecord, TokenRecord,
};
pub use error::DomainError;
pub use ids::{DocumentId, ID_LENGTH, UNNATURAL_ID};
pub use schema::{SchemaModel, SchemaRegistry};
pub use update::{DocumentUpdate, UpdateSet, UpdateValue};
