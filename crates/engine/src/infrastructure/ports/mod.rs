//! Port traits for the host runtime boundary.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete
//! types. The host virtual-tabletop runtime owns document persistence, the
//! settings store, and the UI; the migration engine consumes them as opaque
//! services through these traits.

mod error;
mod random;
mod stores;
mod ui;

pub use error::StoreError;
pub use random::{IdSource, RandomIds};
pub use stores::{
    ActorStore, CompendiumStore, ItemStore, PackInfo, SceneStore, SettingsStore,
};
pub use ui::UiPort;

#[cfg(test)]
pub use stores::{
    MockActorStore, MockCompendiumStore, MockItemStore, MockSceneStore, MockSettingsStore,
};
#[cfg(test)]
pub use ui::MockUiPort;
