//! Raw document shapes as the host store hands them to the plugin.
//!
//! The host persists every actor and item as a loosely-typed JSON document:
//! a handful of fixed top-level fields (`_id`, `name`, `type`, `img`,
//! `folder`, `flags`, embedded `items`) around a versioned `data` body whose
//! shape is whatever schema generation wrote it. Migrations read these as-is
//! and never mutate them in place.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::DocumentId;

/// Actor subtypes recognized by the ruleset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorKind {
    Agent,
    Npc,
    /// Legacy-only subtype; the v1 -> v2 migration retypes these to `Npc`.
    Unnatural,
}

impl ActorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Npc => "npc",
            Self::Unnatural => "unnatural",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "agent" => Some(Self::Agent),
            "npc" => Some(Self::Npc),
            "unnatural" => Some(Self::Unnatural),
            _ => None,
        }
    }
}

/// Item subtypes recognized by the ruleset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Weapon,
    Armor,
    Gear,
    Skill,
    Motivation,
    Disorder,
    Bond,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weapon => "weapon",
            Self::Armor => "armor",
            Self::Gear => "gear",
            Self::Skill => "skill",
            Self::Motivation => "motivation",
            Self::Disorder => "disorder",
            Self::Bond => "bond",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "weapon" => Some(Self::Weapon),
            "armor" => Some(Self::Armor),
            "gear" => Some(Self::Gear),
            "skill" => Some(Self::Skill),
            "motivation" => Some(Self::Motivation),
            "disorder" => Some(Self::Disorder),
            "bond" => Some(Self::Bond),
            _ => None,
        }
    }
}

/// Top-level document classes a compendium pack can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Actor,
    Item,
    Scene,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Actor => "actor",
            Self::Item => "item",
            Self::Scene => "scene",
        }
    }

    /// Host pack metadata capitalizes class names (`"Actor"`), so matching
    /// is case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        [Self::Actor, Self::Item, Self::Scene]
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
    }
}

/// A document exactly as stored by the host: fixed top-level fields around a
/// versioned, loosely-typed `data` body.
///
/// Read-only input to the migration engine. All changes flow back through
/// [`crate::update::DocumentUpdate`] applied by the persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDocument {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub name: String,
    /// The `type` discriminator string. Kept as a string because legacy
    /// documents can carry subtypes no current enum knows about.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(default)]
    pub flags: Value,
    /// The versioned data body. Shape depends on the schema generation that
    /// wrote it.
    #[serde(default)]
    pub data: Value,
    /// Embedded child documents (items on an actor). Empty for items.
    #[serde(default)]
    pub items: Vec<RawDocument>,
}

impl RawDocument {
    pub fn actor_kind(&self) -> Option<ActorKind> {
        ActorKind::parse(&self.kind)
    }

    pub fn item_kind(&self) -> Option<ItemKind> {
        ItemKind::parse(&self.kind)
    }
}

/// A freshly synthesized child document, destined for the host's
/// create-embedded call. Unlike [`RawDocument`], the body here is always in
/// the current schema shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub flags: Value,
}

/// A token placed on a scene.
///
/// Unlinked tokens carry a delta blob (`actor_data`) overriding fields of
/// their base actor; that blob is migrated like a partial actor document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "actorLink", default)]
    pub actor_link: bool,
    #[serde(rename = "actorData", default)]
    pub actor_data: Value,
}

/// A scene document, reduced to what the migration needs: its tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneRecord {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub name: String,
    #[serde(default)]
    pub tokens: Vec<TokenRecord>,
}
