//! Update instruction sets and the dotted-path object algebra behind them.
//!
//! The host persistence layer applies partial updates with dotted-path merge
//! semantics: `{"health.value": 7}` sets one nested field, and a reserved
//! delete marker removes a path instead of setting it. [`UpdateSet`] models
//! that contract explicitly, and the free functions here provide the
//! flatten/expand/apply algebra the sanitizer and transformer are built on.
//!
//! Arrays are leaves throughout: the host replaces arrays wholesale, so the
//! algebra never descends into them.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::ids::DocumentId;

/// A pending change to one field path: set it, or remove it.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateValue {
    Set(Value),
    /// The remove-this-key sentinel. Applying it deletes the path.
    Delete,
}

/// A flat, ordered mapping from dotted field path to pending change.
///
/// BTreeMap keeps iteration deterministic, which keeps logs and tests stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSet {
    entries: BTreeMap<String, UpdateValue>,
}

impl UpdateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a value write at a dotted path.
    pub fn set(&mut self, path: impl Into<String>, value: impl Into<Value>) {
        self.entries
            .insert(path.into(), UpdateValue::Set(value.into()));
    }

    /// Queue a deletion at a dotted path.
    pub fn delete(&mut self, path: impl Into<String>) {
        self.entries.insert(path.into(), UpdateValue::Delete);
    }

    pub fn get(&self, path: &str) -> Option<&UpdateValue> {
        self.entries.get(path)
    }

    /// The value queued at a path, if it is a write.
    pub fn get_set(&self, path: &str) -> Option<&Value> {
        match self.entries.get(path) {
            Some(UpdateValue::Set(v)) => Some(v),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &UpdateValue)> {
        self.entries.iter()
    }

    /// Merge another set on top of this one; `other` wins on conflict.
    pub fn merge(&mut self, other: UpdateSet) {
        self.entries.extend(other.entries);
    }
}

impl FromIterator<(String, UpdateValue)> for UpdateSet {
    fn from_iter<T: IntoIterator<Item = (String, UpdateValue)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// A full update instruction for one document.
///
/// The fixed top-level fields (name, type, img, folder, flags, embedded
/// items) live outside the versioned data body and are never schema-filtered,
/// so they are kept apart from `data` structurally instead of being stripped
/// and re-attached by string prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentUpdate {
    /// Target document, so the persistence layer can address embedded
    /// children individually.
    pub id: DocumentId,
    pub name: Option<String>,
    /// Retype the document (legacy "unnatural" actors become "npc").
    pub kind: Option<String>,
    pub img: Option<String>,
    pub folder: Option<String>,
    /// Flag-bag merge, applied with the host's usual merge semantics.
    pub flags: Option<Value>,
    /// Changes to the versioned data body.
    pub data: UpdateSet,
    /// Updates targeting embedded child documents, each tagged with its id.
    pub items: Vec<DocumentUpdate>,
}

impl DocumentUpdate {
    pub fn new(id: DocumentId) -> Self {
        Self {
            id,
            name: None,
            kind: None,
            img: None,
            folder: None,
            flags: None,
            data: UpdateSet::new(),
            items: Vec::new(),
        }
    }

    /// True when applying this update would change nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.kind.is_none()
            && self.img.is_none()
            && self.folder.is_none()
            && self.flags.is_none()
            && self.data.is_empty()
            && self.items.iter().all(DocumentUpdate::is_empty)
    }
}

/// Flatten a nested object into a dotted-path map. Arrays, scalars, and
/// empty objects are leaves.
pub fn flatten(value: &Value) -> BTreeMap<String, Value> {
    let mut out = BTreeMap::new();
    flatten_into("", value, &mut out);
    out
}

fn flatten_into(prefix: &str, value: &Value, out: &mut BTreeMap<String, Value>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(&path, child, out);
            }
        }
        other => {
            if !prefix.is_empty() {
                out.insert(prefix.to_string(), other.clone());
            }
        }
    }
}

/// Rebuild a nested object from a dotted-path map. Inverse of [`flatten`]
/// for maps produced by it.
pub fn expand(flat: &BTreeMap<String, Value>) -> Value {
    let mut root = Value::Object(Map::new());
    for (path, value) in flat {
        set_path(&mut root, path, value.clone());
    }
    root
}

/// Look up a dotted path in a nested object.
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Write a value at a dotted path, creating intermediate objects as needed.
/// A non-object in the middle of the path is replaced by an object.
pub fn set_path(target: &mut Value, path: &str, value: Value) {
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    let mut current = target;
    let segments: Vec<&str> = path.split('.').collect();
    let (last, parents) = match segments.split_last() {
        Some(split) => split,
        None => return,
    };
    for segment in parents {
        let map = match current.as_object_mut() {
            Some(map) => map,
            None => return,
        };
        let child = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !child.is_object() {
            *child = Value::Object(Map::new());
        }
        current = child;
    }
    if let Some(map) = current.as_object_mut() {
        map.insert(last.to_string(), value);
    }
}

/// Remove a dotted path if present. Empty parent objects are left in place,
/// matching the host's delete semantics.
pub fn remove_path(target: &mut Value, path: &str) {
    let mut current = target;
    let segments: Vec<&str> = path.split('.').collect();
    let (last, parents) = match segments.split_last() {
        Some(split) => split,
        None => return,
    };
    for segment in parents {
        current = match current.as_object_mut().and_then(|m| m.get_mut(*segment)) {
            Some(child) => child,
            None => return,
        };
    }
    if let Some(map) = current.as_object_mut() {
        map.remove(*last);
    }
}

/// Apply an update set to a nested object in place, with the host's
/// dotted-path merge semantics.
pub fn apply(target: &mut Value, update: &UpdateSet) {
    for (path, value) in update.iter() {
        match value {
            UpdateValue::Set(v) => set_path(target, path, v.clone()),
            UpdateValue::Delete => remove_path(target, path),
        }
    }
}
