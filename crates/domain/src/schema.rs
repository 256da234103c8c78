//! Declarative schema models.
//!
//! A [`SchemaModel`] is a template enumerating every permitted field path of
//! one document subtype's data body, with the default value at each path. The
//! migration engine uses it both ways: as an allow-list (paths not in the
//! template are pruned) and as a source of defaults (paths missing after a
//! migration are backfilled).
//!
//! Models live in an explicit, immutable [`SchemaRegistry`] handed to the
//! sanitizer as an argument, so tests can run it against synthetic schemas.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::DomainError;
use crate::update;

/// Allow-list + default-value template for one document subtype.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaModel {
    template: Value,
}

impl SchemaModel {
    /// Wrap a template object. Non-object templates are a programmer error.
    pub fn new(template: Value) -> Result<Self, DomainError> {
        if !template.is_object() {
            return Err(DomainError::malformed(
                "template",
                "schema model template must be a JSON object",
            ));
        }
        Ok(Self { template })
    }

    pub fn template(&self) -> &Value {
        &self.template
    }

    /// Every permitted field path with its default value.
    pub fn paths(&self) -> BTreeMap<String, Value> {
        update::flatten(&self.template)
    }

    /// Whether a dotted path is permitted by this model.
    ///
    /// A path is permitted when the template defines it as a leaf, or when it
    /// points inside a leaf (the template stops at arrays and other wholesale
    /// values).
    pub fn contains(&self, path: &str) -> bool {
        update::get_path(&self.template, path).is_some()
    }
}

/// Immutable mapping from document type string to its schema model.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    models: BTreeMap<String, SchemaModel>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration.
    pub fn with(mut self, kind: impl Into<String>, model: SchemaModel) -> Self {
        self.models.insert(kind.into(), model);
        self
    }

    pub fn model(&self, kind: &str) -> Option<&SchemaModel> {
        self.models.get(kind)
    }

    /// Look up a model, failing with [`DomainError::UnknownSchema`] when the
    /// type was never registered.
    pub fn get(&self, kind: &str) -> Result<&SchemaModel, DomainError> {
        self.models
            .get(kind)
            .ok_or_else(|| DomainError::unknown_schema(kind))
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn model() -> SchemaModel {
        SchemaModel::new(json!({
            "health": { "value": 10, "max": 10 },
            "notes": "",
        }))
        .unwrap()
    }

    #[test]
    fn paths_flatten_defaults() {
        let paths = model().paths();
        assert_eq!(paths.get("health.value"), Some(&json!(10)));
        assert_eq!(paths.get("notes"), Some(&json!("")));
    }

    #[test]
    fn contains_checks_template_paths() {
        let m = model();
        assert!(m.contains("health.max"));
        assert!(!m.contains("wp.value"));
    }

    #[test]
    fn registry_lookup_fails_for_unregistered_kind() {
        let registry = SchemaRegistry::new().with("agent", model());
        assert!(registry.get("agent").is_ok());
        assert!(matches!(
            registry.get("vehicle"),
            Err(DomainError::UnknownSchema { .. })
        ));
    }

    #[test]
    fn non_object_template_is_rejected() {
        assert!(SchemaModel::new(json!("nope")).is_err());
    }
}
