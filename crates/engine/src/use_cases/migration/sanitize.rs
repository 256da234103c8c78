//! Update sanitizer.
//!
//! Given a document's current stored body, a proposed partial update, and
//! the target schema model, produces the final update instruction set handed
//! to the persistence layer: the update merged over current data, pruned to
//! the paths the schema model permits, and backfilled with the model's
//! defaults. The result is idempotent: applying it and sanitizing again with
//! an empty update yields no further change.
//!
//! The fixed excluded top-level fields (id, name, type, img, folder, flags,
//! embedded items) never pass through here; [`DocumentUpdate`] keeps them
//! structurally apart from the versioned body.

use serde_json::Value;

use dossier_domain::{
    update, DocumentUpdate, DomainError, RawDocument, SchemaRegistry, UpdateSet,
};

/// Sanitize a proposed body update against the current body and the schema
/// model registered for `kind`.
///
/// Fails with [`DomainError::UnknownSchema`] when `kind` has no model; that
/// is fatal for the single document, not for the run.
pub fn sanitize_body(
    kind: &str,
    current: &Value,
    proposed: &UpdateSet,
    registry: &SchemaRegistry,
) -> Result<UpdateSet, DomainError> {
    let model = registry.get(kind)?;

    // Merge the proposed update over a working copy of the current body.
    let mut merged = current.clone();
    update::apply(&mut merged, proposed);

    let mut out = UpdateSet::new();

    // Prune: any top-most key with no home in the schema model is marked for
    // deletion and dropped from the working copy.
    prune(&mut merged, model.template(), "", &mut out);

    // Backfill: every schema path still missing gets the model's default, so
    // the document ends the migration structurally complete.
    for (path, default) in model.paths() {
        if update::get_path(&merged, &path).is_none() {
            update::set_path(&mut merged, &path, default);
        }
    }

    // Emit the merged body as writes alongside the deletions.
    for (path, value) in update::flatten(&merged) {
        out.set(path, value);
    }
    Ok(out)
}

/// Recursively compare a merged body against the schema template, deleting
/// the top-most keys the template does not know.
fn prune(merged: &mut Value, template: &Value, prefix: &str, out: &mut UpdateSet) {
    let map = match merged.as_object_mut() {
        Some(map) => map,
        None => return,
    };
    let template_map = match template.as_object() {
        Some(map) => map,
        None => return,
    };
    let mut doomed = Vec::new();
    for (key, child) in map.iter_mut() {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match template_map.get(key) {
            None => doomed.push((key.clone(), path)),
            Some(t_child) if t_child.is_object() && child.is_object() => {
                prune(child, t_child, &path, out);
            }
            // A scalar where the template nests an object, or an object
            // where the template holds a leaf: the shapes disagree, so the
            // key is dropped and the backfill restores the model default.
            Some(t_child) if t_child.is_object() != child.is_object() => {
                doomed.push((key.clone(), path));
            }
            // Both leaves (scalar or array): the template covers the value
            // wholesale, keep it.
            Some(_) => {}
        }
    }
    for (key, path) in doomed {
        out.delete(path);
        map.remove(&key);
    }
}

/// Sanitize a whole document update: the body against `kind`'s model, and
/// each embedded item update against its own item's current body and kind.
///
/// `update.kind` (a retype) wins over the document's stored type when
/// picking the schema model, since the body must conform to the type the
/// document is becoming.
pub fn sanitize_document_update(
    mut update: DocumentUpdate,
    current: &RawDocument,
    registry: &SchemaRegistry,
) -> Result<DocumentUpdate, DomainError> {
    let kind = update.kind.as_deref().unwrap_or(&current.kind);
    update.data = sanitize_body(kind, &current.data, &update.data, registry)?;

    let mut items = Vec::with_capacity(update.items.len());
    for item_update in update.items {
        // Item updates are produced from the document's own embedded items,
        // so an unmatched id cannot be applied and is dropped.
        let Some(item) = current.items.iter().find(|i| i.id == item_update.id) else {
            continue;
        };
        items.push(sanitize_document_update(item_update, item, registry)?);
    }
    update.items = items;
    Ok(update)
}

/// The merged-pruned-backfilled body a sanitized update produces when
/// applied.
pub fn apply_sanitized(current: &Value, sanitized: &UpdateSet) -> Value {
    let mut body = current.clone();
    update::apply(&mut body, sanitized);
    body
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use dossier_domain::{DocumentId, SchemaModel, UpdateValue};

    use super::*;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new().with(
            "npc",
            SchemaModel::new(json!({
                "health": { "value": 10, "max": 10 },
                "sanity": { "value": 50 },
                "notes": "",
            }))
            .expect("template is an object"),
        )
    }

    #[test]
    fn merges_update_over_current_data() {
        let current = json!({ "health": { "value": 4, "max": 10 } });
        let mut proposed = UpdateSet::new();
        proposed.set("health.value", 7);
        let out = sanitize_body("npc", &current, &proposed, &registry()).unwrap();
        assert_eq!(out.get_set("health.value"), Some(&json!(7)));
        assert_eq!(out.get_set("health.max"), Some(&json!(10)));
    }

    #[test]
    fn prunes_paths_absent_from_the_model() {
        let current = json!({
            "health": { "value": 4, "max": 10 },
            "skills": { "firearms": { "proficiency": 40 } },
        });
        let out = sanitize_body("npc", &current, &UpdateSet::new(), &registry()).unwrap();
        assert_eq!(out.get("skills"), Some(&UpdateValue::Delete));
        assert!(out.iter().all(|(path, _)| !path.starts_with("skills.")));
    }

    #[test]
    fn backfills_every_model_default() {
        let current = json!({ "health": { "value": 4 } });
        let out = sanitize_body("npc", &current, &UpdateSet::new(), &registry()).unwrap();
        assert_eq!(out.get_set("health.max"), Some(&json!(10)));
        assert_eq!(out.get_set("sanity.value"), Some(&json!(50)));
        assert_eq!(out.get_set("notes"), Some(&json!("")));
    }

    #[test]
    fn object_where_the_model_holds_a_leaf_is_reset_to_default() {
        // npc "notes" is a plain string in the model; a stray object there
        // must not survive wholesale.
        let current = json!({ "notes": { "junk": 1 } });
        let out = sanitize_body("npc", &current, &UpdateSet::new(), &registry()).unwrap();
        assert_eq!(out.get_set("notes"), Some(&json!("")));
        assert!(out.iter().all(|(path, _)| !path.starts_with("notes.")));
    }

    #[test]
    fn leaf_where_the_model_nests_an_object_is_rebuilt_from_defaults() {
        let current = json!({ "health": 5 });
        let out = sanitize_body("npc", &current, &UpdateSet::new(), &registry()).unwrap();
        assert_eq!(out.get("health"), Some(&UpdateValue::Delete));
        assert_eq!(out.get_set("health.value"), Some(&json!(10)));
        assert_eq!(out.get_set("health.max"), Some(&json!(10)));
    }

    #[test]
    fn sanitizing_twice_is_idempotent() {
        let current = json!({
            "health": { "value": 4 },
            "legacyJunk": true,
        });
        let reg = registry();
        let mut proposed = UpdateSet::new();
        proposed.set("sanity.value", 32);

        let first = sanitize_body("npc", &current, &proposed, &reg).unwrap();
        let once = apply_sanitized(&current, &first);

        let second = sanitize_body("npc", &once, &UpdateSet::new(), &reg).unwrap();
        let twice = apply_sanitized(&once, &second);
        assert_eq!(once, twice);
        assert!(second
            .iter()
            .all(|(_, v)| !matches!(v, UpdateValue::Delete)));
    }

    #[test]
    fn unknown_kind_is_a_lookup_failure() {
        let err = sanitize_body("vehicle", &json!({}), &UpdateSet::new(), &registry())
            .expect_err("no model for vehicle");
        assert!(matches!(err, DomainError::UnknownSchema { .. }));
    }

    #[test]
    fn retype_picks_the_target_model() {
        let reg = registry();
        let doc = RawDocument {
            id: DocumentId::new_unchecked("aaaaaaaaaaaaaaaa"),
            name: "Thing in the Fog".into(),
            kind: "unnatural".into(),
            img: None,
            folder: None,
            flags: json!({}),
            data: json!({ "sanity": { "value": 0 } }),
            items: vec![],
        };
        let mut proposed = DocumentUpdate::new(doc.id.clone());
        proposed.kind = Some("npc".into());
        let out = sanitize_document_update(proposed, &doc, &reg).unwrap();
        assert_eq!(out.kind.as_deref(), Some("npc"));
        assert_eq!(out.data.get_set("sanity.value"), Some(&json!(0)));
    }
}
