//! Field transformer: pure mapping, no I/O.
//!
//! Maps one legacy record to an update instruction set plus zero or more
//! newly-synthesized child records. Absent optional fields never fail (the
//! v1 schema is inconsistent across instances); only structurally malformed
//! values do, and those errors are caught at the orchestrator's per-document
//! boundary.

use serde_json::{json, Value};

use dossier_domain::{
    update, ActorKind, DocumentId, DocumentUpdate, DomainError, ItemKind, NewDocument, RawDocument,
};

use super::legacy::{
    self, LegacySkill, StatisticsShape, WillpowerShape, ADAPTATION_CATEGORIES, STATISTIC_NAMES,
};
use crate::infrastructure::ports::IdSource;

/// Flag key on a synthesized skill recording its originating legacy key,
/// used to re-link weapons to their skill within the same actor transform.
pub const PREV_SKILL_FLAG: &str = "prevSkillId";

/// What one document's transform produced.
#[derive(Debug, Clone)]
pub struct TransformOutcome {
    pub update: DocumentUpdate,
    pub new_items: Vec<NewDocument>,
}

impl TransformOutcome {
    /// True when the document is already in the v2 shape and nothing needs
    /// to be persisted.
    pub fn is_noop(&self) -> bool {
        self.update.is_empty() && self.new_items.is_empty()
    }
}

/// Transform a legacy actor record, recursing into its embedded items.
pub fn actor(doc: &RawDocument, ids: &dyn IdSource) -> Result<TransformOutcome, DomainError> {
    let mut out = DocumentUpdate::new(doc.id.clone());
    let data = &doc.data;

    if let WillpowerShape::PreRename = legacy::willpower_shape(data) {
        if let Some(v) = update::get_path(data, "wp.value") {
            out.data.set("willpower.value", v.clone());
        }
        if let Some(v) = update::get_path(data, "wp.min") {
            out.data.set("willpower.min", v.clone());
        }
    }

    if let Some(v) = update::get_path(data, "health.value") {
        out.data.set("health.value", v.clone());
    }

    if let StatisticsShape::Abbreviated = legacy::statistics_shape(data) {
        for (abbr, full) in STATISTIC_NAMES {
            if let Some(v) = update::get_path(data, &format!("statistics.{abbr}.value")) {
                out.data.set(format!("statistics.{full}.id"), full);
                out.data.set(format!("statistics.{full}.value"), v.clone());
            }
        }
    }

    // Skills first: weapons re-link against the synthesized list.
    let skills = synthesize_skills(data, ids);

    match doc.actor_kind() {
        Some(ActorKind::Agent) => {
            for path in ["physical.description", "physical.wounds"] {
                if let Some(v) = update::get_path(data, path) {
                    if !v.is_object() {
                        out.data.set(path, v.clone());
                    }
                }
            }
            for category in ADAPTATION_CATEGORIES {
                if let Some(triple) = legacy::adaptation(data, category) {
                    let base = format!("sanity.adaptations.{category}");
                    out.data.set(format!("{base}.incident1"), triple.incident1);
                    out.data.set(format!("{base}.incident2"), triple.incident2);
                    out.data.set(format!("{base}.incident3"), triple.incident3);
                    out.data.set(format!("{base}.adapted"), triple.adapted());
                }
            }
        }
        Some(ActorKind::Npc) => {
            if let Some(v) = update::get_path(data, "sanity.value") {
                out.data.set("sanity.value", v.clone());
            }
            out.data.set("unnatural", false);
        }
        Some(ActorKind::Unnatural) => {
            // Unnatural entities fold into the npc subtype in v2.
            out.kind = Some(ActorKind::Npc.as_str().to_string());
            out.data.set("sanity.value", 0);
            for category in ADAPTATION_CATEGORIES {
                let base = format!("sanity.adaptations.{category}");
                for field in ["incident1", "incident2", "incident3", "adapted"] {
                    out.data.set(format!("{base}.{field}"), false);
                }
            }
            out.data.set("unnatural", true);
        }
        None => {}
    }

    let mut new_items = skills.clone();
    for item_doc in &doc.items {
        let mut item_outcome = item(item_doc, &skills, ids)?;
        if !item_outcome.update.is_empty() {
            out.items.push(item_outcome.update);
        }
        new_items.append(&mut item_outcome.new_items);
    }

    Ok(TransformOutcome {
        update: out,
        new_items,
    })
}

/// Transform a legacy item record.
///
/// `skills` is the list synthesized by the owning actor's transform; a
/// weapon migrated without its actor (a bare compendium item) resolves its
/// skill to the empty string.
pub fn item(
    doc: &RawDocument,
    skills: &[NewDocument],
    ids: &dyn IdSource,
) -> Result<TransformOutcome, DomainError> {
    let mut out = DocumentUpdate::new(doc.id.clone());
    let mut new_items = Vec::new();
    let data = &doc.data;

    match doc.item_kind() {
        Some(ItemKind::Weapon) => {
            physical_item_commons(data, &mut out);
            if let Some(key) = legacy::str_of(data, "skill") {
                out.data.set("skill.value", resolve_skill(&key, skills));
            }
            if let Some(raw) = legacy::scalar_of(data, "range") {
                out.data.set("range.value", parse_distance("range", raw)?);
            }
            if let Some(raw) = legacy::scalar_of(data, "killRadius") {
                out.data.set("killRadius.value", parse_distance("killRadius", raw)?);
            }
            match legacy_field(data, "damage") {
                LegacyField::Present(v) => out.data.set("damage.value", v.clone()),
                LegacyField::Absent => out.data.set("damage.value", "0"),
                LegacyField::Migrated => {}
            }
            match legacy_field(data, "armorPiercing") {
                LegacyField::Present(v) => out.data.set("armorPiercing.value", coerce_int(v)),
                LegacyField::Absent => out.data.set("armorPiercing.value", 0),
                LegacyField::Migrated => {}
            }
            // Ammo had no separate max concept in the legacy schema.
            if let Some(raw) = legacy::scalar_of(data, "ammo") {
                out.data.set("ammo.value", raw.clone());
                out.data.set("ammo.max", raw.clone());
            }
        }
        Some(ItemKind::Armor) => {
            physical_item_commons(data, &mut out);
            if let Some(raw) = legacy::scalar_of(data, "protection") {
                out.data.set("armorRating.value", raw.clone());
            }
        }
        Some(ItemKind::Gear) => {
            physical_item_commons(data, &mut out);
        }
        Some(ItemKind::Motivation) => {
            match legacy_field(data, "description") {
                LegacyField::Present(v) => out.data.set("description.value", v.clone()),
                LegacyField::Absent => out.data.set("description.value", ""),
                LegacyField::Migrated => {}
            }
            match legacy_field(data, "crossedOut") {
                LegacyField::Present(v) => out.data.set("crossed.value", v.clone()),
                LegacyField::Absent if update::get_path(data, "crossed.value").is_none() => {
                    out.data.set("crossed.value", false);
                }
                _ => {}
            }
            if let Some(disorder) = legacy::str_of(data, "disorder") {
                if !disorder.trim().is_empty() {
                    let cured = legacy::bool_of(data, "disorderCured").unwrap_or(false);
                    let description = legacy::str_of(data, "description").unwrap_or_default();
                    new_items.push(NewDocument {
                        id: ids.generate(),
                        name: disorder,
                        kind: ItemKind::Disorder.as_str().to_string(),
                        data: json!({
                            "crossed": { "value": cured },
                            "description": { "value": description },
                        }),
                        flags: json!({}),
                    });
                }
            }
        }
        Some(ItemKind::Bond) => {
            let relationship = legacy::str_of(data, "relationship");
            let description = legacy::str_of(data, "description");
            if relationship.is_some() || description.is_some() {
                let joined = [relationship, description]
                    .into_iter()
                    .flatten()
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n");
                out.data.set("description.value", joined);
            }
            if let Some(raw) = legacy::scalar_of(data, "score") {
                out.data.set("score.value", raw.clone());
            }
        }
        // Skills and disorders did not exist as items in v1; anything else
        // is a subtype this migration does not know.
        Some(ItemKind::Skill) | Some(ItemKind::Disorder) | None => {}
    }

    Ok(TransformOutcome {
        update: out,
        new_items,
    })
}

/// Migrate an unlinked token's actor-data delta blob. Returns the updated
/// blob, or `None` when the blob is empty or already migrated.
///
/// Deltas only override fields of the token's base actor, so they get the
/// transformer but not the sanitizer's backfill: a full default body here
/// would shadow everything the token should inherit.
pub fn token_actor_data(blob: &Value, ids: &dyn IdSource) -> Result<Option<Value>, DomainError> {
    let Some(raw) = raw_from_token_blob(blob) else {
        return Ok(None);
    };
    let outcome = actor(&raw, ids)?;
    if outcome.is_noop() {
        return Ok(None);
    }

    let mut out = blob.clone();
    if let Some(kind) = &outcome.update.kind {
        update::set_path(&mut out, "type", json!(kind));
    }
    // Deltas never pass through the sanitizer, so the legacy keys the
    // transform consumed are dropped here. This must happen even when the
    // update set is empty (a delta whose only content is a legacy skills
    // block), or a resumed pass would re-synthesize the same skills.
    let mut data = out.get("data").cloned().unwrap_or_else(|| json!({}));
    update::apply(&mut data, &outcome.update.data);
    for key in ["wp", "skills", "typedSkills"] {
        update::remove_path(&mut data, key);
    }
    for (abbr, _) in STATISTIC_NAMES {
        update::remove_path(&mut data, &format!("statistics.{abbr}"));
    }
    update::set_path(&mut out, "data", data);
    if !outcome.update.items.is_empty() || !outcome.new_items.is_empty() {
        let mut items = out
            .get("items")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for item_update in &outcome.update.items {
            let target = items.iter_mut().find(|entry| {
                entry.get("_id").and_then(Value::as_str) == Some(item_update.id.as_str())
            });
            if let Some(entry) = target {
                if let Some(kind) = &item_update.kind {
                    update::set_path(entry, "type", json!(kind));
                }
                let mut data = entry.get("data").cloned().unwrap_or_else(|| json!({}));
                update::apply(&mut data, &item_update.data);
                update::set_path(entry, "data", data);
            }
        }
        for new_item in &outcome.new_items {
            let value = serde_json::to_value(new_item)
                .map_err(|e| DomainError::malformed("items", e.to_string()))?;
            items.push(value);
        }
        update::set_path(&mut out, "items", Value::Array(items));
    }
    Ok(Some(out))
}

fn raw_from_token_blob(blob: &Value) -> Option<RawDocument> {
    let obj = blob.as_object()?;
    if obj.is_empty() {
        return None;
    }
    let items = obj
        .get("items")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|v| serde_json::from_value(v.clone()).ok())
                .collect()
        })
        .unwrap_or_default();
    Some(RawDocument {
        // Deltas carry no id of their own; the token addresses them.
        id: DocumentId::new_unchecked(
            obj.get("_id").and_then(Value::as_str).unwrap_or("tokendelta000000"),
        ),
        name: obj
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        kind: obj
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        img: None,
        folder: None,
        flags: obj.get("flags").cloned().unwrap_or_else(|| json!({})),
        data: obj.get("data").cloned().unwrap_or_else(|| json!({})),
        items,
    })
}

/// Merge the two legacy skill collections into new skill child records.
///
/// Zero-proficiency skills carry no information and are dropped, except the
/// "unnatural" skill, which always survives and always gets the fixed
/// well-known id so later rules can find it on any actor.
fn synthesize_skills(data: &Value, ids: &dyn IdSource) -> Vec<NewDocument> {
    legacy::skills(data)
        .into_iter()
        .filter_map(|skill| {
            let unnatural = skill.key == "unnatural";
            if skill.proficiency == 0 && !unnatural {
                return None;
            }
            Some(synthesized_skill(skill, unnatural, ids))
        })
        .collect()
}

fn synthesized_skill(skill: LegacySkill, unnatural: bool, ids: &dyn IdSource) -> NewDocument {
    let id = if unnatural {
        DocumentId::unnatural()
    } else {
        ids.generate()
    };
    let name = if skill.group.is_empty() {
        skill.label.clone()
    } else {
        format!("{} ({})", skill.group, skill.label)
    };
    NewDocument {
        id,
        name,
        kind: ItemKind::Skill.as_str().to_string(),
        data: json!({
            "proficiency": { "value": skill.proficiency },
            "failure": { "value": skill.failure },
            "description": { "value": "" },
        }),
        flags: json!({ PREV_SKILL_FLAG: skill.key }),
    }
}

fn resolve_skill(legacy_key: &str, skills: &[NewDocument]) -> String {
    skills
        .iter()
        .find(|s| s.flags.get(PREV_SKILL_FLAG).and_then(Value::as_str) == Some(legacy_key))
        .map(|s| s.id.as_str().to_string())
        // Dangling legacy reference; acceptable per v1 data quality.
        .unwrap_or_default()
}

/// Which shape one item field is in.
enum LegacyField<'a> {
    /// Legacy scalar; copy it over.
    Present(&'a Value),
    /// Never written; take the default.
    Absent,
    /// Already `{ "value": ... }`-shaped.
    Migrated,
}

fn legacy_field<'a>(data: &'a Value, key: &str) -> LegacyField<'a> {
    match data.get(key) {
        None => LegacyField::Absent,
        Some(v) if v.is_object() => LegacyField::Migrated,
        Some(v) => LegacyField::Present(v),
    }
}

/// Fields shared by weapons, armor, and gear.
fn physical_item_commons(data: &Value, out: &mut DocumentUpdate) {
    match legacy_field(data, "expense") {
        LegacyField::Present(v) => out.data.set("expense.value", v.clone()),
        LegacyField::Absent => out.data.set("expense.value", "standard"),
        LegacyField::Migrated => {}
    }
    match legacy_field(data, "equipped") {
        LegacyField::Present(v) => out.data.set("equipped.value", v.clone()),
        LegacyField::Absent => out.data.set("equipped.value", true),
        LegacyField::Migrated => {}
    }
    match legacy_field(data, "description") {
        LegacyField::Present(v) => out.data.set("description.value", v.clone()),
        LegacyField::Absent => out.data.set("description.value", ""),
        LegacyField::Migrated => {}
    }
}

/// Strip a trailing distance-unit letter and coerce to a number.
/// `"50M"` becomes `50`; an empty value becomes `0`.
fn parse_distance(field: &str, raw: &Value) -> Result<Value, DomainError> {
    match raw {
        Value::Number(_) => Ok(raw.clone()),
        Value::String(s) => {
            let trimmed = s
                .trim()
                .trim_end_matches(|c: char| c.is_ascii_alphabetic())
                .trim();
            if trimmed.is_empty() {
                return Ok(json!(0));
            }
            if let Ok(n) = trimmed.parse::<i64>() {
                return Ok(json!(n));
            }
            if let Ok(f) = trimmed.parse::<f64>() {
                return Ok(json!(f));
            }
            Err(DomainError::malformed(
                field,
                format!("expected a number with a unit suffix, got '{s}'"),
            ))
        }
        other => Err(DomainError::malformed(
            field,
            format!("expected string or number, got {other}"),
        )),
    }
}

fn coerce_int(raw: &Value) -> i64 {
    match raw {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}
