//! Legacy (v1) schema model.
//!
//! The v1 schema was never consistent across instances: fields appear and
//! disappear per document, and some worlds carry half-migrated shapes. So
//! instead of probing for presence inline all over the transformer, this
//! module resolves each legacy block once through an explicit shape detector
//! and exposes presence-checked readers that never fail for absent
//! optionals.

use serde_json::Value;

use dossier_domain::update;

/// Legacy abbreviated statistic keys and their full v2 identifiers.
pub const STATISTIC_NAMES: [(&str, &str); 6] = [
    ("str", "strength"),
    ("con", "constitution"),
    ("dex", "dexterity"),
    ("int", "intelligence"),
    ("pow", "power"),
    ("cha", "charisma"),
];

/// The two adaptation categories tracked on an agent's sanity block.
pub const ADAPTATION_CATEGORIES: [&str; 2] = ["violence", "helplessness"];

/// Which generation wrote an actor's willpower block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WillpowerShape {
    /// v1: a `wp` block that v2 renames to `willpower`.
    PreRename,
    /// Already renamed, or the block never existed.
    Current,
}

pub fn willpower_shape(data: &Value) -> WillpowerShape {
    if update::get_path(data, "wp").is_some() {
        WillpowerShape::PreRename
    } else {
        WillpowerShape::Current
    }
}

/// Which generation wrote an actor's statistics block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatisticsShape {
    /// v1: keyed by abbreviation (`str`, `con`, ...).
    Abbreviated,
    /// Keyed by full identifier, or absent entirely.
    Current,
}

pub fn statistics_shape(data: &Value) -> StatisticsShape {
    if update::get_path(data, "statistics.str").is_some() {
        StatisticsShape::Abbreviated
    } else {
        StatisticsShape::Current
    }
}

/// A skill entry out of either legacy collection, normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacySkill {
    /// Its key in the legacy collection, recorded on the synthesized item so
    /// weapons can be re-linked.
    pub key: String,
    pub label: String,
    pub group: String,
    pub proficiency: i64,
    pub failure: bool,
}

/// Merge the two legacy skill collections: `skills` (fixed core skills) and
/// `typedSkills` (custom grouped skills). Empty on already-migrated actors,
/// whose skills live as embedded items instead.
pub fn skills(data: &Value) -> Vec<LegacySkill> {
    let mut out = Vec::new();
    collect_skills(data.get("skills"), &mut out);
    collect_skills(data.get("typedSkills"), &mut out);
    out
}

fn collect_skills(block: Option<&Value>, out: &mut Vec<LegacySkill>) {
    let Some(map) = block.and_then(Value::as_object) else {
        return;
    };
    for (key, entry) in map {
        out.push(LegacySkill {
            key: key.clone(),
            label: str_of(entry, "label").unwrap_or_else(|| key.clone()),
            group: str_of(entry, "group").unwrap_or_default(),
            proficiency: int_of(entry, "proficiency").unwrap_or(0),
            failure: bool_of(entry, "failure").unwrap_or(false),
        });
    }
}

/// The three per-incident booleans of one adaptation category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdaptationTriple {
    pub incident1: bool,
    pub incident2: bool,
    pub incident3: bool,
}

impl AdaptationTriple {
    /// An agent is adapted to a category once all three incidents occurred.
    pub fn adapted(&self) -> bool {
        self.incident1 && self.incident2 && self.incident3
    }
}

pub fn adaptation(data: &Value, category: &str) -> Option<AdaptationTriple> {
    let block = update::get_path(data, &format!("sanity.adaptations.{category}"))?;
    Some(AdaptationTriple {
        incident1: bool_of(block, "incident1").unwrap_or(false),
        incident2: bool_of(block, "incident2").unwrap_or(false),
        incident3: bool_of(block, "incident3").unwrap_or(false),
    })
}

/// A string field, only when it is stored as a legacy scalar. The v2 shape
/// nests the same field inside `{ "value": ... }`, so an object here means
/// the field is already migrated.
pub fn str_of(value: &Value, key: &str) -> Option<String> {
    value.get(key)?.as_str().map(str::to_string)
}

pub fn bool_of(value: &Value, key: &str) -> Option<bool> {
    value.get(key)?.as_bool()
}

/// An integer field, tolerating the legacy habit of storing numbers as
/// strings.
pub fn int_of(value: &Value, key: &str) -> Option<i64> {
    match value.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// A scalar (non-object) field: the marker that the field still carries its
/// legacy shape.
pub fn scalar_of<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let field = value.get(key)?;
    if field.is_object() {
        None
    } else {
        Some(field)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn detects_pre_rename_willpower() {
        assert_eq!(
            willpower_shape(&json!({ "wp": { "value": 8 } })),
            WillpowerShape::PreRename
        );
        assert_eq!(
            willpower_shape(&json!({ "willpower": { "value": 8 } })),
            WillpowerShape::Current
        );
    }

    #[test]
    fn detects_abbreviated_statistics() {
        assert_eq!(
            statistics_shape(&json!({ "statistics": { "str": { "value": 12 } } })),
            StatisticsShape::Abbreviated
        );
        assert_eq!(
            statistics_shape(&json!({ "statistics": { "strength": { "value": 12 } } })),
            StatisticsShape::Current
        );
        assert_eq!(statistics_shape(&json!({})), StatisticsShape::Current);
    }

    #[test]
    fn merges_fixed_and_typed_skill_collections() {
        let data = json!({
            "skills": { "firearms": { "label": "Firearms", "proficiency": 40 } },
            "typedSkills": {
                "tskill_01": { "label": "Spanish", "group": "Language", "proficiency": "30" },
            },
        });
        let skills = skills(&data);
        assert_eq!(skills.len(), 2);
        assert_eq!(skills[0].key, "firearms");
        assert_eq!(skills[1].proficiency, 30);
        assert_eq!(skills[1].group, "Language");
    }

    #[test]
    fn adaptation_is_and_of_all_three_incidents() {
        let data = json!({
            "sanity": { "adaptations": { "violence": {
                "incident1": true, "incident2": true, "incident3": false,
            } } },
        });
        let triple = adaptation(&data, "violence").expect("block present");
        assert!(!triple.adapted());
        assert!(adaptation(&data, "helplessness").is_none());
    }
}
