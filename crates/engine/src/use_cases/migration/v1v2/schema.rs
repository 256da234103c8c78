//! Frozen v2 schema models.
//!
//! These are duplicated here, inside the migration, on purpose: the live
//! schema will keep evolving, and this migration must keep producing the v2
//! shape it was written against, not whatever the current templates say.

use serde_json::{json, Value};

use dossier_domain::{SchemaModel, SchemaRegistry};

fn model(template: Value) -> SchemaModel {
    SchemaModel::new(template).expect("v2 templates are object literals")
}

fn statistic(id: &str) -> Value {
    json!({ "id": id, "value": 10, "distinguishing_feature": "" })
}

fn adaptation() -> Value {
    json!({
        "incident1": false,
        "incident2": false,
        "incident3": false,
        "adapted": false,
    })
}

fn sanity() -> Value {
    json!({
        "value": 50,
        "currentBreakingPoint": 0,
        "adaptations": {
            "violence": adaptation(),
            "helplessness": adaptation(),
        },
    })
}

fn statistics() -> Value {
    json!({
        "strength": statistic("strength"),
        "constitution": statistic("constitution"),
        "dexterity": statistic("dexterity"),
        "intelligence": statistic("intelligence"),
        "power": statistic("power"),
        "charisma": statistic("charisma"),
    })
}

fn agent() -> SchemaModel {
    model(json!({
        "health": { "value": 10, "min": 0, "max": 10 },
        "willpower": { "value": 10, "min": 0, "max": 10 },
        "statistics": statistics(),
        "sanity": sanity(),
        "physical": { "description": "", "wounds": "", "firstAid": false },
    }))
}

fn npc() -> SchemaModel {
    model(json!({
        "health": { "value": 10, "min": 0, "max": 10 },
        "willpower": { "value": 10, "min": 0, "max": 10 },
        "statistics": statistics(),
        "sanity": sanity(),
        "unnatural": false,
        "notes": "",
    }))
}

fn weapon() -> SchemaModel {
    model(json!({
        "description": { "value": "" },
        "expense": { "value": "standard" },
        "equipped": { "value": true },
        "skill": { "value": "" },
        "range": { "value": 0 },
        "damage": { "value": "0" },
        "armorPiercing": { "value": 0 },
        "killRadius": { "value": 0 },
        "ammo": { "value": 0, "max": 0 },
    }))
}

fn armor() -> SchemaModel {
    model(json!({
        "description": { "value": "" },
        "expense": { "value": "standard" },
        "equipped": { "value": true },
        "armorRating": { "value": 0 },
    }))
}

fn gear() -> SchemaModel {
    model(json!({
        "description": { "value": "" },
        "expense": { "value": "standard" },
        "equipped": { "value": true },
    }))
}

fn skill() -> SchemaModel {
    model(json!({
        "description": { "value": "" },
        "proficiency": { "value": 0 },
        "failure": { "value": false },
    }))
}

fn motivation() -> SchemaModel {
    model(json!({
        "description": { "value": "" },
        "crossed": { "value": false },
    }))
}

fn disorder() -> SchemaModel {
    model(json!({
        "description": { "value": "" },
        "crossed": { "value": false },
    }))
}

fn bond() -> SchemaModel {
    model(json!({
        "description": { "value": "" },
        "score": { "value": 10 },
    }))
}

/// The registry this migration sanitizes against: every v2 document type and
/// its frozen template.
pub fn registry() -> SchemaRegistry {
    SchemaRegistry::new()
        .with("agent", agent())
        .with("npc", npc())
        .with("weapon", weapon())
        .with("armor", armor())
        .with("gear", gear())
        .with("skill", skill())
        .with("motivation", motivation())
        .with("disorder", disorder())
        .with("bond", bond())
}
