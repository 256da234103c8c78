//! The v1 to v2 migration.
//!
//! Skills and disorders become embedded item documents, item fields move to
//! the `{ "value": ... }` shape, unnatural entities fold into the npc
//! subtype, and every touched body is sanitized against the frozen v2
//! schema before it is persisted.

pub mod legacy;
pub mod schema;
pub mod transform;

use async_trait::async_trait;
use serde_json::Value;

use dossier_domain::{DocumentKind, RawDocument, SceneRecord, SchemaRegistry};

use super::sanitize;
use super::{Migration, MigrationContext, MigrationError, RunStats};
use crate::infrastructure::ports::{PackInfo, StoreError};
use transform::TransformOutcome;

pub struct MigrateV1V2 {
    registry: SchemaRegistry,
}

impl MigrateV1V2 {
    pub fn new() -> Self {
        Self {
            registry: schema::registry(),
        }
    }
}

impl Default for MigrateV1V2 {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Migration for MigrateV1V2 {
    fn version(&self) -> u32 {
        2
    }

    fn label(&self) -> &'static str {
        "Skills and disorders become embedded items; item fields are normalized"
    }

    async fn run(&self, ctx: &MigrationContext) -> Result<RunStats, MigrationError> {
        let mut stats = RunStats::default();
        self.run_world_actors(ctx, &mut stats).await?;
        self.run_world_items(ctx, &mut stats).await?;
        self.run_scenes(ctx, &mut stats).await?;
        self.run_packs(ctx, &mut stats).await?;
        Ok(stats)
    }
}

impl MigrateV1V2 {
    async fn run_world_actors(
        &self,
        ctx: &MigrationContext,
        stats: &mut RunStats,
    ) -> Result<(), MigrationError> {
        let actors = ctx.actors.list().await?;
        tracing::info!(count = actors.len(), "Migrating world actors");
        for doc in &actors {
            match self.migrate_world_actor(ctx, doc).await {
                Ok(true) => stats.migrated += 1,
                Ok(false) => stats.unchanged += 1,
                Err(e) => {
                    stats.failed += 1;
                    tracing::warn!(document = %doc.name, error = %e, "Actor migration failed");
                }
            }
        }
        Ok(())
    }

    async fn migrate_world_actor(
        &self,
        ctx: &MigrationContext,
        doc: &RawDocument,
    ) -> Result<bool, MigrationError> {
        let outcome = transform::actor(doc, ctx.ids.as_ref())?;
        if outcome.is_noop() {
            return Ok(false);
        }
        let TransformOutcome { update, new_items } = outcome;
        let update = sanitize::sanitize_document_update(update, doc, &self.registry)?;
        ctx.actors.apply_update(update).await?;
        if !new_items.is_empty() {
            ctx.actors.create_embedded(doc.id.clone(), new_items).await?;
        }
        Ok(true)
    }

    async fn run_world_items(
        &self,
        ctx: &MigrationContext,
        stats: &mut RunStats,
    ) -> Result<(), MigrationError> {
        let items = ctx.items.list().await?;
        tracing::info!(count = items.len(), "Migrating world items");
        for doc in &items {
            match self.migrate_world_item(ctx, doc).await {
                Ok(true) => stats.migrated += 1,
                Ok(false) => stats.unchanged += 1,
                Err(e) => {
                    stats.failed += 1;
                    tracing::warn!(document = %doc.name, error = %e, "Item migration failed");
                }
            }
        }
        Ok(())
    }

    async fn migrate_world_item(
        &self,
        ctx: &MigrationContext,
        doc: &RawDocument,
    ) -> Result<bool, MigrationError> {
        let outcome = transform::item(doc, &[], ctx.ids.as_ref())?;
        if outcome.is_noop() {
            return Ok(false);
        }
        let TransformOutcome { update, new_items } = outcome;
        if !update.is_empty() {
            let update = sanitize::sanitize_document_update(update, doc, &self.registry)?;
            ctx.items.apply_update(update).await?;
        }
        if !new_items.is_empty() {
            // A top-level item has no parent to attach children to.
            tracing::warn!(
                document = %doc.name,
                count = new_items.len(),
                "Dropping synthesized child records of a top-level item"
            );
        }
        Ok(true)
    }

    async fn run_scenes(
        &self,
        ctx: &MigrationContext,
        stats: &mut RunStats,
    ) -> Result<(), MigrationError> {
        let scenes = ctx.scenes.list().await?;
        tracing::info!(count = scenes.len(), "Migrating scene token deltas");
        for scene in &scenes {
            for (index, token) in scene.tokens.iter().enumerate() {
                // Linked tokens read live from their actor; only unlinked
                // tokens carry their own data.
                if token.actor_link {
                    continue;
                }
                match transform::token_actor_data(&token.actor_data, ctx.ids.as_ref()) {
                    Ok(None) => {}
                    Ok(Some(blob)) => {
                        let applied = ctx
                            .scenes
                            .update_token_actor_data(scene.id.clone(), index, blob)
                            .await;
                        match applied {
                            Ok(()) => stats.migrated += 1,
                            Err(e) => {
                                stats.failed += 1;
                                tracing::warn!(
                                    scene = %scene.name, token = %token.name, error = %e,
                                    "Token delta update failed"
                                );
                            }
                        }
                    }
                    Err(e) => {
                        stats.failed += 1;
                        tracing::warn!(
                            scene = %scene.name, token = %token.name, error = %e,
                            "Token delta migration failed"
                        );
                    }
                }
            }
        }
        Ok(())
    }

    async fn run_packs(
        &self,
        ctx: &MigrationContext,
        stats: &mut RunStats,
    ) -> Result<(), MigrationError> {
        let packs = ctx.packs.list_packs().await?;
        for pack in &packs {
            if pack.package != "world" {
                continue;
            }
            let Some(kind) = DocumentKind::parse(&pack.kind) else {
                continue;
            };
            if let Err(e) = self.migrate_pack(ctx, pack, kind, stats).await {
                stats.failed += 1;
                tracing::warn!(pack = %pack.collection, error = %e, "Pack migration failed");
            }
        }
        Ok(())
    }

    async fn migrate_pack(
        &self,
        ctx: &MigrationContext,
        pack: &PackInfo,
        kind: DocumentKind,
        stats: &mut RunStats,
    ) -> Result<(), MigrationError> {
        tracing::info!(pack = %pack.collection, "Migrating compendium pack");
        ctx.packs.set_locked(&pack.collection, false).await?;

        // The lock state must be restored whether or not the body succeeds;
        // the counter still advances past a failed pack, so a leaked unlock
        // would be permanent.
        let result = self.migrate_pack_documents(ctx, pack, kind, stats).await;
        if let Err(e) = ctx.packs.set_locked(&pack.collection, pack.locked).await {
            tracing::warn!(
                pack = %pack.collection, error = %e,
                "Failed to restore pack lock state"
            );
        }
        result
    }

    async fn migrate_pack_documents(
        &self,
        ctx: &MigrationContext,
        pack: &PackInfo,
        kind: DocumentKind,
        stats: &mut RunStats,
    ) -> Result<(), MigrationError> {
        // Let the host bring the pack's storage format up to date first.
        ctx.packs.migrate(&pack.collection).await?;

        let docs = ctx.packs.documents(&pack.collection).await?;
        for raw in &docs {
            match self.migrate_pack_document(ctx, &pack.collection, kind, raw).await {
                Ok(true) => stats.migrated += 1,
                Ok(false) => stats.unchanged += 1,
                Err(e) => {
                    stats.failed += 1;
                    let name = raw.get("name").and_then(Value::as_str).unwrap_or("<unnamed>");
                    tracing::warn!(
                        pack = %pack.collection, document = %name, error = %e,
                        "Pack document migration failed"
                    );
                }
            }
        }
        Ok(())
    }

    async fn migrate_pack_document(
        &self,
        ctx: &MigrationContext,
        collection: &str,
        kind: DocumentKind,
        raw: &Value,
    ) -> Result<bool, MigrationError> {
        match kind {
            DocumentKind::Actor => {
                let doc: RawDocument =
                    serde_json::from_value(raw.clone()).map_err(StoreError::from)?;
                let outcome = transform::actor(&doc, ctx.ids.as_ref())?;
                if outcome.is_noop() {
                    return Ok(false);
                }
                let TransformOutcome { update, new_items } = outcome;
                let update = sanitize::sanitize_document_update(update, &doc, &self.registry)?;
                ctx.packs.apply_update(collection, update).await?;
                if !new_items.is_empty() {
                    ctx.packs
                        .create_embedded(collection, doc.id.clone(), new_items)
                        .await?;
                }
                Ok(true)
            }
            DocumentKind::Item => {
                let doc: RawDocument =
                    serde_json::from_value(raw.clone()).map_err(StoreError::from)?;
                // A bare pack item has no owning actor, so weapon skill
                // references resolve to the empty string.
                let outcome = transform::item(&doc, &[], ctx.ids.as_ref())?;
                if outcome.is_noop() {
                    return Ok(false);
                }
                let TransformOutcome { update, new_items } = outcome;
                if !update.is_empty() {
                    let update =
                        sanitize::sanitize_document_update(update, &doc, &self.registry)?;
                    ctx.packs.apply_update(collection, update).await?;
                }
                if !new_items.is_empty() {
                    tracing::warn!(
                        document = %doc.name,
                        count = new_items.len(),
                        "Dropping synthesized child records of a pack item"
                    );
                }
                Ok(true)
            }
            DocumentKind::Scene => {
                let scene: SceneRecord =
                    serde_json::from_value(raw.clone()).map_err(StoreError::from)?;
                let mut changed = false;
                for (index, token) in scene.tokens.iter().enumerate() {
                    if token.actor_link {
                        continue;
                    }
                    if let Some(blob) =
                        transform::token_actor_data(&token.actor_data, ctx.ids.as_ref())?
                    {
                        ctx.packs
                            .update_scene_token(collection, scene.id.clone(), index, blob)
                            .await?;
                        changed = true;
                    }
                }
                Ok(changed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use dossier_domain::{DocumentId, TokenRecord};

    use super::*;
    use crate::infrastructure::ports::{
        IdSource, MockActorStore, MockCompendiumStore, MockItemStore, MockSceneStore,
    };

    struct FixedIds;

    impl IdSource for FixedIds {
        fn generate(&self) -> DocumentId {
            DocumentId::new_unchecked("fixedid000000000")
        }
    }

    fn raw_actor(id: &str, name: &str, data: Value) -> RawDocument {
        RawDocument {
            id: DocumentId::new_unchecked(id),
            name: name.into(),
            kind: "agent".into(),
            img: None,
            folder: None,
            flags: json!({}),
            data,
            items: vec![],
        }
    }

    fn quiet_packs() -> MockCompendiumStore {
        let mut packs = MockCompendiumStore::new();
        packs.expect_list_packs().returning(|| Ok(vec![]));
        packs
    }

    fn ctx(
        actors: MockActorStore,
        items: MockItemStore,
        scenes: MockSceneStore,
        packs: MockCompendiumStore,
    ) -> MigrationContext {
        MigrationContext {
            actors: Arc::new(actors),
            items: Arc::new(items),
            scenes: Arc::new(scenes),
            packs: Arc::new(packs),
            ids: Arc::new(FixedIds),
        }
    }

    #[tokio::test]
    async fn one_malformed_actor_does_not_stop_the_pass() {
        let good = json!({ "wp": { "value": 8 } });
        let bad = json!({ "wp": { "value": 8 } });
        let mut broken = raw_actor("bbbbbbbbbbbbbbbb", "Broken", bad);
        broken.items.push(RawDocument {
            id: DocumentId::new_unchecked("cccccccccccccccc"),
            name: "Bad Knife".into(),
            kind: "weapon".into(),
            img: None,
            folder: None,
            flags: json!({}),
            data: json!({ "range": "not a distance at all" }),
            items: vec![],
        });

        let mut actors = MockActorStore::new();
        let listed = vec![
            raw_actor("aaaaaaaaaaaaaaaa", "First", good.clone()),
            broken,
            raw_actor("dddddddddddddddd", "Third", good),
        ];
        actors.expect_list().return_once(move || Ok(listed));
        // The two well-formed actors are still persisted.
        actors.expect_apply_update().times(2).returning(|_| Ok(()));

        let mut items = MockItemStore::new();
        items.expect_list().returning(|| Ok(vec![]));
        let mut scenes = MockSceneStore::new();
        scenes.expect_list().returning(|| Ok(vec![]));

        let migration = MigrateV1V2::new();
        let stats = migration
            .run(&ctx(actors, items, scenes, quiet_packs()))
            .await
            .unwrap();
        assert_eq!(stats.migrated, 2);
        assert_eq!(stats.failed, 1);
    }

    #[tokio::test]
    async fn synthesized_skills_are_created_under_their_actor() {
        let data = json!({
            "skills": { "firearms": { "label": "Firearms", "proficiency": 40 } },
        });
        let mut actors = MockActorStore::new();
        let listed = vec![raw_actor("aaaaaaaaaaaaaaaa", "Agent", data)];
        actors.expect_list().return_once(move || Ok(listed));
        actors.expect_apply_update().times(1).returning(|_| Ok(()));
        actors
            .expect_create_embedded()
            .withf(|parent, items| {
                parent.as_str() == "aaaaaaaaaaaaaaaa"
                    && items.len() == 1
                    && items[0].name == "Firearms"
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let mut items = MockItemStore::new();
        items.expect_list().returning(|| Ok(vec![]));
        let mut scenes = MockSceneStore::new();
        scenes.expect_list().returning(|| Ok(vec![]));

        let migration = MigrateV1V2::new();
        let stats = migration
            .run(&ctx(actors, items, scenes, quiet_packs()))
            .await
            .unwrap();
        assert_eq!(stats.migrated, 1);
    }

    #[tokio::test]
    async fn already_migrated_world_is_all_unchanged() {
        let mut actors = MockActorStore::new();
        let listed = vec![raw_actor(
            "aaaaaaaaaaaaaaaa",
            "Agent",
            json!({ "willpower": { "value": 8 } }),
        )];
        actors.expect_list().return_once(move || Ok(listed));

        let mut items = MockItemStore::new();
        items.expect_list().returning(|| Ok(vec![]));
        let mut scenes = MockSceneStore::new();
        scenes.expect_list().returning(|| Ok(vec![]));

        let migration = MigrateV1V2::new();
        let stats = migration
            .run(&ctx(actors, items, scenes, quiet_packs()))
            .await
            .unwrap();
        assert_eq!(stats.migrated, 0);
        assert_eq!(stats.unchanged, 1);
    }

    #[tokio::test]
    async fn only_unlinked_tokens_are_touched() {
        let mut actors = MockActorStore::new();
        actors.expect_list().returning(|| Ok(vec![]));
        let mut items = MockItemStore::new();
        items.expect_list().returning(|| Ok(vec![]));

        let mut scenes = MockSceneStore::new();
        let scene = SceneRecord {
            id: DocumentId::new_unchecked("scenescenescene0"),
            name: "Safehouse".into(),
            tokens: vec![
                TokenRecord {
                    name: "Linked".into(),
                    actor_link: true,
                    actor_data: json!({ "data": { "wp": { "value": 3 } } }),
                },
                TokenRecord {
                    name: "Unlinked".into(),
                    actor_link: false,
                    actor_data: json!({ "type": "npc", "data": { "wp": { "value": 3 } } }),
                },
            ],
        };
        let listed = vec![scene];
        scenes.expect_list().return_once(move || Ok(listed));
        scenes
            .expect_update_token_actor_data()
            .withf(|scene, index, blob| {
                scene.as_str() == "scenescenescene0"
                    && *index == 1
                    && blob["data"]["willpower"]["value"] == json!(3)
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let migration = MigrateV1V2::new();
        let stats = migration
            .run(&ctx(actors, items, scenes, quiet_packs()))
            .await
            .unwrap();
        assert_eq!(stats.migrated, 1);
    }

    #[tokio::test]
    async fn pack_lock_is_restored_when_enumeration_fails() {
        let mut actors = MockActorStore::new();
        actors.expect_list().returning(|| Ok(vec![]));
        let mut items = MockItemStore::new();
        items.expect_list().returning(|| Ok(vec![]));
        let mut scenes = MockSceneStore::new();
        scenes.expect_list().returning(|| Ok(vec![]));

        let mut packs = MockCompendiumStore::new();
        packs.expect_list_packs().returning(|| {
            Ok(vec![PackInfo {
                collection: "world.pregens".into(),
                package: "world".into(),
                kind: "Actor".into(),
                locked: true,
            }])
        });
        packs
            .expect_set_locked()
            .withf(|collection, locked| collection == "world.pregens" && !locked)
            .times(1)
            .returning(|_, _| Ok(()));
        packs.expect_migrate().times(1).returning(|_| Ok(()));
        packs.expect_documents().times(1).returning(|_| {
            Err(crate::infrastructure::ports::StoreError::database(
                "documents",
                "pack index unreadable",
            ))
        });
        // The pack comes back locked even though enumeration failed.
        packs
            .expect_set_locked()
            .withf(|collection, locked| collection == "world.pregens" && *locked)
            .times(1)
            .returning(|_, _| Ok(()));

        let migration = MigrateV1V2::new();
        let stats = migration
            .run(&ctx(actors, items, scenes, packs))
            .await
            .unwrap();
        assert_eq!(stats.failed, 1);
    }

    #[tokio::test]
    async fn pack_lock_state_is_restored() {
        let mut actors = MockActorStore::new();
        actors.expect_list().returning(|| Ok(vec![]));
        let mut items = MockItemStore::new();
        items.expect_list().returning(|| Ok(vec![]));
        let mut scenes = MockSceneStore::new();
        scenes.expect_list().returning(|| Ok(vec![]));

        let mut packs = MockCompendiumStore::new();
        packs.expect_list_packs().returning(|| {
            Ok(vec![
                PackInfo {
                    collection: "world.pregens".into(),
                    package: "world".into(),
                    kind: "Actor".into(),
                    locked: true,
                },
                // Not world-owned: must not be touched.
                PackInfo {
                    collection: "core.macros".into(),
                    package: "core".into(),
                    kind: "Actor".into(),
                    locked: true,
                },
            ])
        });
        let mut unlock_order = mockall::Sequence::new();
        packs
            .expect_set_locked()
            .withf(|collection, locked| collection == "world.pregens" && !locked)
            .times(1)
            .in_sequence(&mut unlock_order)
            .returning(|_, _| Ok(()));
        packs
            .expect_migrate()
            .withf(|collection| collection == "world.pregens")
            .times(1)
            .in_sequence(&mut unlock_order)
            .returning(|_| Ok(()));
        packs
            .expect_documents()
            .times(1)
            .in_sequence(&mut unlock_order)
            .returning(|_| {
                Ok(vec![json!({
                    "_id": "packactor0000000",
                    "name": "Pregen",
                    "type": "agent",
                    "data": { "wp": { "value": 10 } },
                })])
            });
        packs
            .expect_apply_update()
            .times(1)
            .in_sequence(&mut unlock_order)
            .returning(|_, _| Ok(()));
        packs
            .expect_set_locked()
            .withf(|collection, locked| collection == "world.pregens" && *locked)
            .times(1)
            .in_sequence(&mut unlock_order)
            .returning(|_, _| Ok(()));

        let migration = MigrateV1V2::new();
        let stats = migration
            .run(&ctx(actors, items, scenes, packs))
            .await
            .unwrap();
        assert_eq!(stats.migrated, 1);
        assert_eq!(stats.failed, 0);
    }
}
