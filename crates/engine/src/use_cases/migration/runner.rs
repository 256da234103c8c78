//! Migration orchestrator.
//!
//! Two-phase: `plan()` is pure and reports which migrations are due;
//! `apply()` is effectful and runs them once the caller has obtained
//! confirmation. `run_on_startup()` wires the two through the host's modal
//! dialog and is the plugin's single entry point, invoked once during
//! application startup (including the settings-registration path that fires
//! when the counter is freshly zero-initialized).

use std::sync::Arc;

use super::{Migration, MigrationContext, MigrationError, RunStats};
use crate::infrastructure::ports::{
    ActorStore, CompendiumStore, IdSource, ItemStore, RandomIds, SceneStore, SettingsStore, UiPort,
};

/// One due migration, as shown in the confirmation dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMigration {
    pub version: u32,
    pub label: &'static str,
}

/// The pure output of [`MigrationRunner::plan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPlan {
    /// Counter value at planning time.
    pub current_version: u32,
    /// Due migrations in ascending version order.
    pub due: Vec<PlannedMigration>,
}

impl MigrationPlan {
    pub fn is_empty(&self) -> bool {
        self.due.is_empty()
    }

    /// The counter value a completed pass advances to.
    pub fn target_version(&self) -> u32 {
        self.due
            .iter()
            .map(|m| m.version)
            .max()
            .unwrap_or(self.current_version)
    }
}

/// Result of a migration pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Nothing was due.
    UpToDate,
    /// The user dismissed the dialog; the counter is untouched and the
    /// prompt reappears on next load.
    Declined,
    /// All due migrations ran; individual failures are counted in the stats
    /// and detailed in the log.
    Completed(RunStats),
}

/// Decides whether migrations must run, gates them behind confirmation, and
/// advances the schema version counter exactly once per completed pass.
pub struct MigrationRunner {
    ctx: MigrationContext,
    settings: Arc<dyn SettingsStore>,
    ui: Arc<dyn UiPort>,
    migrations: Vec<Arc<dyn Migration>>,
}

impl MigrationRunner {
    pub fn new(
        actors: Arc<dyn ActorStore>,
        items: Arc<dyn ItemStore>,
        scenes: Arc<dyn SceneStore>,
        packs: Arc<dyn CompendiumStore>,
        settings: Arc<dyn SettingsStore>,
        ui: Arc<dyn UiPort>,
        ids: Arc<dyn IdSource>,
        mut migrations: Vec<Arc<dyn Migration>>,
    ) -> Self {
        // Each migration assumes the output shape of the previous one.
        migrations.sort_by_key(|m| m.version());
        Self {
            ctx: MigrationContext {
                actors,
                items,
                scenes,
                packs,
                ids,
            },
            settings,
            ui,
            migrations,
        }
    }

    /// The standard runner with every shipped migration installed and the
    /// production id source.
    #[allow(clippy::too_many_arguments)]
    pub fn standard(
        actors: Arc<dyn ActorStore>,
        items: Arc<dyn ItemStore>,
        scenes: Arc<dyn SceneStore>,
        packs: Arc<dyn CompendiumStore>,
        settings: Arc<dyn SettingsStore>,
        ui: Arc<dyn UiPort>,
    ) -> Self {
        Self::new(
            actors,
            items,
            scenes,
            packs,
            settings,
            ui,
            Arc::new(RandomIds),
            vec![Arc::new(super::v1v2::MigrateV1V2::new())],
        )
    }

    /// Which migrations are due, given the persisted counter. Pure apart
    /// from the counter read.
    pub async fn plan(&self) -> Result<MigrationPlan, MigrationError> {
        let current_version = self.settings.schema_version().await?;
        let due = self
            .migrations
            .iter()
            .filter(|m| m.should_run(current_version))
            .map(|m| PlannedMigration {
                version: m.version(),
                label: m.label(),
            })
            .collect();
        Ok(MigrationPlan {
            current_version,
            due,
        })
    }

    /// Run a planned pass. `confirmed` is the dialog's answer; declining
    /// leaves the counter untouched.
    pub async fn apply(
        &self,
        plan: &MigrationPlan,
        confirmed: bool,
    ) -> Result<MigrationOutcome, MigrationError> {
        if plan.is_empty() {
            return Ok(MigrationOutcome::UpToDate);
        }
        if !confirmed {
            tracing::info!(
                current_version = plan.current_version,
                "Migration declined; will prompt again on next load"
            );
            return Ok(MigrationOutcome::Declined);
        }

        let target = plan.target_version();
        tracing::info!(
            current_version = plan.current_version,
            target_version = target,
            "Beginning system migration"
        );
        self.ui
            .notify_info("Dossier: applying system migration. Please be patient and do not close the application.");

        let mut stats = RunStats::default();
        for planned in &plan.due {
            let Some(migration) = self
                .migrations
                .iter()
                .find(|m| m.version() == planned.version)
            else {
                continue;
            };
            tracing::info!(
                version = migration.version(),
                label = migration.label(),
                "Running migration"
            );
            stats.absorb(migration.run(&self.ctx).await?);
        }

        // Advanced exactly once, after every document class has been
        // attempted. Failed documents are logged but not retried.
        self.settings.set_schema_version(target).await?;

        if stats.failed > 0 {
            self.ui.notify_warn(&format!(
                "Dossier: system migration to version {target} completed with {} error(s). See the console log.",
                stats.failed
            ));
        } else {
            self.ui.notify_info(&format!(
                "Dossier: system migration to version {target} completed."
            ));
        }
        tracing::info!(
            target_version = target,
            migrated = stats.migrated,
            failed = stats.failed,
            unchanged = stats.unchanged,
            "System migration complete"
        );
        Ok(MigrationOutcome::Completed(stats))
    }

    /// Plan, confirm through the host dialog, and apply. Safe to invoke on
    /// every application start; `should_run` guards against redundant work
    /// once the counter reaches the target.
    pub async fn run_on_startup(&self) -> Result<MigrationOutcome, MigrationError> {
        let plan = self.plan().await?;
        if plan.is_empty() {
            return Ok(MigrationOutcome::UpToDate);
        }
        let body = confirmation_body(&plan);
        let confirmed = self.ui.confirm("System Migration Required", &body).await;
        self.apply(&plan, confirmed).await
    }
}

fn confirmation_body(plan: &MigrationPlan) -> String {
    let mut body = String::from(
        "The Dossier system needs to update your world's stored data to a new schema version.\n\
         Actors, items, scenes, and world compendium packs will be modified.\n\
         Back up your world before continuing.\n\nPending updates:\n",
    );
    for planned in &plan.due {
        body.push_str(&format!("  v{}: {}\n", planned.version, planned.label));
    }
    body
}
