//! # Store Migrations
//!
//! Named one-shot data migrations. At mount, every registered migration whose
//! name is not yet recorded under `Migrations/<name>` runs in registration
//! order, each in its own branch. A failing migration aborts the mount and
//! leaves no trace; a successful one records the height it ran at and emits
//! `MigrationApplied`.

use crate::error::{RuntimeError, RuntimeResult};
use lsc_ledger_store::{key, prefix, BlockContext, KvRead};
use shared_types::{BlockHeight, StakeEvent};
use tracing::info;

/// A migration body. It receives the mount context and returns a reason on
/// failure.
pub type MigrationFn = Box<dyn Fn(&mut BlockContext<'_>) -> Result<(), String> + Send + Sync>;

fn migration_key(name: &str) -> Vec<u8> {
    key(prefix::MIGRATION, name.as_bytes())
}

/// Height at which `name` ran, if it has.
pub fn applied_at(store: &impl KvRead, name: &str) -> RuntimeResult<Option<BlockHeight>> {
    Ok(store.get_value(&migration_key(name))?)
}

#[derive(Default)]
pub struct MigrationRegistry {
    entries: Vec<(String, MigrationFn)>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, migration: F) -> RuntimeResult<()>
    where
        F: Fn(&mut BlockContext<'_>) -> Result<(), String> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.entries.iter().any(|(existing, _)| *existing == name) {
            return Err(RuntimeError::DuplicateMigration(name));
        }
        self.entries.push((name, Box::new(migration)));
        Ok(())
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Runs every pending migration. Returns the names applied now.
    pub fn apply_pending(&self, ctx: &mut BlockContext<'_>) -> RuntimeResult<Vec<String>> {
        let mut applied = Vec::new();
        for (name, migration) in &self.entries {
            if applied_at(ctx.store(), name)?.is_some() {
                continue;
            }
            ctx.branch(|ctx| {
                migration(ctx).map_err(|reason| RuntimeError::Migration {
                    name: name.clone(),
                    reason,
                })?;
                let height = ctx.height();
                ctx.store_mut().set_value(migration_key(name), &height)?;
                ctx.emit(StakeEvent::MigrationApplied { name: name.clone() });
                Ok::<(), RuntimeError>(())
            })?;
            info!(migration = %name, height = ctx.height(), "Migration applied");
            applied.push(name.clone());
        }
        Ok(applied)
    }
}
