//! crates/mind_mapper_core/src/migration.rs
//!
//! Runs legacy repair over every map a user owns.
//!
//! The user's maps are snapshotted, then each document is repaired, written
//! back, re-read and verified on its own; the per-document outcomes are
//! folded into a `MigrationReport`. A failed verification is recorded and
//! the batch moves on, while a failing store call aborts the run.

use chrono::Utc;
use futures::TryStreamExt;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::StoredMap;
use crate::ports::{MapStore, PortError, PortResult};
use crate::repair::{is_canonical, repair, RepairOutcome};

/// What happened to one document during migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    Migrated,
    Skipped,
    Failed(String),
}

/// Summary returned to the client after a migration run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub migrated: usize,
    pub skipped: usize,
    pub total: usize,
    pub errors: Vec<String>,
}

impl MigrationReport {
    /// Folds one document outcome into the report.
    pub fn record(mut self, outcome: DocumentOutcome) -> Self {
        match outcome {
            DocumentOutcome::Migrated => self.migrated += 1,
            DocumentOutcome::Skipped => self.skipped += 1,
            DocumentOutcome::Failed(message) => self.errors.push(message),
        }
        self.total = self.migrated + self.skipped;
        self
    }
}

/// Repairs all of `user_id`'s maps and reports the outcome.
///
/// The listing is read in full before the first write, so the store never
/// holds a read open while serving the per-document update and re-read.
pub async fn migrate_user_maps(store: &dyn MapStore, user_id: Uuid) -> PortResult<MigrationReport> {
    let maps: Vec<StoredMap> = store.stream_maps(user_id).try_collect().await?;

    let mut report = MigrationReport::default();
    for map in maps {
        let outcome = migrate_one(store, user_id, map).await?;
        report = report.record(outcome);
    }
    Ok(report)
}

async fn migrate_one(store: &dyn MapStore, user_id: Uuid, map: StoredMap) -> PortResult<DocumentOutcome> {
    let updates = match repair(&map.fields, &map.id.to_string(), Utc::now()) {
        RepairOutcome::Skipped => return Ok(DocumentOutcome::Skipped),
        RepairOutcome::Update(updates) => updates,
    };

    store.update_map(user_id, map.id, updates).await?;

    let verified = match store.get_map(user_id, map.id).await {
        Ok(reread) => is_canonical(&reread.fields),
        Err(PortError::NotFound(_)) => false,
        Err(e) => return Err(e),
    };

    if verified {
        Ok(DocumentOutcome::Migrated)
    } else {
        Ok(DocumentOutcome::Failed(format!(
            "Map {} failed post-migration verification",
            map.id
        )))
    }
}
