//! Update Appender Module
//!
//! Grows a batch's timeline by one entry and advances its current stage.
//! The caller hands in a batch it was already authorized for; the appender
//! never re-fetches it, so the state being appended to is the state that
//! was authorized.

use crate::{
    integrity::IntegritySealer,
    store::BatchStore,
    types::{Batch, NewUpdate, SupplyUpdate, TrackerError},
    validation::Validator,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

/// Appends timeline entries to authorized batches
pub struct UpdateAppender {
    store: BatchStore,
    validator: Validator,
    sealer: Arc<dyn IntegritySealer>,
}

impl UpdateAppender {
    pub fn new(store: BatchStore, sealer: Arc<dyn IntegritySealer>) -> Self {
        Self {
            store,
            validator: Validator::new(),
            sealer,
        }
    }

    /// Append one update to the batch's timeline
    ///
    /// Validates the proposed entry's shape, then writes the grown
    /// timeline, the new current stage, and the re-sealed integrity token
    /// in a single conditional update keyed by the batch identifier. Any
    /// recognized stage may follow any other; the tracker records
    /// transitions, it does not police their order.
    ///
    /// # Returns
    /// * `Ok(Batch)` with the post-append state
    /// * `Err(TrackerError::Validation)` if the entry violates a constraint
    /// * `Err(TrackerError::UpdateFailed)` if the batch vanished before the
    ///   write landed (not retried; a concurrent deletion is not transient)
    pub async fn append_update(
        &self,
        batch: Batch,
        proposed: NewUpdate,
    ) -> Result<Batch, TrackerError> {
        // Shape checks first; nothing is written for a malformed entry
        let stage = self.validator.validate_new_update(&proposed)?;

        let now = Utc::now();
        let entry = SupplyUpdate {
            stage,
            actor: proposed.actor,
            location: proposed.location,
            timestamp: proposed.timestamp.unwrap_or(now),
            notes: proposed.notes,
        };

        // Grow the timeline and advance the stage on the authorized copy
        let mut batch = batch;
        batch.updates.push(entry);
        batch.current_stage = stage;
        batch.updated_at = now;
        batch.integrity_hash = self.sealer.seal(&batch);

        // One conditional write carries timeline, stage, and token together
        let written = self
            .store
            .apply_timeline(&batch)
            .await
            .map_err(|e| TrackerError::UpdateFailed(format!("write failed: {}", e)))?;

        if !written {
            return Err(TrackerError::UpdateFailed(format!(
                "batch {} no longer exists",
                batch.batch_id
            )));
        }

        info!(
            "Batch {} advanced to stage {} ({} timeline entries)",
            batch.batch_id,
            batch.current_stage,
            batch.updates.len()
        );
        Ok(batch)
    }
}
