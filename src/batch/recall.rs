//! Recall Gate Module
//!
//! The administrative kill switch for a batch. Recall is one-way: there is
//! no un-recall, and a second recall of the same batch is reported as an
//! error so operators learn the batch was already withdrawn.

use crate::{
    integrity::IntegritySealer,
    store::BatchStore,
    types::{Batch, TrackerError},
};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

/// Sets the one-way recall flag on batches
pub struct RecallGate {
    store: BatchStore,
    sealer: Arc<dyn IntegritySealer>,
}

impl RecallGate {
    pub fn new(store: BatchStore, sealer: Arc<dyn IntegritySealer>) -> Self {
        Self { store, sealer }
    }

    /// Recall a batch
    ///
    /// The store-level write is guarded on `is_recalled = 0`, so of two
    /// racing recalls exactly one performs the transition; the loser gets
    /// the same `AlreadyRecalled` answer a later repeat would.
    ///
    /// # Arguments
    /// * `batch_id` - Batch to withdraw
    /// * `admin_id` - Acting administrator, recorded in the log
    ///
    /// # Returns
    /// * `Ok(Batch)` with the recalled state
    /// * `Err(TrackerError::NotFound)` if no batch has this identifier
    /// * `Err(TrackerError::AlreadyRecalled)` if the flag was already set
    pub async fn recall(&self, batch_id: &str, admin_id: &str) -> Result<Batch, TrackerError> {
        let batch = self
            .store
            .get(batch_id)
            .await?
            .ok_or_else(|| TrackerError::NotFound(batch_id.to_string()))?;

        if batch.is_recalled {
            return Err(TrackerError::AlreadyRecalled(batch_id.to_string()));
        }

        let mut batch = batch;
        batch.is_recalled = true;
        batch.updated_at = Utc::now();
        batch.integrity_hash = self.sealer.seal(&batch);

        let flipped = self
            .store
            .mark_recalled(&batch.batch_id, &batch.integrity_hash, batch.updated_at)
            .await
            .map_err(|e| TrackerError::UpdateFailed(format!("write failed: {}", e)))?;

        if !flipped {
            // A concurrent recall won between our read and our write
            return Err(TrackerError::AlreadyRecalled(batch_id.to_string()));
        }

        info!("Batch {} recalled by {}", batch.batch_id, admin_id);
        Ok(batch)
    }
}
