//! Creation Orchestrator Module
//!
//! This module implements the batch-creation pipeline. Creation must hand
//! every caller a unique identifier and a fully materialized batch, or
//! nothing at all, even when many creations race.
//!
//! # Pipeline Flow
//! 1. Re-validate the payload against the data-model constraints
//! 2. Open a transaction
//! 3. Allocate the next counter value inside it and format the identifier
//! 4. Construct the batch at the farmer stage with its initial timeline entry
//! 5. Insert and commit; identifier and record materialize together
//! 6. On an identifier collision, burn the allocated value and start over
//!    from step 2, up to a bounded number of attempts
//!
//! Coupling allocation and insertion in one transaction removes the main
//! race window; the retry loop covers the residual case of an identifier
//! that already exists in the table. A collided attempt leaves a gap in the
//! identifier space, never a reused value. Collisions never surface to
//! callers.

use crate::{
    config::CreationConfig,
    integrity::IntegritySealer,
    sequence,
    store::{BatchStore, InsertOutcome},
    types::{Batch, NewBatch, Stage, SupplyUpdate, TrackerError},
    validation::Validator,
};
use chrono::{Datelike, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// Batch creation orchestrator
///
/// Composes the counter allocator, the identifier formatter, and the store
/// insert into one atomic unit per attempt.
pub struct BatchOrchestrator {
    /// Persistent batch collection (also supplies the transaction pool)
    store: BatchStore,
    /// Re-checks payloads against the data-model constraints
    validator: Validator,
    /// Produces the integrity token when the payload does not carry one
    sealer: Arc<dyn IntegritySealer>,
    /// Attempt bound and counter name
    config: CreationConfig,
}

impl BatchOrchestrator {
    /// Creates a new orchestrator
    ///
    /// # Arguments
    /// * `store` - Batch collection the created rows go to
    /// * `sealer` - Integrity sealing implementation
    /// * `config` - Creation settings (attempt bound, counter name)
    pub fn new(store: BatchStore, sealer: Arc<dyn IntegritySealer>, config: CreationConfig) -> Self {
        Self {
            store,
            validator: Validator::new(),
            sealer,
            config,
        }
    }

    /// Create a batch owned by `owner_id`
    ///
    /// # Returns
    /// * `Ok(Batch)` with the committed batch and its fresh identifier
    /// * `Err(TrackerError::Validation)` if the payload violates a constraint
    /// * `Err(TrackerError::CreationFailed)` if the attempt bound is
    ///   exhausted or the store fails for any non-collision reason
    pub async fn create_batch(
        &self,
        payload: NewBatch,
        owner_id: &str,
    ) -> Result<Batch, TrackerError> {
        // Step 1: Re-check the payload before consuming any counter value
        let crop_type = self.validator.validate_new_batch(&payload)?;

        for attempt in 1..=self.config.max_attempts {
            // Step 2: One transaction per attempt; allocation and insert
            // commit or roll back together
            let mut tx = self
                .store
                .pool()
                .begin()
                .await
                .map_err(|e| TrackerError::CreationFailed(format!("begin failed: {}", e)))?;

            // Step 3: Allocate and format. The counter advance becomes
            // durable only if this attempt commits, but an aborted attempt
            // never hands its value to anyone else.
            let seq = sequence::allocate(&self.config.counter_name, &mut tx)
                .await
                .map_err(|e| TrackerError::CreationFailed(format!("allocation failed: {}", e)))?;

            let now = Utc::now();
            let batch_id = sequence::format_batch_id(now.year(), seq)?;

            // Step 4: Construct the batch at the farmer stage with its
            // initial timeline entry
            let initial = SupplyUpdate {
                stage: Stage::Farmer,
                actor: owner_id.to_string(),
                location: payload.origin.clone(),
                timestamp: now,
                notes: None,
            };

            let mut batch = Batch {
                batch_id,
                farmer_id: owner_id.to_string(),
                crop_type,
                quantity: payload.quantity,
                harvest_date: payload.harvest_date,
                origin: payload.origin.clone(),
                current_stage: Stage::Farmer,
                is_recalled: false,
                integrity_hash: String::new(),
                qr_code: payload.qr_code.clone(),
                updates: vec![initial],
                created_at: now,
                updated_at: now,
            };
            batch.integrity_hash = match &payload.integrity_token {
                Some(token) => token.clone(),
                None => self.sealer.seal(&batch),
            };

            // Step 5: Insert and commit
            match self.store.insert(&mut tx, &batch).await {
                Ok(InsertOutcome::Inserted) => {
                    tx.commit()
                        .await
                        .map_err(|e| TrackerError::CreationFailed(format!("commit failed: {}", e)))?;
                    info!(
                        "Batch {} created for farmer {} on attempt {}",
                        batch.batch_id, owner_id, attempt
                    );
                    return Ok(batch);
                }
                // Step 6: Collision, the one condition worth retrying.
                // The failed insert wrote nothing, so committing here keeps
                // only the counter advance: the colliding value is burned
                // and the next attempt allocates past it. Rolling back
                // instead would hand the same value out again and collide
                // forever.
                Ok(InsertOutcome::DuplicateId) => {
                    warn!(
                        "Identifier {} already exists (attempt {}/{}), reallocating",
                        batch.batch_id, attempt, self.config.max_attempts
                    );
                    tx.commit().await.map_err(|e| {
                        TrackerError::CreationFailed(format!("commit failed: {}", e))
                    })?;
                }
                // Anything else is not a transient condition; surface it
                Err(e) => {
                    return Err(TrackerError::CreationFailed(format!("insert failed: {}", e)));
                }
            }
        }

        Err(TrackerError::CreationFailed(format!(
            "identifier allocation exhausted {} attempts",
            self.config.max_attempts
        )))
    }
}
