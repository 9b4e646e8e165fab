use crate::types::{CropType, NewBatch, NewUpdate, Stage, TrackerError};
use chrono::Utc;
use std::str::FromStr;
use tracing::debug;

/// Largest accepted batch quantity
const MAX_QUANTITY: f64 = 1_000_000.0;
/// Longest accepted notes field on a timeline entry
const MAX_NOTES_LEN: usize = 500;

pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a batch creation payload
    /// Returns Ok(CropType) with the parsed crop, Err(TrackerError::Validation) otherwise
    pub fn validate_new_batch(&self, payload: &NewBatch) -> Result<CropType, TrackerError> {
        debug!("Validating creation payload for origin {:?}", payload.origin);

        // 1. Crop must be one of the recognized varieties
        let crop_type = CropType::from_str(&payload.crop_type)?;

        // 2. Quantity is a positive number with an upper bound
        if !payload.quantity.is_finite() || payload.quantity <= 0.0 {
            return Err(TrackerError::Validation(format!(
                "quantity must be positive, got {}",
                payload.quantity
            )));
        }
        if payload.quantity > MAX_QUANTITY {
            return Err(TrackerError::Validation(format!(
                "quantity must not exceed {}, got {}",
                MAX_QUANTITY, payload.quantity
            )));
        }

        // 3. Harvest date cannot lie in the future
        if payload.harvest_date > Utc::now() {
            return Err(TrackerError::Validation(
                "harvest date must not be in the future".to_string(),
            ));
        }

        // 4. Origin must be present
        if payload.origin.trim().is_empty() {
            return Err(TrackerError::Validation("origin must not be empty".to_string()));
        }

        Ok(crop_type)
    }

    /// Validate a timeline update payload
    /// Returns Ok(Stage) with the stage normalized to its canonical form
    pub fn validate_new_update(&self, payload: &NewUpdate) -> Result<Stage, TrackerError> {
        debug!("Validating update payload for stage {:?}", payload.stage);

        // 1. Stage must be recognized; case is normalized here
        let stage = Stage::from_str(&payload.stage)?;

        // 2. Actor and location must be present
        if payload.actor.trim().is_empty() {
            return Err(TrackerError::Validation("actor must not be empty".to_string()));
        }
        if payload.location.trim().is_empty() {
            return Err(TrackerError::Validation(
                "location must not be empty".to_string(),
            ));
        }

        // 3. A supplied timestamp cannot lie in the future
        if let Some(ts) = payload.timestamp {
            if ts > Utc::now() {
                return Err(TrackerError::Validation(
                    "update timestamp must not be in the future".to_string(),
                ));
            }
        }

        // 4. Notes are bounded
        if let Some(notes) = &payload.notes {
            if notes.chars().count() > MAX_NOTES_LEN {
                return Err(TrackerError::Validation(format!(
                    "notes must not exceed {} characters",
                    MAX_NOTES_LEN
                )));
            }
        }

        Ok(stage)
    }
}
