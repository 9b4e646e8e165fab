//! Identifier Formatter Module
//!
//! Pure rendering of an allocated sequence number into the external batch
//! identifier format.

use crate::types::TrackerError;

/// Format an allocated sequence into a batch identifier
///
/// Produces `CROP-<year>-<sequence>` with the sequence zero-padded to a
/// minimum of three digits; wider sequences are never truncated
/// (sequence 1000 renders as `CROP-2024-1000`).
///
/// # Arguments
/// * `year` - Calendar year the batch was created in
/// * `sequence` - Allocated counter value; must not be negative
pub fn format_batch_id(year: i32, sequence: i64) -> Result<String, TrackerError> {
    if sequence < 0 {
        return Err(TrackerError::Validation(format!(
            "sequence must not be negative, got {}",
            sequence
        )));
    }

    Ok(format!("CROP-{}-{:03}", year, sequence))
}
