use crate::types::Batch;
use sha2::{Digest, Sha256};

/// Produces the opaque integrity token stored alongside a batch
///
/// Implementations must be deterministic over the batch state they observe;
/// beyond that the tracker treats the output as a black box.
pub trait IntegritySealer: Send + Sync {
    fn seal(&self, batch: &Batch) -> String;
}

/// SHA-256 over the batch's identifying fields and timeline length
pub struct Sha256Sealer;

impl IntegritySealer for Sha256Sealer {
    fn seal(&self, batch: &Batch) -> String {
        let mut hasher = Sha256::new();
        hasher.update(batch.batch_id.as_bytes());
        hasher.update(batch.farmer_id.as_bytes());
        hasher.update(batch.crop_type.as_str().as_bytes());
        hasher.update(batch.quantity.to_le_bytes());
        hasher.update(batch.origin.as_bytes());
        hasher.update(batch.current_stage.as_str().as_bytes());
        hasher.update([batch.is_recalled as u8]);
        hasher.update(batch.updates.len().to_le_bytes());

        hex::encode(hasher.finalize())
    }
}
