use crate::store::BatchStore;
use crate::types::{Batch, Caller, Role, TrackerError};
use tracing::warn;

/// Authorizes callers against a batch's recorded owner
pub struct OwnershipGuard {
    store: BatchStore,
}

impl OwnershipGuard {
    pub fn new(store: BatchStore) -> Self {
        Self { store }
    }

    /// Authorize a caller for a batch and hand the batch back
    ///
    /// Administrators pass unconditionally. Everyone else must match the
    /// batch's `farmer_id`, either with their primary id or with the
    /// alternate farmer-scoped id they presented.
    ///
    /// The loaded batch is returned on success so the caller can keep
    /// working on exactly the state that was authorized instead of
    /// re-fetching it and racing a concurrent writer.
    ///
    /// # Returns
    /// * `Ok(Batch)` if the caller may act on the batch
    /// * `Err(TrackerError::NotFound)` if no batch has this identifier
    /// * `Err(TrackerError::Forbidden)` if the caller is not the owner
    pub async fn authorize(&self, caller: &Caller, batch_id: &str) -> Result<Batch, TrackerError> {
        let batch = self
            .store
            .get(batch_id)
            .await?
            .ok_or_else(|| TrackerError::NotFound(batch_id.to_string()))?;

        // Administrators override ownership
        if caller.role == Role::Admin {
            return Ok(batch);
        }

        let owns = batch.farmer_id == caller.id
            || caller.farmer_id.as_deref() == Some(batch.farmer_id.as_str());

        if owns {
            Ok(batch)
        } else {
            warn!(
                "Caller {} denied for batch {} owned by {}",
                caller.id, batch.batch_id, batch.farmer_id
            );
            Err(TrackerError::Forbidden(format!(
                "caller {} does not own batch {}",
                caller.id, batch_id
            )))
        }
    }
}
