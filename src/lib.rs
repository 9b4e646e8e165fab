//! This crate implements a produce-batch tracking service for a four-stage
//! agricultural supply chain. Batches receive unique, monotonically
//! increasing identifiers under concurrent creation, carry an append-only
//! timeline of supply-chain updates, and can be withdrawn via a one-way
//! administrative recall.

pub mod types; // Defines common data structures, payloads, and the error taxonomy.
pub mod api; // Handles the HTTP surface over the core operations.
pub mod validation; // Re-checks incoming payloads against the data-model constraints.
pub mod store; // SQLite persistence: counters and the batch collection.
pub mod sequence; // Atomic identifier allocation and formatting.
pub mod auth; // Ownership authorization for the update path.
pub mod batch; // Batch lifecycle: creation, timeline appends, recall.
pub mod integrity; // Integrity-token sealing seam.
pub mod config; // Defines and loads system configuration.

// Re-export commonly used types and configurations for easier access.
pub use batch::BatchOrchestrator;
pub use config::Config;
pub use types::*;
