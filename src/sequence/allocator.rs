//! Sequence Allocator Module
//!
//! A durable counter keyed by a logical name. Allocation is one atomic
//! upsert-and-increment; there is no separate "create the counter" step, so
//! two allocators that both observe a missing row cannot lose an update.
//!
//! # Contention
//! All cross-request contention in the tracker funnels through this single
//! statement. SQLite executes it under the connection's write lock, so N
//! concurrent allocations for one name always return N distinct consecutive
//! values, whichever process they came from.

use sqlx::{Sqlite, Transaction};

/// Allocate the next value of the named counter
///
/// Runs inside the caller's transaction: the increment becomes durable only
/// when the caller commits. A caller that cannot use the value must either
/// commit anyway (leaving a gap) or roll the whole attempt back; either
/// way no committed batch ever observes the same value twice.
///
/// # Arguments
/// * `name` - Logical counter name (e.g., "batchId")
/// * `tx` - Open transaction the increment is scoped to
///
/// # Returns
/// The post-increment counter value, starting at 1 for a fresh name
pub async fn allocate(name: &str, tx: &mut Transaction<'_, Sqlite>) -> Result<i64, sqlx::Error> {
    // Upsert-and-increment in one statement. Reading then writing in two
    // steps would let two allocators observe the same value.
    let sequence: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO counters (name, sequence) VALUES (?, 1)
        ON CONFLICT(name) DO UPDATE SET sequence = sequence + 1
        RETURNING sequence
        "#,
    )
    .bind(name)
    .fetch_one(&mut **tx)
    .await?;

    Ok(sequence)
}
