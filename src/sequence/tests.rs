//! Tests for identifier allocation and formatting

#[cfg(test)]
mod tests {
    use crate::sequence::{allocate, format_batch_id};
    use crate::store::{connect, migrate};
    use sqlx::SqlitePool;
    use tempfile::TempDir;

    /// Helper to open a migrated database in a temporary directory
    async fn test_pool() -> (SqlitePool, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let pool = connect(path.to_str().unwrap()).await.unwrap();
        migrate(&pool).await.unwrap();
        (pool, dir)
    }

    #[test]
    fn test_format_pads_to_three_digits() {
        assert_eq!(format_batch_id(2024, 1).unwrap(), "CROP-2024-001");
        assert_eq!(format_batch_id(2024, 7).unwrap(), "CROP-2024-007");
        assert_eq!(format_batch_id(2024, 42).unwrap(), "CROP-2024-042");
    }

    #[test]
    fn test_format_does_not_truncate_wide_sequences() {
        // Padding is a minimum width, not a cap
        assert_eq!(format_batch_id(2024, 1000).unwrap(), "CROP-2024-1000");
        assert_eq!(format_batch_id(2024, 123456).unwrap(), "CROP-2024-123456");
    }

    #[test]
    fn test_format_rejects_negative_sequence() {
        assert!(format_batch_id(2024, -1).is_err());
    }

    #[tokio::test]
    async fn test_allocate_starts_at_one_and_increments() {
        let (pool, _dir) = test_pool().await;

        for expected in 1..=5i64 {
            let mut tx = pool.begin().await.unwrap();
            let got = allocate("batchId", &mut tx).await.unwrap();
            tx.commit().await.unwrap();
            assert_eq!(got, expected);
        }
    }

    #[tokio::test]
    async fn test_allocate_names_are_independent() {
        let (pool, _dir) = test_pool().await;

        let mut tx = pool.begin().await.unwrap();
        assert_eq!(allocate("batchId", &mut tx).await.unwrap(), 1);
        assert_eq!(allocate("shipmentId", &mut tx).await.unwrap(), 1);
        assert_eq!(allocate("batchId", &mut tx).await.unwrap(), 2);
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_allocations_are_distinct_and_consecutive() {
        let (pool, _dir) = test_pool().await;

        let mut handles = Vec::new();
        for _ in 0..16 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                let mut tx = pool.begin().await.unwrap();
                let seq = allocate("batchId", &mut tx).await.unwrap();
                tx.commit().await.unwrap();
                seq
            }));
        }

        let mut got = Vec::new();
        for handle in handles {
            got.push(handle.await.unwrap());
        }
        got.sort_unstable();

        // No gaps, no duplicates, regardless of interleaving
        assert_eq!(got, (1..=16).collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn test_rolled_back_allocation_reverts_the_counter() {
        let (pool, _dir) = test_pool().await;

        let mut tx = pool.begin().await.unwrap();
        assert_eq!(allocate("batchId", &mut tx).await.unwrap(), 1);
        tx.rollback().await.unwrap();

        // The aborted attempt never published its value, so the next
        // committed allocation starts where the counter really is
        let mut tx = pool.begin().await.unwrap();
        assert_eq!(allocate("batchId", &mut tx).await.unwrap(), 1);
        tx.commit().await.unwrap();

        let mut tx = pool.begin().await.unwrap();
        assert_eq!(allocate("batchId", &mut tx).await.unwrap(), 2);
        tx.commit().await.unwrap();
    }
}
