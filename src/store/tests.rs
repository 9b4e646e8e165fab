//! Tests for the batch collection

#[cfg(test)]
mod tests {
    use crate::store::{BatchStore, InsertOutcome, connect, migrate};
    use crate::types::{Batch, CropType, Stage, SupplyUpdate};
    use chrono::Utc;
    use tempfile::TempDir;

    /// Helper to open a migrated store in a temporary directory
    async fn test_store() -> (BatchStore, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let pool = connect(path.to_str().unwrap()).await.unwrap();
        migrate(&pool).await.unwrap();
        (BatchStore::new(pool), dir)
    }

    /// Helper to build a batch with one farmer-stage timeline entry
    fn sample_batch(batch_id: &str, farmer_id: &str) -> Batch {
        let now = Utc::now();
        Batch {
            batch_id: batch_id.to_string(),
            farmer_id: farmer_id.to_string(),
            crop_type: CropType::Rice,
            quantity: 100.0,
            harvest_date: now,
            origin: "Green Valley".to_string(),
            current_stage: Stage::Farmer,
            is_recalled: false,
            integrity_hash: "seed-hash".to_string(),
            qr_code: Some("qr-blob".to_string()),
            updates: vec![SupplyUpdate {
                stage: Stage::Farmer,
                actor: farmer_id.to_string(),
                location: "Green Valley".to_string(),
                timestamp: now,
                notes: None,
            }],
            created_at: now,
            updated_at: now,
        }
    }

    async fn insert_committed(store: &BatchStore, batch: &Batch) -> InsertOutcome {
        let mut tx = store.pool().begin().await.unwrap();
        let outcome = store.insert(&mut tx, batch).await.unwrap();
        tx.commit().await.unwrap();
        outcome
    }

    #[tokio::test]
    async fn test_insert_and_get_roundtrip() {
        let (store, _dir) = test_store().await;
        let batch = sample_batch("CROP-2024-001", "F1");

        assert_eq!(insert_committed(&store, &batch).await, InsertOutcome::Inserted);

        let loaded = store.get("CROP-2024-001").await.unwrap().unwrap();
        assert_eq!(loaded.batch_id, batch.batch_id);
        assert_eq!(loaded.farmer_id, "F1");
        assert_eq!(loaded.crop_type, CropType::Rice);
        assert_eq!(loaded.current_stage, Stage::Farmer);
        assert_eq!(loaded.quantity, 100.0);
        assert_eq!(loaded.qr_code.as_deref(), Some("qr-blob"));
        assert_eq!(loaded.updates.len(), 1);
        assert_eq!(loaded.updates[0].stage, Stage::Farmer);
        assert!(!loaded.is_recalled);
    }

    #[tokio::test]
    async fn test_insert_reports_duplicate_identifier() {
        let (store, _dir) = test_store().await;
        let batch = sample_batch("CROP-2024-001", "F1");

        assert_eq!(insert_committed(&store, &batch).await, InsertOutcome::Inserted);

        // Same identifier, different owner: still a duplicate
        let rival = sample_batch("CROP-2024-001", "F2");
        assert_eq!(insert_committed(&store, &rival).await, InsertOutcome::DuplicateId);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let (store, _dir) = test_store().await;
        assert!(store.get("CROP-2024-999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_by_farmer_filters_ownership() {
        let (store, _dir) = test_store().await;
        insert_committed(&store, &sample_batch("CROP-2024-001", "F1")).await;
        insert_committed(&store, &sample_batch("CROP-2024-002", "F2")).await;
        insert_committed(&store, &sample_batch("CROP-2024-003", "F1")).await;

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 3);

        let f1 = store.list_by_farmer("F1").await.unwrap();
        assert_eq!(f1.len(), 2);
        assert!(f1.iter().all(|b| b.farmer_id == "F1"));
    }

    #[tokio::test]
    async fn test_apply_timeline_on_missing_batch_reports_no_row() {
        let (store, _dir) = test_store().await;
        let batch = sample_batch("CROP-2024-001", "F1");

        // Never inserted; the conditional write must hit nothing
        assert!(!store.apply_timeline(&batch).await.unwrap());
    }

    #[tokio::test]
    async fn test_apply_timeline_persists_stage_and_entries() {
        let (store, _dir) = test_store().await;
        let mut batch = sample_batch("CROP-2024-001", "F1");
        insert_committed(&store, &batch).await;

        batch.updates.push(SupplyUpdate {
            stage: Stage::Mandi,
            actor: "M1".to_string(),
            location: "Mandi Yard".to_string(),
            timestamp: Utc::now(),
            notes: Some("weighed".to_string()),
        });
        batch.current_stage = Stage::Mandi;
        batch.integrity_hash = "resealed".to_string();
        batch.updated_at = Utc::now();

        assert!(store.apply_timeline(&batch).await.unwrap());

        let loaded = store.get("CROP-2024-001").await.unwrap().unwrap();
        assert_eq!(loaded.updates.len(), 2);
        assert_eq!(loaded.current_stage, Stage::Mandi);
        assert_eq!(loaded.integrity_hash, "resealed");
        assert_eq!(loaded.updates[1].notes.as_deref(), Some("weighed"));
    }

    #[tokio::test]
    async fn test_mark_recalled_transitions_only_once() {
        let (store, _dir) = test_store().await;
        let batch = sample_batch("CROP-2024-001", "F1");
        insert_committed(&store, &batch).await;

        let now = Utc::now();
        assert!(store.mark_recalled("CROP-2024-001", "sealed", now).await.unwrap());
        // The guarded write refuses the second transition
        assert!(!store.mark_recalled("CROP-2024-001", "sealed-again", now).await.unwrap());

        let loaded = store.get("CROP-2024-001").await.unwrap().unwrap();
        assert!(loaded.is_recalled);
        assert_eq!(loaded.integrity_hash, "sealed");
    }
}
