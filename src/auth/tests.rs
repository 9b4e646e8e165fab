//! Tests for ownership authorization

#[cfg(test)]
mod tests {
    use crate::auth::OwnershipGuard;
    use crate::store::{BatchStore, connect, migrate};
    use crate::types::{Batch, Caller, CropType, Role, Stage, SupplyUpdate, TrackerError};
    use chrono::Utc;
    use tempfile::TempDir;

    async fn test_guard() -> (OwnershipGuard, BatchStore, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let pool = connect(path.to_str().unwrap()).await.unwrap();
        migrate(&pool).await.unwrap();
        let store = BatchStore::new(pool);
        (OwnershipGuard::new(store.clone()), store, dir)
    }

    fn caller(id: &str, role: Role) -> Caller {
        Caller {
            id: id.to_string(),
            role,
            farmer_id: None,
        }
    }

    async fn seed_batch(store: &BatchStore, batch_id: &str, farmer_id: &str) {
        let now = Utc::now();
        let batch = Batch {
            batch_id: batch_id.to_string(),
            farmer_id: farmer_id.to_string(),
            crop_type: CropType::Wheat,
            quantity: 50.0,
            harvest_date: now,
            origin: "North Field".to_string(),
            current_stage: Stage::Farmer,
            is_recalled: false,
            integrity_hash: "seed".to_string(),
            qr_code: None,
            updates: vec![SupplyUpdate {
                stage: Stage::Farmer,
                actor: farmer_id.to_string(),
                location: "North Field".to_string(),
                timestamp: now,
                notes: None,
            }],
            created_at: now,
            updated_at: now,
        };
        let mut tx = store.pool().begin().await.unwrap();
        store.insert(&mut tx, &batch).await.unwrap();
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_owner_is_authorized_and_receives_the_batch() {
        let (guard, store, _dir) = test_guard().await;
        seed_batch(&store, "CROP-2024-001", "F1").await;

        let batch = guard
            .authorize(&caller("F1", Role::Farmer), "CROP-2024-001")
            .await
            .unwrap();
        // The loaded batch comes back so the caller never re-fetches
        assert_eq!(batch.batch_id, "CROP-2024-001");
        assert_eq!(batch.farmer_id, "F1");
    }

    #[tokio::test]
    async fn test_alternate_farmer_identity_is_authorized() {
        let (guard, store, _dir) = test_guard().await;
        seed_batch(&store, "CROP-2024-001", "F1").await;

        // Primary id differs, but the presented farmer-scoped id matches
        let mut linked = caller("U42", Role::Farmer);
        linked.farmer_id = Some("F1".to_string());

        let batch = guard.authorize(&linked, "CROP-2024-001").await.unwrap();
        assert_eq!(batch.farmer_id, "F1");
    }

    #[tokio::test]
    async fn test_admin_overrides_ownership() {
        let (guard, store, _dir) = test_guard().await;
        seed_batch(&store, "CROP-2024-001", "F1").await;

        let batch = guard
            .authorize(&caller("root", Role::Admin), "CROP-2024-001")
            .await
            .unwrap();
        assert_eq!(batch.batch_id, "CROP-2024-001");
    }

    #[tokio::test]
    async fn test_non_owner_is_forbidden() {
        let (guard, store, _dir) = test_guard().await;
        seed_batch(&store, "CROP-2024-001", "F1").await;

        let err = guard
            .authorize(&caller("F2", Role::Farmer), "CROP-2024-001")
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_missing_batch_is_not_found() {
        let (guard, _store, _dir) = test_guard().await;

        let err = guard
            .authorize(&caller("F1", Role::Farmer), "CROP-2024-404")
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::NotFound(_)));
    }
}
