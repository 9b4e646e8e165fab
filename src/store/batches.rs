//! Batch Collection Module
//!
//! Row-level access to the `batches` table. Every batch row carries its
//! full timeline as a JSON array so reads never join and the history is
//! always consistent with the batch fields fetched alongside it.
//!
//! Writes that must observe a precondition (append, recall) are expressed
//! as conditional UPDATEs and report whether a row was hit; deciding what
//! a miss means is left to the component issuing the write.

use crate::types::{Batch, SupplyUpdate};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use sqlx::{FromRow, Sqlite, Transaction};
use std::str::FromStr;

/// Outcome of inserting a freshly constructed batch
///
/// A duplicate identifier is not an error at this layer: the creation
/// pipeline treats it as the signal to allocate again.
#[derive(Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The formatted identifier already exists in the table
    DuplicateId,
}

/// Raw row shape of the `batches` table
#[derive(Debug, FromRow)]
struct BatchRow {
    batch_id: String,
    farmer_id: String,
    crop_type: String,
    quantity: f64,
    harvest_date: DateTime<Utc>,
    origin: String,
    current_stage: String,
    is_recalled: bool,
    integrity_hash: String,
    qr_code: Option<String>,
    updates: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BatchRow {
    /// Decode the stored row into the domain type
    fn into_batch(self) -> Result<Batch, sqlx::Error> {
        let crop_type = FromStr::from_str(&self.crop_type).map_err(|e| {
            sqlx::Error::ColumnDecode {
                index: "crop_type".into(),
                source: Box::new(e),
            }
        })?;
        let current_stage = FromStr::from_str(&self.current_stage).map_err(|e| {
            sqlx::Error::ColumnDecode {
                index: "current_stage".into(),
                source: Box::new(e),
            }
        })?;
        let updates: Vec<SupplyUpdate> =
            serde_json::from_str(&self.updates).map_err(|e| sqlx::Error::ColumnDecode {
                index: "updates".into(),
                source: Box::new(e),
            })?;

        Ok(Batch {
            batch_id: self.batch_id,
            farmer_id: self.farmer_id,
            crop_type,
            quantity: self.quantity,
            harvest_date: self.harvest_date,
            origin: self.origin,
            current_stage,
            is_recalled: self.is_recalled,
            integrity_hash: self.integrity_hash,
            qr_code: self.qr_code,
            updates,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn timeline_json(updates: &[SupplyUpdate]) -> Result<String, sqlx::Error> {
    serde_json::to_string(updates)
        .map_err(|e| sqlx::Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Persistent batch collection
#[derive(Clone)]
pub struct BatchStore {
    pool: SqlitePool,
}

impl BatchStore {
    /// Creates a store over an already-connected pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The underlying pool, for callers that manage their own transactions
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a new batch inside the caller's transaction
    ///
    /// The row materializes only when the caller commits. An identifier
    /// collision is reported as `InsertOutcome::DuplicateId` rather than an
    /// error so the creation pipeline can decide how to finish the attempt
    /// and allocate again; every other failure propagates untouched.
    pub async fn insert(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        batch: &Batch,
    ) -> Result<InsertOutcome, sqlx::Error> {
        let updates = timeline_json(&batch.updates)?;

        let result = sqlx::query(
            r#"
            INSERT INTO batches (
                batch_id, farmer_id, crop_type, quantity, harvest_date, origin,
                current_stage, is_recalled, integrity_hash, qr_code, updates,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&batch.batch_id)
        .bind(&batch.farmer_id)
        .bind(batch.crop_type.as_str())
        .bind(batch.quantity)
        .bind(batch.harvest_date)
        .bind(&batch.origin)
        .bind(batch.current_stage.as_str())
        .bind(batch.is_recalled)
        .bind(&batch.integrity_hash)
        .bind(&batch.qr_code)
        .bind(updates)
        .bind(batch.created_at)
        .bind(batch.updated_at)
        .execute(&mut **tx)
        .await;

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Ok(InsertOutcome::DuplicateId)
            }
            Err(e) => Err(e),
        }
    }

    /// Fetch a batch by its external identifier
    pub async fn get(&self, batch_id: &str) -> Result<Option<Batch>, sqlx::Error> {
        let row = sqlx::query_as::<_, BatchRow>("SELECT * FROM batches WHERE batch_id = ?")
            .bind(batch_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(BatchRow::into_batch).transpose()
    }

    /// List every batch, oldest first
    pub async fn list_all(&self) -> Result<Vec<Batch>, sqlx::Error> {
        let rows = sqlx::query_as::<_, BatchRow>("SELECT * FROM batches ORDER BY created_at, batch_id")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(BatchRow::into_batch).collect()
    }

    /// List the batches owned by one farmer, oldest first
    pub async fn list_by_farmer(&self, farmer_id: &str) -> Result<Vec<Batch>, sqlx::Error> {
        let rows = sqlx::query_as::<_, BatchRow>(
            "SELECT * FROM batches WHERE farmer_id = ? ORDER BY created_at, batch_id",
        )
        .bind(farmer_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(BatchRow::into_batch).collect()
    }

    /// Write an appended timeline back to the batch row
    ///
    /// One conditional UPDATE carries the new timeline, the advanced stage,
    /// and the re-sealed integrity token together.
    ///
    /// # Returns
    /// `true` if the row was written, `false` if no row matched the
    /// identifier (the batch disappeared between load and write)
    pub async fn apply_timeline(&self, batch: &Batch) -> Result<bool, sqlx::Error> {
        let updates = timeline_json(&batch.updates)?;

        let result = sqlx::query(
            r#"
            UPDATE batches
            SET updates = ?, current_stage = ?, integrity_hash = ?, updated_at = ?
            WHERE batch_id = ?
            "#,
        )
        .bind(updates)
        .bind(batch.current_stage.as_str())
        .bind(&batch.integrity_hash)
        .bind(batch.updated_at)
        .bind(&batch.batch_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Flip the recall flag, once
    ///
    /// The WHERE clause refuses rows already recalled, so two racing recall
    /// requests cannot both report success.
    ///
    /// # Returns
    /// `true` if this call performed the transition, `false` if the batch
    /// was already recalled (or no longer exists)
    pub async fn mark_recalled(
        &self,
        batch_id: &str,
        integrity_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE batches
            SET is_recalled = 1, integrity_hash = ?, updated_at = ?
            WHERE batch_id = ? AND is_recalled = 0
            "#,
        )
        .bind(integrity_hash)
        .bind(updated_at)
        .bind(batch_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
