use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supply-chain position a batch occupies at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Farmer,
    Mandi,
    Transport,
    Retailer,
}

impl Stage {
    /// Canonical lowercase name, as stored and serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Farmer => "farmer",
            Stage::Mandi => "mandi",
            Stage::Transport => "transport",
            Stage::Retailer => "retailer",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = TrackerError;

    /// Parses a stage name, normalizing case ("Transport" and "transport" are the same stage)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "farmer" => Ok(Stage::Farmer),
            "mandi" => Ok(Stage::Mandi),
            "transport" => Ok(Stage::Transport),
            "retailer" => Ok(Stage::Retailer),
            other => Err(TrackerError::Validation(format!(
                "unknown stage '{}'",
                other
            ))),
        }
    }
}

/// Crop variety a batch consists of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropType {
    Rice,
    Wheat,
    Corn,
    Tomato,
}

impl CropType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CropType::Rice => "rice",
            CropType::Wheat => "wheat",
            CropType::Corn => "corn",
            CropType::Tomato => "tomato",
        }
    }
}

impl fmt::Display for CropType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CropType {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rice" => Ok(CropType::Rice),
            "wheat" => Ok(CropType::Wheat),
            "corn" => Ok(CropType::Corn),
            "tomato" => Ok(CropType::Tomato),
            other => Err(TrackerError::Validation(format!(
                "unknown crop type '{}'",
                other
            ))),
        }
    }
}

/// Role attached to an authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Farmer,
    Mandi,
    Transporter,
    Retailer,
}

impl FromStr for Role {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "farmer" => Ok(Role::Farmer),
            "mandi" => Ok(Role::Mandi),
            "transporter" => Ok(Role::Transporter),
            "retailer" => Ok(Role::Retailer),
            other => Err(TrackerError::Validation(format!("unknown role '{}'", other))),
        }
    }
}

/// Identity resolved by the upstream authentication layer
///
/// The core trusts these values verbatim; resolving them from credentials
/// is the job of the layer in front of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Caller {
    pub id: String,
    pub role: Role,
    /// Alternate farmer-scoped identity some callers carry alongside
    /// their primary id (e.g. a linked farmer profile)
    pub farmer_id: Option<String>,
}

/// One immutable entry in a batch's supply-chain timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplyUpdate {
    pub stage: Stage,
    pub actor: String,
    pub location: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One tracked unit of harvested produce and its full supply-chain history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    /// External identifier, unique and immutable once assigned
    pub batch_id: String,
    /// Owning farmer, compared by string equality on authorization
    pub farmer_id: String,
    pub crop_type: CropType,
    pub quantity: f64,
    pub harvest_date: DateTime<Utc>,
    pub origin: String,
    /// Always equals the stage of the most recently appended update
    pub current_stage: Stage,
    /// One-way flag; once true the batch is withdrawn from circulation
    pub is_recalled: bool,
    /// Opaque token re-sealed on every mutation
    pub integrity_hash: String,
    /// Opaque pre-rendered code supplied at creation, if any
    pub qr_code: Option<String>,
    /// Append-only timeline; never empty after creation
    pub updates: Vec<SupplyUpdate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a batch
///
/// The owner is not part of the payload; it comes from the caller identity.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBatch {
    pub crop_type: String,
    pub quantity: f64,
    pub harvest_date: DateTime<Utc>,
    pub origin: String,
    /// Pre-rendered visual code to store alongside the batch
    pub qr_code: Option<String>,
    /// Caller-supplied integrity token; sealed locally when absent
    pub integrity_token: Option<String>,
}

/// Payload for appending a timeline entry to a batch
#[derive(Debug, Clone, Deserialize)]
pub struct NewUpdate {
    pub stage: String,
    pub actor: String,
    pub location: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Errors surfaced by the tracking core
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Malformed input; the caller must correct it, never retried internally
    #[error("validation failed: {0}")]
    Validation(String),

    /// No batch exists under the given identifier
    #[error("batch not found: {0}")]
    NotFound(String),

    /// Authenticated but not authorized for the batch
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Recall requested for a batch that is already recalled
    #[error("batch already recalled: {0}")]
    AlreadyRecalled(String),

    /// Batch creation exhausted its retries or hit a non-collision failure
    #[error("batch creation failed: {0}")]
    CreationFailed(String),

    /// A write against an existing batch failed (e.g. concurrent deletion)
    #[error("batch update failed: {0}")]
    UpdateFailed(String),

    /// Underlying store failure on a read or bookkeeping path
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}
