//! API Server Module
//!
//! This module implements the REST surface of the tracker. It wires the
//! creation orchestrator, ownership guard, update appender, and recall gate
//! behind a handful of routes and maps core errors onto HTTP status codes.
//!
//! # Identity
//! A prior authentication layer resolves the caller and forwards it in
//! headers (`x-user-id`, `x-user-role`, optional `x-farmer-id`). The
//! handlers trust those values verbatim.

use crate::{
    auth::OwnershipGuard,
    batch::{BatchOrchestrator, RecallGate, UpdateAppender},
    config::Config,
    integrity::Sha256Sealer,
    store::BatchStore,
    types::{Caller, NewBatch, NewUpdate, Role, TrackerError},
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared application state that is accessible across all request handlers
///
/// Holds the tracker components that serve concurrent requests:
/// - `orchestrator`: transactional batch creation
/// - `guard`: ownership authorization for the update path
/// - `appender`: timeline growth on authorized batches
/// - `recall_gate`: the one-way administrative recall
/// - `store`: read access for the fetch/list routes
#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<BatchOrchestrator>,
    guard: Arc<OwnershipGuard>,
    appender: Arc<UpdateAppender>,
    recall_gate: Arc<RecallGate>,
    store: BatchStore,
}

/// The main API server struct
pub struct Server {
    config: Config,
    state: AppState,
}

impl Server {
    /// Creates a new API server instance
    ///
    /// # Arguments
    /// * `config` - Server configuration (host, port, creation settings)
    /// * `store` - Connected batch store shared by every component
    pub fn new(config: Config, store: BatchStore) -> Self {
        let sealer = Arc::new(Sha256Sealer);

        let orchestrator = Arc::new(BatchOrchestrator::new(
            store.clone(),
            sealer.clone(),
            config.creation.clone(),
        ));
        let guard = Arc::new(OwnershipGuard::new(store.clone()));
        let appender = Arc::new(UpdateAppender::new(store.clone(), sealer.clone()));
        let recall_gate = Arc::new(RecallGate::new(store.clone(), sealer));

        let state = AppState {
            orchestrator,
            guard,
            appender,
            recall_gate,
            store,
        };

        Self { config, state }
    }

    /// Starts the API server and begins listening for incoming requests
    ///
    /// # Returns
    /// `Ok(())` if the server starts successfully, or an error if binding fails
    pub async fn start(self) -> anyhow::Result<()> {
        let app = Router::new()
            .route("/batches", post(handle_create).get(handle_list))
            .route("/batches/:id", get(handle_get))
            .route("/batches/:id/updates", post(handle_append))
            .route("/batches/:id/recall", post(handle_recall))
            .with_state(self.state);

        let addr = format!("{}:{}", self.config.api.host, self.config.api.port);
        info!("API server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// Error body returned for every failed request
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Map a core error onto an HTTP response
fn core_error(err: TrackerError) -> Response {
    let status = match &err {
        TrackerError::Validation(_) => StatusCode::BAD_REQUEST,
        TrackerError::NotFound(_) => StatusCode::NOT_FOUND,
        TrackerError::Forbidden(_) => StatusCode::FORBIDDEN,
        TrackerError::AlreadyRecalled(_) => StatusCode::CONFLICT,
        TrackerError::CreationFailed(_) | TrackerError::UpdateFailed(_) | TrackerError::Store(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_response(status, err.to_string())
}

/// Resolve the caller identity forwarded by the authentication layer
fn caller_from_headers(headers: &HeaderMap) -> Result<Caller, Response> {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let id = header_str("x-user-id").ok_or_else(|| {
        error_response(StatusCode::UNAUTHORIZED, "missing x-user-id header")
    })?;
    let role = header_str("x-user-role")
        .ok_or_else(|| error_response(StatusCode::UNAUTHORIZED, "missing x-user-role header"))?
        .parse::<Role>()
        .map_err(|e| error_response(StatusCode::UNAUTHORIZED, e.to_string()))?;

    Ok(Caller {
        id,
        role,
        farmer_id: header_str("x-farmer-id"),
    })
}

/// Handles `POST /batches`
///
/// Creates a batch owned by the caller. The payload may carry an opaque
/// pre-rendered QR code and integrity token; both are stored untouched.
async fn handle_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<NewBatch>,
) -> Response {
    let caller = match caller_from_headers(&headers) {
        Ok(caller) => caller,
        Err(resp) => return resp,
    };

    info!("Create request from {}", caller.id);

    match state.orchestrator.create_batch(payload, &caller.id).await {
        Ok(batch) => (StatusCode::CREATED, Json(batch)).into_response(),
        Err(e) => {
            warn!("Create failed for {}: {}", caller.id, e);
            core_error(e)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListParams {
    farmer: Option<String>,
}

/// Handles `GET /batches`, optionally filtered by `?farmer=`
async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Response {
    let result = match &params.farmer {
        Some(farmer_id) => state.store.list_by_farmer(farmer_id).await,
        None => state.store.list_all().await,
    };

    match result {
        Ok(batches) => Json(batches).into_response(),
        Err(e) => core_error(TrackerError::Store(e)),
    }
}

/// Handles `GET /batches/:id`
async fn handle_get(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.store.get(&id).await {
        Ok(Some(batch)) => Json(batch).into_response(),
        Ok(None) => core_error(TrackerError::NotFound(id)),
        Err(e) => core_error(TrackerError::Store(e)),
    }
}

/// Handles `POST /batches/:id/updates`
///
/// Authorizes the caller against the batch's owner, then appends the
/// proposed entry to the batch state that authorization loaded. Recalled
/// batches are withdrawn from circulation and refuse further updates here.
async fn handle_append(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<NewUpdate>,
) -> Response {
    let caller = match caller_from_headers(&headers) {
        Ok(caller) => caller,
        Err(resp) => return resp,
    };

    let batch = match state.guard.authorize(&caller, &id).await {
        Ok(batch) => batch,
        Err(e) => return core_error(e),
    };

    if batch.is_recalled {
        warn!("Update refused for recalled batch {}", batch.batch_id);
        return error_response(
            StatusCode::CONFLICT,
            format!("batch {} is recalled", batch.batch_id),
        );
    }

    match state.appender.append_update(batch, payload).await {
        Ok(batch) => Json(batch).into_response(),
        Err(e) => core_error(e),
    }
}

/// Handles `POST /batches/:id/recall`
///
/// Administrators only; everyone else is refused before the gate is reached.
async fn handle_recall(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let caller = match caller_from_headers(&headers) {
        Ok(caller) => caller,
        Err(resp) => return resp,
    };

    if caller.role != Role::Admin {
        warn!("Recall attempt by non-admin {}", caller.id);
        return error_response(StatusCode::FORBIDDEN, "recall requires the admin role");
    }

    match state.recall_gate.recall(&id, &caller.id).await {
        Ok(batch) => Json(batch).into_response(),
        Err(e) => core_error(e),
    }
}
