//! axum front for the chunk store.
//!
//! Renderers poll `/surface` for column tops, tools fetch whole chunks from
//! `/chunk`, and editors push writes to `/block` or `/delta`. Store calls
//! that may generate run on the blocking pool.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tokio::net::TcpListener;

use strata_engine::codec::{encode_chunk, DeltaBatch};
use strata_engine::world::block::BlockId;
use strata_engine::world::position::{BlockPos, ChunkCoord};
use strata_engine::world::World;

use crate::metrics::{Metrics, MetricsSnapshot, RequestKind};

/// Shared by every request handler.
pub struct AppState {
    pub world: Arc<World>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(world: Arc<World>) -> Self {
        Self {
            world,
            metrics: Metrics::new(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/surface", get(surface))
        .route("/chunk", get(chunk))
        .route("/block", post(set_block))
        .route("/delta", post(apply_delta))
        .route("/stats", get(stats))
        .route("/healthz", get(healthz))
        .with_state(state)
}

/// Bind `addr` and serve until the task is dropped.
pub async fn serve(state: Arc<AppState>, addr: &str) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("HTTP listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Chunk coordinate from `x`, `y`, `z` query parameters. Missing or
/// unparsable components read as 0.
pub fn coord_from_query(params: &HashMap<String, String>) -> ChunkCoord {
    let axis = |name: &str| {
        params
            .get(name)
            .and_then(|v| v.trim().parse::<i32>().ok())
            .unwrap_or(0)
    };
    ChunkCoord::new(axis("x"), axis("y"), axis("z"))
}

fn octet_stream(bytes: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, "application/octet-stream")], bytes).into_response()
}

fn internal_error(err: impl std::fmt::Display) -> Response {
    tracing::error!("request failed: {}", err);
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
}

async fn surface(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let coord = coord_from_query(&params);
    let world = Arc::clone(&state.world);
    let start = Instant::now();
    match tokio::task::spawn_blocking(move || world.surface_snapshot(coord).to_bytes()).await {
        Ok(bytes) => {
            state
                .metrics
                .record_request(RequestKind::Surface, bytes.len(), start.elapsed());
            octet_stream(bytes)
        }
        Err(e) => internal_error(e),
    }
}

async fn chunk(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let coord = coord_from_query(&params);
    let world = Arc::clone(&state.world);
    let start = Instant::now();
    let encoded = tokio::task::spawn_blocking(move || {
        let chunk = world.get_or_create(coord);
        let bytes = encode_chunk(&chunk.read(), true);
        bytes
    })
    .await;
    match encoded {
        Ok(Err(e)) => internal_error(e),
        Ok(Ok(bytes)) => {
            state
                .metrics
                .record_request(RequestKind::Chunk, bytes.len(), start.elapsed());
            octet_stream(bytes)
        }
        Err(e) => internal_error(e),
    }
}

/// Body of `POST /block`. Coordinates are absolute block positions.
#[derive(Debug, Deserialize)]
pub struct BlockWrite {
    pub x: i64,
    pub y: i64,
    pub z: i64,
    pub block: u8,
    #[serde(default)]
    pub meta: u8,
}

async fn set_block(State(state): State<Arc<AppState>>, Json(write): Json<BlockWrite>) -> Response {
    let pos = BlockPos::new(write.x, write.y, write.z);
    let world = Arc::clone(&state.world);
    let done = tokio::task::spawn_blocking(move || {
        world.set_block(pos, BlockId(write.block), write.meta)
    })
    .await;
    match done {
        Ok(Ok(())) => {
            state.metrics.record_edits(1);
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(Err(e)) => {
            state.metrics.record_rejected();
            tracing::warn!("rejected block write: {}", e);
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
        Err(e) => internal_error(e),
    }
}

async fn apply_delta(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let batch = match DeltaBatch::decode(&body) {
        Ok(batch) => batch,
        Err(e) => {
            state.metrics.record_rejected();
            tracing::warn!("rejected delta batch: {}", e);
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };
    let edits = batch.edits.len();
    let world = Arc::clone(&state.world);
    match tokio::task::spawn_blocking(move || world.apply_delta(&batch)).await {
        Ok(()) => {
            state.metrics.record_edits(edits);
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => internal_error(e),
    }
}

async fn stats(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    let world = &state.world;
    Json(
        state
            .metrics
            .snapshot(world.chunk_count() as u64, world.generated_count()),
    )
}

async fn healthz() -> &'static str {
    "ok"
}
