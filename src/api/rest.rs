use axum::{
    Router,
    routing::get,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use crate::observability::metrics;
use crate::price_infra::Snapshot;
use crate::price_infra::engine::QuoteEngine;
use crate::types::PairRequest;

pub struct ApiState {
    pub engine: QuoteEngine,
}

pub fn create_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/quotes/:pair", get(get_quotes))
        .route("/api/pairs", get(get_pairs))
        .route("/api/sources", get(list_sources))
        .route("/metrics", get(get_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn get_quotes(
    State(state): State<Arc<ApiState>>,
    Path(pair): Path<String>,
) -> Result<Json<Snapshot>, (StatusCode, String)> {
    let pair = PairRequest::parse(&pair).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let snapshot = state.engine.get_snapshot(&pair).await;
    Ok(Json(snapshot.as_ref().clone()))
}

#[derive(Deserialize)]
struct PairsQuery {
    #[serde(default)]
    list: String,
}

#[derive(Serialize)]
struct PairsResponse {
    pairs: Vec<Snapshot>,
}

/// `?list=btc-usd,eth-ars`; entries that do not parse are skipped.
async fn get_pairs(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<PairsQuery>,
) -> Json<PairsResponse> {
    let pairs: Vec<PairRequest> = query
        .list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match PairRequest::parse(s) {
            Ok(pair) => Some(pair),
            Err(e) => {
                tracing::debug!(input = s, error = %e, "Skipping malformed pair");
                None
            }
        })
        .collect();

    let snapshots = state.engine.get_snapshots(&pairs).await;
    Json(PairsResponse {
        pairs: snapshots.iter().map(|s| s.as_ref().clone()).collect(),
    })
}

#[derive(Serialize)]
struct SourcesResponse {
    sources: Vec<String>,
}

async fn list_sources(State(state): State<Arc<ApiState>>) -> Json<SourcesResponse> {
    Json(SourcesResponse {
        sources: state.engine.source_names(),
    })
}

async fn get_metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render(),
    )
}
