// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The HTTP surface.
//!
//! | route | |
//! |---|---|
//! | `GET /status` | TSL count and last processing time |
//! | `GET /info` | per-TSL scheme summaries |
//! | `POST /evaluate` | the AuthZEN-style decision endpoint |
//! | `GET /health` | liveness, always 200 |
//! | `GET /ready` | 200 once a snapshot with a non-empty pool exists |

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use time::OffsetDateTime;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::config::SecurityConfig;
use crate::evaluate::{decide, EvaluationRequest};
use crate::limit::RateLimiter;
use crate::snapshot::SnapshotPublisher;

/// Shared handler state: the snapshot slot plus the optional rate limiter.
pub struct AppState {
    publisher: Arc<SnapshotPublisher>,
    limiter: Option<RateLimiter>,
}

impl AppState {
    /// Builds handler state from the publisher and the security config.
    pub fn new(publisher: Arc<SnapshotPublisher>, security: &SecurityConfig) -> Arc<Self> {
        let limiter = (security.rate_limit_rps > 0).then(|| RateLimiter::new(security.rate_limit_rps));
        Arc::new(Self { publisher, limiter })
    }
}

/// Assembles the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/info", get(info))
        .route("/evaluate", post(evaluate))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct StatusBody {
    tsl_count: usize,
    #[serde(with = "time::serde::rfc3339::option")]
    last_processed: Option<OffsetDateTime>,
}

async fn status(State(state): State<Arc<AppState>>) -> Json<StatusBody> {
    let snapshot = state.publisher.current();
    Json(StatusBody {
        tsl_count: snapshot
            .as_ref()
            .map(|s| s.context().tsl_count())
            .unwrap_or(0),
        last_processed: snapshot.map(|s| s.processed_at()),
    })
}

#[derive(Serialize)]
struct InfoBody {
    tsl_summaries: Vec<TslSummary>,
}

#[derive(Serialize)]
struct TslSummary {
    territory: String,
    sequence: u64,
    #[serde(with = "time::serde::rfc3339::option")]
    issue_date: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    next_update: Option<OffsetDateTime>,
    service_count: usize,
    #[serde(rename = "type")]
    type_uri: String,
}

async fn info(State(state): State<Arc<AppState>>) -> Json<InfoBody> {
    let mut tsl_summaries = Vec::new();
    if let Some(snapshot) = state.publisher.current() {
        for tree in snapshot.context().trees() {
            for list in tree.flatten() {
                let scheme = list.scheme();
                tsl_summaries.push(TslSummary {
                    territory: scheme.territory().to_string(),
                    sequence: scheme.sequence_number(),
                    issue_date: scheme.issue_date(),
                    next_update: scheme.next_update(),
                    service_count: list.service_count(),
                    type_uri: scheme.type_uri().to_string(),
                });
            }
        }
    }
    Json(InfoBody { tsl_summaries })
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn ready(State(state): State<Arc<AppState>>) -> StatusCode {
    match state.publisher.current() {
        Some(snapshot) if !snapshot.context().pool().is_empty() => StatusCode::OK,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn evaluate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EvaluationRequest>,
) -> Response {
    if let Some(limiter) = &state.limiter {
        if !limiter.try_acquire() {
            return StatusCode::TOO_MANY_REQUESTS.into_response();
        }
    }

    let snapshot = state.publisher.current();
    let response = decide(snapshot.as_deref(), &request);
    debug!(decision = response.decision, "evaluated request");
    Json(response).into_response()
}
