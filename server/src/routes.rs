//! HTTP routes
//!
//! `POST /search` hands the raw body and the `flags`/`profile` query
//! parameters to the dispatcher; `GET /health` reports engine readiness.
//! Every error answer is a JSON `{"error": ...}` object.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use sz_search_core::DispatchResponse;

use crate::state::AppState;

/// Query-string options accepted by `/search`
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    /// Pipe-separated flag names
    pub flags: Option<String>,
    /// Search profile name
    pub profile: Option<String>,
}

/// Build the service router
///
/// Bodies larger than `state.max_body_bytes` are refused with a JSON 413.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/search", post(search).fallback(method_not_allowed))
        .route("/health", get(health).fallback(method_not_allowed))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .with_state(state)
}

async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => {
            return json_response(DispatchResponse::error(400, &rejection.body_text()));
        }
    };

    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::debug!(status = %rejection.status(), "Rejecting search body");
            return json_response(DispatchResponse::error(
                rejection.status().as_u16(),
                &rejection.body_text(),
            ));
        }
    };

    let dispatcher = Arc::clone(&state.dispatcher);
    let handled = tokio::spawn(async move {
        dispatcher
            .handle(&body, params.flags.as_deref(), params.profile.as_deref())
            .await
    })
    .await;

    let response = match handled {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Search request failed unexpectedly");
            DispatchResponse::error(500, "internal server error")
        }
    };
    json_response(response)
}

async fn health(State(state): State<AppState>) -> Response {
    let report = state.dispatcher.health().await;
    let status = StatusCode::from_u16(report.http_status()).unwrap_or(StatusCode::SERVICE_UNAVAILABLE);
    (status, Json(report)).into_response()
}

async fn not_found() -> Response {
    json_response(DispatchResponse::error(404, "not found"))
}

async fn method_not_allowed() -> Response {
    json_response(DispatchResponse::error(405, "method not allowed"))
}

fn json_response(response: DispatchResponse) -> Response {
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        response.body,
    )
        .into_response()
}
