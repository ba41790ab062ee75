// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Axum router and handlers.
//!
//! | Route                             | Method | Body                                |
//! |-----------------------------------|--------|-------------------------------------|
//! | `/status`                         | GET    | `{"id", "left"?, "right"?}`         |
//! | `/{side}/status`                  | GET    | `{"on", "level", "bed_temperature"}`|
//! | `/{side}/on`, `/{side}/off`       | PUT    | `{"status": "ok"}`                  |
//! | `/{side}/temperature?level=N`     | PUT    | `{"status": "ok", "level": N}`      |

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use super::error::ApiError;
use crate::adapter::{Command, execute_command};
use crate::backend::BackendApi;
use crate::error::ValidationError;
use crate::manager::StateManager;
use crate::state::UserState;
use crate::types::{Level, Side};

/// Full device status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Device identifier.
    pub id: String,
    /// Left side, if a user is assigned.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub left: Option<SideStatus>,
    /// Right side, if a user is assigned.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub right: Option<SideStatus>,
}

/// Status of one side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideStatus {
    /// Side is heating or cooling.
    pub on: bool,
    /// Target level.
    pub level: i32,
    /// Bed temperature in degrees Celsius.
    pub bed_temperature: f64,
}

impl From<&UserState> for SideStatus {
    fn from(user: &UserState) -> Self {
        Self {
            on: user.is_on(),
            level: user.target_level(),
            bed_temperature: user.bed_temperature(),
        }
    }
}

#[derive(Debug, Serialize)]
struct OkResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    level: Option<i32>,
}

impl OkResponse {
    fn ok() -> Json<Self> {
        Json(Self {
            status: "ok",
            level: None,
        })
    }

    fn with_level(level: i32) -> Json<Self> {
        Json(Self {
            status: "ok",
            level: Some(level),
        })
    }
}

/// Builds the hub router over `manager`.
pub(crate) fn router<B: BackendApi + 'static>(manager: Arc<StateManager<B>>) -> Router {
    Router::new()
        .route("/status", get(status::<B>).fallback(method_not_allowed))
        .route(
            "/{side}/status",
            get(side_status::<B>).fallback(method_not_allowed),
        )
        .route("/{side}/on", put(side_on::<B>).fallback(method_not_allowed))
        .route("/{side}/off", put(side_off::<B>).fallback(method_not_allowed))
        .route(
            "/{side}/temperature",
            put(side_temperature::<B>).fallback(method_not_allowed),
        )
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(manager)
}

/// Only the exact lowercase side names are routed.
fn parse_side(segment: &str) -> Result<Side, ApiError> {
    match segment {
        "left" => Ok(Side::Left),
        "right" => Ok(Side::Right),
        _ => Err(ApiError::NotFound("not found".to_string())),
    }
}

/// First `level` value of the query string, if any.
fn level_param(
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Option<String>, ApiError> {
    let Query(pairs) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    Ok(pairs
        .into_iter()
        .find_map(|(key, value)| (key == "level").then_some(value)))
}

/// Validates the `level` query parameter.
fn parse_level(raw: Option<&str>) -> Result<i32, ApiError> {
    let raw = raw.unwrap_or_default();
    if raw.is_empty() {
        return Err(ApiError::BadRequest("level parameter required".to_string()));
    }
    let level: i32 = raw.trim().parse().map_err(|_| {
        ApiError::BadRequest(ValidationError::InvalidLevel(raw.to_string()).to_string())
    })?;
    Level::new(level).map_err(|_| {
        ApiError::BadRequest("invalid level: must be between -100 and 100".to_string())
    })?;
    Ok(level)
}

async fn status<B: BackendApi>(
    State(manager): State<Arc<StateManager<B>>>,
) -> Result<Json<StatusResponse>, ApiError> {
    let state = manager
        .get_state()
        .await
        .map_err(|e| ApiError::Internal(format!("failed to get state: {e}")))?;

    Ok(Json(StatusResponse {
        id: state.id().to_string(),
        left: state.left().map(SideStatus::from),
        right: state.right().map(SideStatus::from),
    }))
}

async fn side_status<B: BackendApi>(
    State(manager): State<Arc<StateManager<B>>>,
    Path(side): Path<String>,
) -> Result<Json<SideStatus>, ApiError> {
    let side = parse_side(&side)?;
    let state = manager
        .get_state()
        .await
        .map_err(|e| ApiError::Internal(format!("failed to get state: {e}")))?;

    state
        .user(side)
        .map(|user| Json(SideStatus::from(user)))
        .ok_or_else(|| ApiError::NotFound(format!("no user assigned to {side} side")))
}

async fn side_on<B: BackendApi>(
    State(manager): State<Arc<StateManager<B>>>,
    Path(side): Path<String>,
) -> Result<Json<OkResponse>, ApiError> {
    let side = parse_side(&side)?;
    execute_command(&manager, Command::on(side))
        .await
        .map_err(|e| ApiError::Internal(format!("failed to turn on: {e}")))?;
    Ok(OkResponse::ok())
}

async fn side_off<B: BackendApi>(
    State(manager): State<Arc<StateManager<B>>>,
    Path(side): Path<String>,
) -> Result<Json<OkResponse>, ApiError> {
    let side = parse_side(&side)?;
    execute_command(&manager, Command::off(side))
        .await
        .map_err(|e| ApiError::Internal(format!("failed to turn off: {e}")))?;
    Ok(OkResponse::ok())
}

async fn side_temperature<B: BackendApi>(
    State(manager): State<Arc<StateManager<B>>>,
    Path(side): Path<String>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let side = parse_side(&side)?;
    let level = parse_level(level_param(query)?.as_deref())?;
    execute_command(&manager, Command::set_temperature(side, level))
        .await
        .map_err(|e| ApiError::Internal(format!("failed to set temperature: {e}")))?;
    Ok(OkResponse::with_level(level))
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn not_found() -> ApiError {
    ApiError::NotFound("not found".to_string())
}
