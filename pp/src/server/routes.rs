//! API routes

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tracing::{Instrument, debug, info, info_span};
use uuid::Uuid;

use super::AppState;
use super::error::ApiError;
use crate::dosing::{self, DosingRequest, DosingResult};
use crate::plan::{DiagnoseOutcome, DiagnoseRequest};

type AppStateArc = Arc<AppState>;

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/api/v1/healthz", get(health))
}

pub fn calculator_routes() -> Router<AppStateArc> {
    Router::new().route("/api/v1/calculator/dose", post(dose))
}

pub fn diagnose_routes() -> Router<AppStateArc> {
    Router::new().route("/api/v1/diagnose", post(diagnose))
}

async fn health() -> Json<Value> {
    debug!("health: called");
    Json(json!({ "status": "ok" }))
}

// Bodies are decoded by hand so every malformed body is a 400 with a JSON
// error, whatever the content-type says.
async fn dose(body: Bytes) -> Result<Json<DosingResult>, ApiError> {
    debug!(body_len = body.len(), "dose: called");
    let request: DosingRequest = serde_json::from_slice(&body)?;
    let result = dosing::calculate(&request);
    info!(
        doses = result.doses.len(),
        confidence = %result.confidence,
        "Dosing calculated"
    );
    Ok(Json(result))
}

async fn diagnose(State(state): State<AppStateArc>, body: Bytes) -> Result<Json<DiagnoseOutcome>, ApiError> {
    debug!(body_len = body.len(), "diagnose: called");
    let request: DiagnoseRequest = serde_json::from_slice(&body)?;

    let span = info_span!("diagnose", request_id = %Uuid::now_v7(), pool_id = %request.pool_id);
    async move {
        let outcome = state.orchestrator.produce(&request).await?;
        info!(
            source = %outcome.source,
            warning = outcome.warning.is_some(),
            "Diagnose completed"
        );
        Ok::<_, ApiError>(Json(outcome))
    }
    .instrument(span)
    .await
}
