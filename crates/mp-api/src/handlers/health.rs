use std::sync::atomic::Ordering;

use axum::{Json, extract::State};
use mp_common::run_id;
use serde_json::json;

use crate::SharedState;
use crate::error::ApiError;

pub async fn livez() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Ready until shutdown starts. Scoring has no external dependency to probe.
pub async fn readyz(State(state): State<SharedState>) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.readiness.load(Ordering::SeqCst) {
        return Err(ApiError::ServiceUnavailable("shutting_down".into()));
    }

    Ok(Json(json!({
        "status": "ok",
        "application": env!("CARGO_PKG_NAME"),
        "embedder": state.embedder.name(),
        "run_id": run_id::get(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn readyz_reports_the_embedder() {
        let state = crate::test_state("k");

        let Json(body) = readyz(State(state)).await.unwrap();

        assert_eq!(body["status"], "ok");
        assert_eq!(body["embedder"], "hash");
    }

    #[tokio::test]
    async fn readyz_rejects_while_shutting_down() {
        let state = crate::test_state("k");
        state.readiness.store(false, Ordering::SeqCst);

        match readyz(State(state)).await {
            Err(ApiError::ServiceUnavailable(code)) => assert_eq!(code, "shutting_down"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
