//! Health, summary and reload

use axum::extract::State;
use axum::Json;
use marsdash_core::LedgerSummary;
use serde_json::Value;

use crate::error::ApiResult;
use crate::AppState;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn api_summary(State(state): State<AppState>) -> Json<LedgerSummary> {
    let ledger = state.ledger.read().await;
    Json(ledger.summary())
}

pub async fn api_reload(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let mut ledger = state.ledger.write().await;
    ledger.reload().await?;
    let summary = ledger.summary();
    log::info!("Ledger reloaded: {} postings", summary.postings);
    Ok(Json(serde_json::json!({ "success": true, "summary": summary })))
}
