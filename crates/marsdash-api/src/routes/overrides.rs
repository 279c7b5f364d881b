//! Annotation endpoints

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use marsdash_core::{save_override, user_transactions, CoreError, OverrideRecord};
use serde_json::Value;

use crate::error::ApiResult;
use crate::AppState;

pub async fn api_save_override(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(value) = payload.map_err(|rejection| CoreError::validation("body", rejection.body_text()))?;
    let record = save_override(state.overlay.as_ref(), &value).await?;
    Ok(Json(serde_json::json!({ "success": true, "record": record })))
}

pub async fn api_user_transactions(State(state): State<AppState>) -> ApiResult<Json<Vec<OverrideRecord>>> {
    Ok(Json(user_transactions(state.overlay.as_ref()).await?))
}
