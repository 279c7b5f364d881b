//! Dashboard grid endpoints

use axum::extract::{Query, State};
use axum::Json;
use marsdash_core::{default_range, get_snapshot, DateRange, Snapshot};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RangeParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

pub async fn api_data(State(state): State<AppState>, Query(params): Query<RangeParams>) -> ApiResult<Json<Snapshot>> {
    let ledger = state.ledger.read().await;
    let snapshot = get_snapshot(
        &*ledger,
        state.overlay.as_ref(),
        params.start_date.as_deref(),
        params.end_date.as_deref(),
        &state.config.dashboard,
    )
    .await?;
    Ok(Json(snapshot))
}

pub async fn api_default_range(State(state): State<AppState>) -> ApiResult<Json<DateRange>> {
    let ledger = state.ledger.read().await;
    Ok(Json(default_range(&*ledger)?))
}
