//! Account balance lookup

use axum::extract::{Query, State};
use axum::Json;
use marsdash_core::{account_balances, parse_date, Money};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct BalanceParams {
    /// Case-insensitive substring of the account name
    #[serde(default)]
    pub account: String,
    pub as_of: Option<String>,
}

pub async fn api_balance(
    State(state): State<AppState>,
    Query(params): Query<BalanceParams>,
) -> ApiResult<Json<BTreeMap<String, Money>>> {
    let as_of = match params.as_of.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(raw) => Some(parse_date(raw)?),
        None => None,
    };
    let ledger = state.ledger.read().await;
    Ok(Json(account_balances(&*ledger, &params.account, as_of)?))
}
