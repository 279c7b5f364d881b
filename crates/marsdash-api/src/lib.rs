//! JSON HTTP API for the balance dashboard
//!
//! Routes are organized into modules:
//! - routes::dashboard: grid snapshot and default range
//! - routes::overrides: user annotations
//! - routes::balances: account balances
//! - routes::system: health, summary and reload

pub mod error;
pub mod routes;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use marsdash_config::Config;
use marsdash_core::{Ledger, OverlayRef};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};

pub use error::{ApiError, ApiResult};

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<RwLock<Ledger>>,
    pub overlay: OverlayRef,
    pub config: Config,
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    CorsLayer::new().allow_origin(origins).allow_methods(Any).allow_headers(Any)
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    use routes::balances::api_balance;
    use routes::dashboard::{api_data, api_default_range};
    use routes::overrides::{api_save_override, api_user_transactions};
    use routes::system::{api_reload, api_summary, health_check};

    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/data", get(api_data))
        .route("/api/default_range", get(api_default_range))
        .route("/api/user_transactions", get(api_user_transactions).post(api_save_override))
        .route("/api/balance", get(api_balance))
        .route("/api/summary", get(api_summary))
        .route("/api/reload", post(api_reload))
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}

/// Start the HTTP server and serve until Ctrl-C
pub async fn start_server(config: Config, ledger: Arc<RwLock<Ledger>>, overlay: OverlayRef) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState { ledger, overlay, config };

    let router = create_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", addr, e))?;
    log::info!("Starting marsdash server on http://{}", addr);
    log::info!("Routes: /api/data, /api/default_range, /api/user_transactions, /api/balance, /api/summary, /api/reload");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Server stopped gracefully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use marsdash_core::JsonlOverlayLog;
    use marsdash_parser::DefaultBeancountParser;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const SOURCE: &str = r#"
2024-01-01 open Assets:Checking:Main USD

2024-01-01 * "Opening"
  Assets:Checking:Main   100.00 USD
  Equity:Opening

2024-01-03 * "Employer Inc" "Salary"
  Assets:Checking:Main   50.00 USD
  Income:Salary

2024-02-15 * "Grocer" "food"
  Assets:Checking:Main   -20.00 USD
  Expenses:Food
"#;

    async fn state(dir: &tempfile::TempDir) -> AppState {
        let config = Config::default();
        let mut ledger = Ledger::new(&config, Arc::new(DefaultBeancountParser));
        ledger.load_source(SOURCE).await.unwrap();
        AppState {
            ledger: Arc::new(RwLock::new(ledger)),
            overlay: Arc::new(JsonlOverlayLog::new(dir.path().join("user_transactions.jsonl"))),
            config,
        }
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let response = create_router(state(&dir).await).oneshot(get("/api/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_data_returns_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(
            create_router(state(&dir).await),
            get("/api/data?start_date=2024-01-01&end_date=2024-01-04"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["accounts"], json!(["Assets:Checking:Main"]));
        let balances: Vec<&Value> = body["rows"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| &r["Assets:Checking:Main"]["balance"])
            .collect();
        assert_eq!(balances, vec!["100.00", "100.00", "150.00", "150.00"]);
        assert_eq!(body["rows"][2]["Assets:Checking:Main"]["description"], json!("Employer Inc"));
    }

    #[tokio::test]
    async fn test_data_without_range_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(create_router(state(&dir).await), get("/api/data")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"accounts": [], "rows": [], "user_transactions": []}));
    }

    #[tokio::test]
    async fn test_data_rejects_reversed_range() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(
            create_router(state(&dir).await),
            get("/api/data?start_date=2024-01-05&end_date=2024-01-01"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], json!("INVALID_RANGE"));
    }

    #[tokio::test]
    async fn test_default_range() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(create_router(state(&dir).await), get("/api/default_range")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"start_date": "2024-02-16", "end_date": "2024-02-29"}));
    }

    #[tokio::test]
    async fn test_save_and_list_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let router = create_router(state(&dir).await);

        let (status, _) = send(
            router.clone(),
            post_json(
                "/api/user_transactions",
                json!({"date": "2024-01-01", "account": "A", "transaction": "50"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = send(
            router.clone(),
            post_json(
                "/api/user_transactions",
                json!({"date": "2024-01-01", "account": "A", "format": {"transaction": {"underline": true}}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["field"], json!("format.transaction.underline"));

        let (status, body) = send(router.clone(), get("/api/user_transactions")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([{"date": "2024-01-01", "account": "A", "transaction": "50", "description": ""}])
        );

        let (_, body) = send(router, get("/api/data?start_date=2024-01-01&end_date=2024-01-01")).await;
        assert_eq!(body["user_transactions"][0]["transaction"], json!("50"));
    }

    #[tokio::test]
    async fn test_save_rejects_non_json_body() {
        let dir = tempfile::tempdir().unwrap();
        let request = Request::builder()
            .method("POST")
            .uri("/api/user_transactions")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(create_router(state(&dir).await), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], json!("VALIDATION_ERROR"));
    }

    #[tokio::test]
    async fn test_balance() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(
            create_router(state(&dir).await),
            get("/api/balance?account=checking&as_of=2024-01-02"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"Assets:Checking:Main": "100.00"}));
    }

    #[tokio::test]
    async fn test_summary_and_reload_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let router = create_router(state(&dir).await);
        let (status, body) = send(router.clone(), get("/api/summary")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["postings"], json!(6));

        // Loaded from text, so there is no file to reload from
        let (status, body) = send(router, Request::builder().method("POST").uri("/api/reload").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], json!("NOT_LOADED"));
    }

    #[tokio::test]
    async fn test_empty_ledger_has_no_default_range() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state(&dir).await;
        let config = Config::default();
        let mut empty = Ledger::new(&config, Arc::new(DefaultBeancountParser));
        empty.load_source("").await.unwrap();
        state.ledger = Arc::new(RwLock::new(empty));
        let (status, body) = send(create_router(state), get("/api/default_range")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], json!("NO_TRANSACTIONS"));
    }
}
