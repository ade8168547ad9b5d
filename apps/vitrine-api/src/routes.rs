//! HTTP routes.
//!
//! | Method | Path         | Auth        | Description                       |
//! |--------|--------------|-------------|-----------------------------------|
//! | GET    | `/health`    | none        | Liveness, catalog size, last sync |
//! | GET    | `/tools`     | none        | Tool catalog                      |
//! | POST   | `/tool_call` | `X-API-KEY` | Invoke a tool (`search_products`) |

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use vitrine_core::validation::validate_search_query;
use vitrine_core::SearchRequest;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Header carrying the caller's API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// The only tool this service exposes.
pub const SEARCH_TOOL: &str = "search_products";

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tools", get(tools))
        .route("/tool_call", post(tool_call))
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let mut body = json!({ "status": "ok" });

    match state.db.sync_runs().last_completed().await {
        Ok(Some(run)) => {
            let at = run.finished_at.unwrap_or(run.started_at);
            body["lastSync"] = Value::String(at.to_rfc3339());
        }
        Ok(None) => {}
        Err(err) => warn!(error = %err, "Could not read sync history"),
    }

    match state.db.products().count().await {
        Ok(count) => body["productCount"] = json!(count),
        Err(err) => warn!(error = %err, "Could not count products"),
    }

    Json(body)
}

// =============================================================================
// Tool Catalog
// =============================================================================

/// JSON description of the tools, in the shape agents expect.
pub fn tool_catalog() -> Value {
    json!({
        "tools": [
            {
                "name": SEARCH_TOOL,
                "description": "Busca produtos por nome, código ou código de barras. Retorna 3 por página.",
                "input_schema": {
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "Termo de busca"
                        },
                        "page": {
                            "type": "integer",
                            "description": "Página (1, 2, 3...)",
                            "default": 1
                        },
                        "user_id": {
                            "type": "string",
                            "description": "ID do usuário",
                            "default": "default"
                        }
                    },
                    "required": ["query"]
                }
            }
        ]
    })
}

async fn tools() -> Json<Value> {
    Json(tool_catalog())
}

// =============================================================================
// Tool Call
// =============================================================================

/// Body of `POST /tool_call`.
#[derive(Debug, Deserialize)]
pub struct ToolCallRequest {
    pub tool_name: String,

    #[serde(default)]
    pub params: Value,

    #[serde(default = "default_user_id")]
    pub user_id: String,
}

fn default_user_id() -> String {
    "default".to_string()
}

/// Checks the caller's key against the configured one.
///
/// With no key configured every call is refused.
fn authorize(headers: &HeaderMap, expected: Option<&str>) -> ApiResult<()> {
    let Some(provided) = headers.get(API_KEY_HEADER) else {
        return Err(ApiError::Forbidden("Not authenticated".to_string()));
    };

    match expected {
        Some(expected) if provided.as_bytes() == expected.as_bytes() => Ok(()),
        _ => Err(ApiError::Forbidden(
            "Could not validate credentials".to_string(),
        )),
    }
}

async fn tool_call(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(call): Json<ToolCallRequest>,
) -> ApiResult<Json<Value>> {
    authorize(&headers, state.api_key.as_deref())?;

    if call.tool_name != SEARCH_TOOL {
        return Err(ApiError::NotFound("Ferramenta não encontrada".to_string()));
    }

    let params = if call.params.is_null() {
        SearchRequest::default()
    } else {
        serde_json::from_value::<SearchRequest>(call.params)
            .map_err(|err| ApiError::Validation(format!("Invalid params: {err}")))?
    };

    let request = SearchRequest {
        query: validate_search_query(&params.query)?,
        page: params.page,
    };

    info!(
        user_id = %call.user_id,
        query = %request.query,
        page = ?request.page,
        "search_products called"
    );

    let response = state.search.search(&request).await;
    Ok(Json(json!({ "tools": [response] })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;
    use vitrine_core::{Money, Product, ScoringParams};
    use vitrine_db::{Database, DbConfig, SyncRunStats};

    use crate::search::CatalogSearch;

    const KEY: &str = "test-key";

    async fn test_router() -> (Router, Database) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products()
            .upsert_batch(&[
                Product::new("10", "Toalha de Banho")
                    .with_prices(Money::from_cents(4990), Money::from_cents(4490)),
                Product::new("11", "Lençol Casal"),
            ])
            .await
            .unwrap();

        let state = Arc::new(AppState {
            search: CatalogSearch::new(db.clone(), ScoringParams::default()),
            db: db.clone(),
            api_key: Some(KEY.to_string()),
        });
        (router(state), db)
    }

    async fn call(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn tool_call_request(key: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/tool_call")
            .header("content-type", "application/json");
        if let Some(key) = key {
            builder = builder.header("X-API-KEY", key);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (router, _db) = test_router().await;

        let (status, body) = call(&router, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok", "productCount": 2 }));
    }

    #[tokio::test]
    async fn test_health_reports_last_sync() {
        let (router, db) = test_router().await;
        let id = db.sync_runs().start().await.unwrap();
        db.sync_runs()
            .finish(&id, &SyncRunStats::default())
            .await
            .unwrap();

        let (_, body) = call(&router, get("/health")).await;
        assert_eq!(body["status"], "ok");
        assert!(body["lastSync"].is_string());
        assert_eq!(body["productCount"], 2);
    }

    #[tokio::test]
    async fn test_tools_lists_search_products() {
        let (router, _db) = test_router().await;

        let (status, body) = call(&router, get("/tools")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tools"][0]["name"], SEARCH_TOOL);
        assert_eq!(body["tools"][0]["input_schema"]["required"], json!(["query"]));
    }

    #[tokio::test]
    async fn test_missing_key_is_forbidden() {
        let (router, _db) = test_router().await;
        let body = json!({ "tool_name": SEARCH_TOOL, "params": { "query": "toalha" } });

        let (status, body) = call(&router, tool_call_request(None, body)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["detail"], "Not authenticated");
    }

    #[tokio::test]
    async fn test_wrong_key_is_forbidden() {
        let (router, _db) = test_router().await;
        let body = json!({ "tool_name": SEARCH_TOOL, "params": { "query": "toalha" } });

        let (status, body) = call(&router, tool_call_request(Some("nope"), body)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["detail"], "Could not validate credentials");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_not_found() {
        let (router, _db) = test_router().await;
        let body = json!({ "tool_name": "delete_everything", "params": {} });

        let (status, body) = call(&router, tool_call_request(Some(KEY), body)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Ferramenta não encontrada");
    }

    #[tokio::test]
    async fn test_search_returns_camel_case_page() {
        let (router, _db) = test_router().await;
        let body = json!({
            "tool_name": SEARCH_TOOL,
            "params": { "query": "toalhas", "page": 1 },
            "user_id": "5511999990000"
        });

        let (status, body) = call(&router, tool_call_request(Some(KEY), body)).await;
        assert_eq!(status, StatusCode::OK);

        let result = &body["tools"][0];
        assert_eq!(result["page"], 1);
        assert_eq!(result["hasMore"], false);
        assert_eq!(result["items"][0]["code"], "10");
        assert_eq!(result["items"][0]["name"], "Toalha de Banho");
        assert_eq!(result["items"][0]["priceCash"], 44.9);
        assert!(result.get("error").is_none());
    }

    #[tokio::test]
    async fn test_empty_query_returns_empty_page() {
        let (router, _db) = test_router().await;
        let body = json!({ "tool_name": SEARCH_TOOL, "params": { "query": "" } });

        let (status, body) = call(&router, tool_call_request(Some(KEY), body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["tools"][0],
            json!({ "items": [], "page": 1, "hasMore": false })
        );
    }

    #[tokio::test]
    async fn test_overlong_query_is_rejected() {
        let (router, _db) = test_router().await;
        let body = json!({ "tool_name": SEARCH_TOOL, "params": { "query": "a".repeat(201) } });

        let (status, _) = call(&router, tool_call_request(Some(KEY), body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
