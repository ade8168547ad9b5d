//! Reconcile cycles against an in-process fake of the inventory API.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use vitrine_core::{Product, SyncRunStatus};
use vitrine_db::{Database, DbConfig, SyncRunStats};
use vitrine_sync::config::ScheduleSettings;
use vitrine_sync::{CycleOutcome, Reconciler, SyncConfig, SyncError, SyncScheduler};

const API_KEY: &str = "test-key";

// =============================================================================
// Fake Upstream
// =============================================================================

#[derive(Default)]
struct FakeUpstream {
    groups: Vec<Value>,
    products: Vec<Value>,
    /// Remaining produtos requests answered with 503.
    product_failures: AtomicU32,
    /// (path, fields) of every authorized request.
    requests: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeUpstream {
    fn new(groups: Vec<Value>, products: Vec<Value>) -> Self {
        FakeUpstream {
            groups,
            products,
            ..Default::default()
        }
    }

    fn requests_to(&self, path: &str) -> Vec<Option<String>> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, fields)| fields.clone())
            .collect()
    }

    fn total_requests(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

type Params = HashMap<String, String>;

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == API_KEY)
}

fn window<'a>(records: &'a [Value], params: &Params) -> impl Iterator<Item = &'a Value> {
    let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let limit: usize = params.get("limit").and_then(|l| l.parse().ok()).unwrap_or(100);
    records.iter().skip((page.max(1) - 1) * limit).take(limit)
}

fn project(record: &Value, fields: Option<&String>) -> Value {
    let (Some(fields), Some(object)) = (fields, record.as_object()) else {
        return record.clone();
    };
    let keep: HashSet<&str> = fields.split(',').collect();
    Value::Object(
        object
            .iter()
            .filter(|(k, _)| keep.contains(k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    )
}

/// Products come back as `{data: {items, total}}`.
async fn produtos(
    State(upstream): State<Arc<FakeUpstream>>,
    headers: HeaderMap,
    Query(params): Query<Params>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let fields = params.get("fields").cloned();
    upstream
        .requests
        .lock()
        .unwrap()
        .push(("/v1/produtos".to_string(), fields.clone()));

    let failing = upstream
        .product_failures
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if failing {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    let items: Vec<Value> = window(&upstream.products, &params)
        .map(|r| project(r, fields.as_ref()))
        .collect();

    Json(json!({"data": {"items": items, "total": upstream.products.len()}})).into_response()
}

/// Groups come back as a bare array with no total.
async fn grupos(
    State(upstream): State<Arc<FakeUpstream>>,
    headers: HeaderMap,
    Query(params): Query<Params>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    upstream
        .requests
        .lock()
        .unwrap()
        .push(("/v1/grupos".to_string(), None));

    let items: Vec<Value> = window(&upstream.groups, &params).cloned().collect();
    Json(Value::Array(items)).into_response()
}

async fn serve(upstream: Arc<FakeUpstream>) -> String {
    let app = Router::new()
        .route("/v1/produtos", get(produtos))
        .route("/v1/grupos", get(grupos))
        .with_state(upstream);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

// =============================================================================
// Fixtures
// =============================================================================

fn group(code: &str, description: &str) -> Value {
    json!({"CODGRUPO": code, "DESCRICAO": description})
}

fn product(code: &str, name: &str, group: &str) -> Value {
    json!({
        "CODPRD": code,
        "NOMEFANTASIA": name,
        "PRECO2": 19.9,
        "PRECO1": "17,90",
        "CODGRUPO": group,
        "CODBARRAS": null
    })
}

fn default_groups() -> Vec<Value> {
    vec![group("1", "Cama, Mesa e Banho"), group("2", "Limpeza")]
}

fn config(base_url: &str) -> SyncConfig {
    let mut config = SyncConfig::default();
    config.upstream.base_url = Some(base_url.to_string());
    config.upstream.api_key = Some(API_KEY.to_string());
    config.retry.delay_ms = 10;
    config
}

async fn setup(upstream: FakeUpstream) -> (Arc<FakeUpstream>, Database, Reconciler) {
    let upstream = Arc::new(upstream);
    let base_url = serve(upstream.clone()).await;
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let reconciler = Reconciler::from_config(db.clone(), &config(&base_url)).unwrap();
    (upstream, db, reconciler)
}

async fn local_codes(db: &Database) -> HashSet<String> {
    db.products().codes().await.unwrap()
}

fn codes(list: &[&str]) -> HashSet<String> {
    list.iter().map(|c| c.to_string()).collect()
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_total_within_one_page_needs_one_request_per_pass() {
    let products: Vec<Value> = (1..=7)
        .map(|i| product(&format!("P{i}"), &format!("Toalha {i}"), "1"))
        .collect();
    let (upstream, db, reconciler) = setup(FakeUpstream::new(default_groups(), products)).await;

    let outcome = reconciler.run_cycle().await.unwrap();

    let CycleOutcome::Completed(report) = outcome else {
        panic!("cycle was skipped");
    };
    assert_eq!(report.remote_codes, 7);
    assert_eq!(report.products_upserted, 7);

    let product_requests = upstream.requests_to("/v1/produtos");
    assert_eq!(
        product_requests,
        vec![Some("CODPRD".to_string()), None],
        "one enumeration request and one full fetch"
    );
    // bare arrays carry no total: read until the empty page
    assert_eq!(upstream.requests_to("/v1/grupos").len(), 2);
    assert_eq!(db.products().count().await.unwrap(), 7);
}

#[tokio::test]
async fn test_reconcile_replaces_missing_and_adds_new() {
    let remote = vec![
        product("A", "Toalha de Banho", "1"),
        product("B", "Lençol Casal", "1"),
        product("C", "Vassoura", "2"),
    ];
    let (_upstream, db, reconciler) = setup(FakeUpstream::new(default_groups(), remote)).await;

    db.products()
        .upsert_batch(&[
            Product::new("A", "Toalha antiga"),
            Product::new("B", "Lençol"),
            Product::new("D", "Produto descontinuado"),
        ])
        .await
        .unwrap();

    let CycleOutcome::Completed(report) = reconciler.run_cycle().await.unwrap() else {
        panic!("cycle was skipped");
    };

    assert_eq!(local_codes(&db).await, codes(&["A", "B", "C"]));
    assert_eq!(report.products_deleted, 1);

    let a = db.products().get("A").await.unwrap().unwrap();
    assert_eq!(a.name, "Toalha de Banho");
    assert_eq!(a.price_regular_cents, 1990);
    assert_eq!(a.price_cash_cents, 1790);
    assert_eq!(a.group_description, "Cama, Mesa e Banho");

    let c = db.products().get("C").await.unwrap().unwrap();
    assert_eq!(c.group_description, "Limpeza");

    let last = db.sync_runs().last_completed().await.unwrap().unwrap();
    assert_eq!(last.products_deleted, 1);
    assert_eq!(last.products_upserted, 3);
}

#[tokio::test]
async fn test_second_cycle_leaves_catalog_unchanged() {
    let remote = vec![
        product("A", "Toalha de Banho", "1"),
        product("B", "Lençol Casal", "1"),
        product("C", "Vassoura", "2"),
    ];
    let (_upstream, db, reconciler) = setup(FakeUpstream::new(default_groups(), remote)).await;

    reconciler.run_cycle().await.unwrap();
    let first = db.products().all().await.unwrap();

    let CycleOutcome::Completed(report) = reconciler.run_cycle().await.unwrap() else {
        panic!("cycle was skipped");
    };
    let second = db.products().all().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(report.products_deleted, 0);
}

#[tokio::test]
async fn test_malformed_records_are_skipped() {
    let remote = vec![
        product("A", "Toalha de Banho", "1"),
        json!({"NOMEFANTASIA": "Sem código"}),
        json!("not an object"),
    ];
    let (_upstream, db, reconciler) = setup(FakeUpstream::new(default_groups(), remote)).await;

    let CycleOutcome::Completed(report) = reconciler.run_cycle().await.unwrap() else {
        panic!("cycle was skipped");
    };

    assert_eq!(report.records_skipped, 2);
    assert_eq!(local_codes(&db).await, codes(&["A"]));
}

#[tokio::test]
async fn test_exhausted_retries_fail_cycle_but_keep_groups() {
    let upstream = FakeUpstream::new(default_groups(), vec![product("A", "Toalha", "1")]);
    upstream.product_failures.store(u32::MAX, Ordering::SeqCst);
    let (upstream, db, reconciler) = setup(upstream).await;

    let err = reconciler.run_cycle().await.unwrap_err();

    assert!(matches!(err, SyncError::RetriesExhausted { attempts: 3, .. }));
    assert_eq!(upstream.requests_to("/v1/produtos").len(), 3);
    assert_eq!(db.groups().count().await.unwrap(), 2);
    assert_eq!(db.products().count().await.unwrap(), 0);

    let runs = db.sync_runs().recent(1).await.unwrap();
    assert_eq!(runs[0].status, SyncRunStatus::Failed);
    assert!(runs[0].error.is_some());

    // the lock was released: the next cycle runs (and fails) again
    assert!(reconciler.run_cycle().await.is_err());
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let upstream = FakeUpstream::new(default_groups(), vec![product("A", "Toalha", "1")]);
    upstream.product_failures.store(2, Ordering::SeqCst);
    let (_upstream, db, reconciler) = setup(upstream).await;

    let outcome = reconciler.run_cycle().await.unwrap();

    assert!(matches!(outcome, CycleOutcome::Completed(_)));
    assert_eq!(local_codes(&db).await, codes(&["A"]));
}

#[tokio::test]
async fn test_cycle_skipped_while_lock_is_held() {
    let (upstream, db, reconciler) =
        setup(FakeUpstream::new(default_groups(), vec![product("A", "Toalha", "1")])).await;

    let other = db.sync_lock();
    assert!(other.try_acquire().await.unwrap());

    assert_eq!(reconciler.run_cycle().await.unwrap(), CycleOutcome::Skipped);
    assert_eq!(upstream.total_requests(), 0);

    other.release().await.unwrap();
    assert!(matches!(
        reconciler.run_cycle().await.unwrap(),
        CycleOutcome::Completed(_)
    ));
}

#[tokio::test]
async fn test_missing_credentials_abort_before_any_request() {
    let upstream = Arc::new(FakeUpstream::new(default_groups(), vec![]));
    let base_url = serve(upstream.clone()).await;
    let db = Database::new(DbConfig::in_memory()).await.unwrap();

    let mut config = config(&base_url);
    config.upstream.api_key = None;
    let reconciler = Reconciler::from_config(db.clone(), &config).unwrap();

    let err = reconciler.run_cycle().await.unwrap_err();

    assert!(err.is_config_error());
    assert_eq!(upstream.total_requests(), 0);
    assert!(db.sync_runs().recent(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cycle_prunes_expired_history() {
    let (_upstream, db, reconciler) =
        setup(FakeUpstream::new(default_groups(), vec![product("A", "Toalha", "1")])).await;
    let reconciler = reconciler.with_history_retention_days(30);

    let expired = db.sync_runs().start().await.unwrap();
    db.sync_runs()
        .finish(&expired, &SyncRunStats::default())
        .await
        .unwrap();
    sqlx::query("UPDATE sync_runs SET started_at = ?1 WHERE id = ?2")
        .bind(chrono::Utc::now() - chrono::Duration::days(31))
        .bind(&expired)
        .execute(db.pool())
        .await
        .unwrap();

    reconciler.run_cycle().await.unwrap();

    let runs = db.sync_runs().recent(10).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_ne!(runs[0].id, expired);
    assert_eq!(runs[0].status, SyncRunStatus::Completed);
}

#[tokio::test]
async fn test_scheduler_runs_a_cycle_on_start() {
    let (_upstream, db, reconciler) =
        setup(FakeUpstream::new(default_groups(), vec![product("A", "Toalha", "1")])).await;

    let settings = ScheduleSettings {
        interval_secs: 3600,
        run_on_start: true,
        ..Default::default()
    };
    let handle = SyncScheduler::new(Arc::new(reconciler), &settings).spawn();

    let mut synced = false;
    for _ in 0..100 {
        if db.sync_runs().last_completed().await.unwrap().is_some() {
            synced = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    handle.shutdown().await;
    assert!(synced, "no cycle completed within 5s");
    assert_eq!(local_codes(&db).await, codes(&["A"]));
}
