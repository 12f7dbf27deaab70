//! Store failures surface over HTTP with the exact unapplied tail.
//!
//! Uses the in-memory catalog's order store with failure injection
//! (`folio-order` `testkit` feature).

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use folio_config::OrderingConfig;
use folio_daemon::catalog::MemoryCatalog;
use folio_daemon::{routes, state};
use folio_order::StoreErrorKind;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

const TOKEN: &str = "test-admin-token";

async fn call(st: &Arc<state::AppState>, req: Request<Body>) -> (StatusCode, Value) {
    let resp = routes::build_router(Arc::clone(st))
        .oneshot(req)
        .await
        .expect("oneshot failed");
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

fn admin(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {TOKEN}"))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn seeded(n: usize) -> (Arc<state::AppState>, Arc<MemoryCatalog>) {
    let catalog = Arc::new(MemoryCatalog::new(OrderingConfig::default()));
    let st = Arc::new(state::AppState::new(
        catalog.clone(),
        Some(TOKEN.to_string()),
    ));
    for i in 0..n {
        let (status, _) = call(
            &st,
            admin("POST", "/api/artworks", json!({ "title": format!("T{i}") })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    (st, catalog)
}

#[tokio::test]
async fn kth_write_failure_is_500_with_unapplied_ids() {
    let (st, catalog) = seeded(4).await;
    // Inserting at 1 rewrites ids 1..=4 to 2..=5, in that sequence.
    catalog
        .order_store()
        .fail_on_write(2, StoreErrorKind::Rejected);

    let (status, json) = call(
        &st,
        admin("POST", "/api/artworks", json!({"title": "New", "order": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "PARTIAL_FAILURE");
    assert_eq!(json["unappliedIds"], json!([2, 3, 4]));
}

#[tokio::test]
async fn reorder_to_missing_id_reports_tail() {
    let (st, _catalog) = seeded(2).await;
    let body = json!({"items": [
        {"id": 2, "order": 1},
        {"id": 42, "order": 2},
        {"id": 1, "order": 3}
    ]});
    let (status, json) = call(&st, admin("POST", "/api/artworks/reorder", body)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "PARTIAL_FAILURE");
    assert_eq!(json["unappliedIds"], json!([42, 1]));
}

#[tokio::test]
async fn snapshot_failure_is_503() {
    let (st, catalog) = seeded(1).await;
    catalog.order_store().fail_reads(StoreErrorKind::Unavailable);

    let (status, json) = call(
        &st,
        admin("POST", "/api/artworks", json!({"title": "New"})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "STORE_UNAVAILABLE");
}

#[tokio::test]
async fn rejected_snapshot_query_is_500_not_503() {
    let (st, catalog) = seeded(1).await;
    catalog.order_store().fail_reads(StoreErrorKind::Rejected);

    let (status, json) = call(
        &st,
        admin("POST", "/api/artworks", json!({"title": "New"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL");
}

#[tokio::test]
async fn append_after_trusted_max_order_is_400() {
    let (st, _catalog) = seeded(2).await;
    let body = json!({"items": [{"id": 2, "order": i32::MAX}]});
    let (status, _) = call(&st, admin("POST", "/api/artworks/reorder", body)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = call(
        &st,
        admin("POST", "/api/artworks", json!({"title": "Late"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION");

    let (_, list) = call(
        &st,
        Request::builder()
            .uri("/api/artworks")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(list.as_array().map(Vec::len), Some(2));
}
