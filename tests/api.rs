//! End-to-end tests against the full router, bearer middleware included.

use axum::http::{header, HeaderValue, StatusCode};
use axum_test::TestServer;
use chrono::{Datelike, Utc};
use serde_json::{json, Value};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use pos_sync_server::config::{AuthConfig, Config, DatabaseConfig, ServerConfig};
use pos_sync_server::{db, routes, state::AppState};

const TOKEN: &str = "test-sync-token";

fn auth_header() -> HeaderValue {
    HeaderValue::from_static("Bearer test-sync-token")
}

fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseConfig {
            url: ":memory:".to_string(),
        },
        auth: AuthConfig {
            token: TOKEN.to_string(),
        },
    }
}

/// Router over a fresh in-memory database; the pool is returned too so
/// tests can assert on rows the API does not expose.
async fn spawn() -> (TestServer, SqlitePool) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .unwrap();
    db::init_schema(&pool).await.unwrap();

    let app = routes::app(AppState::new(pool.clone(), test_config()));
    (TestServer::new(app).unwrap(), pool)
}

fn order_item(entity_uuid: &str, total: f64) -> Value {
    json!({
        "outbox_id": 1,
        "entity_type": "order",
        "entity_uuid": entity_uuid,
        "operation": "create",
        "payload": {
            "order": {
                "customer": "Walk-in",
                "subtotal": total,
                "total": total,
                "status": "completed"
            },
            "items": [
                {"product_name": "Americano", "qty": 1.0, "unit_price": total, "line_total": total}
            ],
            "payments": [
                {"method": "cash", "amount": total}
            ]
        }
    })
}

#[tokio::test]
async fn health_is_open() {
    let (server, _pool) = spawn().await;

    let res = server.get("/health").await;
    res.assert_status_ok();

    let body: Value = res.json();
    assert_eq!(body["status"], "ok");
    assert!(body["server_time"].as_str().is_some());
}

#[tokio::test]
async fn missing_or_wrong_token_is_rejected() {
    let (server, _pool) = spawn().await;

    let res = server.post("/sync/push").json(&json!({"batch": []})).await;
    res.assert_status(StatusCode::UNAUTHORIZED);

    let res = server
        .get("/admin/summary")
        .add_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer nope"))
        .await;
    res.assert_status(StatusCode::UNAUTHORIZED);

    let res = server
        .get("/catalog/pull")
        .add_header(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"))
        .await;
    res.assert_status(StatusCode::UNAUTHORIZED);

    // Whitespace padding around an otherwise correct token is not accepted
    let res = server
        .get("/admin/summary")
        .add_header(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer  test-sync-token "),
        )
        .await;
    res.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn order_push_assigns_receipt_and_appears_in_listing() {
    let (server, _pool) = spawn().await;

    let res = server
        .post("/sync/push")
        .add_header(header::AUTHORIZATION, auth_header())
        .json(&json!({"device_id": "term-1", "batch": [order_item("c-order-1", 4.50)]}))
        .await;
    res.assert_status_ok();

    let body: Value = res.json();
    assert_eq!(body["failed"].as_array().unwrap().len(), 0);

    let processed = &body["processed"][0];
    assert_eq!(processed["status"], "ok");
    assert_eq!(processed["entity_uuid"], "c-order-1");
    assert!(processed["server_id"].as_str().unwrap().starts_with("ORD-"));
    assert!(processed.get("duplicate").is_none());

    let res = server
        .get("/admin/orders")
        .add_header(header::AUTHORIZATION, auth_header())
        .await;
    res.assert_status_ok();

    let listing: Value = res.json();
    assert_eq!(listing["total"], 1);

    let order = &listing["orders"][0];
    let expected_receipt = format!("POS-{}-00001", Utc::now().year());
    assert_eq!(order["receipt_number"], expected_receipt.as_str());
    assert_eq!(order["items"].as_array().unwrap().len(), 1);
    assert_eq!(order["payments"].as_array().unwrap().len(), 1);
    assert_eq!(order["payments"][0]["method"], "cash");
}

#[tokio::test]
async fn replayed_batch_is_idempotent() {
    let (server, _pool) = spawn().await;

    let batch = json!({"batch": [order_item("c-order-1", 12.0)]});

    let first: Value = server
        .post("/sync/push")
        .add_header(header::AUTHORIZATION, auth_header())
        .json(&batch)
        .await
        .json();
    let second: Value = server
        .post("/sync/push")
        .add_header(header::AUTHORIZATION, auth_header())
        .json(&batch)
        .await
        .json();

    assert_eq!(second["processed"][0]["duplicate"], true);
    assert_eq!(
        second["processed"][0]["server_id"],
        first["processed"][0]["server_id"]
    );

    let listing: Value = server
        .get("/admin/orders")
        .add_header(header::AUTHORIZATION, auth_header())
        .await
        .json();
    assert_eq!(listing["total"], 1);
}

#[tokio::test]
async fn failed_item_does_not_abort_its_siblings() {
    let (server, _pool) = spawn().await;

    let res = server
        .post("/sync/push")
        .add_header(header::AUTHORIZATION, auth_header())
        .json(&json!({"batch": [
            {
                "outbox_id": 10,
                "entity_type": "cash_event",
                "entity_uuid": "c-cash-1",
                "operation": "create",
                "payload": {"type": "in", "amount": 50.0, "reason": "float top-up"}
            },
            {
                "outbox_id": 11,
                "entity_type": "gift_card",
                "entity_uuid": "c-gift-1",
                "operation": "create",
                "payload": {}
            }
        ]}))
        .await;
    res.assert_status_ok();

    let body: Value = res.json();
    assert_eq!(body["processed"].as_array().unwrap().len(), 1);
    assert_eq!(body["processed"][0]["entity_uuid"], "c-cash-1");

    let failed = &body["failed"][0];
    assert_eq!(failed["outbox_id"], 11);
    assert_eq!(failed["entity_uuid"], "c-gift-1");
    assert!(failed["error"].as_str().unwrap().contains("gift_card"));
}

#[tokio::test]
async fn refund_after_order_flips_order_status() {
    let (server, _pool) = spawn().await;

    server
        .post("/sync/push")
        .add_header(header::AUTHORIZATION, auth_header())
        .json(&json!({"batch": [order_item("c-order-1", 20.0)]}))
        .await
        .assert_status_ok();

    let res = server
        .post("/sync/push")
        .add_header(header::AUTHORIZATION, auth_header())
        .json(&json!({"batch": [{
            "entity_type": "refund",
            "entity_uuid": "c-refund-1",
            "operation": "create",
            "payload": {"order_uuid": "c-order-1", "amount": 20.0, "reason": "damaged"}
        }]}))
        .await;
    res.assert_status_ok();

    let body: Value = res.json();
    assert!(body["processed"][0]["server_id"]
        .as_str()
        .unwrap()
        .starts_with("REF-"));

    let listing: Value = server
        .get("/admin/orders")
        .add_header(header::AUTHORIZATION, auth_header())
        .await
        .json();
    assert_eq!(listing["orders"][0]["status"], "refunded");
}

#[tokio::test]
async fn status_less_update_does_not_unrefund_an_order() {
    let (server, _pool) = spawn().await;

    server
        .post("/sync/push")
        .add_header(header::AUTHORIZATION, auth_header())
        .json(&json!({"batch": [order_item("c-order-1", 20.0)]}))
        .await
        .assert_status_ok();

    server
        .post("/sync/push")
        .add_header(header::AUTHORIZATION, auth_header())
        .json(&json!({"batch": [{
            "entity_type": "refund",
            "entity_uuid": "c-refund-1",
            "operation": "create",
            "payload": {"order_uuid": "c-order-1", "amount": 20.0}
        }]}))
        .await
        .assert_status_ok();

    // A later update that never mentions the status must not reset it
    server
        .post("/sync/push")
        .add_header(header::AUTHORIZATION, auth_header())
        .json(&json!({"batch": [{
            "entity_type": "order",
            "entity_uuid": "c-order-1",
            "operation": "update",
            "payload": {"order": {}}
        }]}))
        .await
        .assert_status_ok();

    let listing: Value = server
        .get("/admin/orders")
        .add_header(header::AUTHORIZATION, auth_header())
        .await
        .json();
    assert_eq!(listing["orders"][0]["status"], "refunded");
}

#[tokio::test]
async fn refund_before_order_leaves_linkage_unresolved() {
    let (server, pool) = spawn().await;

    server
        .post("/sync/push")
        .add_header(header::AUTHORIZATION, auth_header())
        .json(&json!({"batch": [{
            "entity_type": "refund",
            "entity_uuid": "c-refund-1",
            "operation": "create",
            "payload": {"order_uuid": "c-order-1", "amount": 5.0}
        }]}))
        .await
        .assert_status_ok();

    server
        .post("/sync/push")
        .add_header(header::AUTHORIZATION, auth_header())
        .json(&json!({"batch": [order_item("c-order-1", 5.0)]}))
        .await
        .assert_status_ok();

    // Late arrival of the order does not retroactively resolve the refund.
    let link: (Option<String>,) =
        sqlx::query_as("SELECT order_server_id FROM refunds WHERE client_uuid = 'c-refund-1'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(link.0.is_none());

    let listing: Value = server
        .get("/admin/orders")
        .add_header(header::AUTHORIZATION, auth_header())
        .await
        .json();
    assert_eq!(listing["orders"][0]["status"], "completed");
}

#[tokio::test]
async fn catalog_upsert_then_pull() {
    let (server, _pool) = spawn().await;

    let empty: Value = server
        .get("/catalog/pull")
        .add_header(header::AUTHORIZATION, auth_header())
        .await
        .json();
    assert_eq!(empty["count"], 0);

    let res = server
        .post("/admin/catalog/products")
        .add_header(header::AUTHORIZATION, auth_header())
        .json(&json!([
            {"uuid": "p-1", "name": "Americano", "price": 3.5},
            {"uuid": "p-2", "name": "Croissant", "price": 2.8, "active": false}
        ]))
        .await;
    res.assert_status_ok();

    let upserted: Value = res.json();
    assert_eq!(upserted["ok"], true);
    assert_eq!(upserted["count"], 2);

    server
        .post("/admin/catalog/categories")
        .add_header(header::AUTHORIZATION, auth_header())
        .json(&json!([{"uuid": "cat-1", "name": "Drinks"}]))
        .await
        .assert_status_ok();

    let full: Value = server
        .get("/catalog/pull")
        .add_header(header::AUTHORIZATION, auth_header())
        .await
        .json();
    assert_eq!(full["count"], 2);
    assert_eq!(full["categories"].as_array().unwrap().len(), 1);
    let checkpoint = full["updated_at"].as_str().unwrap().to_string();

    // Re-pulling from the returned checkpoint yields nothing new.
    let delta: Value = server
        .get("/catalog/pull")
        .add_query_param("since", &checkpoint)
        .add_header(header::AUTHORIZATION, auth_header())
        .await
        .json();
    assert_eq!(delta["count"], 0);
}

#[tokio::test]
async fn pull_checkpoint_never_outruns_later_writes() {
    let (server, _pool) = spawn().await;

    // The checkpoint handed out by a pull predates anything committed
    // after that pull began, so chaining checkpoints cannot skip a row
    let first: Value = server
        .get("/catalog/pull")
        .add_header(header::AUTHORIZATION, auth_header())
        .await
        .json();
    let checkpoint = first["updated_at"].as_str().unwrap().to_string();

    server
        .post("/admin/catalog/products")
        .add_header(header::AUTHORIZATION, auth_header())
        .json(&json!([{"uuid": "p-1", "name": "Americano", "price": 3.5}]))
        .await
        .assert_status_ok();

    let delta: Value = server
        .get("/catalog/pull")
        .add_query_param("since", &checkpoint)
        .add_header(header::AUTHORIZATION, auth_header())
        .await
        .json();
    assert_eq!(delta["count"], 1);
    assert_eq!(delta["products"][0]["uuid"], "p-1");
}

#[tokio::test]
async fn catalog_pull_rejects_malformed_since() {
    let (server, _pool) = spawn().await;

    let res = server
        .get("/catalog/pull")
        .add_query_param("since", "yesterday")
        .add_header(header::AUTHORIZATION, auth_header())
        .await;
    res.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = res.json();
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn summary_reflects_pushed_activity() {
    let (server, _pool) = spawn().await;

    let mut a = order_item("c-order-1", 10.0);
    a["payload"]["order"]["tax_amount"] = json!(1.0);
    let b = order_item("c-order-2", 6.0);

    server
        .post("/sync/push")
        .add_header(header::AUTHORIZATION, auth_header())
        .json(&json!({"batch": [a, b, {
            "entity_type": "refund",
            "entity_uuid": "c-refund-1",
            "operation": "create",
            "payload": {"order_uuid": "c-order-2", "amount": 6.0}
        }]}))
        .await
        .assert_status_ok();

    let summary: Value = server
        .get("/admin/summary")
        .add_header(header::AUTHORIZATION, auth_header())
        .await
        .json();

    assert_eq!(summary["orders"], 2);
    assert_eq!(summary["refunds"], 1);
    assert!((summary["refund_total"].as_f64().unwrap() - 6.0).abs() < 1e-9);
    assert!((summary["revenue"].as_f64().unwrap() - 16.0).abs() < 1e-9);
    let cash = summary["payments_by_method"]
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["method"] == "cash")
        .unwrap();
    assert!((cash["total"].as_f64().unwrap() - 16.0).abs() < 1e-9);
}
