use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, Response, StatusCode},
    Router,
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseBackend as DbBackend, Set, Statement,
};
use serde_json::Value;
use sha2::Sha256;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;
use yoa_api::{
    config::AppConfig,
    db,
    entities::artwork,
    events::{self, EventSender},
    AppState,
};

#[allow(dead_code)]
pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret_for_harness";

/// Harness that spins up the full router against a throwaway SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _tmp: tempfile::TempDir,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let tmp = tempfile::tempdir().expect("failed to create temp dir");
        let db_path = tmp.path().join("yoa_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
            "sk_test_key_for_harness".to_string(),
            TEST_WEBHOOK_SECRET.to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.media_root = tmp.path().join("uploads").display().to_string();

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");

        for sql in schema_statements() {
            pool.execute(Statement::from_string(DbBackend::Sqlite, sql.to_string()))
                .await
                .expect("failed to create test schema");
        }

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(
            Arc::new(pool),
            Arc::new(cfg),
            Arc::new(EventSender::new(event_tx)),
        );
        let router = yoa_api::api_v1_routes().with_state(state.clone());

        Self {
            router,
            state,
            _tmp: tmp,
            _event_task: event_task,
        }
    }

    pub async fn insert_artwork(
        &self,
        title: &str,
        slug: &str,
        price: Decimal,
        inventory_count: i32,
        is_published: bool,
    ) -> artwork::Model {
        let now = Utc::now();
        artwork::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title.to_string()),
            slug: Set(slug.to_string()),
            description: Set(String::new()),
            price: Set(price),
            inventory_count: Set(inventory_count),
            is_published: Set(is_published),
            medium: Set(None),
            dimensions: Set(None),
            year: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to insert test artwork")
    }

    pub async fn request(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("request should not error at the transport level")
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request should build");
        let response = self.request(request).await;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should read");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body should be JSON")
        };
        (status, json)
    }
}

/// A `t=..,v1=..` signature header over `payload`, as the processor sends it.
#[allow(dead_code)]
pub fn sign_webhook_payload(payload: &[u8], secret: &str) -> String {
    let timestamp = Utc::now().timestamp().to_string();
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("any key size works for hmac");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    let signature = hex::encode(mac.finalize().into_bytes());
    format!("t={timestamp},v1={signature}")
}

fn schema_statements() -> [&'static str; 6] {
    [
        r#"CREATE TABLE IF NOT EXISTS artworks (
            id TEXT PRIMARY KEY NOT NULL,
            title TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL,
            price REAL NOT NULL,
            inventory_count INTEGER NOT NULL,
            is_published INTEGER NOT NULL DEFAULT 0,
            medium TEXT,
            dimensions TEXT,
            year INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );"#,
        r#"CREATE TABLE IF NOT EXISTS artwork_images (
            id TEXT PRIMARY KEY NOT NULL,
            artwork_id TEXT NOT NULL,
            thumbnail_filename TEXT NOT NULL,
            preview_filename TEXT NOT NULL,
            large_filename TEXT NOT NULL,
            alt_text TEXT,
            position INTEGER NOT NULL DEFAULT 0,
            is_primary INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );"#,
        r#"CREATE TABLE IF NOT EXISTS orders (
            id TEXT PRIMARY KEY NOT NULL,
            order_number TEXT NOT NULL UNIQUE,
            payment_intent_id TEXT NOT NULL UNIQUE,
            customer_name TEXT NOT NULL,
            customer_email TEXT NOT NULL,
            shipping_address TEXT NOT NULL,
            billing_address TEXT NOT NULL,
            subtotal REAL NOT NULL,
            shipping_cost REAL NOT NULL,
            tax_amount REAL NOT NULL,
            total REAL NOT NULL,
            status TEXT NOT NULL,
            payment_status TEXT NOT NULL,
            tracking_number TEXT,
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );"#,
        r#"CREATE TABLE IF NOT EXISTS order_items (
            id TEXT PRIMARY KEY NOT NULL,
            order_id TEXT NOT NULL,
            artwork_id TEXT NOT NULL,
            title TEXT NOT NULL,
            slug TEXT NOT NULL,
            unit_price REAL NOT NULL,
            quantity INTEGER NOT NULL,
            line_total REAL NOT NULL,
            created_at TEXT NOT NULL
        );"#,
        r#"CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY NOT NULL,
            title TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL,
            url TEXT,
            is_published INTEGER NOT NULL DEFAULT 0,
            position INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );"#,
        r#"CREATE TABLE IF NOT EXISTS exhibitions (
            id TEXT PRIMARY KEY NOT NULL,
            title TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL,
            venue TEXT,
            starts_at TEXT,
            ends_at TEXT,
            is_published INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );"#,
    ]
}
