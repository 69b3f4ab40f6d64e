#![allow(dead_code)] // not every test binary uses every helper

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceExt;

use eshop_api::{
    auth::SessionService,
    chat::ChatHub,
    config::AppConfig,
    db,
    events::{self, EventSender},
    services::AppServices,
    AppState,
};

/// Parses a JSON field (string or number) into a Decimal for exact
/// money comparisons independent of serialized scale.
pub fn decimal(value: &Value) -> rust_decimal::Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("not a decimal value: {:?}", other),
    }
}

/// Helper harness for spinning up an application backed by a
/// tempfile-based sqlite database.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    _db_file: tempfile::NamedTempFile,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db_file = tempfile::NamedTempFile::new().expect("failed to create temp db file");
        let db_path = db_file.path().display().to_string();

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path),
            "redis://127.0.0.1:6379".to_string(),
            "test_secret_key_for_testing_purposes_only_32chars".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.auto_reply_delay_ms = 10;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        tokio::spawn(events::process_events(event_rx));

        let sessions = Arc::new(SessionService::new(
            &cfg.session_secret,
            Duration::from_secs(cfg.session_ttl_secs),
            Duration::from_secs(cfg.session_ttl_remember_secs),
        ));
        let chat_hub = Arc::new(ChatHub::new(cfg.chat_send_queue_capacity));
        let services = AppServices::new(db.clone(), Arc::new(event_sender.clone()), &cfg);

        let state = AppState {
            db,
            config: cfg,
            event_sender,
            services,
            sessions,
            chat_hub,
        };
        let router = eshop_api::app_router(state.clone());

        Self {
            router,
            state,
            _db_file: db_file,
        }
    }

    /// Sends a raw request through the router.
    pub async fn send(&self, request: Request<Body>) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("request should not fail at the transport level")
    }

    /// Sends a JSON request and returns status plus parsed body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(payload) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .expect("request build"),
            None => builder.body(Body::empty()).expect("request build"),
        };

        let response = self.send(request).await;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body read");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response should be JSON")
        };
        (status, value)
    }

    /// Registers a user through the API and returns the session cookie
    /// pair (`eshop_session=<token>`) for follow-up requests.
    pub async fn register_user(&self, username: &str) -> String {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": "password123",
                })
                .to_string(),
            ))
            .expect("request build");

        let response = self.send(request).await;
        assert_eq!(response.status(), StatusCode::CREATED, "registration failed");

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("registration should set a session cookie")
            .to_str()
            .expect("cookie should be ascii");

        set_cookie
            .split(';')
            .next()
            .expect("cookie pair")
            .to_string()
    }

    /// Creates a product through the catalog service and returns its id.
    pub async fn create_product(
        &self,
        name: &str,
        price: rust_decimal::Decimal,
        stock_quantity: i32,
    ) -> uuid::Uuid {
        self.state
            .services
            .catalog
            .create_product(eshop_api::services::catalog::CreateProductInput {
                name: name.to_string(),
                price,
                description: None,
                category: None,
                image_url: None,
                stock_quantity: Some(stock_quantity),
            })
            .await
            .expect("failed to create test product")
            .id
    }
}
