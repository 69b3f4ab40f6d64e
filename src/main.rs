use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::http::HeaderValue;
use tokio::{signal, sync::mpsc};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use eshop_api as api;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = api::config::load_config()?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);

    // Init DB
    let db_pool = api::db::establish_connection_from_app_config(&cfg).await?;
    if cfg.auto_migrate {
        api::db::run_migrations(&db_pool).await.map_err(|e| {
            error!("Failed running migrations: {}", e);
            e
        })?;
    }
    let db_arc = Arc::new(db_pool);

    // Init events
    let (event_tx, event_rx) = mpsc::channel(cfg.event_channel_capacity);
    let event_sender = api::events::EventSender::new(event_tx);
    tokio::spawn(api::events::process_events(event_rx));

    // Session service for cookie issuance and verification
    let sessions = Arc::new(api::auth::SessionService::new(
        &cfg.session_secret,
        Duration::from_secs(cfg.session_ttl_secs),
        Duration::from_secs(cfg.session_ttl_remember_secs),
    ));

    // Chat fan-out broker; single-process deployments run without one
    let broker: Option<Arc<dyn api::message_queue::MessageQueue>> =
        match cfg.chat_broker_backend.to_ascii_lowercase().as_str() {
            "redis" => match redis::Client::open(cfg.redis_url.clone()) {
                Ok(client) => match api::message_queue::RedisMessageQueue::new(
                    client,
                    cfg.chat_broker_namespace.clone(),
                )
                .await
                {
                    Ok(queue) => Some(Arc::new(queue)),
                    Err(err) => {
                        error!(
                            "Failed to initialize Redis chat broker (falling back to local broadcast): {}",
                            err
                        );
                        None
                    }
                },
                Err(err) => {
                    error!(
                        "Invalid Redis URL (falling back to local broadcast): {}",
                        err
                    );
                    None
                }
            },
            "in-memory" => Some(Arc::new(api::message_queue::InMemoryMessageQueue::new())),
            _ => None,
        };

    let mut hub = api::chat::ChatHub::new(cfg.chat_send_queue_capacity);
    if let Some(broker) = broker {
        hub = hub.with_broker(broker);
    }
    let chat_hub = Arc::new(hub);
    tokio::spawn(chat_hub.clone().run_fanout());

    // Aggregate app services used by HTTP handlers
    let services = api::services::AppServices::new(db_arc.clone(), Arc::new(event_sender.clone()), &cfg);

    // Compose shared app state
    let app_state = api::AppState {
        db: db_arc,
        config: cfg.clone(),
        event_sender,
        services,
        sessions,
        chat_hub,
    };

    // Build CORS layer from config
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| {
                    let trimmed = origin.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        HeaderValue::from_str(trimmed).ok()
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    let cors_layer = if let Some(origins) = configured_origins {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else if cfg.should_allow_permissive_cors() {
        info!(
            "Using permissive CORS because explicit origins were not configured ({})",
            if cfg.is_development() {
                "development environment"
            } else {
                "explicit override enabled"
            }
        );
        CorsLayer::permissive()
    } else {
        error!("Missing CORS configuration detected; set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true");
        return Err("Missing CORS configuration: set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true".into());
    };

    let app = api::app_router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer);

    // Bind and serve
    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    info!("eshop-api listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
