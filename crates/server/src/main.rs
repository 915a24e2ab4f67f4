//! Sitecraft server entry point.

use std::sync::Arc;

use anyhow::Context;
use axum::{Router, middleware};
use sitecraft_api::{AppState, router as api_router};
use sitecraft_common::{Config, LocalArtifactStore, LocalStorage};
use sitecraft_core::{
    AccountService, BundleLimits, DashboardService, FulfillmentService, MessagingService,
    NotificationService, OrderService, TemplateService,
};
use sitecraft_db::repositories::{
    NotificationRepository, OrderMessageRepository, OrderRepository, TemplateRepository,
    UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sitecraft=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting sitecraft server...");

    let config = Config::load().context("Failed to load configuration")?;

    let db = Arc::new(sitecraft_db::init(&config).await?);
    info!("Connected to database");

    info!("Running database migrations...");
    sitecraft_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let user_repo = UserRepository::new(Arc::clone(&db));
    let template_repo = TemplateRepository::new(Arc::clone(&db));
    let order_repo = OrderRepository::new(Arc::clone(&db));
    let message_repo = OrderMessageRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));

    // Initialize services
    let notification_service = NotificationService::new(notification_repo);
    let account_service = AccountService::new(user_repo.clone());
    let template_service = TemplateService::new(
        template_repo.clone(),
        Arc::new(LocalStorage::new(
            config.storage.assets_path.clone(),
            config.storage.assets_url.clone(),
        )),
    );
    let order_service = OrderService::new(
        order_repo.clone(),
        template_repo.clone(),
        notification_service.clone(),
        Arc::new(config.questionnaire.clone()),
    );
    let messaging_service = MessagingService::new(
        order_repo.clone(),
        message_repo,
        notification_service.clone(),
    );
    let fulfillment_service = FulfillmentService::new(
        order_repo.clone(),
        Arc::new(LocalArtifactStore::new(config.storage.websites_path.clone())),
        notification_service.clone(),
        BundleLimits::from(&config.storage),
    );
    let dashboard_service = DashboardService::new(
        user_repo,
        order_repo,
        template_repo,
        notification_service.clone(),
    );

    let admin = account_service.ensure_admin(&config.admin).await?;
    info!(email = %admin.email, "Admin account ready");

    let seeded = template_service.seed_defaults().await?;
    if seeded > 0 {
        info!(count = seeded, "Seeded default template catalog");
    }

    let state = AppState {
        account_service,
        template_service,
        order_service,
        messaging_service,
        notification_service,
        fulfillment_service,
        dashboard_service,
    };

    // Build router
    let mut app = Router::new().nest(
        "/api",
        api_router(config.storage.max_upload_bytes as usize),
    );
    if config.storage.assets_url.starts_with('/') {
        app = app.nest_service(
            &config.storage.assets_url,
            ServeDir::new(&config.storage.assets_path),
        );
    }

    let app = app
        .layer(middleware::from_fn_with_state(
            state.clone(),
            sitecraft_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let listener = tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.server.host, config.server.port))?;
    info!(addr = %listener.local_addr()?, url = %config.server.url, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
