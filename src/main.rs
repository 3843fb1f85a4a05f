//! Cinema Storefront server binary.

use std::sync::Arc;

use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use cinema_storefront::adapters::http::{self, AppState};
use cinema_storefront::adapters::memory::{
    InMemoryCatalog, InMemoryStore, InMemoryWebhookEventRepository,
};
use cinema_storefront::adapters::postgres::{
    PostgresCartRepository, PostgresCatalog, PostgresOrderRepository, PostgresPaymentRepository,
    PostgresWebhookEventRepository,
};
use cinema_storefront::adapters::stripe::StripeGateway;
use cinema_storefront::application::handlers::payment::HandlePaymentWebhookHandler;
use cinema_storefront::config::{AppConfig, ServerConfig};
use cinema_storefront::domain::payment::StripeWebhookVerifier;
use cinema_storefront::ports::{
    CartRepository, CatalogLookup, OrderRepository, PaymentRepository, WebhookEventRepository,
};

struct Storage {
    carts: Arc<dyn CartRepository>,
    orders: Arc<dyn OrderRepository>,
    payments: Arc<dyn PaymentRepository>,
    catalog: Arc<dyn CatalogLookup>,
    webhook_events: Arc<dyn WebhookEventRepository>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    let storage = storage(&config).await?;
    if !config.payment.is_test_mode() {
        tracing::info!("Stripe live mode");
    }

    let webhooks = HandlePaymentWebhookHandler::new(
        StripeWebhookVerifier::new(config.payment.webhook_secret())
            .with_tolerance(config.webhook.signature_tolerance_secs),
        storage.payments.clone(),
        storage.webhook_events.clone(),
        config.webhook.settings(),
    );

    let state = AppState {
        carts: storage.carts,
        orders: storage.orders,
        payments: storage.payments,
        catalog: storage.catalog,
        gateway: Arc::new(StripeGateway::new(config.payment.stripe_config())),
        checkout: config.payment.checkout_settings(),
        refunds: config.payment.refund_settings(),
        webhooks: Arc::new(webhooks),
    };

    let app = http::with_server_layers(
        http::router(state),
        config.server.request_timeout(),
        cors_layer(&config.server),
    );

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "Cinema storefront listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// JSON logs in production, human-readable otherwise. `RUST_LOG` wins over
/// the configured filter.
fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if server.is_production() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn storage(config: &AppConfig) -> Result<Storage, Box<dyn std::error::Error>> {
    let Some(database) = &config.database else {
        tracing::warn!(
            "No database configured; using the in-memory store with an empty catalog (one store-wide lock, not for production)"
        );
        let store = Arc::new(InMemoryStore::new());
        return Ok(Storage {
            carts: store.clone(),
            orders: store.clone(),
            payments: store,
            catalog: Arc::new(InMemoryCatalog::new()),
            webhook_events: Arc::new(InMemoryWebhookEventRepository::new()),
        });
    };

    tracing::info!(url = %database.redacted_url(), "Connecting to PostgreSQL");
    let pool = database.pool_options().connect(&database.url).await?;

    if database.run_migrations {
        tracing::info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    Ok(Storage {
        carts: Arc::new(PostgresCartRepository::new(pool.clone())),
        orders: Arc::new(PostgresOrderRepository::new(pool.clone())),
        payments: Arc::new(PostgresPaymentRepository::new(pool.clone())),
        catalog: Arc::new(PostgresCatalog::new(pool.clone())),
        webhook_events: Arc::new(PostgresWebhookEventRepository::new(pool)),
    })
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        if server.is_production() {
            return CorsLayer::new();
        }
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
