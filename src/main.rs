use std::sync::Arc;

use okadamart::api::router::create_router;
use okadamart::config::AppConfig;
use okadamart::services::ledger_reconciler::run_ledger_reconciler;
use okadamart::services::notifier::Notifier;
use okadamart::{db, metrics, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);

    tracing::info!("Connecting to database...");
    let pool = db::init_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database connected");

    let metrics_handle = metrics::init_metrics();

    let notifier = match &config.notify_webhook_url {
        Some(url) => {
            tracing::info!(webhook = %url, "Notification webhook enabled");
            Some(Arc::new(Notifier::new(url.clone())))
        }
        None => {
            tracing::info!("Notification webhook disabled (NOTIFY_WEBHOOK_URL unset)");
            None
        }
    };

    // Ledger reconciler: retries settlement ledgers that failed to create
    // alongside their order.
    if config.reconciler_enabled {
        let reconciler_pool = pool.clone();
        let interval = config.reconciler_interval_secs;
        tokio::spawn(async move {
            run_ledger_reconciler(reconciler_pool, interval).await;
        });
    } else {
        tracing::info!("Ledger reconciler disabled (RECONCILER_ENABLED=false)");
    }

    let state = AppState {
        db: pool,
        config,
        metrics_handle,
        notifier,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();
}
