use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use labelry_api::{build_router, ApiConfig, AppState, HttpScoringNotifier};
use labelry_core::{NoopNotifier, ScoringNotifier};
use labelry_db::{log_pool_metrics, Database};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "labelry_api=debug,labelry_core=info,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "labelry_api=debug,labelry_core=info,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("labelry-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let config = ApiConfig::from_env();

    let db = Database::connect(&config.database_url, &config.pool_config()).await?;
    db.migrate().await?;
    info!(subsystem = "db", "Migrations applied");

    let pool_db = db.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            log_pool_metrics(pool_db.pool());
        }
    });

    let notifier: Arc<dyn ScoringNotifier> = match &config.scoring_api_url {
        Some(url) => {
            info!(
                subsystem = "notifier",
                scoring_api_url = %url,
                queue_capacity = config.scoring_queue_capacity,
                "Scoring notifications enabled"
            );
            Arc::new(HttpScoringNotifier::spawn(
                url.clone(),
                config.scoring_queue_capacity,
                config.scoring_timeout,
            )?)
        }
        None => {
            info!(
                subsystem = "notifier",
                "SCORING_API_URL not set, scoring notifications disabled"
            );
            Arc::new(NoopNotifier)
        }
    };

    let engine = db
        .engine(notifier)
        .with_max_tag_length(config.max_tag_length);
    let state = AppState::new(engine, Arc::new(db.sessions.clone()), Arc::new(db.clone()));
    let app = build_router(state, &config);

    let addr: SocketAddr = config.bind_addr().parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
