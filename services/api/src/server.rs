use crate::cli::ServeArgs;
use crate::infra::{cors_layer, AppState};
use crate::routes::with_entry_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use bracket_pool::config::AppConfig;
use bracket_pool::contest::entries::EntryService;
use bracket_pool::contest::SystemClock;
use bracket_pool::error::AppError;
use bracket_pool::storage::SqliteEntryRepository;
use bracket_pool::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(SqliteEntryRepository::open(&config.storage)?);
    let entry_service = Arc::new(EntryService::new(
        repository,
        Arc::new(SystemClock),
        &config.contest,
    ));

    let entries_open = entry_service.is_open();

    let app = with_entry_routes(entry_service)
        .layer(Extension(app_state))
        .layer(cors_layer(&config.cors))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        deadline = %config.contest.window.deadline(),
        entries_open,
        email_domain = %config.contest.email_domain,
        "bracket pool api ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
