use crate::cli::ServeArgs;
use crate::infra::{bootstrap, seed_sample_office, AppState};
use crate::routes::with_service_routes;
use asset_desk::config::AppConfig;
use asset_desk::error::AppError;
use asset_desk::store::MemoryStore;
use asset_desk::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
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

    let store = Arc::new(MemoryStore::with_lock_timeout(config.store.lock_timeout));
    let services = bootstrap(store, &config.organization)?;
    if args.seed_sample {
        seed_sample_office(&services, 3)?;
    }

    let app = with_service_routes(&services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        lock_timeout_ms = config.store.lock_timeout.as_millis() as u64,
        "asset desk ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
