use crate::cli::ServeArgs;
use crate::infra::{build_store, AppState};
use crate::routes::with_application_routes;
use appraisal_desk::config::{AppConfig, StoreConfig};
use appraisal_desk::desk::AppraisalDesk;
use appraisal_desk::error::AppError;
use appraisal_desk::{seed, telemetry};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

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

    let store = build_store(&config.store);
    if args.seed {
        if config.store == StoreConfig::Memory {
            seed::seed(store.clone()).await?;
        } else {
            warn!("--seed only applies to the in-memory store; use the seed command instead");
        }
    }
    let desk = Arc::new(AppraisalDesk::new(store));

    let app = with_application_routes(desk)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "appraisal desk ready");

    axum::serve(listener, app).await?;
    Ok(())
}
