use crate::cli::ServeArgs;
use crate::demo::seed_demo_records;
use crate::infra::{AppState, InMemoryNotificationOutbox, InMemoryWorkflowStore};
use crate::routes::with_integration_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use thiqax::config::AppConfig;
use thiqax::error::AppError;
use thiqax::telemetry;
use thiqax::workflows::verification::{IntegrationError, VerificationService};
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

    let store = Arc::new(InMemoryWorkflowStore::default());
    if args.seed_demo {
        seed_demo_records(&store, Utc::now()).map_err(IntegrationError::from)?;
        info!("demo records loaded into the in-memory store");
    }
    let outbox = Arc::new(InMemoryNotificationOutbox::default());
    let service = Arc::new(VerificationService::new(
        store,
        outbox,
        config.workflow,
    ));

    let app = with_integration_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        expiry_window_days = config.workflow.expiry_window_days,
        "verification service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
