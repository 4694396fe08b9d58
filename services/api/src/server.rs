use crate::cli::ServeArgs;
use crate::infra::{load_jobs, AppState, InMemoryBackend};
use crate::routes::with_application_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use straatix::applications::SessionRegistry;
use straatix::config::AppConfig;
use straatix::error::AppError;
use straatix::telemetry;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let jobs = load_jobs(args.jobs_csv.as_deref())?;
    let job_count = jobs.len();
    let backend = InMemoryBackend::new(jobs, config.applications.clone());
    let application_service = Arc::new(backend.application_service());
    let account_service = Arc::new(backend.account_service());
    let sessions = Arc::new(SessionRegistry::new(Duration::from_secs(
        config.applications.session_idle_secs,
    )));

    let app = with_application_routes(application_service, account_service, sessions)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, job_count, "careers service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
