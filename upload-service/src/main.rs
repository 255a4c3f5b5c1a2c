use service_core::error::AppError;
use service_core::observability::init_tracing;
use tokio::signal;
use upload_service::config::UploadConfig;
use upload_service::services::init_metrics;
use upload_service::startup::Application;

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = UploadConfig::load()?;

    init_tracing(
        "upload-service",
        &config.common.log_level,
        config.common.otlp_endpoint.as_deref(),
    );

    // Must be installed before any metric is recorded
    init_metrics();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        production = config.storage.mode.is_production(),
        "Starting upload service"
    );

    let app = Application::build(config).await?;

    tokio::select! {
        result = app.run_until_stopped() => {
            if let Err(e) = result {
                tracing::error!("HTTP server error: {}", e);
                return Err(AppError::InternalError(anyhow::Error::new(e)));
            }
        }
        _ = shutdown_signal() => {}
    }

    Ok(())
}
