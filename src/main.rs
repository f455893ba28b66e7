use kibitzer::config::Configuration;
use kibitzer::coordinator::CoordinatorBuilder;
use kibitzer::error::AppError;
use tracing::Level;

fn init_logging() {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();
}

fn load_configuration() -> Result<Configuration, AppError> {
    match std::env::var("KIBITZER_CONFIG") {
        Ok(path) => Configuration::from_file(path),
        Err(_) => Ok(Configuration::default()),
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    init_logging();
    let configuration = load_configuration()?;

    let coordinator = CoordinatorBuilder::new(configuration).build()?;
    coordinator.start().await?;

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| AppError::Config(format!("failed to listen for shutdown signal: {e}")))?;
    tracing::info!("shutdown requested");
    coordinator.stop().await?;

    let capture_stats = coordinator.capturer().stats();
    let engine_stats = coordinator.engine().stats();
    tracing::info!(
        total_captures = capture_stats.total_captures,
        capture_errors = capture_stats.total_errors,
        total_decisions = engine_stats.total_decisions,
        avg_inference_ms = engine_stats.avg_inference_ms,
        "final statistics"
    );
    Ok(())
}
