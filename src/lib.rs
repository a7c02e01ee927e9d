pub mod analytics;
pub mod api;
pub mod appointments;
pub mod blog;
pub mod bookings;
pub mod chat;
pub mod config;
pub mod core_state;
pub mod dashboard;
pub mod db;
pub mod doctors;
pub mod error;
pub mod gemini;
pub mod health_records;
pub mod labs;
pub mod models;
pub mod onboarding;
pub mod validation;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Database(#[from] db::DatabaseError),

    #[error(transparent)]
    Server(#[from] api::ServerError),
}

/// Load configuration from the environment, prepare the database and
/// serve the API until shutdown.
pub async fn run() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = config::Config::from_env()?;
    let core = Arc::new(core_state::CoreState::new(config));
    core.init_database()?;

    api::serve(core).await?;
    Ok(())
}
