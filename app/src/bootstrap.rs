use crate::config::AppConfig;

/// Load `.env` from the first candidate path that has one.
pub fn load_dotenv() {
    let candidates = [".env", "../.env"];
    for path in &candidates {
        if dotenvy::from_filename(path).is_ok() {
            tracing::info!("Loaded .env from: {path}");
            return;
        }
    }
    tracing::info!("No .env file found, using system environment variables");
}

/// Load `.env` and the configuration (fatal on error).
pub fn init_foundation() -> Result<AppConfig, anyhow::Error> {
    load_dotenv();
    let config = AppConfig::from_env()?;
    tracing::info!(
        "Settings loaded (base={}, filter={}, radius={}, workers={})",
        config.base_directory.display(),
        config.file_filter,
        config.corner_radius,
        config.worker_count
    );
    Ok(config)
}
