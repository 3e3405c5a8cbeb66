//! Console binary: watch until `q` or Ctrl+C.

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use corner_watcher_lib::WatchOrchestrator;
use corner_watcher_lib::shutdown;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = corner_watcher_lib::init_foundation()?;
    let target = config.watch_target()?;

    let token = CancellationToken::new();
    shutdown::spawn_quit_listener(token.clone());
    shutdown::spawn_ctrl_c_listener(token.clone());

    let orchestrator = WatchOrchestrator::new(target, config.watch_options());
    orchestrator.run(token).await?;
    Ok(())
}
