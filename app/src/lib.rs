//! Watches a directory for new images, writes a rounded-corner copy of each
//! into `done` and moves the source into `original`.

pub mod bootstrap;
pub mod config;
pub mod services;
pub mod shutdown;
pub mod watcher;

pub use bootstrap::init_foundation;
pub use config::{AppConfig, ConfigError};
pub use watcher::{
    RunSummary, WatchError, WatchOptions, WatchOrchestrator, WatchState, WatchTarget,
};
