pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;

pub use adapters::{FileSource, SettingsFormat};
pub use config::MigrateConfig;
pub use crate::core::{
    etl::MigrationEngine,
    pipeline::{CombinedPipeline, SplitPipeline},
};
pub use domain::model::{ConfigDocument, LegacySettings, LockMode, MigrationOutcome};
pub use utils::error::{MigrateError, Result};
