use crate::adapters::FileSource;
use crate::config::MigrateConfig;
use crate::core::etl::MigrationEngine;
use crate::core::{ConfigProvider, Pipeline};
use crate::domain::model::MigrationOutcome;
use crate::utils::validation::Validate;
use std::path::Path;
use std::process::ExitCode;

/// Shared `main` body of both binaries. The report goes to stdout; logs and
/// the failure summary go to stderr.
pub fn run_cli<P, F>(config: MigrateConfig, make_pipeline: F) -> ExitCode
where
    P: Pipeline,
    F: FnOnce(&Path) -> P,
{
    tracing::debug!("Migration config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        tracing::error!("Suggestion: {}", e.recovery_suggestion());
        eprintln!("{}", e.user_friendly_message());
        return ExitCode::from(e.exit_code());
    }

    let pipeline = make_pipeline(config.config_dir());
    let source = FileSource::new(config.legacy_config());
    let engine = MigrationEngine::new(pipeline, source, config);

    match engine.run() {
        Ok(MigrationOutcome::Migrated { written }) => {
            for path in &written {
                println!("Migrated config written to {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Ok(MigrationOutcome::AlreadyMigrated { existing }) => {
            for path in &existing {
                println!("JSON config already exists at {}; left untouched.", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(
                "Migration failed: {} (Severity: {:?})",
                e,
                e.severity()
            );
            tracing::error!("Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("{}", e.user_friendly_message());
            ExitCode::from(e.exit_code())
        }
    }
}
