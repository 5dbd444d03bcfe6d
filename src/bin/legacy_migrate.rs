use clap::Parser;
use securedrop_config_migrate::app::run_cli;
use securedrop_config_migrate::utils::logger;
use securedrop_config_migrate::{CliArgs, CombinedPipeline, LockMode, MigrateConfig};
use std::process::ExitCode;

/// Writes the single `config.json` layout. Waits for a running migration
/// instead of failing.
fn main() -> ExitCode {
    let args = CliArgs::parse();

    logger::init_cli_logger(args.verbose);
    tracing::info!("Starting securedrop-config-migrate-legacy");

    let config = MigrateConfig::from_env(args.force, LockMode::Blocking);
    run_cli(config, CombinedPipeline::new)
}
