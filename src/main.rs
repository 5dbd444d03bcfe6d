use clap::Parser;
use securedrop_config_migrate::app::run_cli;
use securedrop_config_migrate::utils::logger;
use securedrop_config_migrate::{CliArgs, LockMode, MigrateConfig, SplitPipeline};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    logger::init_cli_logger(args.verbose);
    tracing::info!("Starting securedrop-config-migrate");

    let config = MigrateConfig::from_env(args.force, LockMode::NonBlocking);
    run_cli(config, SplitPipeline::new)
}
