use clap::Parser;

#[derive(Debug, Clone, Default, Parser)]
#[command(about = "Helper for migrating config from Python to JSON")]
pub struct CliArgs {
    #[arg(long, help = "Overwrite existing JSON config even if it is already present")]
    pub force: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = CliArgs::try_parse_from(["securedrop-config-migrate", "--force"]).unwrap();
        assert!(args.force);
        assert!(!args.verbose);

        let args = CliArgs::try_parse_from(["securedrop-config-migrate", "-v"]).unwrap();
        assert!(!args.force);
        assert!(args.verbose);
    }

    #[test]
    fn test_rejects_path_flags() {
        assert!(CliArgs::try_parse_from(["securedrop-config-migrate", "--config-dir", "/tmp"]).is_err());
    }
}
