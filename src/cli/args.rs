// CLI argument definitions using Clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Inspect Allure results written by the lifecycle engine
#[derive(Parser, Debug)]
#[command(name = "allure-lifecycle")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect Allure result directories", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose debug output
    #[arg(short = 'v', long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Count results, containers and attachments in a results directory
    Summary(SummaryArgs),

    /// Print the effective configuration as TOML
    Config,
}

#[derive(Args, Debug, Clone)]
pub struct SummaryArgs {
    /// Results directory (defaults to the configured one)
    #[arg(required = false)]
    pub dir: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_summary() {
        let cli = Cli::try_parse_from(["allure-lifecycle", "summary", "out", "--format", "json"]).unwrap();
        match cli.command {
            Commands::Summary(args) => {
                assert_eq!(args.dir, Some(PathBuf::from("out")));
                assert_eq!(args.format, OutputFormat::Json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_config_with_verbose() {
        let cli = Cli::try_parse_from(["allure-lifecycle", "-v", "config"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Config));
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["allure-lifecycle", "summary", "--format", "xml"]).is_err());
    }
}
