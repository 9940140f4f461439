use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "license-audit",
    about = "Audit the licenses of installed npm dependencies",
    version
)]
pub struct Cli {
    /// Config file [default: ./.license-audit/config.toml, fallback ~/.config/license-audit/config.toml]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable the formal SPDX grammar; normalize with heuristics only
    #[arg(long, global = true)]
    pub no_grammar: bool,

    /// Debug logging and, for `scan`, every package in the report
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan node_modules and report license usage
    Scan(ScanArgs),
    /// Generate the third-party notices file
    Notices(NoticesArgs),
    /// Manage the provenance disclaimer in markdown files
    #[command(subcommand)]
    Disclaimer(DisclaimerCommand),
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Project path to scan
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub format: ReportFormat,

    /// Apply the recommended policy table instead of the configured one
    #[arg(long)]
    pub strict: bool,

    /// Look up UNKNOWN licenses in the npm registry
    #[arg(long)]
    pub online: bool,

    /// Write the raw scan result to the cache file
    #[arg(long)]
    pub save_cache: bool,

    /// Only print summary line
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Args, Debug)]
pub struct NoticesArgs {
    /// Project path
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Write the Brazilian Portuguese variant
    #[arg(long = "pt-br")]
    pub pt_br: bool,

    /// Output file, relative to the project path
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Rescan even when a cached scan result exists
    #[arg(long)]
    pub refresh: bool,
}

#[derive(Subcommand, Debug)]
pub enum DisclaimerCommand {
    /// Prepend the disclaimer to markdown files that lack it
    Add(DisclaimerArgs),
    /// List markdown files that lack the disclaimer
    Verify(DisclaimerArgs),
}

#[derive(Args, Debug)]
pub struct DisclaimerArgs {
    /// Project path
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Disclaimer partial, relative to the project path
    #[arg(long, value_name = "FILE")]
    pub disclaimer_path: Option<PathBuf>,

    /// Show what would change without writing
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_scan_flags() {
        let cli = Cli::parse_from([
            "license-audit", "scan", "app", "--format", "json", "--strict", "--online", "-v",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Command::Scan(args) => {
                assert_eq!(args.path, PathBuf::from("app"));
                assert!(matches!(args.format, ReportFormat::Json));
                assert!(args.strict && args.online && !args.save_cache);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_disclaimer_verify() {
        let cli = Cli::parse_from(["license-audit", "disclaimer", "verify", "--dry-run"]);
        match cli.command {
            Command::Disclaimer(DisclaimerCommand::Verify(args)) => {
                assert_eq!(args.path, PathBuf::from("."));
                assert!(args.dry_run);
                assert!(args.disclaimer_path.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_notices() {
        let cli = Cli::parse_from(["license-audit", "notices", "--pt-br", "--refresh"]);
        match cli.command {
            Command::Notices(args) => assert!(args.pt_br && args.refresh && args.output.is_none()),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
