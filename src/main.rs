mod cli;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, DisclaimerArgs, DisclaimerCommand, NoticesArgs, ReportFormat, ScanArgs};
use license_audit::cache::{JsonFileCache, ScanCache};
use license_audit::config::{load_config, Config, PolicyConfig};
use license_audit::disclaimer::{self, DisclaimerOptions};
use license_audit::license::grammar::{self, LicenseGrammarService, NullGrammar};
use license_audit::license::Normalizer;
use license_audit::notices::{self, NoticeOptions, ProjectInfo};
use license_audit::scanner::aggregator::{
    aggregate, ClassificationPolicy, ConfiguredPolicy, UnknownLicensePolicy,
};
use license_audit::scanner::{self, install_dir_of, ScanOptions};
use license_audit::{registry, report, ScanResult};

/// Exit code when the scan found problematic packages.
const EXIT_PROBLEMATIC: i32 = 2;
const EXIT_FAILURE: i32 = 1;

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("license_audit=debug")
    } else {
        EnvFilter::try_from_env("LICENSE_AUDIT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            EXIT_FAILURE
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32> {
    let config_override = cli.config.clone();
    match cli.command {
        Command::Scan(ref args) => {
            let root = project_root(&args.path);
            let config = load_config(&root, config_override.as_deref())?;
            let normalizer = install_grammar(&config, cli.no_grammar);
            run_scan(&root, args, &config, normalizer, cli.verbose).await
        }
        Command::Notices(ref args) => {
            let root = project_root(&args.path);
            let config = load_config(&root, config_override.as_deref())?;
            let normalizer = install_grammar(&config, cli.no_grammar);
            run_notices(&root, args, &config, normalizer).await
        }
        Command::Disclaimer(ref command) => {
            let (args, verify) = match command {
                DisclaimerCommand::Add(args) => (args, false),
                DisclaimerCommand::Verify(args) => (args, true),
            };
            let root = project_root(&args.path);
            let config = load_config(&root, config_override.as_deref())?;
            run_disclaimer(&root, args, &config, verify)
        }
    }
}

fn project_root(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Install the process-wide grammar service and return a normalizer over it.
fn install_grammar(config: &Config, no_grammar: bool) -> Normalizer {
    let service: Arc<dyn LicenseGrammarService> = if no_grammar {
        Arc::new(NullGrammar)
    } else {
        grammar::from_config(&config.normalizer)
    };
    grammar::install(service);
    Normalizer::global()
}

async fn run_scan(
    root: &Path,
    args: &ScanArgs,
    config: &Config,
    normalizer: Normalizer,
    verbose: bool,
) -> Result<i32> {
    let install_dir = install_dir_of(root)?;

    let configured = if args.strict {
        Some(ConfiguredPolicy::new(PolicyConfig::recommended()))
    } else {
        config.policy.clone().map(ConfiguredPolicy::new)
    };
    let policy: Arc<dyn ClassificationPolicy> = match &configured {
        Some(configured) => Arc::new(configured.clone()),
        None => Arc::new(UnknownLicensePolicy),
    };

    let options = ScanOptions {
        normalizer: normalizer.clone(),
        policy,
        concurrency: config.scan.concurrency,
    };

    let mut records = scanner::collect(&install_dir, &options).await?;
    let json = matches!(args.format, ReportFormat::Json);
    if args.online {
        records = registry::enrich_unknown(records, &normalizer, args.quiet || json).await?;
    }
    let result = aggregate(records, options.policy.as_ref());

    if args.save_cache {
        JsonFileCache::new(root.join(&config.cache.path)).save(&result);
    }

    match args.format {
        ReportFormat::Terminal => {
            report::terminal::render(&result, root, configured.as_ref(), verbose, args.quiet)?;
        }
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(if result.has_problems() {
        EXIT_PROBLEMATIC
    } else {
        0
    })
}

async fn run_notices(
    root: &Path,
    args: &NoticesArgs,
    config: &Config,
    normalizer: Normalizer,
) -> Result<i32> {
    let project = ProjectInfo::load(root, &normalizer)?;
    let cache = JsonFileCache::new(root.join(&config.cache.path));

    let cached = if args.refresh { None } else { cache.load() };
    let result: ScanResult = match cached {
        Some(result) => result,
        None => {
            debug!("no cached scan result; scanning");
            let options = ScanOptions {
                normalizer,
                policy: Arc::new(UnknownLicensePolicy),
                concurrency: config.scan.concurrency,
            };
            let result = scanner::scan(&install_dir_of(root)?, &options).await?;
            cache.save(&result);
            result
        }
    };

    let summary = notices::generate(
        root,
        &project,
        &result,
        &NoticeOptions {
            pt_br: args.pt_br,
            output: args.output.clone(),
        },
    )?;
    println!(
        " {} Notices written to {} ({} packages)",
        "✓".green(),
        summary.output.display(),
        summary.packages
    );
    Ok(0)
}

fn run_disclaimer(
    root: &Path,
    args: &DisclaimerArgs,
    config: &Config,
    verify: bool,
) -> Result<i32> {
    let mut options = DisclaimerOptions::from_config(&config.disclaimer)?;
    if let Some(path) = &args.disclaimer_path {
        options.disclaimer_path = path.clone();
    }
    options.dry_run = args.dry_run;

    if verify {
        let outcome = disclaimer::verify(root, &options)?;
        if outcome.is_clean() {
            println!(" {} All markdown files carry the disclaimer", "✓".green());
            return Ok(0);
        }
        println!(
            " {} {} markdown file(s) missing the disclaimer:",
            "✗".red(),
            outcome.missing.len()
        );
        for file in &outcome.missing {
            println!("   - {}", file.display());
        }
        return Ok(EXIT_FAILURE);
    }

    let outcome = disclaimer::add(root, &options)?;
    let verb = if options.dry_run { "Would update" } else { "Updated" };
    println!(
        " {} {} {} markdown file(s)",
        "✓".green(),
        verb,
        outcome.updated_files.len()
    );
    for file in &outcome.updated_files {
        println!("   - {}", file.display());
    }
    Ok(0)
}
