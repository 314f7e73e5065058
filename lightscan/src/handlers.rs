use anyhow::Context;
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use lightscan_core::discovery::load_wordlist;
use lightscan_core::report::{ReportFormat, write_reports};
use lightscan_core::scan::{ScanConfig, ScanProgressCallback, ScanState, execute_scan};
use lightscan_core::{Severity, print_banner};
use lightscan_scanner::error::ScanError;
use lightscan_scanner::{CancelHandle, ReqwestClient, SharedClient};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, info, warn};

pub const EXIT_OK: i32 = 0;
pub const EXIT_INTERNAL: i32 = 1;
pub const EXIT_CONFIG: i32 = 2;
pub const EXIT_UNREACHABLE: i32 = 3;

/// Why a scan run did not complete.
#[derive(Debug)]
pub enum ScanFailure {
    Config(ScanError),
    Unreachable(String),
    Internal(anyhow::Error),
}

impl ScanFailure {
    pub fn exit_code(&self) -> i32 {
        match self {
            ScanFailure::Config(_) => EXIT_CONFIG,
            ScanFailure::Unreachable(_) => EXIT_UNREACHABLE,
            ScanFailure::Internal(_) => EXIT_INTERNAL,
        }
    }
}

/// Configuration problems surface before any request is sent; everything
/// else the scan returns is an internal failure.
impl From<ScanError> for ScanFailure {
    fn from(error: ScanError) -> Self {
        match error {
            ScanError::Config(_) | ScanError::InvalidUrl(_) | ScanError::Wordlist(_) => {
                ScanFailure::Config(error)
            }
            other => ScanFailure::Internal(other.into()),
        }
    }
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

fn wordlist_arg(matches: &ArgMatches, name: &str) -> Result<Option<Vec<String>>, ScanError> {
    match matches.get_one::<PathBuf>(name) {
        Some(path) => {
            let expanded = expand_path(&path.to_string_lossy());
            load_wordlist(&expanded).map(Some)
        }
        None => Ok(None),
    }
}

/// Build a validated scan configuration from parsed arguments.
pub fn config_from_matches(matches: &ArgMatches) -> Result<ScanConfig, ScanError> {
    let target = matches
        .get_one::<String>("TARGET")
        .ok_or_else(|| ScanError::Config("a target URL is required".to_string()))?;

    let mut config = ScanConfig::new(target);
    if let Some(max_pages) = matches.get_one::<usize>("max-pages") {
        config.max_pages = *max_pages;
    }
    if let Some(depth) = matches.get_one::<usize>("depth") {
        config.max_depth = *depth;
    }
    if let Some(timeout) = matches.get_one::<u64>("timeout") {
        config.timeout_secs = *timeout;
    }
    if let Some(user_agent) = matches.get_one::<String>("user-agent") {
        config.user_agent = user_agent.clone();
    }
    if let Some(output_dir) = matches.get_one::<String>("output-dir") {
        config.output_dir = expand_path(output_dir);
    }
    if let Some(formats) = matches.get_one::<String>("format") {
        config.formats = ReportFormat::parse_list(formats)?;
    }
    if let Some(delay) = matches.get_one::<f64>("delay") {
        config.delay = *delay;
    }
    if let Some(threads) = matches.get_one::<usize>("threads") {
        config.workers = *threads;
    }
    config.max_duration = matches.get_one::<u64>("max-duration").copied();
    config.obey_robots = !matches.get_flag("ignore-robots");
    config.verbose = matches.get_flag("verbose");
    config.json_output = matches.get_flag("json") || config.formats.contains(&ReportFormat::Json);

    if let Some(paths) = wordlist_arg(matches, "hidden-wordlist")? {
        config.hidden_paths = paths;
    }
    if let Some(files) = wordlist_arg(matches, "exposed-wordlist")? {
        config.exposed_files = files;
    }

    config.validate()?;
    Ok(config)
}

pub fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    // A subscriber may already be installed when called more than once
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_warning() {
    println!(
        "{} {}",
        "[!]".yellow().bold(),
        "LightScan sends active probes (query and form mutations, path guessing).".yellow()
    );
    println!(
        "{} {}\n",
        "[!]".yellow().bold(),
        "Only scan systems you own or are explicitly authorized to test.".yellow()
    );
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn new_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("Starting scan...");
    spinner
}

fn severity_label(severity: Severity) -> colored::ColoredString {
    let label = format!("[{}]", severity.as_str().to_uppercase());
    match severity {
        Severity::High => label.red().bold(),
        Severity::Medium => label.truecolor(255, 165, 0).bold(),
        Severity::Low => label.yellow(),
        Severity::Info => label.blue(),
    }
}

pub fn print_summary(state: &ScanState, reports: &[PathBuf]) {
    println!();
    print_divider();
    println!("{} {}", "Scan complete:".bold(), state.target.bright_white());
    print_divider();

    if state.interrupted {
        println!("{} Scan stopped early, results are partial", "⚠".yellow());
    }
    println!("Pages crawled: {}", state.pages.len().to_string().cyan());
    println!("Forms found:   {}", state.forms.len().to_string().cyan());
    println!("Findings:      {}", state.findings.len().to_string().cyan());

    if !state.stack.is_empty() {
        println!("\nTechnology hints:");
        for (key, value) in &state.stack {
            println!("  {}: {}", key.bright_white(), value);
        }
    }

    if !state.findings.is_empty() {
        println!();
        for finding in &state.findings {
            println!(
                "  {:<10} {} {}",
                severity_label(finding.severity),
                finding.title,
                format!("({})", finding.location).dimmed()
            );
        }
    }

    if !reports.is_empty() {
        println!("\nReports:");
        for path in reports {
            println!("  {} {}", "→".blue(), path.display().to_string().bright_white());
        }
    }
    println!();
}

/// Run one scan end to end: crawl, probe, write reports.
pub async fn run_scan(config: ScanConfig, quiet: bool) -> Result<(ScanState, Vec<PathBuf>), ScanFailure> {
    let client: SharedClient = Arc::new(ReqwestClient::new(
        config.timeout_secs,
        &config.user_agent,
        config.delay_duration()?,
    )?);

    let cancel = match config.max_duration {
        Some(secs) => CancelHandle::with_deadline(Duration::from_secs(secs)),
        None => CancelHandle::new(),
    };

    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing in-flight requests");
            ctrl_c_cancel.cancel();
        }
    });

    let spinner = if quiet { None } else { Some(Arc::new(new_spinner())) };
    let progress: Option<ScanProgressCallback> = spinner.clone().map(|pb| {
        Arc::new(move |msg: String| {
            pb.set_message(msg);
        }) as ScanProgressCallback
    });

    let output_dir = config.output_dir.clone();
    let result = execute_scan(config, client, cancel, progress).await;
    if let Some(ref pb) = spinner {
        pb.finish_and_clear();
    }
    let state = result?;

    if state.target_unreachable() {
        return Err(ScanFailure::Unreachable(state.target));
    }

    let reports = write_reports(&state, &output_dir)
        .with_context(|| format!("failed to write reports to {}", output_dir.display()))
        .map_err(ScanFailure::Internal)?;
    for path in &reports {
        info!("Report written: {}", path.display());
    }

    Ok((state, reports))
}

/// Entry point for the command line. Returns the process exit code.
pub async fn handle_scan(matches: &ArgMatches) -> i32 {
    let quiet = matches.get_flag("quiet");
    if !quiet {
        print_banner();
        print_warning();
    }

    init_tracing(matches.get_flag("verbose"));

    let config = match config_from_matches(matches) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            return EXIT_CONFIG;
        }
    };

    info!("Starting scan of {}", config.target);

    match run_scan(config, quiet).await {
        Ok((state, reports)) => {
            if !quiet {
                print_summary(&state, &reports);
            }
            EXIT_OK
        }
        Err(failure) => {
            match &failure {
                ScanFailure::Config(e) => eprintln!("{} {}", "✗".red(), e),
                ScanFailure::Unreachable(target) => eprintln!(
                    "{} Target unreachable: no pages could be fetched from {}",
                    "✗".red(),
                    target
                ),
                ScanFailure::Internal(e) => eprintln!("{} Scan failed: {:#}", "✗".red(), e),
            }
            failure.exit_code()
        }
    }
}
