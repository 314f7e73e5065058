// Scan orchestration: crawl, passive checks, active probes, discovery and
// aggregation, in that order

use crate::aggregate::{FindingStreams, aggregate};
use crate::discovery::{
    self, ProbeResult, default_exposed_files, default_hidden_paths, directory_listing_findings,
    exposed_file_findings, find_directory_listings, hidden_path_findings,
};
use crate::finding::Finding;
use crate::fingerprint::fingerprint_stack;
use crate::probe::{ProbeOptions, generate_token};
use crate::report::ReportFormat;
use crate::security::{check_cookies, check_security_headers, form_findings};
use crate::sqli::test_basic_sqli;
use crate::xss::test_reflected_xss;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use lightscan_scanner::error::{Result, ScanError};
use lightscan_scanner::normalize::{canonicalize, normalize_base};
use lightscan_scanner::{
    CancelHandle, Crawler, FormDescriptor, Page, ProgressCallback, SharedClient, SkipReason,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Callback for reporting scan phase progress
pub type ScanProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Settings for one scan. Serialized verbatim into reports as the
/// configuration used.
#[derive(Debug, Clone, Serialize)]
pub struct ScanConfig {
    pub target: String,
    pub max_pages: usize,
    pub max_depth: usize,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub output_dir: PathBuf,
    pub formats: Vec<ReportFormat>,
    pub obey_robots: bool,
    /// Seconds to sleep before every request.
    pub delay: f64,
    pub workers: usize,
    pub verbose: bool,
    pub json_output: bool,
    /// Scan-wide deadline in seconds.
    pub max_duration: Option<u64>,
    pub hidden_paths: Vec<String>,
    pub exposed_files: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            target: String::new(),
            max_pages: lightscan_scanner::crawler::DEFAULT_MAX_PAGES,
            max_depth: lightscan_scanner::crawler::DEFAULT_MAX_DEPTH,
            timeout_secs: 10,
            user_agent: lightscan_scanner::http::DEFAULT_USER_AGENT.to_string(),
            output_dir: PathBuf::from("reports"),
            formats: vec![ReportFormat::Markdown, ReportFormat::Html, ReportFormat::Text],
            obey_robots: true,
            delay: 0.0,
            workers: 1,
            verbose: false,
            json_output: false,
            max_duration: None,
            hidden_paths: default_hidden_paths(),
            exposed_files: default_exposed_files(),
        }
    }
}

impl ScanConfig {
    pub fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            ..Default::default()
        }
    }

    /// Reject settings that cannot produce a scan.
    pub fn validate(&self) -> Result<()> {
        if self.max_pages == 0 {
            return Err(ScanError::Config("max pages must be at least 1".to_string()));
        }
        if self.workers == 0 {
            return Err(ScanError::Config("threads must be at least 1".to_string()));
        }
        self.delay_duration()?;
        normalize_base(&self.target)?;
        Ok(())
    }

    /// Rejects negative, non-finite and out-of-range values.
    pub fn delay_duration(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.delay)
            .map_err(|_| ScanError::Config(format!("invalid delay: {}", self.delay)))
    }

    /// Formats to write, with JSON added when `json_output` is set.
    pub fn report_formats(&self) -> Vec<ReportFormat> {
        let mut formats = Vec::new();
        for format in &self.formats {
            if !formats.contains(format) {
                formats.push(*format);
            }
        }
        if self.json_output && !formats.contains(&ReportFormat::Json) {
            formats.push(ReportFormat::Json);
        }
        formats
    }
}

/// Everything collected by a scan. Partial when `interrupted` is set.
#[derive(Debug, Clone, Serialize)]
pub struct ScanState {
    pub scan_id: Uuid,
    pub target: String,
    pub pages: IndexMap<String, Page>,
    pub forms: Vec<FormDescriptor>,
    pub findings: Vec<Finding>,
    pub stack: IndexMap<String, String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub config_used: ScanConfig,
    pub directory_listing: Vec<String>,
    pub hidden_paths: Vec<ProbeResult>,
    pub exposed_files: Vec<ProbeResult>,
    pub skipped: BTreeMap<SkipReason, usize>,
    pub interrupted: bool,
}

impl ScanState {
    fn new(config: ScanConfig) -> Self {
        Self {
            scan_id: Uuid::new_v4(),
            target: config.target.clone(),
            pages: IndexMap::new(),
            forms: Vec::new(),
            findings: Vec::new(),
            stack: IndexMap::new(),
            start_time: Utc::now(),
            end_time: None,
            config_used: config,
            directory_listing: Vec::new(),
            hidden_paths: Vec::new(),
            exposed_files: Vec::new(),
            skipped: BTreeMap::new(),
            interrupted: false,
        }
    }

    /// The page header checks run against: the target itself when it was
    /// fetched, otherwise the first fetched page.
    pub fn representative_page(&self) -> Option<&Page> {
        canonicalize(&self.target)
            .and_then(|key| self.pages.get(&key))
            .or_else(|| self.pages.values().next())
    }

    /// Nothing was fetched and nothing else explains it: the scan ran to
    /// completion and robots.txt did not block the crawl.
    pub fn target_unreachable(&self) -> bool {
        self.pages.is_empty()
            && !self.interrupted
            && !self.skipped.contains_key(&SkipReason::RobotsDisallowed)
    }

    pub fn duration_secs(&self) -> Option<i64> {
        self.end_time.map(|end| (end - self.start_time).num_seconds())
    }
}

fn notify(progress: &Option<ScanProgressCallback>, message: &str) {
    if let Some(callback) = progress {
        callback(message.to_string());
    }
}

/// Run a full scan of `config.target` through `client`.
///
/// Only configuration problems are errors. Transport failures are absorbed
/// along the way, and a tripped `cancel` ends the scan early with whatever
/// was collected so far.
pub async fn execute_scan(
    config: ScanConfig,
    client: SharedClient,
    cancel: CancelHandle,
    progress: Option<ScanProgressCallback>,
) -> Result<ScanState> {
    config.validate()?;
    let target = normalize_base(&config.target)?;
    let config = ScanConfig {
        target: target.clone(),
        ..config
    };
    let mut state = ScanState::new(config.clone());

    info!("Starting scan {} of {}", state.scan_id, target);

    // Crawl
    notify(&progress, "Crawling...");
    let mut crawler = Crawler::new(client.clone())
        .with_max_pages(config.max_pages)
        .with_max_depth(config.max_depth)
        .with_robots(config.obey_robots)
        .with_workers(config.workers)
        .with_cancel(cancel.clone());
    if let Some(callback) = progress.clone() {
        let crawl_callback: ProgressCallback = Arc::new(move |_worker_id: usize, url: String| {
            callback(format!("Crawling {}", url));
        });
        crawler = crawler.with_progress_callback(crawl_callback);
    }

    let outcome = crawler.crawl(&target).await?;
    info!(
        "Crawl finished: {} page(s), {} form(s)",
        outcome.pages.len(),
        outcome.forms.len()
    );
    state.pages = outcome.pages;
    state.forms = outcome.forms;
    state.skipped = outcome.skipped;

    let options = ProbeOptions {
        concurrency: config.workers,
        cancel: cancel.clone(),
    };
    let http = client.as_ref();

    // Discovery
    state.directory_listing = find_directory_listings(&state.pages);
    if state.pages.is_empty() {
        warn!("No pages fetched from {}, skipping active checks", target);
    } else {
        notify(&progress, "Probing hidden paths...");
        state.hidden_paths = discovery::probe_hidden_paths(
            http,
            &target,
            &config.hidden_paths,
            config.workers,
            &cancel,
        )
        .await;
        notify(&progress, "Probing exposed files...");
        state.exposed_files = discovery::probe_exposed_files(
            http,
            &target,
            &config.exposed_files,
            config.workers,
            &cancel,
        )
        .await;
    }

    let mut streams = FindingStreams::default();

    // Passive checks
    if let Some(page) = state.representative_page() {
        streams.headers = check_security_headers(&page.headers, &target);
    }
    for (url, page) in &state.pages {
        streams.cookies.extend(check_cookies(&page.cookies, url));
    }
    streams.forms = form_findings(&state.forms);

    // Active probes
    if !state.pages.is_empty() {
        let token = generate_token();
        info!("Using reflection token {}", token);
        notify(&progress, "Testing parameter reflection...");
        streams.xss = test_reflected_xss(http, &state.pages, &state.forms, &token, &options).await;
        notify(&progress, "Testing SQL error signatures...");
        streams.sqli = test_basic_sqli(http, &state.pages, &state.forms, &options).await;
    }

    state.stack = fingerprint_stack(&state.pages);

    streams.discovery = directory_listing_findings(&state.directory_listing);
    streams.discovery.extend(hidden_path_findings(&state.hidden_paths));
    streams.discovery.extend(exposed_file_findings(&state.exposed_files));

    state.findings = aggregate(streams);
    state.interrupted = outcome.cancelled || cancel.is_cancelled();
    state.end_time = Some(Utc::now());

    if state.interrupted {
        warn!("Scan interrupted; results are partial");
    }
    info!("Scan complete: {} finding(s)", state.findings.len());

    Ok(state)
}
