// Report generation from a finished scan

use crate::discovery::ProbeResult;
use crate::finding::{Finding, Severity};
use crate::probe::html_escape;
use crate::scan::ScanState;
use indexmap::IndexMap;
use lightscan_scanner::error::{Result, ScanError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const REPORT_BASENAME: &str = "lightscan_report";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Text,
    Markdown,
    Html,
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Markdown => "md",
            ReportFormat::Html => "html",
            ReportFormat::Json => "json",
        }
    }

    /// Parse a comma separated list such as `md,html,txt`.
    pub fn parse_list(list: &str) -> Result<Vec<Self>> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Self::from_str)
            .collect()
    }
}

impl FromStr for ReportFormat {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "txt" | "text" => Ok(ReportFormat::Text),
            "md" | "markdown" => Ok(ReportFormat::Markdown),
            "html" => Ok(ReportFormat::Html),
            "json" => Ok(ReportFormat::Json),
            other => Err(ScanError::Config(format!("unknown report format '{}'", other))),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
}

impl SeverityCounts {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut counts = Self::default();
        for finding in findings {
            match finding.severity {
                Severity::High => counts.high += 1,
                Severity::Medium => counts.medium += 1,
                Severity::Low => counts.low += 1,
                Severity::Info => counts.info += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low + self.info
    }

    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
            Severity::Info => self.info,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSummary {
    pub url: String,
    pub status: u16,
    pub depth: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSummary {
    pub page: String,
    pub method: String,
    pub action: String,
    pub inputs: Vec<String>,
}

/// Flattened view of a scan, shared by every report format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub scan_id: String,
    pub target: String,
    pub start_time: String,
    pub end_time: Option<String>,
    pub duration_seconds: Option<i64>,
    pub interrupted: bool,
    pub findings: Vec<Finding>,
    pub severity_counts: SeverityCounts,
    pub pages: Vec<PageSummary>,
    pub forms: Vec<FormSummary>,
    pub stack: IndexMap<String, String>,
    pub directory_listing: Vec<String>,
    pub hidden_paths: Vec<ProbeResult>,
    pub exposed_files: Vec<ProbeResult>,
    pub config_used: serde_json::Value,
}

impl ReportData {
    pub fn from_state(state: &ScanState) -> Result<Self> {
        Ok(Self {
            scan_id: state.scan_id.to_string(),
            target: state.target.clone(),
            start_time: state.start_time.to_rfc3339(),
            end_time: state.end_time.map(|t| t.to_rfc3339()),
            duration_seconds: state.duration_secs(),
            interrupted: state.interrupted,
            findings: state.findings.clone(),
            severity_counts: SeverityCounts::from_findings(&state.findings),
            pages: state
                .pages
                .values()
                .map(|p| PageSummary {
                    url: p.url.clone(),
                    status: p.status,
                    depth: p.depth,
                })
                .collect(),
            forms: state
                .forms
                .iter()
                .map(|f| FormSummary {
                    page: f.page_url.clone(),
                    method: f.method.as_str().to_uppercase(),
                    action: f.action.clone(),
                    inputs: f
                        .named_inputs()
                        .filter_map(|i| i.probe_name())
                        .map(str::to_string)
                        .collect(),
                })
                .collect(),
            stack: state.stack.clone(),
            directory_listing: state.directory_listing.clone(),
            hidden_paths: state.hidden_paths.clone(),
            exposed_files: state.exposed_files.clone(),
            config_used: serde_json::to_value(&state.config_used)?,
        })
    }

    fn status_label(&self) -> &'static str {
        if self.interrupted {
            "Interrupted (partial results)"
        } else {
            "Completed"
        }
    }

    fn accessible_hidden_paths(&self) -> impl Iterator<Item = &ProbeResult> {
        self.hidden_paths.iter().filter(|r| r.status.is_some_and(|s| s < 400))
    }

    fn exposed_hits(&self) -> impl Iterator<Item = &ProbeResult> {
        self.exposed_files.iter().filter(|r| r.status == Some(200))
    }
}

const HEAVY_RULE: &str =
    "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";
const LIGHT_RULE: &str =
    "────────────────────────────────────────────────────────────────────────────────\n";

pub fn generate_text_report(data: &ReportData) -> String {
    let mut report = String::new();

    // Header
    report.push_str(HEAVY_RULE);
    report.push_str("                        LIGHTSCAN SECURITY SCAN REPORT\n");
    report.push_str(HEAVY_RULE);
    report.push('\n');

    report.push_str(&format!("Scan ID:      {}\n", data.scan_id));
    report.push_str(&format!("Target:       {}\n", data.target));
    report.push_str(&format!("Status:       {}\n", data.status_label()));
    report.push_str(&format!("Started:      {}\n", data.start_time));
    if let Some(ref end) = data.end_time {
        report.push_str(&format!("Finished:     {}\n", end));
    }
    if let Some(duration) = data.duration_seconds {
        report.push_str(&format!("Duration:     {} seconds\n", duration));
    }
    report.push_str(&format!("Pages Found:  {}\n", data.pages.len()));
    report.push_str(&format!("Forms Found:  {}\n", data.forms.len()));
    report.push('\n');

    if !data.stack.is_empty() {
        report.push_str(HEAVY_RULE);
        report.push_str("TECHNOLOGY STACK\n");
        report.push_str(HEAVY_RULE);
        report.push('\n');
        for (key, value) in &data.stack {
            report.push_str(&format!("  {}: {}\n", key, value));
        }
        report.push('\n');
    }

    // Summary
    report.push_str(HEAVY_RULE);
    report.push_str("EXECUTIVE SUMMARY\n");
    report.push_str(HEAVY_RULE);
    report.push('\n');
    report.push_str(&format!("Total Findings: {}\n\n", data.severity_counts.total()));
    for severity in Severity::all() {
        let count = data.severity_counts.get(severity);
        if count > 0 {
            report.push_str(&format!(
                "  {:<10} {}\n",
                format!("[{}]", severity.as_str().to_uppercase()),
                count
            ));
        }
    }
    report.push('\n');

    if !data.findings.is_empty() {
        report.push_str(HEAVY_RULE);
        report.push_str("DETAILED FINDINGS\n");
        report.push_str(HEAVY_RULE);
        report.push('\n');

        for (idx, finding) in data.findings.iter().enumerate() {
            report.push_str(&format!("[{}] {}\n", idx + 1, finding.title));
            report.push_str(&format!("Severity:     {}\n", finding.severity.as_str().to_uppercase()));
            report.push_str(&format!("Category:     {}\n", finding.category));
            report.push_str(&format!("Location:     {}\n", finding.location));

            report.push_str("\nDescription:\n");
            report.push_str(&wrap_text(&finding.description, 80, "  "));
            if !finding.evidence.is_empty() {
                report.push_str("\nEvidence:\n");
                report.push_str(&wrap_text(&finding.evidence, 80, "  "));
            }
            if !finding.recommendation.is_empty() {
                report.push_str("\nRecommendation:\n");
                report.push_str(&wrap_text(&finding.recommendation, 80, "  "));
            }
            report.push('\n');
            report.push_str(LIGHT_RULE);
            report.push('\n');
        }
    }

    if !data.pages.is_empty() {
        report.push_str(HEAVY_RULE);
        report.push_str("CRAWLED PAGES\n");
        report.push_str(HEAVY_RULE);
        report.push('\n');
        for page in &data.pages {
            report.push_str(&format!("  [{}] {}\n", page.status, page.url));
        }
        report.push('\n');
    }

    // Footer
    report.push_str(HEAVY_RULE);
    report.push_str("                          End of Report\n");
    report.push_str(HEAVY_RULE);
    report.push_str("\nGenerated by LightScan - a lightweight, non-intrusive web scanner\n");
    report.push_str("For authorized security testing only.\n\n");

    report
}

pub fn generate_markdown_report(data: &ReportData) -> String {
    let mut report = String::new();

    report.push_str("# LightScan Security Scan Report\n\n");
    report.push_str(&format!("- **Target:** {}\n", data.target));
    report.push_str(&format!("- **Scan ID:** `{}`\n", data.scan_id));
    report.push_str(&format!("- **Status:** {}\n", data.status_label()));
    report.push_str(&format!("- **Started:** {}\n", data.start_time));
    if let Some(ref end) = data.end_time {
        report.push_str(&format!("- **Finished:** {}\n", end));
    }
    report.push_str(&format!("- **Pages crawled:** {}\n", data.pages.len()));
    report.push_str(&format!("- **Forms found:** {}\n\n", data.forms.len()));

    report.push_str("## Summary\n\n");
    report.push_str("| Severity | Count |\n|---|---|\n");
    for severity in Severity::all() {
        report.push_str(&format!("| {} | {} |\n", severity, data.severity_counts.get(severity)));
    }
    report.push_str(&format!("| **Total** | **{}** |\n\n", data.severity_counts.total()));

    if !data.stack.is_empty() {
        report.push_str("## Technology Stack\n\n");
        for (key, value) in &data.stack {
            report.push_str(&format!("- **{}:** {}\n", key, value));
        }
        report.push('\n');
    }

    report.push_str("## Findings\n\n");
    if data.findings.is_empty() {
        report.push_str("No findings.\n\n");
    }
    for (idx, finding) in data.findings.iter().enumerate() {
        report.push_str(&format!("### {}. {} ({})\n\n", idx + 1, finding.title, finding.severity));
        report.push_str(&format!("- **Category:** {}\n", finding.category));
        report.push_str(&format!("- **Location:** `{}`\n", finding.location));
        if !finding.description.is_empty() {
            report.push_str(&format!("- **Description:** {}\n", finding.description));
        }
        if !finding.evidence.is_empty() {
            report.push_str(&format!("- **Evidence:** `{}`\n", finding.evidence.replace('`', "'")));
        }
        if !finding.recommendation.is_empty() {
            report.push_str(&format!("- **Recommendation:** {}\n", finding.recommendation));
        }
        report.push('\n');
    }

    if !data.directory_listing.is_empty()
        || data.accessible_hidden_paths().next().is_some()
        || data.exposed_hits().next().is_some()
    {
        report.push_str("## Discovery\n\n");
        for url in &data.directory_listing {
            report.push_str(&format!("- Directory listing: {}\n", url));
        }
        for hit in data.accessible_hidden_paths() {
            if let Some(status) = hit.status {
                report.push_str(&format!("- Hidden path: {} ({})\n", hit.url, status));
            }
        }
        for hit in data.exposed_hits() {
            report.push_str(&format!("- Exposed file: {}\n", hit.url));
        }
        report.push('\n');
    }

    if !data.pages.is_empty() {
        report.push_str("## Crawled Pages\n\n");
        for page in &data.pages {
            report.push_str(&format!("- [{}] {}\n", page.status, page.url));
        }
        report.push('\n');
    }

    if !data.forms.is_empty() {
        report.push_str("## Forms\n\n");
        for form in &data.forms {
            report.push_str(&format!(
                "- {} `{}` on {} (inputs: {})\n",
                form.method,
                form.action,
                form.page,
                form.inputs.join(", ")
            ));
        }
        report.push('\n');
    }

    report.push_str("---\n\n_Generated by LightScan. For authorized security testing only._\n");
    report
}

pub fn generate_html_report(data: &ReportData) -> String {
    let mut report = String::new();

    report.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    report.push_str(&format!(
        "<title>LightScan Report - {}</title>\n",
        html_escape(&data.target)
    ));
    report.push_str(
        "<style>\n\
         body { font-family: sans-serif; margin: 2em; color: #222; }\n\
         table { border-collapse: collapse; }\n\
         td, th { border: 1px solid #ccc; padding: 4px 8px; text-align: left; }\n\
         .sev-High { color: #b00020; } .sev-Medium { color: #d35400; }\n\
         .sev-Low { color: #b7950b; } .sev-Info { color: #2471a3; }\n\
         code { background: #f4f4f4; padding: 1px 4px; }\n\
         </style>\n</head>\n<body>\n",
    );

    report.push_str("<h1>LightScan Security Scan Report</h1>\n<ul>\n");
    report.push_str(&format!("<li><b>Target:</b> {}</li>\n", html_escape(&data.target)));
    report.push_str(&format!("<li><b>Scan ID:</b> {}</li>\n", html_escape(&data.scan_id)));
    report.push_str(&format!("<li><b>Status:</b> {}</li>\n", data.status_label()));
    report.push_str(&format!("<li><b>Started:</b> {}</li>\n", html_escape(&data.start_time)));
    if let Some(ref end) = data.end_time {
        report.push_str(&format!("<li><b>Finished:</b> {}</li>\n", html_escape(end)));
    }
    report.push_str(&format!("<li><b>Pages crawled:</b> {}</li>\n", data.pages.len()));
    report.push_str(&format!("<li><b>Forms found:</b> {}</li>\n</ul>\n", data.forms.len()));

    report.push_str("<h2>Summary</h2>\n<table>\n<tr><th>Severity</th><th>Count</th></tr>\n");
    for severity in Severity::all() {
        report.push_str(&format!(
            "<tr><td class=\"sev-{0}\">{0}</td><td>{1}</td></tr>\n",
            severity,
            data.severity_counts.get(severity)
        ));
    }
    report.push_str("</table>\n");

    if !data.stack.is_empty() {
        report.push_str("<h2>Technology Stack</h2>\n<ul>\n");
        for (key, value) in &data.stack {
            report.push_str(&format!(
                "<li><b>{}:</b> {}</li>\n",
                html_escape(key),
                html_escape(value)
            ));
        }
        report.push_str("</ul>\n");
    }

    report.push_str("<h2>Findings</h2>\n");
    if data.findings.is_empty() {
        report.push_str("<p>No findings.</p>\n");
    } else {
        report.push_str(
            "<table>\n<tr><th>#</th><th>Severity</th><th>Title</th><th>Category</th>\
             <th>Location</th><th>Description</th><th>Evidence</th><th>Recommendation</th></tr>\n",
        );
        for (idx, finding) in data.findings.iter().enumerate() {
            report.push_str(&format!(
                "<tr><td>{}</td><td class=\"sev-{}\">{}</td><td>{}</td><td>{}</td>\
                 <td><code>{}</code></td><td>{}</td><td><code>{}</code></td><td>{}</td></tr>\n",
                idx + 1,
                finding.severity,
                finding.severity,
                html_escape(&finding.title),
                finding.category,
                html_escape(&finding.location),
                html_escape(&finding.description),
                html_escape(&finding.evidence),
                html_escape(&finding.recommendation),
            ));
        }
        report.push_str("</table>\n");
    }

    if !data.pages.is_empty() {
        report.push_str("<h2>Crawled Pages</h2>\n<ul>\n");
        for page in &data.pages {
            report.push_str(&format!(
                "<li>[{}] {}</li>\n",
                page.status,
                html_escape(&page.url)
            ));
        }
        report.push_str("</ul>\n");
    }

    report.push_str("<p><i>Generated by LightScan. For authorized security testing only.</i></p>\n");
    report.push_str("</body>\n</html>\n");
    report
}

pub fn generate_json_report(data: &ReportData) -> std::result::Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "LightScan",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json",
                "disclaimer": "For authorized security testing only"
            },
            "scan": {
                "id": data.scan_id,
                "target": data.target,
                "start_time": data.start_time,
                "end_time": data.end_time,
                "duration_seconds": data.duration_seconds,
                "interrupted": data.interrupted,
                "config_used": data.config_used
            },
            "summary": {
                "total_pages": data.pages.len(),
                "total_forms": data.forms.len(),
                "total_findings": data.severity_counts.total(),
                "severity_breakdown": data.severity_counts
            },
            "findings": data.findings,
            "stack": data.stack,
            "pages": data.pages,
            "forms": data.forms,
            "discovery": {
                "directory_listing": data.directory_listing,
                "hidden_paths": data.hidden_paths,
                "exposed_files": data.exposed_files
            }
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn generate_report(data: &ReportData, format: ReportFormat) -> Result<String> {
    Ok(match format {
        ReportFormat::Text => generate_text_report(data),
        ReportFormat::Markdown => generate_markdown_report(data),
        ReportFormat::Html => generate_html_report(data),
        ReportFormat::Json => generate_json_report(data)?,
    })
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Write one `lightscan_report.<ext>` per configured format into `dir`,
/// creating it if needed. Returns the written paths in format order.
pub fn write_reports(state: &ScanState, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let data = ReportData::from_state(state)?;

    let mut written = Vec::new();
    for format in state.config_used.report_formats() {
        let path = dir.join(format!("{}.{}", REPORT_BASENAME, format.extension()));
        save_report(&generate_report(&data, format)?, &path)?;
        written.push(path);
    }
    Ok(written)
}

fn wrap_text(text: &str, width: usize, indent: &str) -> String {
    let mut result = String::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.len() + word.len() + 1 > width - indent.len() && !current_line.is_empty() {
            result.push_str(indent);
            result.push_str(&current_line);
            result.push('\n');
            current_line.clear();
        }

        if !current_line.is_empty() {
            current_line.push(' ');
        }
        current_line.push_str(word);
    }

    if !current_line.is_empty() {
        result.push_str(indent);
        result.push_str(&current_line);
        result.push('\n');
    }

    result
}
