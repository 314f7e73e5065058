// Tests for report generation functionality

use chrono::{TimeZone, Utc};
use indexmap::IndexMap;
use lightscan_core::discovery::ProbeResult;
use lightscan_core::finding::{Category, Finding, Severity};
use lightscan_core::report::{
    ReportData, ReportFormat, SeverityCounts, generate_html_report, generate_json_report,
    generate_markdown_report, generate_text_report, write_reports,
};
use lightscan_core::scan::{ScanConfig, ScanState};
use lightscan_scanner::{FormDescriptor, FormInput, FormMethod, Headers, Page};
use std::collections::BTreeMap;
use std::str::FromStr;
use tempfile::TempDir;
use uuid::Uuid;

fn sample_state() -> ScanState {
    let mut pages = IndexMap::new();
    pages.insert(
        "http://example.test/".to_string(),
        Page {
            url: "http://example.test/".to_string(),
            status: 200,
            headers: Headers::new(),
            content: String::new(),
            cookies: Vec::new(),
            depth: 0,
        },
    );

    let mut stack = IndexMap::new();
    stack.insert("Server".to_string(), "nginx".to_string());

    ScanState {
        scan_id: Uuid::new_v4(),
        target: "http://example.test".to_string(),
        pages,
        forms: vec![FormDescriptor {
            page_url: "http://example.test/".to_string(),
            method: FormMethod::Post,
            action: "http://example.test/submit".to_string(),
            inputs: vec![FormInput::new(Some("q"), "text")],
        }],
        findings: vec![
            Finding::new(
                "Potential Reflected XSS",
                Category::Xss,
                Severity::Medium,
                "http://example.test/a?id=xss_probe_1",
            )
            .description("Token reflected unencoded in response.")
            .evidence("<script>xss_probe_1</script>")
            .recommendation("Encode output."),
            Finding::new(
                "Missing Permissions-Policy",
                Category::Headers,
                Severity::Info,
                "http://example.test",
            ),
        ],
        stack,
        start_time: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
        end_time: Some(Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 35).unwrap()),
        config_used: ScanConfig::new("http://example.test"),
        directory_listing: Vec::new(),
        hidden_paths: vec![ProbeResult {
            url: "http://example.test/admin".to_string(),
            path: "admin".to_string(),
            status: Some(200),
        }],
        exposed_files: Vec::new(),
        skipped: BTreeMap::new(),
        interrupted: false,
    }
}

// ============================================================================
// Report Format Tests
// ============================================================================

#[test]
fn test_report_format_from_str() {
    assert_eq!(ReportFormat::from_str("text").unwrap(), ReportFormat::Text);
    assert_eq!(ReportFormat::from_str("txt").unwrap(), ReportFormat::Text);
    assert_eq!(ReportFormat::from_str("md").unwrap(), ReportFormat::Markdown);
    assert_eq!(ReportFormat::from_str("HTML").unwrap(), ReportFormat::Html);
    assert_eq!(ReportFormat::from_str("Json").unwrap(), ReportFormat::Json);
}

#[test]
fn test_report_format_from_str_invalid() {
    assert!(ReportFormat::from_str("pdf").is_err());
    assert!(ReportFormat::parse_list("md,pdf").is_err());
}

#[test]
fn test_report_format_extension() {
    assert_eq!(ReportFormat::Text.extension(), "txt");
    assert_eq!(ReportFormat::Markdown.extension(), "md");
    assert_eq!(ReportFormat::Html.extension(), "html");
    assert_eq!(ReportFormat::Json.extension(), "json");
}

// ============================================================================
// Report Data Tests
// ============================================================================

#[test]
fn test_report_data_from_state() {
    let data = ReportData::from_state(&sample_state()).unwrap();

    assert_eq!(data.target, "http://example.test");
    assert_eq!(data.duration_seconds, Some(30));
    assert_eq!(data.pages.len(), 1);
    assert_eq!(data.forms[0].method, "POST");
    assert_eq!(data.forms[0].inputs, vec!["q"]);
    assert_eq!(
        data.severity_counts,
        SeverityCounts {
            high: 0,
            medium: 1,
            low: 0,
            info: 1
        }
    );
    assert_eq!(data.severity_counts.total(), 2);
    assert_eq!(data.config_used["max_pages"], 100);
}

// ============================================================================
// Report Generation Tests
// ============================================================================

#[test]
fn test_generate_text_report() {
    let data = ReportData::from_state(&sample_state()).unwrap();
    let report = generate_text_report(&data);

    assert!(report.contains("LIGHTSCAN SECURITY SCAN REPORT"));
    assert!(report.contains("Target:       http://example.test"));
    assert!(report.contains("Duration:     30 seconds"));
    assert!(report.contains("Total Findings: 2"));
    assert!(report.contains("[MEDIUM]"));
    assert!(report.contains("[1] Potential Reflected XSS"));
    assert!(report.contains("Server: nginx"));
    assert!(report.contains("End of Report"));
}

#[test]
fn test_generate_markdown_report() {
    let data = ReportData::from_state(&sample_state()).unwrap();
    let report = generate_markdown_report(&data);

    assert!(report.starts_with("# LightScan Security Scan Report"));
    assert!(report.contains("| Medium | 1 |"));
    assert!(report.contains("### 1. Potential Reflected XSS (Medium)"));
    assert!(report.contains("### 2. Missing Permissions-Policy (Info)"));
    assert!(report.contains("- Hidden path: http://example.test/admin (200)"));
}

#[test]
fn test_generate_html_report_escapes_content() {
    let data = ReportData::from_state(&sample_state()).unwrap();
    let report = generate_html_report(&data);

    assert!(report.starts_with("<!DOCTYPE html>"));
    assert!(report.contains("&lt;script&gt;xss_probe_1&lt;/script&gt;"));
    assert!(!report.contains("<script>xss_probe_1"));
    assert!(report.contains("</html>"));
}

#[test]
fn test_generate_json_report() {
    let data = ReportData::from_state(&sample_state()).unwrap();
    let json = generate_json_report(&data).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let report = &value["report"];
    assert_eq!(report["metadata"]["generator"], "LightScan");
    assert_eq!(report["scan"]["target"], "http://example.test");
    assert_eq!(report["summary"]["total_findings"], 2);
    assert_eq!(report["summary"]["severity_breakdown"]["medium"], 1);
    assert_eq!(report["findings"][0]["category"], "XSS");
    assert_eq!(report["findings"][0]["severity"], "Medium");
    assert_eq!(report["discovery"]["hidden_paths"][0]["status"], 200);
}

// ============================================================================
// Report Writing Tests
// ============================================================================

#[test]
fn test_write_reports_one_file_per_format() {
    let temp_dir = TempDir::new().unwrap();
    let out_dir = temp_dir.path().join("nested").join("reports");
    let mut state = sample_state();
    state.config_used.json_output = true;

    let written = write_reports(&state, &out_dir).unwrap();

    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(
        names,
        vec![
            "lightscan_report.md",
            "lightscan_report.html",
            "lightscan_report.txt",
            "lightscan_report.json"
        ]
    );
    for path in &written {
        assert!(path.exists());
        assert!(std::fs::metadata(path).unwrap().len() > 0);
    }
}
