// Tests for forced browsing, wordlists and directory listing detection

mod common;

use common::{StubClient, html_response};
use indexmap::IndexMap;
use lightscan_core::discovery::{
    ProbeResult, directory_listing_findings, exposed_file_findings, find_directory_listings,
    hidden_path_findings, load_wordlist, probe_exposed_files, probe_hidden_paths,
};
use lightscan_core::finding::{Category, Severity};
use lightscan_scanner::{CancelHandle, Headers, Page, ScanError};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

fn result(url: &str, path: &str, status: Option<u16>) -> ProbeResult {
    ProbeResult {
        url: url.to_string(),
        path: path.to_string(),
        status,
    }
}

// ============================================================================
// Wordlist Tests
// ============================================================================

#[test]
fn test_load_wordlist_basic() {
    let temp_dir = TempDir::new().unwrap();
    let wordlist_path = temp_dir.path().join("hidden.txt");

    fs::write(&wordlist_path, "admin\nbackup\n.git/config").unwrap();

    let words = load_wordlist(&wordlist_path).unwrap();
    assert_eq!(words, vec!["admin", "backup", ".git/config"]);
}

#[test]
fn test_load_wordlist_skips_comments_and_blank_lines() {
    let temp_dir = TempDir::new().unwrap();
    let wordlist_path = temp_dir.path().join("hidden.txt");

    fs::write(&wordlist_path, "# dirs\nadmin\n\n   \n  staging  \n# end\n").unwrap();

    let words = load_wordlist(&wordlist_path).unwrap();
    assert_eq!(words, vec!["admin", "staging"]);
}

#[test]
fn test_load_wordlist_only_comments() {
    let temp_dir = TempDir::new().unwrap();
    let wordlist_path = temp_dir.path().join("hidden.txt");

    fs::write(&wordlist_path, "# Comment 1\n# Comment 2").unwrap();

    assert!(matches!(load_wordlist(&wordlist_path), Err(ScanError::Wordlist(_))));
}

#[test]
fn test_load_wordlist_nonexistent_file() {
    let wordlist_path = PathBuf::from("/nonexistent/path/wordlist.txt");
    assert!(matches!(load_wordlist(&wordlist_path), Err(ScanError::Wordlist(_))));
}

// ============================================================================
// Probe Tests
// ============================================================================

#[tokio::test]
async fn test_hidden_paths_probe_origin_root() {
    let client = StubClient::new()
        .response("http://example.test/admin", html_response(302, ""))
        .response("http://example.test/backup", html_response(404, "not found"));

    let results = probe_hidden_paths(
        &client,
        "http://example.test/app/index.php",
        &words(&["/admin/", "backup", "tmp"]),
        1,
        &CancelHandle::new(),
    )
    .await;

    assert_eq!(
        results,
        vec![
            result("http://example.test/admin", "/admin/", Some(302)),
            result("http://example.test/backup", "backup", Some(404)),
            result("http://example.test/tmp", "tmp", None),
        ]
    );

    let findings = hidden_path_findings(&results);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].title, "Accessible Hidden Path");
    assert_eq!(findings[0].severity, Severity::Info);
    assert_eq!(findings[0].location, "http://example.test/admin");
    assert_eq!(findings[0].evidence, "Status 302");
}

#[tokio::test]
async fn test_exposed_files_require_exact_200() {
    let client = StubClient::new()
        .response("http://example.test:8080/.env", html_response(200, "DB_PASSWORD=x"))
        .response("http://example.test:8080/.git/config", html_response(403, ""))
        .response("http://example.test:8080/backup.zip", html_response(204, ""));

    let results = probe_exposed_files(
        &client,
        "http://example.test:8080",
        &words(&[".env", "/.git/config", "backup.zip"]),
        4,
        &CancelHandle::new(),
    )
    .await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[1].url, "http://example.test:8080/.git/config");

    let findings = exposed_file_findings(&results);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].title, "Potentially Sensitive Exposed File");
    assert_eq!(findings[0].severity, Severity::Medium);
    assert_eq!(findings[0].category, Category::Discovery);
    assert_eq!(findings[0].evidence, "Status 200 for .env");
}

#[tokio::test]
async fn test_cancelled_discovery_sends_nothing() {
    let client = StubClient::new();
    let cancel = CancelHandle::new();
    cancel.cancel();

    let results =
        probe_hidden_paths(&client, "http://example.test", &words(&["admin"]), 1, &cancel).await;

    assert!(results.is_empty());
    assert!(client.gets().is_empty());
}

// ============================================================================
// Directory Listing Tests
// ============================================================================

#[test]
fn test_directory_listing_pages_become_low_findings() {
    let mut pages = IndexMap::new();
    for (url, content) in [
        ("http://example.test/", "<title>Welcome</title>"),
        ("http://example.test/files/", "<title>Index of /files</title>"),
    ] {
        pages.insert(
            url.to_string(),
            Page {
                url: url.to_string(),
                status: 200,
                headers: Headers::new(),
                content: content.to_string(),
                cookies: Vec::new(),
                depth: 0,
            },
        );
    }

    let listings = find_directory_listings(&pages);
    assert_eq!(listings, vec!["http://example.test/files/"]);

    let findings = directory_listing_findings(&listings);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].title, "Potential Directory Listing Enabled");
    assert_eq!(findings[0].severity, Severity::Low);
}
