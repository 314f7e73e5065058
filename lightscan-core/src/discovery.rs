// Forced browsing against the origin root plus directory listing detection

use crate::finding::{Category, Finding, Severity};
use futures::stream::{self, StreamExt};
use indexmap::IndexMap;
use lightscan_scanner::error::{Result, ScanError};
use lightscan_scanner::normalize::origin_root;
use lightscan_scanner::{CancelHandle, HttpClient, Page};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info};

const DEFAULT_HIDDEN_PATHS: &str = include_str!("../wordlists/hidden_paths.txt");
const DEFAULT_EXPOSED_FILES: &str = include_str!("../wordlists/exposed_files.txt");

static LISTING_TITLE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)<title>\s*Index of /").ok());

/// Status of one forced-browsing request. `status` is `None` when the
/// request failed at the transport level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub url: String,
    pub path: String,
    pub status: Option<u16>,
}

pub fn default_hidden_paths() -> Vec<String> {
    parse_wordlist(DEFAULT_HIDDEN_PATHS)
}

pub fn default_exposed_files() -> Vec<String> {
    parse_wordlist(DEFAULT_EXPOSED_FILES)
}

/// One entry per line; blank lines and `#` comments are skipped.
pub fn parse_wordlist(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Load a wordlist file. An unreadable or empty file is an error.
pub fn load_wordlist(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .map_err(|e| ScanError::Wordlist(format!("Failed to read wordlist {}: {}", path.display(), e)))?;

    let words = parse_wordlist(&content);
    if words.is_empty() {
        return Err(ScanError::Wordlist(format!(
            "Wordlist {} is empty or contains only comments",
            path.display()
        )));
    }

    Ok(words)
}

/// Directory candidate: surrounding slashes are dropped from the entry.
pub fn hidden_path_url(root: &str, path: &str) -> String {
    format!("{}/{}", root.trim_end_matches('/'), path.trim_matches('/'))
}

/// File candidate: only a leading slash is dropped.
pub fn exposed_file_url(root: &str, file: &str) -> String {
    format!("{}/{}", root.trim_end_matches('/'), file.trim_start_matches('/'))
}

/// Request each candidate once, in wordlist order.
async fn probe_candidates(
    client: &dyn HttpClient,
    candidates: Vec<(String, String)>,
    concurrency: usize,
    cancel: &CancelHandle,
) -> Vec<ProbeResult> {
    stream::iter(candidates)
        .map(|(url, path)| {
            let cancel = cancel.clone();
            async move {
                if cancel.is_cancelled() {
                    return None;
                }
                let status = client.get(&url).await.map(|r| r.status_code);
                debug!("Probed {} -> {:?}", url, status);
                Some(ProbeResult { url, path, status })
            }
        })
        .buffered(concurrency.max(1))
        .filter_map(|result| async move { result })
        .collect()
        .await
}

pub async fn probe_hidden_paths(
    client: &dyn HttpClient,
    base: &str,
    wordlist: &[String],
    concurrency: usize,
    cancel: &CancelHandle,
) -> Vec<ProbeResult> {
    let Some(root) = origin_root(base) else {
        return Vec::new();
    };
    let candidates = wordlist
        .iter()
        .map(|p| (hidden_path_url(&root, p), p.clone()))
        .collect();
    info!("Probing {} hidden path(s) under {}", wordlist.len(), root);
    probe_candidates(client, candidates, concurrency, cancel).await
}

pub async fn probe_exposed_files(
    client: &dyn HttpClient,
    base: &str,
    files: &[String],
    concurrency: usize,
    cancel: &CancelHandle,
) -> Vec<ProbeResult> {
    let Some(root) = origin_root(base) else {
        return Vec::new();
    };
    let candidates = files
        .iter()
        .map(|f| (exposed_file_url(&root, f), f.clone()))
        .collect();
    info!("Probing {} exposed file(s) under {}", files.len(), root);
    probe_candidates(client, candidates, concurrency, cancel).await
}

pub fn is_directory_listing(content: &str) -> bool {
    if content.is_empty() {
        return false;
    }
    LISTING_TITLE.as_ref().is_some_and(|re| re.is_match(content)) || content.contains("Index of /")
}

/// URLs of crawled pages whose content looks like an autoindex page.
pub fn find_directory_listings(pages: &IndexMap<String, Page>) -> Vec<String> {
    pages
        .iter()
        .filter(|(_, page)| is_directory_listing(&page.content))
        .map(|(url, _)| url.clone())
        .collect()
}

pub fn directory_listing_findings(urls: &[String]) -> Vec<Finding> {
    urls.iter()
        .map(|url| {
            Finding::new("Potential Directory Listing Enabled", Category::Discovery, Severity::Low, url)
                .description("Page appears to expose a raw directory listing.")
                .evidence("...Index of /... observed")
                .recommendation("Disable autoindex/directory listing for production resources.")
        })
        .collect()
}

/// Findings for hidden paths answering with any status below 400.
pub fn hidden_path_findings(results: &[ProbeResult]) -> Vec<Finding> {
    results
        .iter()
        .filter_map(|r| r.status.filter(|s| *s < 400).map(|s| (r, s)))
        .map(|(r, status)| {
            Finding::new("Accessible Hidden Path", Category::Discovery, Severity::Info, &r.url)
                .description("Hidden path from small wordlist is accessible.")
                .evidence(format!("Status {}", status))
                .recommendation("Review and restrict or remove unused paths.")
        })
        .collect()
}

/// Findings for exposed files answering exactly 200.
pub fn exposed_file_findings(results: &[ProbeResult]) -> Vec<Finding> {
    results
        .iter()
        .filter(|r| r.status == Some(200))
        .map(|r| {
            Finding::new(
                "Potentially Sensitive Exposed File",
                Category::Discovery,
                Severity::Medium,
                &r.url,
            )
            .description("A known sensitive filename responded with 200 OK.")
            .evidence(format!("Status 200 for {}", r.path))
            .recommendation("Remove or restrict sensitive files from public access.")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_wordlists_loaded() {
        let hidden = default_hidden_paths();
        assert_eq!(hidden.len(), 14);
        assert_eq!(hidden.first().map(String::as_str), Some("admin"));
        assert!(hidden.contains(&"server-status".to_string()));

        let files = default_exposed_files();
        assert_eq!(files.len(), 14);
        assert!(files.contains(&".git/HEAD".to_string()));
        assert!(files.contains(&"phpinfo.php".to_string()));
    }

    #[test]
    fn test_candidate_urls() {
        assert_eq!(hidden_path_url("http://x.test", "/admin/"), "http://x.test/admin");
        assert_eq!(exposed_file_url("http://x.test/", "/.git/config"), "http://x.test/.git/config");
        assert_eq!(exposed_file_url("http://x.test", "backup/"), "http://x.test/backup/");
    }

    #[test]
    fn test_directory_listing_detection() {
        assert!(is_directory_listing("<html><TITLE> index of /files</TITLE>"));
        assert!(is_directory_listing("<h1>Index of /</h1>"));
        assert!(!is_directory_listing("<title>Home</title>"));
        assert!(!is_directory_listing(""));
    }
}
