// Error-based SQL injection indicators: break the query with a quote and
// look for database error text in the response

use crate::finding::{Category, Finding, Severity, truncate_chars};
use crate::probe::{PLACEHOLDER_VALUE, ProbeOptions, TestedSet, mutate_query, query_params, run_probes};
use indexmap::IndexMap;
use lightscan_scanner::{FormData, FormDescriptor, FormMethod, HttpClient, Page};
use regex::Regex;
use std::sync::LazyLock;
use tracing::info;

pub const SQLI_PAYLOADS: &[&str] = &["'", "\""];

const MAX_MATCH_CHARS: usize = 100;

static SQL_ERROR_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)You have an error in your SQL syntax",
        r"(?i)Warning: mysql_",
        r"(?i)pg_query\(",
        r"(?i)PG::SyntaxError",
        r"(?i)SQLSTATE\[HY000\]",
        r"(?i)Microsoft OLE DB Provider",
        r"(?i)ODBC SQL Server Driver",
        r"(?i)Unclosed quotation mark after the character string",
        r"(?i)SQLite/JDBCDriver",
        r"(?i)SQLITE_ERROR",
        r"(?i)ORA-\d+",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Leftmost database error signature in `body`, cut to 100 characters.
pub fn find_sql_error(body: &str) -> Option<String> {
    SQL_ERROR_PATTERNS
        .iter()
        .filter_map(|re| re.find(body))
        .min_by_key(|m| m.start())
        .map(|m| truncate_chars(m.as_str(), MAX_MATCH_CHARS))
}

/// Append each payload to every query parameter of every crawled URL, and to
/// every named field of every POST form.
pub async fn test_basic_sqli(
    client: &dyn HttpClient,
    pages: &IndexMap<String, Page>,
    forms: &[FormDescriptor],
    options: &ProbeOptions,
) -> Vec<Finding> {
    let tested = TestedSet::new();

    let mut query_jobs = Vec::new();
    for url in pages.keys().filter(|url| url.contains('?')) {
        for (param, _) in query_params(url) {
            for payload in SQLI_PAYLOADS {
                if let Some(mutated) = mutate_query(url, &param, |v| format!("{}{}", v, payload))
                    && tested.claim(&mutated)
                {
                    query_jobs.push(mutated);
                }
            }
        }
    }

    info!("SQLi probe: {} parameter mutation(s)", query_jobs.len());

    let mut findings = run_probes(query_jobs, options, |url| async move {
        let response = client.get(&url).await?;
        if response.status_code != 200 {
            return None;
        }
        let matched = find_sql_error(&response.text)?;
        Some(
            Finding::new("Possible SQL Injection Indicator", Category::Sqli, Severity::Medium, &url)
                .description("Database error message returned after injecting a quote.")
                .evidence(matched)
                .recommendation("Use parameterized queries and centralized error handling."),
        )
    })
    .await;

    let mut form_jobs: Vec<(String, FormData)> = Vec::new();
    for form in forms.iter().filter(|form| form.method == FormMethod::Post) {
        let names: Vec<&str> = form.named_inputs().filter_map(|i| i.probe_name()).collect();
        for target in &names {
            for payload in SQLI_PAYLOADS {
                let data: FormData = names
                    .iter()
                    .map(|name| {
                        let value = if name == target {
                            format!("{}{}", PLACEHOLDER_VALUE, payload)
                        } else {
                            PLACEHOLDER_VALUE.to_string()
                        };
                        (name.to_string(), value)
                    })
                    .collect();
                form_jobs.push((form.action.clone(), data));
            }
        }
    }

    let form_findings = run_probes(form_jobs, options, |(action, data)| async move {
        let response = client.post(&action, &data).await?;
        if response.status_code != 200 {
            return None;
        }
        let matched = find_sql_error(&response.text)?;
        Some(
            Finding::new("Possible SQL Injection Indicator (Form)", Category::Sqli, Severity::Medium, &action)
                .description("Database error message returned after injecting a quote into a form field.")
                .evidence(matched)
                .recommendation("Use parameterized queries and centralized error handling."),
        )
    })
    .await;

    findings.extend(form_findings);
    findings
}
