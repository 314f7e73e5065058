// Reflected input probe: inject the scan token and look for it in the response

use crate::finding::{Category, Finding, Severity};
use crate::probe::{
    ProbeOptions, Reflection, TestedSet, classify_reflection, mutate_query, query_params,
    run_probes,
};
use indexmap::IndexMap;
use lightscan_scanner::{FormData, FormDescriptor, FormMethod, HttpClient, Page};
use tracing::{debug, info};

/// Input types that receive the token in form probes.
pub const TEXT_LIKE_TYPES: &[&str] = &["text", "search", "email", "password", "textarea"];

/// Probe every query parameter of every crawled URL and every POST form
/// with `token`.
pub async fn test_reflected_xss(
    client: &dyn HttpClient,
    pages: &IndexMap<String, Page>,
    forms: &[FormDescriptor],
    token: &str,
    options: &ProbeOptions,
) -> Vec<Finding> {
    let tested = TestedSet::new();

    let query_jobs: Vec<String> = pages
        .keys()
        .filter(|url| url.contains('?'))
        .flat_map(|url| {
            query_params(url)
                .into_iter()
                .filter_map(|(param, _)| mutate_query(url, &param, |_| token.to_string()))
                .collect::<Vec<_>>()
        })
        .filter(|mutated| tested.claim(mutated))
        .collect();

    info!("Reflection probe: {} parameter mutation(s)", query_jobs.len());

    let mut findings = run_probes(query_jobs, options, |url| async move {
        let response = client.get(&url).await?;
        if response.status_code != 200 {
            return None;
        }
        match classify_reflection(&response.text, token)? {
            Reflection::Raw => Some(
                Finding::new("Potential Reflected XSS", Category::Xss, Severity::Medium, &url)
                    .description("Token reflected unencoded in response.")
                    .evidence(format!("...{}...", token))
                    .recommendation("HTML-encode user-supplied input and implement a CSP."),
            ),
            Reflection::Encoded => Some(
                Finding::new("Parameter Reflection (Encoded)", Category::Xss, Severity::Info, &url)
                    .description("Token reflected but appears HTML-encoded.")
                    .evidence(format!("...{}...", token))
                    .recommendation("Continue encoding and validate/escape inputs."),
            ),
        }
    })
    .await;

    let form_jobs: Vec<(String, FormData)> = forms
        .iter()
        .filter(|form| form.method == FormMethod::Post)
        .filter_map(|form| {
            let data = token_submission(form, token);
            if data.is_empty() {
                debug!("No text-like fields in form at {}, skipping", form.action);
                None
            } else {
                Some((form.action.clone(), data))
            }
        })
        .collect();

    let form_findings = run_probes(form_jobs, options, |(action, data)| async move {
        let response = client.post(&action, &data).await?;
        if response.status_code != 200 {
            return None;
        }
        match classify_reflection(&response.text, token)? {
            Reflection::Raw => Some(
                Finding::new("Potential Reflected XSS (Form)", Category::Xss, Severity::Medium, &action)
                    .description("Form input reflected unencoded in response.")
                    .evidence(format!("...{}...", token))
                    .recommendation("HTML-encode user-supplied input and implement a CSP."),
            ),
            Reflection::Encoded => Some(
                Finding::new("Form Input Reflection (Encoded)", Category::Xss, Severity::Info, &action)
                    .description("Token reflected but appears HTML-encoded.")
                    .evidence(format!("...{}...", token))
                    .recommendation("Maintain proper output encoding."),
            ),
        }
    })
    .await;

    findings.extend(form_findings);
    findings
}

/// One combined submission: every named text-like field set to the token.
pub fn token_submission(form: &FormDescriptor, token: &str) -> FormData {
    form.named_inputs()
        .filter(|input| {
            TEXT_LIKE_TYPES
                .iter()
                .any(|t| input.input_type.eq_ignore_ascii_case(t))
        })
        .filter_map(|input| input.probe_name())
        .map(|name| (name.to_string(), token.to_string()))
        .collect()
}
