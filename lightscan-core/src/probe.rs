// Shared pieces of the active probes: the scan token, query mutation,
// the tested-URL set and reflection classification

use crate::finding::Finding;
use futures::stream::{self, StreamExt};
use lightscan_scanner::CancelHandle;
use rand::Rng;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Mutex;
use url::Url;

pub const TOKEN_PREFIX: &str = "xss_probe_";

/// Neutral value given to form fields that are not under test.
pub const PLACEHOLDER_VALUE: &str = "test";

/// How probe requests are issued.
#[derive(Debug, Clone)]
pub struct ProbeOptions {
    /// Requests allowed in flight at once.
    pub concurrency: usize,
    pub cancel: CancelHandle,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            cancel: CancelHandle::new(),
        }
    }
}

/// Run one probe per job with bounded concurrency. Results come back in job
/// order whatever order the responses arrive in. Jobs not yet started when
/// the scan is cancelled are dropped.
pub async fn run_probes<J, F, Fut>(jobs: Vec<J>, options: &ProbeOptions, probe: F) -> Vec<Finding>
where
    F: Fn(J) -> Fut,
    Fut: Future<Output = Option<Finding>>,
{
    stream::iter(jobs)
        .map(|job| {
            let cancel = options.cancel.clone();
            let pending = probe(job);
            async move {
                if cancel.is_cancelled() {
                    None
                } else {
                    pending.await
                }
            }
        })
        .buffered(options.concurrency.max(1))
        .filter_map(|finding| async move { finding })
        .collect()
        .await
}

/// One unguessable token per scan: fixed prefix plus 8 random hex digits.
pub fn generate_token() -> String {
    format!("{}{:08x}", TOKEN_PREFIX, rand::thread_rng().r#gen::<u32>())
}

/// Query parameters as probed: first value for each distinct name, in
/// order of first appearance. Parameters with a blank value are left out.
pub fn query_params(url: &str) -> Vec<(String, String)> {
    let Ok(parsed) = Url::parse(url) else {
        return Vec::new();
    };

    let mut params: Vec<(String, String)> = Vec::new();
    for (name, value) in parsed.query_pairs() {
        if value.is_empty() || params.iter().any(|(n, _)| n == name.as_ref()) {
            continue;
        }
        params.push((name.into_owned(), value.into_owned()));
    }
    params
}

/// Rebuild `url` with `param` set to `mutate(current value)` and the other
/// probed parameters unchanged.
pub fn mutate_query(url: &str, param: &str, mutate: impl Fn(&str) -> String) -> Option<String> {
    let mut parsed = Url::parse(url).ok()?;
    let params = query_params(url);
    if !params.iter().any(|(name, _)| name == param) {
        return None;
    }

    parsed.set_fragment(None);
    parsed.query_pairs_mut().clear().extend_pairs(params.iter().map(|(name, value)| {
        if name == param {
            (name.clone(), mutate(value))
        } else {
            (name.clone(), value.clone())
        }
    }));
    Some(parsed.to_string())
}

/// Mutated URLs already requested during this scan. `claim` checks and
/// records in one step.
#[derive(Debug, Default)]
pub struct TestedSet {
    urls: Mutex<HashSet<String>>,
}

impl TestedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// True the first time `url` is seen.
    pub fn claim(&self, url: &str) -> bool {
        match self.urls.lock() {
            Ok(mut urls) => urls.insert(url.to_string()),
            Err(poisoned) => poisoned.into_inner().insert(url.to_string()),
        }
    }

    pub fn len(&self) -> usize {
        self.urls.lock().map(|u| u.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reflection {
    /// The literal token appears in the body.
    Raw,
    /// Only the HTML-escaped token appears.
    Encoded,
}

/// HTML escaping with quotes, matching what a template engine would emit.
pub fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Classify how `token` comes back in `body`.
///
/// The scan token only contains `[a-z0-9_]`, so its escaped form is
/// identical and every reflection of it is reported as raw. The encoded
/// branch is only reachable for tokens carrying HTML-special characters.
pub fn classify_reflection(body: &str, token: &str) -> Option<Reflection> {
    if token.is_empty() {
        return None;
    }
    if body.contains(token) {
        return Some(Reflection::Raw);
    }
    let escaped = html_escape(token);
    if escaped != token && body.contains(&escaped) {
        return Some(Reflection::Encoded);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shape() {
        let token = generate_token();
        assert!(token.starts_with(TOKEN_PREFIX));
        let suffix = &token[TOKEN_PREFIX.len()..];
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(html_escape(&token), token);
    }

    #[test]
    fn test_query_params_first_value_and_blank_dropped() {
        let params = query_params("http://x.test/p?a=1&b=&a=2&c=three");
        assert_eq!(
            params,
            vec![
                ("a".to_string(), "1".to_string()),
                ("c".to_string(), "three".to_string())
            ]
        );
        assert!(query_params("http://x.test/p").is_empty());
        assert!(query_params("garbage").is_empty());
    }

    #[test]
    fn test_mutate_query_replaces_one_param() {
        let url = mutate_query("http://x.test/a?id=1&sort=asc", "id", |_| "TOKEN".to_string());
        assert_eq!(url.unwrap(), "http://x.test/a?id=TOKEN&sort=asc");
    }

    #[test]
    fn test_mutate_query_appends_payload() {
        let url = mutate_query("http://x.test/a?id=1", "id", |v| format!("{}'", v));
        assert_eq!(url.unwrap(), "http://x.test/a?id=1%27");
        assert!(mutate_query("http://x.test/a?id=1", "missing", |v| v.to_string()).is_none());
    }

    #[test]
    fn test_tested_set_claims_once() {
        let tested = TestedSet::new();
        assert!(tested.claim("http://x.test/?a=1"));
        assert!(!tested.claim("http://x.test/?a=1"));
        assert!(tested.claim("http://x.test/?a=2"));
        assert_eq!(tested.len(), 2);
    }

    #[test]
    fn test_classify_raw_reflection() {
        let token = "xss_probe_deadbeef";
        let body = format!("<p>You searched for {}</p>", token);
        assert_eq!(classify_reflection(&body, token), Some(Reflection::Raw));
    }

    #[test]
    fn test_classify_encoded_reflection() {
        let token = "<xss_probe_deadbeef>";
        let body = "<p>You searched for &lt;xss_probe_deadbeef&gt;</p>";
        assert_eq!(classify_reflection(body, token), Some(Reflection::Encoded));
    }

    #[test]
    fn test_classify_absent() {
        assert_eq!(classify_reflection("<p>nothing</p>", "xss_probe_1"), None);
        assert_eq!(classify_reflection("anything", ""), None);
    }
}
