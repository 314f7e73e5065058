use crate::http::{Cookie, Headers};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A fetched page, keyed in the crawl by its canonical URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub url: String,
    pub status: u16,
    pub headers: Headers,
    /// Body text; empty when the Content-Type is not textual.
    pub content: String,
    pub cookies: Vec<Cookie>,
    pub depth: usize,
}

impl Page {
    pub fn has_query(&self) -> bool {
        self.url.contains('?')
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormMethod {
    Get,
    Post,
}

impl FormMethod {
    /// Missing, empty and unknown methods all fall back to GET.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|m| m.trim().to_ascii_lowercase()) {
            Some(m) if m == "post" => FormMethod::Post,
            _ => FormMethod::Get,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FormMethod::Get => "get",
            FormMethod::Post => "post",
        }
    }
}

impl fmt::Display for FormMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormInput {
    /// Nameless fields are kept for reporting but never probed.
    pub name: Option<String>,
    pub input_type: String,
}

impl FormInput {
    pub fn new(name: Option<&str>, input_type: &str) -> Self {
        Self {
            name: name.map(str::to_string),
            input_type: input_type.to_string(),
        }
    }

    /// Name if present and non-empty.
    pub fn probe_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormDescriptor {
    pub page_url: String,
    pub method: FormMethod,
    pub action: String,
    pub inputs: Vec<FormInput>,
}

impl FormDescriptor {
    pub fn named_inputs(&self) -> impl Iterator<Item = &FormInput> {
        self.inputs.iter().filter(|i| i.probe_name().is_some())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SkipReason {
    DepthExceeded,
    AlreadyVisited,
    RobotsDisallowed,
    FetchFailed,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::DepthExceeded => "depth_exceeded",
            SkipReason::AlreadyVisited => "already_visited",
            SkipReason::RobotsDisallowed => "robots_disallowed",
            SkipReason::FetchFailed => "fetch_failed",
        }
    }
}

/// Everything the crawl produced. Pages are in fetch order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlOutcome {
    pub pages: IndexMap<String, Page>,
    pub forms: Vec<FormDescriptor>,
    pub skipped: BTreeMap<SkipReason, usize>,
    /// True when the crawl stopped on cancellation rather than exhaustion.
    pub cancelled: bool,
}

impl CrawlOutcome {
    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_method_defaults_to_get() {
        assert_eq!(FormMethod::parse(None), FormMethod::Get);
        assert_eq!(FormMethod::parse(Some("")), FormMethod::Get);
        assert_eq!(FormMethod::parse(Some("PUT")), FormMethod::Get);
        assert_eq!(FormMethod::parse(Some(" POST ")), FormMethod::Post);
    }

    #[test]
    fn test_named_inputs_skip_nameless_and_empty() {
        let form = FormDescriptor {
            page_url: "http://example.com/".to_string(),
            method: FormMethod::Post,
            action: "http://example.com/submit".to_string(),
            inputs: vec![
                FormInput::new(Some("q"), "text"),
                FormInput::new(None, "submit"),
                FormInput::new(Some(""), "text"),
            ],
        };
        let names: Vec<_> = form.named_inputs().filter_map(|i| i.probe_name()).collect();
        assert_eq!(names, vec!["q"]);
    }
}
