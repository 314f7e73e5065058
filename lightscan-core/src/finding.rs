use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_EVIDENCE_CHARS: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    /// Sort rank, higher is more severe.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
            Severity::Info => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
            Severity::Info => "Info",
        }
    }

    pub fn all() -> [Severity; 4] {
        [Severity::High, Severity::Medium, Severity::Low, Severity::Info]
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Headers,
    Cookie,
    Forms,
    #[serde(rename = "XSS")]
    Xss,
    #[serde(rename = "SQLi")]
    Sqli,
    Discovery,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Headers => "Headers",
            Category::Cookie => "Cookie",
            Category::Forms => "Forms",
            Category::Xss => "XSS",
            Category::Sqli => "SQLi",
            Category::Discovery => "Discovery",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One security observation. Built once by an analyzer, never changed after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub id: Option<String>,
    pub title: String,
    pub category: Category,
    pub severity: Severity,
    pub location: String,
    pub description: String,
    pub evidence: String,
    pub recommendation: String,
}

impl Finding {
    pub fn new(title: impl Into<String>, category: Category, severity: Severity, location: &str) -> Self {
        Self {
            id: None,
            title: title.into(),
            category,
            severity,
            location: location.to_string(),
            description: String::new(),
            evidence: String::new(),
            recommendation: String::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Evidence is cut to `MAX_EVIDENCE_CHARS` characters.
    pub fn evidence(mut self, evidence: impl AsRef<str>) -> Self {
        self.evidence = truncate_chars(evidence.as_ref(), MAX_EVIDENCE_CHARS);
        self
    }

    pub fn recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = recommendation.into();
        self
    }
}

pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_rank_order() {
        assert!(Severity::High.rank() > Severity::Medium.rank());
        assert!(Severity::Medium.rank() > Severity::Low.rank());
        assert!(Severity::Low.rank() > Severity::Info.rank());
    }

    #[test]
    fn test_evidence_is_truncated() {
        let finding = Finding::new("t", Category::Headers, Severity::Low, "http://x.test")
            .evidence("é".repeat(500));
        assert_eq!(finding.evidence.chars().count(), MAX_EVIDENCE_CHARS);
    }

    #[test]
    fn test_category_serializes_with_display_name() {
        assert_eq!(serde_json::to_string(&Category::Xss).unwrap(), "\"XSS\"");
        assert_eq!(serde_json::to_string(&Category::Sqli).unwrap(), "\"SQLi\"");
        assert_eq!(serde_json::to_string(&Severity::Medium).unwrap(), "\"Medium\"");
    }
}
