// robots.txt handling: only Disallow lines are honoured, for every user agent

use crate::http::HttpClient;
use crate::normalize::{origin_root, url_path};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotsRuleSet {
    disallow: Vec<String>,
}

impl RobotsRuleSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Collect every `Disallow:` value (case-insensitive directive, value
    /// trimmed). User-agent groups are not tracked.
    pub fn parse(body: &str) -> Self {
        let disallow = body
            .lines()
            .map(str::trim)
            .filter_map(|line| {
                let (directive, value) = line.split_once(':')?;
                directive
                    .trim()
                    .eq_ignore_ascii_case("disallow")
                    .then(|| value.trim().to_string())
            })
            .collect();

        Self { disallow }
    }

    /// Fetch `<origin>/robots.txt`. Fetch failures and non-200 responses
    /// give an empty rule set.
    pub async fn load(client: &dyn HttpClient, base_url: &str) -> Self {
        let Some(root) = origin_root(base_url) else {
            return Self::empty();
        };
        let robots_url = format!("{}/robots.txt", root);

        match client.get(&robots_url).await {
            Some(response) if response.status_code == 200 => {
                let rules = Self::parse(&response.text);
                info!("Loaded {} robots.txt disallow rule(s)", rules.len());
                rules
            }
            Some(response) => {
                debug!("robots.txt returned {}, no rules applied", response.status_code);
                Self::empty()
            }
            None => {
                debug!("robots.txt unreachable, no rules applied");
                Self::empty()
            }
        }
    }

    pub fn rules(&self) -> &[String] {
        &self.disallow
    }

    pub fn len(&self) -> usize {
        self.disallow.len()
    }

    pub fn is_empty(&self) -> bool {
        self.disallow.is_empty()
    }

    /// `/` blocks everything, any other non-empty rule is a plain prefix.
    /// An empty `Disallow:` blocks nothing.
    pub fn is_disallowed(&self, path: &str) -> bool {
        self.disallow
            .iter()
            .any(|rule| rule == "/" || (!rule.is_empty() && path.starts_with(rule.as_str())))
    }

    pub fn is_url_disallowed(&self, url: &str) -> bool {
        self.is_disallowed(&url_path(url))
    }
}
