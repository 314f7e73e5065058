// HTTP collaborator used by the crawler, the probes and discovery

use crate::error::Result;
use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_USER_AGENT: &str = "LightScan/1.0";

/// Ordered form submission body.
pub type FormData = IndexMap<String, String>;

/// Shared handle handed to crawler workers and probes.
pub type SharedClient = Arc<dyn HttpClient>;

/// A cookie as set by a response. Transport implementations normalize
/// whatever their cookie library exposes into this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub secure: bool,
    pub http_only: bool,
}

impl Cookie {
    pub fn new(name: &str, value: &str, secure: bool, http_only: bool) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            secure,
            http_only,
        }
    }
}

/// Response headers. Names keep the case they were inserted with but every
/// lookup ignores case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(IndexMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header. A repeated name (in any case) is folded into the
    /// existing entry as a comma separated list.
    pub fn insert(&mut self, name: &str, value: &str) {
        if let Some(existing) = self
            .0
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
        {
            existing.push_str(", ");
            existing.push_str(value);
        } else {
            self.0.insert(name.to_string(), value.to_string());
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            headers.insert(k.as_ref(), v.as_ref());
        }
        headers
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Response {
    pub status_code: u16,
    pub headers: Headers,
    pub text: String,
    pub cookies: Vec<Cookie>,
}

impl Response {
    pub fn new(status_code: u16, text: &str) -> Self {
        Self {
            status_code,
            headers: Headers::new(),
            text: text.to_string(),
            cookies: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_cookie(mut self, cookie: Cookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    pub fn content_type(&self) -> &str {
        self.headers.get("content-type").unwrap_or("")
    }

    async fn from_reqwest(response: reqwest::Response) -> reqwest::Result<Self> {
        let status_code = response.status().as_u16();

        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str(), value);
            }
        }

        let cookies = response
            .cookies()
            .map(|c| Cookie::new(c.name(), c.value(), c.secure(), c.http_only()))
            .collect();

        let text = response.text().await?;

        Ok(Self {
            status_code,
            headers,
            text,
            cookies,
        })
    }
}

/// Transport seam. Any transport failure (timeout, DNS, refused connection,
/// TLS) yields `None`; callers treat that as "no data" and move on.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str) -> Option<Response>;

    async fn post(&self, url: &str, form: &FormData) -> Option<Response>;
}

/// reqwest-backed client with the user agent, timeout and per-request delay
/// baked in.
pub struct ReqwestClient {
    client: Client,
    delay: Duration,
}

impl ReqwestClient {
    pub fn new(timeout_secs: u64, user_agent: &str, delay: Duration) -> Result<Self> {
        let timeout_secs = timeout_secs.max(1);
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client, delay })
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    async fn execute(&self, request: reqwest::RequestBuilder, url: &str) -> Option<Response> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("Request error {}: {}", url, e);
                return None;
            }
        };

        match Response::from_reqwest(response).await {
            Ok(response) => Some(response),
            Err(e) => {
                debug!("Failed to read body from {}: {}", url, e);
                None
            }
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Option<Response> {
        debug!("GET {}", url);
        self.pause().await;
        self.execute(self.client.get(url), url).await
    }

    async fn post(&self, url: &str, form: &FormData) -> Option<Response> {
        debug!("POST {} data={:?}", url, form);
        self.pause().await;
        self.execute(self.client.post(url).form(form), url).await
    }
}
