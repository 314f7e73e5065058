use crate::cancel::CancelHandle;
use crate::error::{Result, ScanError};
use crate::http::{Response, SharedClient};
use crate::normalize::{canonicalize, resolve_link, same_origin};
use crate::result::{CrawlOutcome, FormDescriptor, FormInput, FormMethod, Page, SkipReason};
use crate::robots::RobotsRuleSet;
use indexmap::IndexMap;
use scraper::{Html, Selector};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::{Arc, LazyLock};
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("static selector is valid"));
static FORM_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("form").expect("static selector is valid"));
static FIELD_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("input, textarea, select").expect("static selector is valid"));

pub const DEFAULT_MAX_PAGES: usize = 100;
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// What a worker should do next.
enum Next {
    Fetch(String, usize),
    Wait,
    Done,
}

#[derive(Default)]
struct Frontier {
    queue: VecDeque<(String, usize)>,
    visited: HashSet<String>,
    pages: IndexMap<String, Page>,
    forms: Vec<FormDescriptor>,
    skipped: BTreeMap<SkipReason, usize>,
    in_flight: usize,
}

impl Frontier {
    fn skip(&mut self, reason: SkipReason) {
        *self.skipped.entry(reason).or_insert(0) += 1;
    }
}

/// Crawl state shared by every worker. Visited marking and the page budget
/// check happen under the same lock, so no URL is fetched twice and the
/// budget is never overrun.
struct CrawlSession {
    state: Mutex<Frontier>,
    max_pages: usize,
    max_depth: usize,
    robots: Option<RobotsRuleSet>,
}

impl CrawlSession {
    fn new(
        seed: &str,
        max_pages: usize,
        max_depth: usize,
        robots: Option<RobotsRuleSet>,
    ) -> Self {
        let mut frontier = Frontier::default();
        frontier.queue.push_back((seed.to_string(), 0));
        Self {
            state: Mutex::new(frontier),
            max_pages,
            max_depth,
            robots,
        }
    }

    async fn next_entry(&self) -> Next {
        let mut state = self.state.lock().await;
        loop {
            if state.pages.len() + state.in_flight >= self.max_pages {
                // A fetch in flight may still fail and give its slot back
                return if state.in_flight == 0 { Next::Done } else { Next::Wait };
            }

            let Some((url, depth)) = state.queue.pop_front() else {
                return if state.in_flight == 0 { Next::Done } else { Next::Wait };
            };

            if depth > self.max_depth {
                state.skip(SkipReason::DepthExceeded);
                continue;
            }

            let Some(canonical) = canonicalize(&url) else {
                debug!("Dropping unparsable URL {}", url);
                continue;
            };

            if !state.visited.insert(canonical.clone()) {
                state.skip(SkipReason::AlreadyVisited);
                continue;
            }

            if let Some(ref robots) = self.robots
                && robots.is_url_disallowed(&canonical)
            {
                debug!("Skipping disallowed by robots.txt: {}", canonical);
                state.skip(SkipReason::RobotsDisallowed);
                continue;
            }

            state.in_flight += 1;
            return Next::Fetch(canonical, depth);
        }
    }

    async fn record_failure(&self, url: &str) {
        debug!("Fetch failed for {}", url);
        let mut state = self.state.lock().await;
        state.in_flight -= 1;
        state.skip(SkipReason::FetchFailed);
    }

    async fn record_page(&self, page: Page, links: Vec<String>, forms: Vec<FormDescriptor>) {
        let mut state = self.state.lock().await;
        state.in_flight -= 1;

        let next_depth = page.depth + 1;
        state.pages.insert(page.url.clone(), page);
        state.forms.extend(forms);

        for link in links {
            if !state.visited.contains(&link)
                && state.pages.len() + state.queue.len() < self.max_pages
            {
                state.queue.push_back((link, next_depth));
            }
        }
    }

    async fn into_outcome(&self, cancelled: bool) -> CrawlOutcome {
        let mut state = self.state.lock().await;
        CrawlOutcome {
            pages: std::mem::take(&mut state.pages),
            forms: std::mem::take(&mut state.forms),
            skipped: std::mem::take(&mut state.skipped),
            cancelled,
        }
    }
}

/// Breadth-first, same-origin crawler bounded by page count and depth.
pub struct Crawler {
    client: SharedClient,
    max_pages: usize,
    max_depth: usize,
    obey_robots: bool,
    workers: usize,
    progress_callback: Option<ProgressCallback>,
    cancel: CancelHandle,
}

impl Crawler {
    pub fn new(client: SharedClient) -> Self {
        Self {
            client,
            max_pages: DEFAULT_MAX_PAGES,
            max_depth: DEFAULT_MAX_DEPTH,
            obey_robots: true,
            workers: 1,
            progress_callback: None,
            cancel: CancelHandle::new(),
        }
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_robots(mut self, obey_robots: bool) -> Self {
        self.obey_robots = obey_robots;
        self
    }

    /// Number of concurrent fetch workers. One worker gives strict FIFO order.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    pub async fn crawl(&self, base_url: &str) -> Result<CrawlOutcome> {
        Url::parse(base_url).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        info!(
            "Starting crawl of {} (max_pages={}, max_depth={}, workers={})",
            base_url, self.max_pages, self.max_depth, self.workers
        );

        let robots = if self.obey_robots {
            Some(RobotsRuleSet::load(self.client.as_ref(), base_url).await)
        } else {
            None
        };

        let session = Arc::new(CrawlSession::new(
            base_url,
            self.max_pages,
            self.max_depth,
            robots,
        ));

        let mut worker_handles = Vec::with_capacity(self.workers);
        for worker_id in 0..self.workers {
            let session = session.clone();
            let client = self.client.clone();
            let progress_cb = self.progress_callback.clone();
            let cancel = self.cancel.clone();
            let base_url = base_url.to_string();

            worker_handles.push(tokio::spawn(async move {
                debug!("Worker {} started", worker_id);
                loop {
                    if cancel.is_cancelled() {
                        debug!("Worker {} stopping on cancellation", worker_id);
                        break;
                    }

                    let (url, depth) = match session.next_entry().await {
                        Next::Fetch(url, depth) => (url, depth),
                        Next::Wait => {
                            tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
                            continue;
                        }
                        Next::Done => break,
                    };

                    if let Some(ref callback) = progress_cb {
                        callback(worker_id, url.clone());
                    }

                    match client.get(&url).await {
                        Some(response) => {
                            let (page, links, forms) = build_page(&url, depth, response, &base_url);
                            session.record_page(page, links, forms).await;
                        }
                        None => session.record_failure(&url).await,
                    }
                }
                debug!("Worker {} finished", worker_id);
            }));
        }

        for handle in worker_handles {
            handle.await?;
        }

        let outcome = session.into_outcome(self.cancel.is_cancelled()).await;
        info!(
            "Crawl complete. Fetched {} pages, found {} forms",
            outcome.pages.len(),
            outcome.forms.len()
        );
        Ok(outcome)
    }
}

/// Turn a response into a page record plus whatever it links to. Only
/// 200 responses with textual content are parsed.
fn build_page(
    url: &str,
    depth: usize,
    response: Response,
    base_url: &str,
) -> (Page, Vec<String>, Vec<FormDescriptor>) {
    let content = if response.content_type().contains("text") {
        response.text
    } else {
        String::new()
    };

    let (links, forms) = if response.status_code == 200 && !content.is_empty() {
        extract_elements(&content, url, base_url)
    } else {
        (Vec::new(), Vec::new())
    };

    let page = Page {
        url: url.to_string(),
        status: response.status_code,
        headers: response.headers,
        content,
        cookies: response.cookies,
        depth,
    };

    (page, links, forms)
}

/// Same-origin links and every form on the page.
pub fn extract_elements(
    html: &str,
    page_url: &str,
    base_url: &str,
) -> (Vec<String>, Vec<FormDescriptor>) {
    let document = Html::parse_document(html);

    let links = document
        .select(&LINK_SELECTOR)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(page_url, href))
        .filter(|link| same_origin(base_url, link))
        .collect();

    let forms = document
        .select(&FORM_SELECTOR)
        .map(|form| {
            let method = FormMethod::parse(form.value().attr("method"));
            let action = form
                .value()
                .attr("action")
                .filter(|a| !a.trim().is_empty())
                .and_then(|a| Url::parse(page_url).ok()?.join(a.trim()).ok())
                .map(|u| u.to_string())
                .unwrap_or_else(|| page_url.to_string());

            let inputs = form
                .select(&FIELD_SELECTOR)
                .map(|field| {
                    FormInput::new(
                        field.value().attr("name"),
                        field.value().attr("type").unwrap_or("text"),
                    )
                })
                .collect();

            FormDescriptor {
                page_url: page_url.to_string(),
                method,
                action,
                inputs,
            }
        })
        .collect();

    (links, forms)
}
