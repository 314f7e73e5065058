// In-memory HttpClient shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use lightscan_scanner::{FormData, HttpClient, Response};
use std::collections::HashMap;
use std::sync::Mutex;

type GetHandler = Box<dyn Fn(&str) -> Option<Response> + Send + Sync>;
type PostHandler = Box<dyn Fn(&FormData) -> Option<Response> + Send + Sync>;

/// Exact GET routes first, then prefix handlers in registration order.
/// Anything unrouted behaves like a transport failure.
#[derive(Default)]
pub struct StubClient {
    pages: HashMap<String, Response>,
    prefixes: Vec<(String, GetHandler)>,
    posts: HashMap<String, PostHandler>,
    gets: Mutex<Vec<String>>,
    posted: Mutex<Vec<(String, FormData)>>,
}

impl StubClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn html(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), html_response(200, body));
        self
    }

    pub fn response(mut self, url: &str, response: Response) -> Self {
        self.pages.insert(url.to_string(), response);
        self
    }

    pub fn prefix(
        mut self,
        prefix: &str,
        handler: impl Fn(&str) -> Option<Response> + Send + Sync + 'static,
    ) -> Self {
        self.prefixes.push((prefix.to_string(), Box::new(handler)));
        self
    }

    pub fn post(
        mut self,
        url: &str,
        handler: impl Fn(&FormData) -> Option<Response> + Send + Sync + 'static,
    ) -> Self {
        self.posts.insert(url.to_string(), Box::new(handler));
        self
    }

    pub fn gets(&self) -> Vec<String> {
        self.gets.lock().unwrap().clone()
    }

    pub fn posted(&self) -> Vec<(String, FormData)> {
        self.posted.lock().unwrap().clone()
    }
}

pub fn html_response(status: u16, body: &str) -> Response {
    Response::new(status, body).with_header("Content-Type", "text/html; charset=utf-8")
}

#[async_trait]
impl HttpClient for StubClient {
    async fn get(&self, url: &str) -> Option<Response> {
        self.gets.lock().unwrap().push(url.to_string());
        if let Some(response) = self.pages.get(url) {
            return Some(response.clone());
        }
        self.prefixes
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix.as_str()))
            .and_then(|(_, handler)| handler(url))
    }

    async fn post(&self, url: &str, form: &FormData) -> Option<Response> {
        self.posted.lock().unwrap().push((url.to_string(), form.clone()));
        self.posts.get(url).and_then(|handler| handler(form))
    }
}
