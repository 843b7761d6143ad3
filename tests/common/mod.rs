#![allow(dead_code)]

use async_trait::async_trait;
use reposcout::github::{RawResponse, Transport, TransportFailure};
use reposcout::{ClientConfig, GitHubClient, MemoryCache};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const BASE_URL: &str = "http://github.test";

pub fn test_config() -> ClientConfig {
    ClientConfig::default()
        .with_base_url(BASE_URL)
        .with_retries(3, Duration::from_secs(1))
        .with_cache_ttl(Duration::from_secs(60))
}

pub fn json_response(status: StatusCode, body: Value) -> RawResponse {
    RawResponse::new(status, body.to_string())
}

pub fn ok(body: Value) -> RawResponse {
    json_response(StatusCode::OK, body)
        .with_header("x-ratelimit-limit", "60")
        .with_header("x-ratelimit-remaining", "59")
}

pub fn rate_limited(reset_epoch: i64) -> RawResponse {
    json_response(
        StatusCode::FORBIDDEN,
        json!({ "message": "API rate limit exceeded" }),
    )
    .with_header("x-ratelimit-limit", "60")
    .with_header("x-ratelimit-remaining", "0")
    .with_header("x-ratelimit-reset", &reset_epoch.to_string())
}

pub fn timeout() -> Result<RawResponse, TransportFailure> {
    Err(TransportFailure::Timeout("operation timed out".to_string()))
}

/// Plays back a fixed sequence of outcomes and counts calls
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<RawResponse, TransportFailure>>>,
    calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<RawResponse, TransportFailure>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<RawResponse, TransportFailure> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), params.to_vec()));
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportFailure::Other("script exhausted".to_string())))
    }
}

/// Serves directory listings keyed by repository path
#[derive(Default)]
pub struct TreeTransport {
    routes: HashMap<String, RawResponse>,
    visited: Mutex<Vec<String>>,
}

impl TreeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listing for `path` ("" is the repository root)
    pub fn dir(mut self, path: &str, entries: &[(&str, &str)]) -> Self {
        let listing: Vec<Value> = entries
            .iter()
            .map(|(name, kind)| {
                let full = if path.is_empty() {
                    name.to_string()
                } else {
                    format!("{path}/{name}")
                };
                json!({
                    "name": name,
                    "path": full,
                    "type": kind,
                    "size": if *kind == "file" { 100 } else { 0 },
                    "download_url": null,
                })
            })
            .collect();
        self.routes.insert(path.to_string(), ok(Value::Array(listing)));
        self
    }

    pub fn respond(mut self, path: &str, response: RawResponse) -> Self {
        self.routes.insert(path.to_string(), response);
        self
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for TreeTransport {
    async fn get(
        &self,
        url: &str,
        _params: &[(String, String)],
    ) -> Result<RawResponse, TransportFailure> {
        let prefix = format!("{BASE_URL}/repos/owner/repo/contents");
        let path = url
            .strip_prefix(&prefix)
            .map(|rest| rest.trim_start_matches('/').to_string())
            .unwrap_or_default();
        self.visited.lock().unwrap().push(path.clone());

        Ok(self.routes.get(&path).cloned().unwrap_or_else(|| {
            json_response(StatusCode::NOT_FOUND, json!({ "message": "Not Found" }))
        }))
    }
}

pub fn client_over(transport: Arc<dyn Transport>) -> GitHubClient {
    GitHubClient::with_transport(test_config(), transport, Arc::new(MemoryCache::new()))
}
