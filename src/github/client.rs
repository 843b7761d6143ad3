use crate::cache::CacheStore;
use crate::config::ClientConfig;
use crate::github::{
    error::{ApiError, ApiResult},
    executor::Executor,
    models::{
        CodeSearchHit, CodeSearchItem, ContentsPayload, DirectoryEntry, FileContent, FilePayload,
        RateLimitResponse, Repository, RepositorySummary, SearchResponse,
    },
    rate_limit::RateLimitStatus,
    transport::{HttpTransport, Transport},
};
use crate::Result;
use base64::Engine;
use reqwest::StatusCode;
use std::sync::Arc;
use tracing::{debug, error};

/// GitHub caps `per_page` at 100
const MAX_PER_PAGE: usize = 100;

/// GitHub API client
pub struct GitHubClient {
    executor: Executor,
}

impl GitHubClient {
    /// Create a new GitHub client over HTTP with the given cache backend
    pub fn new(config: ClientConfig, cache: Arc<dyn CacheStore>) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport), cache))
    }

    /// Create a client over an arbitrary transport
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            executor: Executor::new(config, transport, cache),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        self.executor.config()
    }

    /// Search repositories, returning at most `max_results` summaries.
    ///
    /// `language` is folded into the query as a `language:` qualifier.
    pub async fn search_repositories(
        &self,
        query: &str,
        language: Option<&str>,
        sort: &str,
        max_results: usize,
    ) -> ApiResult<Vec<RepositorySummary>> {
        if max_results == 0 {
            return Ok(Vec::new());
        }

        let mut search_query = query.to_string();
        if let Some(language) = language.filter(|l| !l.is_empty()) {
            search_query.push_str(&format!(" language:{language}"));
        }

        let params = vec![
            ("q".to_string(), search_query),
            ("sort".to_string(), sort.to_string()),
            ("order".to_string(), "desc".to_string()),
            (
                "per_page".to_string(),
                max_results.min(MAX_PER_PAGE).to_string(),
            ),
        ];

        let response: SearchResponse<Repository> = self
            .executor
            .execute_as("/search/repositories", &params, true)
            .await
            .inspect_err(|e| error!("Repository search failed: {}", e))?;

        debug!(
            "Repository search matched {} repositories",
            response.total_count
        );

        Ok(response
            .items
            .iter()
            .take(max_results)
            .map(Repository::summary)
            .collect())
    }

    /// Get repository information
    pub async fn get_repository(&self, owner: &str, name: &str) -> ApiResult<Repository> {
        let endpoint = repo_endpoint(owner, name);
        self.executor.execute_as(&endpoint, &[], true).await
    }

    /// List a directory. A file path yields a one-element list.
    pub async fn get_repository_contents(
        &self,
        owner: &str,
        name: &str,
        path: &str,
    ) -> ApiResult<Vec<DirectoryEntry>> {
        let endpoint = contents_endpoint(owner, name, path);
        let payload: ContentsPayload = self.executor.execute_as(&endpoint, &[], true).await?;
        Ok(payload.into_entries())
    }

    /// Fetch a file. Base64 payloads are decoded to text before returning.
    pub async fn get_file_content(
        &self,
        owner: &str,
        name: &str,
        path: &str,
    ) -> ApiResult<FileContent> {
        let endpoint = contents_endpoint(owner, name, path);
        let value = self.executor.execute(&endpoint, &[], true).await?;

        if value.is_array() {
            return Err(ApiError::PermanentTransport {
                status: Some(StatusCode::OK.as_u16()),
                cause: format!("{path} is a directory, not a file"),
            });
        }

        let payload: FilePayload = serde_json::from_value(value)
            .map_err(|e| ApiError::malformed(StatusCode::OK.as_u16(), e))?;

        let text = match payload.encoding.as_deref() {
            Some("base64") => decode_base64_text(&payload.content)?,
            _ => payload.content,
        };

        Ok(FileContent {
            path: payload.path,
            name: payload.name,
            size: payload.size,
            encoding: payload.encoding,
            text,
        })
    }

    /// Search code. This endpoint has a much lower rate limit than the rest
    /// of the API, so expect `RateLimitExceeded` sooner.
    pub async fn search_code(
        &self,
        query: &str,
        repository: Option<(&str, &str)>,
        extension: Option<&str>,
        max_results: usize,
    ) -> ApiResult<Vec<CodeSearchHit>> {
        if max_results == 0 {
            return Ok(Vec::new());
        }

        let mut search_query = query.to_string();
        if let Some(extension) = extension.filter(|e| !e.is_empty()) {
            search_query.push_str(&format!(" extension:{extension}"));
        }
        if let Some((owner, name)) = repository {
            search_query.push_str(&format!(" repo:{owner}/{name}"));
        }

        let params = vec![
            ("q".to_string(), search_query),
            (
                "per_page".to_string(),
                max_results.min(MAX_PER_PAGE).to_string(),
            ),
        ];

        let response: SearchResponse<CodeSearchItem> = self
            .executor
            .execute_as("/search/code", &params, true)
            .await
            .inspect_err(|e| error!("Code search failed: {}", e))?;

        Ok(response
            .items
            .into_iter()
            .take(max_results)
            .map(CodeSearchHit::from)
            .collect())
    }

    /// Query the live rate-limit counters. Never cached.
    ///
    /// This is a status probe: on failure it logs and reports all zeros.
    pub async fn get_rate_limit(&self) -> RateLimitStatus {
        match self
            .executor
            .execute_as::<RateLimitResponse>("/rate_limit", &[], false)
            .await
        {
            Ok(response) => response.resources.core,
            Err(e) => {
                error!("Failed to get rate limit: {}", e);
                RateLimitStatus::default()
            }
        }
    }

    /// Counters from the most recent response, without a remote call
    pub async fn last_rate_limit(&self) -> Option<RateLimitStatus> {
        self.executor.last_rate_limit().await
    }
}

fn repo_endpoint(owner: &str, name: &str) -> String {
    format!(
        "/repos/{}/{}",
        urlencoding::encode(owner),
        urlencoding::encode(name)
    )
}

fn contents_endpoint(owner: &str, name: &str, path: &str) -> String {
    let path = path.trim_matches('/');
    let base = repo_endpoint(owner, name);
    if path.is_empty() {
        return format!("{base}/contents");
    }

    let encoded: Vec<_> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(urlencoding::encode)
        .collect();
    format!("{base}/contents/{}", encoded.join("/"))
}

fn decode_base64_text(content: &str) -> ApiResult<String> {
    // GitHub wraps base64 content at 60 columns
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| ApiError::malformed(StatusCode::OK.as_u16(), e))?;
    String::from_utf8(bytes).map_err(|e| ApiError::malformed(StatusCode::OK.as_u16(), e))
}
