use crate::github::rate_limit::RateLimitStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// GitHub repository information, as returned by `/repos/{owner}/{repo}`
/// and inside repository search results.
///
/// Only the fields used for projection are typed; everything else is kept
/// verbatim in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub owner: Owner,
    pub description: Option<String>,
    pub html_url: String,
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Repository owner information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Owner {
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The narrow, stable view of a repository handed to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySummary {
    pub name: String,
    pub full_name: String,
    pub description: String,
    pub url: String,
    pub language: String,
    pub stars: u64,
    pub forks: u64,
    pub owner: OwnerSummary,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerSummary {
    pub login: String,
    pub avatar_url: String,
}

impl Repository {
    pub fn summary(&self) -> RepositorySummary {
        RepositorySummary {
            name: self.name.clone(),
            full_name: self.full_name.clone(),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| "No description".to_string()),
            url: self.html_url.clone(),
            language: self
                .language
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            stars: self.stargazers_count,
            forks: self.forks_count,
            owner: OwnerSummary {
                login: self.owner.login.clone(),
                avatar_url: self.owner.avatar_url.clone(),
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Envelope shared by the search endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse<T> {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Submodule,
    #[serde(other)]
    Unknown,
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub path: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub size: u64,
    pub download_url: Option<String>,
}

impl DirectoryEntry {
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// The contents endpoint answers with a list for directories and a single
/// object for files.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum ContentsPayload {
    Listing(Vec<DirectoryEntry>),
    Single(DirectoryEntry),
}

impl ContentsPayload {
    pub(crate) fn into_entries(self) -> Vec<DirectoryEntry> {
        match self {
            ContentsPayload::Listing(entries) => entries,
            ContentsPayload::Single(entry) => vec![entry],
        }
    }
}

/// File payload from the contents endpoint
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FilePayload {
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub content: String,
    pub encoding: Option<String>,
}

/// Decoded file content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    pub path: String,
    pub name: String,
    pub size: u64,
    /// Encoding tag as reported upstream (`base64`, `none`, ...)
    pub encoding: Option<String>,
    pub text: String,
}

impl FileContent {
    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CodeSearchItem {
    pub name: String,
    pub path: String,
    pub sha: String,
    pub html_url: String,
    pub repository: CodeSearchRepository,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CodeSearchRepository {
    pub full_name: String,
}

/// Projected code search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSearchHit {
    pub name: String,
    pub path: String,
    pub sha: String,
    pub url: String,
    pub repository_full_name: String,
}

impl From<CodeSearchItem> for CodeSearchHit {
    fn from(item: CodeSearchItem) -> Self {
        Self {
            name: item.name,
            path: item.path,
            sha: item.sha,
            url: item.html_url,
            repository_full_name: item.repository.full_name,
        }
    }
}

/// `/rate_limit` response
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RateLimitResponse {
    pub resources: RateLimitResources,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RateLimitResources {
    pub core: RateLimitStatus,
}
