use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RepositoryRecord {
    pub id: i64,
    pub full_name: String,
    pub name: String,
    pub owner: String,
    pub description: String,
    pub url: String,
    pub language: String,
    pub stars: i64,
    pub forks: i64,
    pub last_fetched: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRepository {
    pub full_name: String,
    pub name: String,
    pub owner: String,
    pub description: String,
    pub url: String,
    pub language: String,
    pub stars: i64,
    pub forks: i64,
}

impl From<&crate::github::RepositorySummary> for NewRepository {
    fn from(summary: &crate::github::RepositorySummary) -> Self {
        Self {
            full_name: summary.full_name.clone(),
            name: summary.name.clone(),
            owner: summary.owner.login.clone(),
            description: summary.description.clone(),
            url: summary.url.clone(),
            language: summary.language.clone(),
            stars: i64::try_from(summary.stars).unwrap_or(i64::MAX),
            forks: i64::try_from(summary.forks).unwrap_or(i64::MAX),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CodeFile {
    pub id: i64,
    pub repository_id: i64,
    pub path: String,
    pub name: String,
    pub content: String,
    pub size: i64,
    pub fetched_at: DateTime<Utc>,
}

impl CodeFile {
    /// Computed on demand rather than stored
    pub fn line_count(&self) -> usize {
        self.content.lines().count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCodeFile {
    pub repository_id: i64,
    pub path: String,
    pub name: String,
    pub content: String,
    pub size: i64,
}

impl NewCodeFile {
    pub fn from_content(repository_id: i64, file: &crate::github::FileContent) -> Self {
        Self {
            repository_id,
            path: file.path.clone(),
            name: file.name.clone(),
            content: file.text.clone(),
            size: i64::try_from(file.size).unwrap_or(i64::MAX),
        }
    }
}
