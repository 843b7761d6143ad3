pub mod client;
pub mod crawler;
pub mod error;
pub mod executor;
pub mod models;
pub mod parser;
pub mod rate_limit;
pub mod transport;

pub use client::GitHubClient;
pub use crawler::{CrawlBudget, CrawlOptions, CrawlReport, FileFilter};
pub use error::{ApiError, ApiResult};
pub use executor::{Executor, RetryState};
pub use models::{
    CodeSearchHit, DirectoryEntry, EntryKind, FileContent, Repository, RepositorySummary,
};
pub use parser::{parse_repository, RepositoryRef};
pub use rate_limit::{RateLimitStatus, RateLimitVerdict};
pub use transport::{HttpTransport, RawResponse, Transport, TransportFailure};
