pub mod cache;
pub mod config;
pub mod db;
pub mod error;

// GitHub integration
pub mod github;

pub mod cli;

// Re-exports
pub use cache::{CacheStore, MemoryCache};
pub use config::{ClientConfig, Settings};
pub use error::{Error, Result};
pub use github::GitHubClient;
