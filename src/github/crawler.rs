//! Bounded depth-first traversal of a repository tree
//!
//! The traversal keeps an explicit stack of directory listings instead of
//! recursing, so the budget check is a single guard at the top of each step.

use crate::config::defaults;
use crate::github::client::GitHubClient;
use crate::github::error::ApiError;
use crate::github::models::DirectoryEntry;
use std::vec::IntoIter;
use tracing::{debug, info, warn};

/// Which files a crawl collects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileFilter {
    /// Files whose name ends with the given suffix, e.g. `.py`
    Extension(String),
    Any,
}

impl FileFilter {
    pub fn python() -> Self {
        FileFilter::Extension(".py".to_string())
    }

    /// Accepts `py`, `.py` or `*.py`
    pub fn extension(ext: &str) -> Self {
        let ext = ext.trim_start_matches('*').trim_start_matches('.');
        FileFilter::Extension(format!(".{ext}"))
    }

    pub fn matches(&self, entry: &DirectoryEntry) -> bool {
        if !entry.is_file() {
            return false;
        }
        match self {
            FileFilter::Extension(suffix) => entry.name.ends_with(suffix.as_str()),
            FileFilter::Any => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub max_files: usize,
    /// Directories deeper than this below the start path are not listed.
    /// `None` means no depth limit; the file budget still bounds the crawl.
    pub max_depth: Option<usize>,
    pub filter: FileFilter,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_files: defaults::MAX_FILES,
            max_depth: None,
            filter: FileFilter::python(),
        }
    }
}

/// Remaining file slots for one crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlBudget {
    remaining: usize,
}

impl CrawlBudget {
    pub fn new(max_files: usize) -> Self {
        Self {
            remaining: max_files,
        }
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Claim one slot; false once the budget is spent
    pub fn take(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

/// A directory that could not be listed
#[derive(Debug, Clone)]
pub struct DegradedPath {
    pub path: String,
    pub error: ApiError,
}

#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    pub files: Vec<DirectoryEntry>,
    pub degraded: Vec<DegradedPath>,
    pub directories_listed: usize,
    /// True when at least one listing was rejected by the rate limit
    pub rate_limited: bool,
}

struct Frame {
    entries: IntoIter<DirectoryEntry>,
    depth: usize,
}

impl GitHubClient {
    /// Collect up to `max_files` Python files below `start_path`.
    pub async fn find_files(
        &self,
        owner: &str,
        name: &str,
        start_path: &str,
        max_files: usize,
    ) -> Vec<DirectoryEntry> {
        let options = CrawlOptions {
            max_files,
            ..CrawlOptions::default()
        };
        self.crawl(owner, name, start_path, &options).await.files
    }

    /// Depth-first crawl that never returns more than `options.max_files`
    /// entries. A directory that cannot be listed, rate limit included, is
    /// recorded in `degraded` and its siblings are still visited.
    pub async fn crawl(
        &self,
        owner: &str,
        name: &str,
        start_path: &str,
        options: &CrawlOptions,
    ) -> CrawlReport {
        let mut report = CrawlReport::default();
        let mut budget = CrawlBudget::new(options.max_files);
        let mut stack: Vec<Frame> = Vec::new();

        if budget.is_exhausted() {
            return report;
        }

        match self.list(owner, name, start_path, &mut report).await {
            Some(entries) => stack.push(Frame {
                entries: entries.into_iter(),
                depth: 0,
            }),
            None => return report,
        }

        while let Some(frame) = stack.last_mut() {
            if budget.is_exhausted() {
                break;
            }

            let Some(entry) = frame.entries.next() else {
                stack.pop();
                continue;
            };
            let depth = frame.depth;

            if entry.is_dir() {
                if options.max_depth.is_some_and(|max| depth >= max) {
                    debug!("Not descending into {}: depth limit reached", entry.path);
                    continue;
                }
                if let Some(children) = self.list(owner, name, &entry.path, &mut report).await {
                    stack.push(Frame {
                        entries: children.into_iter(),
                        depth: depth + 1,
                    });
                }
            } else if options.filter.matches(&entry) && budget.take() {
                report.files.push(entry);
            }
        }

        info!(
            "Crawl of {}/{} found {} files in {} directories ({} skipped)",
            owner,
            name,
            report.files.len(),
            report.directories_listed,
            report.degraded.len()
        );
        report
    }

    async fn list(
        &self,
        owner: &str,
        name: &str,
        path: &str,
        report: &mut CrawlReport,
    ) -> Option<Vec<DirectoryEntry>> {
        match self.get_repository_contents(owner, name, path).await {
            Ok(entries) => {
                report.directories_listed += 1;
                Some(entries)
            }
            Err(error) => {
                warn!("Error scanning {}: {}", display_path(path), error);
                report.rate_limited |= error.is_rate_limit();
                report.degraded.push(DegradedPath {
                    path: path.to_string(),
                    error,
                });
                None
            }
        }
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "/"
    } else {
        path
    }
}
