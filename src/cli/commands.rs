use crate::db::{self, models::NewCodeFile, models::NewRepository, DbPool};
use crate::github::{
    parse_repository, CrawlOptions, FileFilter, GitHubClient, RepositoryRef, RepositorySummary,
};
use crate::github::{EntryKind, FileContent};
use crate::Result;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// Search repositories and print a summary table
pub async fn search(
    client: &GitHubClient,
    pool: Option<&DbPool>,
    query: &str,
    language: &str,
    sort: &str,
    max_results: usize,
) -> Result<()> {
    let language = (!language.is_empty()).then_some(language);
    let results = client
        .search_repositories(query, language, sort, max_results)
        .await?;

    print_repositories(&results);

    if let Some(pool) = pool {
        // Saving is best effort: the search already succeeded
        match persist_repositories(pool, &results).await {
            Ok(saved) => info!("Saved {} repositories", saved),
            Err(e) => warn!("Failed to save search results: {}", e.log_safe()),
        }
    }

    Ok(())
}

/// Show metadata for one repository
pub async fn show_repository(client: &GitHubClient, repository: &str) -> Result<()> {
    let repo_ref = parse_repository(repository)?;
    let repo = client
        .get_repository(&repo_ref.owner, &repo_ref.name)
        .await?;
    let summary = repo.summary();

    println!("{}", summary.full_name);
    println!("  {}", summary.description);
    println!("  URL:      {}", summary.url);
    println!("  Language: {}", summary.language);
    println!("  Stars:    {}", summary.stars);
    println!("  Forks:    {}", summary.forks);
    println!("  Created:  {}", format_date(summary.created_at));
    println!("  Updated:  {}", format_date(summary.updated_at));

    Ok(())
}

/// List one directory
pub async fn list_directory(client: &GitHubClient, repository: &str, path: &str) -> Result<()> {
    let repo_ref = parse_repository(repository)?;
    let entries = client
        .get_repository_contents(&repo_ref.owner, &repo_ref.name, path)
        .await?;

    for entry in entries {
        let marker = match entry.kind {
            EntryKind::Dir => "dir ",
            EntryKind::File => "file",
            EntryKind::Symlink => "link",
            EntryKind::Submodule => "sub ",
            EntryKind::Unknown => "?   ",
        };
        println!("{marker} {:>9}  {}", entry.size, entry.path);
    }

    Ok(())
}

/// Print a file, optionally storing it
pub async fn cat_file(
    client: &GitHubClient,
    pool: Option<&DbPool>,
    repository: &str,
    path: &str,
) -> Result<()> {
    let repo_ref = parse_repository(repository)?;
    let file = client
        .get_file_content(&repo_ref.owner, &repo_ref.name, path)
        .await?;

    print!("{}", file.text);
    if !file.text.ends_with('\n') {
        println!();
    }

    if let Some(pool) = pool {
        match persist_file(client, pool, &repo_ref, &file).await {
            Ok(()) => info!("Saved {} ({} lines)", file.path, file.line_count()),
            Err(e) => warn!("Failed to save {}: {}", file.path, e.log_safe()),
        }
    }

    Ok(())
}

/// Search code and print one hit per line
pub async fn search_code(
    client: &GitHubClient,
    query: &str,
    repository: Option<&str>,
    extension: &str,
    max_results: usize,
) -> Result<()> {
    let repo_ref = repository.map(parse_repository).transpose()?;
    let extension = (!extension.is_empty()).then_some(extension);

    let hits = client
        .search_code(
            query,
            repo_ref.as_ref().map(|r| (r.owner.as_str(), r.name.as_str())),
            extension,
            max_results,
        )
        .await?;

    if hits.is_empty() {
        println!("No matches");
    }
    for hit in hits {
        println!("{}: {}", hit.repository_full_name, hit.path);
    }

    Ok(())
}

/// Walk a repository tree and print matching files
pub async fn find_files(
    client: &GitHubClient,
    repository: &str,
    path: &str,
    extension: &str,
    max_files: usize,
    max_depth: Option<usize>,
) -> Result<()> {
    let repo_ref = parse_repository(repository)?;
    let options = CrawlOptions {
        max_files,
        max_depth,
        filter: FileFilter::extension(extension),
    };

    let report = client
        .crawl(&repo_ref.owner, &repo_ref.name, path, &options)
        .await;

    for file in &report.files {
        println!("{:>9}  {}", file.size, file.path);
    }
    println!(
        "\n{} files, {} directories listed",
        report.files.len(),
        report.directories_listed
    );
    for degraded in &report.degraded {
        println!("  skipped {}: {}", degraded.path, degraded.error.user_message());
    }

    Ok(())
}

/// Print the live rate-limit counters
pub async fn rate_limit(client: &GitHubClient) -> Result<()> {
    let status = client.get_rate_limit().await;
    let reset = status
        .reset_at()
        .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "unknown".to_string());

    println!("Limit:     {}", status.limit);
    println!("Remaining: {}", status.remaining);
    println!("Used:      {}", status.used);
    println!("Resets at: {reset}");
    if !client.config().is_authenticated() {
        println!("\nSet GITHUB_TOKEN to raise the limit from 60 to 5000 requests per hour.");
    }

    Ok(())
}

/// Upsert every search result, returning how many rows were written
pub async fn persist_repositories(pool: &DbPool, results: &[RepositorySummary]) -> Result<usize> {
    for summary in results {
        db::repositories::upsert_repository(pool, &NewRepository::from(summary)).await?;
    }
    Ok(results.len())
}

/// Store a fetched file, creating its repository row first when needed
pub async fn persist_file(
    client: &GitHubClient,
    pool: &DbPool,
    repo_ref: &RepositoryRef,
    file: &FileContent,
) -> Result<()> {
    let record =
        match db::repositories::get_repository_by_full_name(pool, &repo_ref.full_name()).await? {
            Some(record) => record,
            None => {
                let repo = client
                    .get_repository(&repo_ref.owner, &repo_ref.name)
                    .await?;
                db::repositories::upsert_repository(pool, &NewRepository::from(&repo.summary()))
                    .await?
            }
        };

    db::code_files::upsert_code_file(pool, &NewCodeFile::from_content(record.id, file)).await?;
    db::repositories::mark_fetched(pool, record.id).await?;
    Ok(())
}

fn print_repositories(results: &[RepositorySummary]) {
    if results.is_empty() {
        println!("No repositories found");
        return;
    }

    for repo in results {
        println!("{} ({} stars, {} forks)", repo.full_name, repo.stars, repo.forks);
        println!("  {}", repo.description);
        println!("  {}", repo.url);
    }
}

fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}
