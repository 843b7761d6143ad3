use crate::db::{models::*, DbPool};
use crate::error::{Error, Result};
use chrono::Utc;

/// Insert a repository, or refresh its metadata when `full_name` already exists
pub async fn upsert_repository(pool: &DbPool, repo: &NewRepository) -> Result<RepositoryRecord> {
    let now = Utc::now();

    let record = sqlx::query_as::<_, RepositoryRecord>(
        r#"
        INSERT INTO repositories (
            full_name, name, owner, description, url, language, stars, forks,
            last_fetched, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(full_name) DO UPDATE SET
            name = excluded.name,
            owner = excluded.owner,
            description = excluded.description,
            url = excluded.url,
            language = excluded.language,
            stars = excluded.stars,
            forks = excluded.forks,
            last_fetched = excluded.last_fetched
        RETURNING *
        "#,
    )
    .bind(&repo.full_name)
    .bind(&repo.name)
    .bind(&repo.owner)
    .bind(&repo.description)
    .bind(&repo.url)
    .bind(&repo.language)
    .bind(repo.stars)
    .bind(repo.forks)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(record)
}

/// Get repository by ID
pub async fn get_repository(pool: &DbPool, id: i64) -> Result<RepositoryRecord> {
    let record = sqlx::query_as::<_, RepositoryRecord>("SELECT * FROM repositories WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Repository {id} not found")))?;

    Ok(record)
}

/// Get repository by `owner/name`
pub async fn get_repository_by_full_name(
    pool: &DbPool,
    full_name: &str,
) -> Result<Option<RepositoryRecord>> {
    let record =
        sqlx::query_as::<_, RepositoryRecord>("SELECT * FROM repositories WHERE full_name = ?")
            .bind(full_name)
            .fetch_optional(pool)
            .await?;

    Ok(record)
}

/// List repositories, most starred first
pub async fn list_repositories(pool: &DbPool) -> Result<Vec<RepositoryRecord>> {
    let records = sqlx::query_as::<_, RepositoryRecord>(
        "SELECT * FROM repositories ORDER BY stars DESC, name ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(records)
}

/// Record that the repository was just refreshed from GitHub
pub async fn mark_fetched(pool: &DbPool, id: i64) -> Result<()> {
    let result = sqlx::query("UPDATE repositories SET last_fetched = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Repository {id} not found")));
    }

    Ok(())
}
