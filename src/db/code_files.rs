use crate::db::{models::*, DbPool};
use crate::error::{Error, Result};
use chrono::Utc;

/// Insert a file, or replace its content when (repository, path) already exists
pub async fn upsert_code_file(pool: &DbPool, file: &NewCodeFile) -> Result<CodeFile> {
    let now = Utc::now();

    let record = sqlx::query_as::<_, CodeFile>(
        r#"
        INSERT INTO code_files (repository_id, path, name, content, size, fetched_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(repository_id, path) DO UPDATE SET
            name = excluded.name,
            content = excluded.content,
            size = excluded.size,
            fetched_at = excluded.fetched_at
        RETURNING *
        "#,
    )
    .bind(file.repository_id)
    .bind(&file.path)
    .bind(&file.name)
    .bind(&file.content)
    .bind(file.size)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(record)
}

/// Get a stored file by repository and path
pub async fn get_code_file(pool: &DbPool, repository_id: i64, path: &str) -> Result<CodeFile> {
    let record = sqlx::query_as::<_, CodeFile>(
        "SELECT * FROM code_files WHERE repository_id = ? AND path = ?",
    )
    .bind(repository_id)
    .bind(path)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("File {path} not found")))?;

    Ok(record)
}

/// List stored files of a repository ordered by path
pub async fn list_code_files(pool: &DbPool, repository_id: i64) -> Result<Vec<CodeFile>> {
    let records = sqlx::query_as::<_, CodeFile>(
        "SELECT * FROM code_files WHERE repository_id = ? ORDER BY path",
    )
    .bind(repository_id)
    .fetch_all(pool)
    .await?;

    Ok(records)
}
