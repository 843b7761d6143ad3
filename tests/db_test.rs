mod common;

use common::{client_over, ok, ScriptedTransport};
use reposcout::cli::commands;
use reposcout::db::{
    self, api_cache::SqliteCache, code_files, models::NewCodeFile, models::NewRepository,
    repositories, DbPool,
};
use reposcout::github::{FileContent, RepositoryRef};
use reposcout::{CacheStore, Error};
use serde_json::json;
use std::time::Duration;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

// Every pooled connection to `sqlite::memory:` gets its own database, so the
// tests use a throwaway file instead.
async fn setup() -> (TempDir, DbPool) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}", dir.path().join("test.db").display());
    let pool = db::init_pool(&url).await.unwrap();
    db::run_migrations(&pool).await.unwrap();
    (dir, pool)
}

fn new_repository(full_name: &str, stars: i64) -> NewRepository {
    let (owner, name) = full_name.split_once('/').unwrap();
    NewRepository {
        full_name: full_name.to_string(),
        name: name.to_string(),
        owner: owner.to_string(),
        description: "No description".to_string(),
        url: format!("https://github.com/{full_name}"),
        language: "Python".to_string(),
        stars,
        forks: 0,
    }
}

#[tokio::test]
async fn test_upsert_repository_keeps_one_row_per_full_name() {
    let (_dir, pool) = setup().await;

    let first = repositories::upsert_repository(&pool, &new_repository("alice/sorts", 10))
        .await
        .unwrap();
    let second = repositories::upsert_repository(&pool, &new_repository("alice/sorts", 25))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.stars, 25);
    assert_eq!(repositories::list_repositories(&pool).await.unwrap().len(), 1);

    let found = repositories::get_repository_by_full_name(&pool, "alice/sorts")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.stars, 25);
    assert!(repositories::get_repository_by_full_name(&pool, "bob/none")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_list_repositories_orders_by_stars() {
    let (_dir, pool) = setup().await;

    for (name, stars) in [("a/low", 1), ("b/high", 500), ("c/mid", 42), ("a/also-mid", 42)] {
        repositories::upsert_repository(&pool, &new_repository(name, stars))
            .await
            .unwrap();
    }

    let names: Vec<_> = repositories::list_repositories(&pool)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.full_name)
        .collect();
    assert_eq!(names, ["b/high", "a/also-mid", "c/mid", "a/low"]);
}

#[tokio::test]
async fn test_missing_repository_is_not_found() {
    let (_dir, pool) = setup().await;

    let err = assert_err!(repositories::get_repository(&pool, 404).await);
    assert!(matches!(err, Error::NotFound(_)));

    let err = assert_err!(repositories::mark_fetched(&pool, 404).await);
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_upsert_code_file_replaces_content() {
    let (_dir, pool) = setup().await;
    let repo = repositories::upsert_repository(&pool, &new_repository("alice/sorts", 1))
        .await
        .unwrap();

    let file = |content: &str| NewCodeFile {
        repository_id: repo.id,
        path: "sorts/bubble.py".to_string(),
        name: "bubble.py".to_string(),
        content: content.to_string(),
        size: content.len() as i64,
    };

    let first = code_files::upsert_code_file(&pool, &file("pass\n")).await.unwrap();
    let second = code_files::upsert_code_file(&pool, &file("def f():\n    pass\n"))
        .await
        .unwrap();
    assert_eq!(first.id, second.id);

    let stored = code_files::get_code_file(&pool, repo.id, "sorts/bubble.py")
        .await
        .unwrap();
    assert_eq!(stored.line_count(), 2);
    assert_eq!(code_files::list_code_files(&pool, repo.id).await.unwrap().len(), 1);

    let err = code_files::get_code_file(&pool, repo.id, "missing.py")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_sqlite_cache_round_trip_and_expiry() {
    let (_dir, pool) = setup().await;
    let cache = SqliteCache::new(pool);

    assert!(cache.get("github_api:/repos/a/b").await.is_none());

    cache
        .set("github_api:/repos/a/b", b"{\"id\":1}".to_vec(), Duration::from_secs(60))
        .await;
    assert_eq!(
        cache.get("github_api:/repos/a/b").await.as_deref(),
        Some(&b"{\"id\":1}"[..])
    );

    cache
        .set("github_api:/repos/a/b", b"{\"id\":2}".to_vec(), Duration::from_secs(60))
        .await;
    assert_eq!(
        cache.get("github_api:/repos/a/b").await.as_deref(),
        Some(&b"{\"id\":2}"[..])
    );

    cache
        .set("github_api:/rate_limit", b"{}".to_vec(), Duration::ZERO)
        .await;
    assert!(cache.get("github_api:/rate_limit").await.is_none());
    assert_eq!(cache.purge_expired().await.unwrap(), 1);
}

#[tokio::test]
async fn test_persist_search_results() {
    let (_dir, pool) = setup().await;
    let summaries: Vec<_> = (1..=3)
        .map(|n| {
            serde_json::from_value::<reposcout::github::Repository>(json!({
                "name": format!("repo{n}"),
                "full_name": format!("owner/repo{n}"),
                "owner": { "login": "owner" },
                "description": null,
                "html_url": format!("https://github.com/owner/repo{n}"),
                "language": null,
                "stargazers_count": n * 10,
                "created_at": null,
                "updated_at": null
            }))
            .unwrap()
            .summary()
        })
        .collect();

    let saved = assert_ok!(commands::persist_repositories(&pool, &summaries).await);
    assert_eq!(saved, 3);

    let stored = repositories::list_repositories(&pool).await.unwrap();
    assert_eq!(stored[0].full_name, "owner/repo3");
    assert_eq!(stored[0].language, "Unknown");
}

#[tokio::test]
async fn test_persist_file_fetches_missing_repository() {
    let (_dir, pool) = setup().await;
    let transport = ScriptedTransport::new(vec![Ok(ok(json!({
        "name": "Python",
        "full_name": "TheAlgorithms/Python",
        "owner": { "login": "TheAlgorithms" },
        "description": "All Algorithms implemented in Python",
        "html_url": "https://github.com/TheAlgorithms/Python",
        "language": "Python",
        "stargazers_count": 180000,
        "created_at": "2016-07-16T09:44:01Z",
        "updated_at": null
    })))]);
    let client = client_over(transport.clone());
    let repo_ref = RepositoryRef {
        owner: "TheAlgorithms".to_string(),
        name: "Python".to_string(),
    };
    let file = FileContent {
        path: "sorts/quick_sort.py".to_string(),
        name: "quick_sort.py".to_string(),
        size: 9,
        encoding: Some("base64".to_string()),
        text: "print(1)\n".to_string(),
    };

    commands::persist_file(&client, &pool, &repo_ref, &file)
        .await
        .unwrap();
    // The repository row now exists, so no second lookup is needed
    commands::persist_file(&client, &pool, &repo_ref, &file)
        .await
        .unwrap();
    assert_eq!(transport.call_count(), 1);

    let record = repositories::get_repository_by_full_name(&pool, "TheAlgorithms/Python")
        .await
        .unwrap()
        .unwrap();
    assert!(record.last_fetched.is_some());
    let stored = code_files::get_code_file(&pool, record.id, "sorts/quick_sort.py")
        .await
        .unwrap();
    assert_eq!(stored.content, "print(1)\n");
}
