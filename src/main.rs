use clap::Parser;
use reposcout::{
    cli::{commands, Cli, Commands},
    config::Settings,
    db::{self, api_cache::SqliteCache, DbPool},
    CacheStore, GitHubClient, MemoryCache, Result,
};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if it exists
    // Silently ignore if file doesn't exist
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,reposcout=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e.log_safe());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::from_env()?;
    settings.validate()?;
    debug!("Client configuration: {:?}", settings.client);

    // The database is only opened when something needs it
    let wants_db = cli.persistent_cache
        || matches!(
            cli.command,
            Commands::Search { save: true, .. } | Commands::Cat { save: true, .. }
        );
    let pool = if wants_db {
        Some(open_database(&settings).await?)
    } else {
        None
    };

    let cache: Arc<dyn CacheStore> = match (&pool, cli.persistent_cache) {
        (Some(pool), true) => Arc::new(SqliteCache::new(pool.clone())),
        _ => Arc::new(MemoryCache::new()),
    };
    let client = GitHubClient::new(settings.client.clone(), cache)?;

    match cli.command {
        Commands::Search {
            query,
            language,
            sort,
            max_results,
            save,
        } => {
            let pool = pool.as_ref().filter(|_| save);
            commands::search(&client, pool, &query, &language, &sort, max_results).await?;
        }
        Commands::Repo { repository } => {
            commands::show_repository(&client, &repository).await?;
        }
        Commands::Ls { repository, path } => {
            commands::list_directory(&client, &repository, &path).await?;
        }
        Commands::Cat {
            repository,
            path,
            save,
        } => {
            let pool = pool.as_ref().filter(|_| save);
            commands::cat_file(&client, pool, &repository, &path).await?;
        }
        Commands::Code {
            query,
            repository,
            extension,
            max_results,
        } => {
            commands::search_code(
                &client,
                &query,
                repository.as_deref(),
                &extension,
                max_results,
            )
            .await?;
        }
        Commands::Find {
            repository,
            path,
            extension,
            max_files,
            max_depth,
        } => {
            commands::find_files(
                &client, &repository, &path, &extension, max_files, max_depth,
            )
            .await?;
        }
        Commands::RateLimit => {
            commands::rate_limit(&client).await?;
        }
        Commands::Migrate => {
            migrate(&settings).await?;
        }
    }

    if let Some(status) = client.last_rate_limit().await {
        debug!(
            "Rate limit after run: {}/{} remaining",
            status.remaining, status.limit
        );
    }

    Ok(())
}

async fn open_database(settings: &Settings) -> Result<DbPool> {
    let pool = db::init_pool_with_config(&settings.database).await?;
    db::run_migrations(&pool).await?;
    Ok(pool)
}

async fn migrate(settings: &Settings) -> Result<()> {
    info!("Running database migrations");
    info!("Database: {}", settings.database.url);

    let pool = db::init_pool_with_config(&settings.database).await?;
    db::run_migrations(&pool).await?;

    info!("Migrations completed successfully");
    Ok(())
}
