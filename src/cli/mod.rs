pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "reposcout")]
#[command(about = "Rate-limit aware GitHub repository explorer", long_about = None)]
pub struct Cli {
    /// Share the response cache between runs through the database
    #[arg(long, global = true, env = "REPOSCOUT_PERSISTENT_CACHE")]
    pub persistent_cache: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search repositories
    Search {
        /// Search query
        query: String,

        /// Language filter (empty string disables it)
        #[arg(short, long, default_value = "python")]
        language: String,

        /// Sort by stars, forks or updated
        #[arg(long, default_value = "stars")]
        sort: String,

        /// Maximum number of results
        #[arg(short = 'n', long, default_value_t = 10)]
        max_results: usize,

        /// Store the results in the database
        #[arg(long)]
        save: bool,
    },

    /// Show repository metadata
    Repo {
        /// Repository as owner/name
        repository: String,
    },

    /// List a directory of a repository
    Ls {
        /// Repository as owner/name
        repository: String,

        /// Path inside the repository
        #[arg(default_value = "")]
        path: String,
    },

    /// Print a file from a repository
    Cat {
        /// Repository as owner/name
        repository: String,

        /// File path inside the repository
        path: String,

        /// Store the file in the database
        #[arg(long)]
        save: bool,
    },

    /// Search code (much stricter rate limit)
    Code {
        /// Code to search for
        query: String,

        /// Restrict to one repository (owner/name)
        #[arg(short, long)]
        repository: Option<String>,

        /// File extension filter
        #[arg(short, long, default_value = "py")]
        extension: String,

        /// Maximum number of results
        #[arg(short = 'n', long, default_value_t = 10)]
        max_results: usize,
    },

    /// Find matching files by walking a repository tree
    Find {
        /// Repository as owner/name
        repository: String,

        /// Directory to start from
        #[arg(default_value = "")]
        path: String,

        /// File extension to collect
        #[arg(short, long, default_value = "py")]
        extension: String,

        /// Stop after this many files
        #[arg(short = 'n', long, default_value_t = 50)]
        max_files: usize,

        /// Do not descend more than this many directories below the start
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Show the current API rate limit
    RateLimit,

    /// Run database migrations
    Migrate,
}
