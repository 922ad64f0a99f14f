//! # Character Tally CLI (`tally`)
//!
//! ## Usage
//!
//! ```bash
//! tally --config ./config/tally.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tally init` | Create the SQLite database and run schema migrations |
//! | `tally sources` | List sources and whether they are configured |
//! | `tally random [--source S]` | Fetch a random character and record it as seen |
//! | `tally vote <source> <id> <name> <like\|dislike>` | Record a vote |
//! | `tally list` | Page through the tally |
//! | `tally top <liked\|disliked\|recent>` | Show a single top record |
//! | `tally serve` | Start the HTTP server |
//!
//! When the config file does not exist, defaults plus environment variables
//! are used. A `.env` file in the working directory is loaded first.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use character_tally::config::{self, Config};
use character_tally::models::{ListQuery, SortField, SortOrder, VoteRequest, DEFAULT_LIMIT};
use character_tally::service::CharacterService;
use character_tally::sqlite_store::SqliteStore;
use character_tally::{db, migrate, server, sources, Source, Vote};

#[derive(Parser)]
#[command(
    name = "tally",
    about = "Random characters from public catalogs, with a like/dislike tally",
    version
)]
struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, default_value = "./config/tally.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database (create tables and indexes)
    Init,

    /// List sources and their availability
    Sources,

    /// Fetch a random character and record it as seen
    Random {
        /// Restrict to one source (rickandmorty, pokemon, superhero, dragonball)
        #[arg(long)]
        source: Option<Source>,
    },

    /// Record a like or dislike for a character
    Vote {
        source: Source,
        /// Source-specific character id
        id: String,
        name: String,
        vote: Vote,
        #[arg(long, default_value = "")]
        image: String,
    },

    /// List tallied characters
    List {
        #[arg(long)]
        source: Option<Source>,
        /// likes, dislikes, lastEvaluatedAt or createdAt
        #[arg(long, default_value = "createdAt")]
        sort_by: SortField,
        /// asc or desc
        #[arg(long, default_value = "desc")]
        order: SortOrder,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: i64,
        #[arg(long, default_value_t = 0)]
        skip: i64,
    },

    /// Show the single top record for a ranking
    Top {
        #[arg(value_enum)]
        kind: TopKind,
    },

    /// Start the HTTP server
    Serve,
}

#[derive(Clone, Copy, ValueEnum)]
enum TopKind {
    Liked,
    Disliked,
    Recent,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("character_tally=info,tower_http=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn resolve_config(path: &std::path::Path) -> anyhow::Result<Config> {
    if path.exists() {
        config::load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Config::from_env()
    }
}

async fn open_service(cfg: &Config) -> anyhow::Result<CharacterService> {
    let pool = db::connect(cfg).await?;
    migrate::apply(&pool).await?;
    CharacterService::from_config(cfg, Arc::new(SqliteStore::new(pool)))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let cfg = resolve_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized at {}", cfg.db.path.display());
        }
        Commands::Sources => {
            let service = open_service(&cfg).await?;
            sources::print_sources(service.adapters());
        }
        Commands::Random { source } => {
            let service = open_service(&cfg).await?;
            let character = service.get_random_character(source).await?;
            print_json(&character)?;
        }
        Commands::Vote {
            source,
            id,
            name,
            vote,
            image,
        } => {
            let service = open_service(&cfg).await?;
            let request = VoteRequest {
                source,
                source_id: id,
                name,
                image,
                vote,
            };
            let ack = service.record_vote(&request).await?;
            print_json(&ack)?;
        }
        Commands::List {
            source,
            sort_by,
            order,
            limit,
            skip,
        } => {
            let service = open_service(&cfg).await?;
            let query = ListQuery {
                source,
                sort_by,
                order,
                limit,
                skip,
            };
            let page = service.list_characters(&query).await?;
            print_json(&page)?;
        }
        Commands::Top { kind } => {
            let service = open_service(&cfg).await?;
            let item = match kind {
                TopKind::Liked => service.top_liked().await?,
                TopKind::Disliked => service.top_disliked().await?,
                TopKind::Recent => service.last_evaluated().await?,
            };
            print_json(&item)?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
