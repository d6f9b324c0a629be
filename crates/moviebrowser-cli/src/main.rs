//! MovieBrowser CLI - browse TMDb listings and manage favorites from a terminal.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use moviebrowser_core::config::PathsConfig;
use moviebrowser_core::MovieBrowser;
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "moviebrowser")]
#[command(about = "Browse now-playing movies and keep a list of favorites")]
struct Args {
    /// Data directory (defaults to the platform data directory)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// TMDb v3 API key
    #[arg(long, env = "TMDB_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List movies currently in theaters
    NowPlaying {
        /// Number of pages to fetch
        #[arg(long, default_value = "1")]
        pages: u32,
    },
    /// List movies similar to a movie
    Similar {
        id: i64,
        #[arg(long, default_value = "1")]
        pages: u32,
    },
    /// Show a movie's details
    Details { id: i64 },
    /// Manage favorites
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// Clear cached data
    Clear {
        /// Also remove every favorite
        #[arg(long)]
        favorites: bool,
    },
}

#[derive(Subcommand, Debug)]
enum FavoritesAction {
    List,
    Add { id: i64 },
    Remove { id: i64 },
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(PathsConfig::DATA_DIR_NAME)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    let data_dir = args.data_dir.unwrap_or_else(default_data_dir);
    debug!("Data directory: {}", data_dir.display());

    let mut builder = MovieBrowser::builder(&data_dir).auto_create_dirs(true);
    if let Some(api_key) = args.api_key {
        builder = builder.api_key(api_key);
    }
    let browser = builder.build().await?;

    match args.command {
        Command::NowPlaying { pages } => commands::now_playing(&browser, pages).await,
        Command::Similar { id, pages } => commands::similar(&browser, id, pages).await,
        Command::Details { id } => commands::details(&browser, id).await,
        Command::Favorites { action } => match action {
            FavoritesAction::List => commands::list_favorites(&browser).await,
            FavoritesAction::Add { id } => commands::add_favorite(&browser, id).await,
            FavoritesAction::Remove { id } => commands::remove_favorite(&browser, id).await,
        },
        Command::Clear { favorites } => commands::clear(&browser, favorites).await,
    }
}
