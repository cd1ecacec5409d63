use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use headlines::app::{build_http_client, App};
use headlines::config::{Config, API_KEY_ENV};
use headlines::feed::{FeedEvent, PaginationController};
use headlines::query::Category;
use headlines::source::NewsApiSource;
use headlines::ui;

/// Get the config directory path (~/.config/headlines/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let config_dir = PathBuf::from(home).join(".config").join("headlines");
    Ok(config_dir)
}

/// Install the tracing subscriber when `RUST_LOG` is set.
///
/// The TUI owns stdout, so events go to `headlines.log` in the config dir.
fn init_logging(config_dir: &Path) -> Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        return Ok(());
    }

    let log_path = config_dir.join("headlines.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[derive(Parser, Debug)]
#[command(name = "headlines", about = "Terminal news browser with infinite scroll")]
struct Args {
    /// Category to open at startup (all, tech, business, sports, science, entertainment)
    #[arg(long, value_name = "NAME")]
    category: Option<Category>,

    /// Initial search term
    #[arg(long, value_name = "TERM", default_value = "")]
    search: String,

    /// Config file path (default: ~/.config/headlines/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
    }

    // SEC-007: config may hold the API key; keep the directory user-only
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) =
            std::fs::set_permissions(&config_dir, std::fs::Permissions::from_mode(0o700))
        {
            eprintln!(
                "Warning: failed to set permissions on {}: {}",
                config_dir.display(),
                e
            );
        }
    }

    init_logging(&config_dir)?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config: {}", config_path.display()))?;
    tracing::debug!(?config, "Effective configuration");

    let Some(api_key) = config.resolve_api_key() else {
        eprintln!("Error: No NewsAPI key configured");
        eprintln!();
        eprintln!("Set the {} environment variable, or add", API_KEY_ENV);
        eprintln!("  api_key = \"...\"");
        eprintln!("to {}", config_path.display());
        std::process::exit(1);
    };

    let client =
        build_http_client(config.request_timeout()).context("Failed to build HTTP client")?;
    let source = NewsApiSource::new(
        client,
        &config.base_url,
        api_key,
        config.category_sources(),
    )
    .context("Invalid news source configuration")?;

    let (feed_tx, feed_rx) = mpsc::channel::<FeedEvent>(32);
    let controller = PaginationController::new(Arc::new(source), feed_tx);
    let category = args.category.unwrap_or(config.default_category);
    let mut app = App::new(controller, category, args.search);

    ui::run(&mut app, feed_rx).await?;

    println!("Goodbye!");
    Ok(())
}
