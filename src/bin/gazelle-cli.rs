use clap::{Parser, Subcommand};
use gazelle::{ClientConfig, Credentials, Gazelle};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gazelle-cli")]
#[command(about = "CLI for Gazelle trackers - search and download torrents", long_about = None)]
struct Cli {
    /// Account name (can also be set via GAZELLE_USERNAME env var)
    #[arg(long, env = "GAZELLE_USERNAME")]
    username: String,

    /// Account password (can also be set via GAZELLE_PASSWORD env var)
    #[arg(long, env = "GAZELLE_PASSWORD", hide_env_values = true)]
    password: String,

    /// Tracker base URL, e.g. https://tracker.example/
    #[arg(long, env = "GAZELLE_HOSTNAME")]
    hostname: String,

    /// File the session cookie is kept in
    #[arg(long, default_value = "cookie.json")]
    cookie_file: PathBuf,

    /// Minimum milliseconds between two requests
    #[arg(long, default_value_t = 2000)]
    min_interval_ms: u64,

    /// Log debug output (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the most seeded edition of an album
    Search {
        /// Artist name (exact, case-sensitive)
        artist: String,

        /// Album name (exact, case-sensitive)
        album: String,
    },
    /// Download a .torrent file
    Download {
        /// Torrent ID
        id: u64,

        /// Destination directory, must end with a path separator
        #[arg(default_value = "./")]
        dir: String,
    },
    /// Call a raw ajax action and print its payload
    Action {
        /// Action name, e.g. "index" or "browse"
        name: String,

        /// Parameters as key=value
        #[arg(value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", s))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::default()
        .with_cookie_path(&cli.cookie_file)
        .with_min_interval(Duration::from_millis(cli.min_interval_ms));
    let gazelle = Gazelle::with_config(
        Credentials::new(cli.username, cli.password, cli.hostname),
        config,
    )?;

    match &cli.command {
        Commands::Search { artist, album } => {
            let edition = gazelle.search(artist, album).await?;
            println!("{}", serde_json::to_string_pretty(&edition)?);
        }
        Commands::Download { id, dir } => {
            let path = gazelle.download(*id, dir)?.await?;
            println!("✅ Downloaded: {}", path.display());
        }
        Commands::Action { name, params } => {
            let payload = gazelle.action(name, params).await?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
    }

    Ok(())
}
