mod commands;
mod logging;
mod session;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use photomigrate_core::library::Library;
use photomigrate_core::store::EmsClient;
use photomigrate_core::{Migrator, DEFAULT_ASSET_CONTENT_TYPE, DEFAULT_LIBRARY_CONTENT_TYPE};
use tracing::{debug, warn};

/// photomigrate — import an Apple Photos library into elasticms
#[derive(Parser)]
#[command(name = "photomigrate", version, about)]
struct Cli {
    /// Base URL of the destination elasticms instance
    url: String,

    /// Path to the Apple Photos library bundle
    #[arg(default_value_t = default_photos_path())]
    photos_path: String,

    /// Username (prompted when omitted and no session is cached)
    #[arg(long)]
    username: Option<String>,

    /// Password (prompted when omitted and no session is cached)
    #[arg(long)]
    password: Option<String>,

    /// Content type of the library document
    #[arg(long, default_value = DEFAULT_LIBRARY_CONTENT_TYPE)]
    library_content_type: String,

    /// Content type of the per-asset documents
    #[arg(long, default_value = DEFAULT_ASSET_CONTENT_TYPE)]
    asset_content_type: String,
}

fn default_photos_path() -> String {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Pictures")
        .join("Photos Library.photoslibrary")
        .to_string_lossy()
        .to_string()
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn authenticate(cli: &Cli, client: &mut EmsClient) -> Result<()> {
    if let Some(session) = session::load() {
        debug!("reusing cached session");
        client.set_token(&session.token);
        return Ok(());
    }

    let username = match &cli.username {
        Some(username) => username.clone(),
        None => prompt("Username")?,
    };
    let password = match &cli.password {
        Some(password) => password.clone(),
        None => prompt("Password")?,
    };

    let session = client
        .login(&username, &password)
        .context("authentication failed")?;
    if let Err(err) = session::store(&session) {
        warn!(error = %err, "could not cache session, will log in again next run");
    }
    Ok(())
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let mut client = EmsClient::new(&cli.url).context("invalid elasticms URL")?;
    authenticate(&cli, &mut client)?;

    let photos_path = PathBuf::from(&cli.photos_path);
    let library = Library::open(&photos_path)
        .with_context(|| format!("cannot open Photos library at {}", photos_path.display()))?;

    let migrator = Migrator::new(
        library,
        client,
        &cli.library_content_type,
        &cli.asset_content_type,
    );
    commands::migrate::run(&migrator)
}
