//! NPS Explorer - Browse National Park Service sites from the terminal
//!
//! Lists the national sites of a state scraped from nps.gov and shows places
//! near a chosen site using the MapQuest search API. Every page and API response
//! is cached on disk, so repeated runs only hit the network for new requests.

use std::io;
use std::process::ExitCode;

use clap::Parser;

use npsexplorer::app::App;
use npsexplorer::cache::{CacheStore, HttpFetcher, RequestCache};
use npsexplorer::cli::{Cli, StartupConfig};
use npsexplorer::data::{PlacesClient, SiteCatalog};
use npsexplorer::logging;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = StartupConfig::from_cli(&cli)?;

    if let Err(e) = logging::init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let store = CacheStore::load(&config.cache_path);
    tracing::debug!(path = %store.path().display(), entries = store.len(), "Loaded cache");

    let http = RequestCache::new(HttpFetcher::new()?);
    let mut app = App::new(store, http, SiteCatalog::new(), PlacesClient::new(config.api_key));

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    app.run(stdin.lock(), &mut stdout)?;

    Ok(())
}
