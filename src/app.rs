//! Interactive session for NPS Explorer
//!
//! A two-state menu loop: the user first picks a state, then picks a site from
//! that state's listing to see places nearby. All network access goes through
//! the request cache owned by the session.

use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use thiserror::Error;

use crate::cache::{CacheError, CacheStore, Fetcher, RequestCache};
use crate::data::{PlacesClient, Site, SiteCatalog};

const STATE_PROMPT: &str = "Enter a state name (e.g. Michigan, michigan) or \"exit\": ";
const SITE_PROMPT: &str = "Choose the number for detail search or \"exit\" or \"back\": ";

/// Errors that end the session
#[derive(Debug, Error)]
pub enum AppError {
    /// A page or API request failed, or the cache could not be written
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Reading input or writing output failed
    #[error("Console I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Session state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    /// Waiting for a state name
    PickState,
    /// Waiting for a site number from the listing of `state`
    PickSite { state: String, sites: Vec<Site> },
}

/// Interactive explorer session
pub struct App<F> {
    /// Current menu
    pub state: AppState,
    /// Flag indicating the session should end
    pub should_quit: bool,
    /// Request cache contents, persisted after every miss
    store: CacheStore,
    /// Cached transport
    http: RequestCache<F>,
    /// nps.gov scraper
    catalog: SiteCatalog,
    /// Nearby-places search
    places: PlacesClient,
    /// Lower-cased state name to listing URL
    state_urls: BTreeMap<String, String>,
}

impl<F: Fetcher> App<F> {
    /// Creates a new session starting at the state menu
    pub fn new(
        store: CacheStore,
        http: RequestCache<F>,
        catalog: SiteCatalog,
        places: PlacesClient,
    ) -> Self {
        Self {
            state: AppState::PickState,
            should_quit: false,
            store,
            http,
            catalog,
            places,
            state_urls: BTreeMap::new(),
        }
    }

    /// The request cache contents
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// The cached transport
    pub fn http(&self) -> &RequestCache<F> {
        &self.http
    }

    /// Fetches the list of states; must run before the first state lookup
    pub fn load_state_index(&mut self) -> Result<(), AppError> {
        self.state_urls = self.catalog.state_urls(&self.http, &mut self.store)?;
        Ok(())
    }

    /// Prompt for the current state
    pub fn prompt(&self) -> &'static str {
        match self.state {
            AppState::PickState => STATE_PROMPT,
            AppState::PickSite { .. } => SITE_PROMPT,
        }
    }

    /// Runs the session until the user exits or input ends
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<(), AppError> {
        self.load_state_index()?;

        let mut lines = input.lines();
        while !self.should_quit {
            write!(out, "{}", self.prompt())?;
            out.flush()?;

            match lines.next() {
                Some(line) => self.handle_input(&line?, out)?,
                None => {
                    writeln!(out)?;
                    self.should_quit = true;
                }
            }
        }

        writeln!(out, "Bye!")?;
        Ok(())
    }

    /// Applies one line of user input to the current state
    pub fn handle_input<W: Write>(&mut self, input: &str, out: &mut W) -> Result<(), AppError> {
        let input = input.trim();
        if input.eq_ignore_ascii_case("exit") {
            self.should_quit = true;
            return Ok(());
        }

        match self.state {
            AppState::PickState => self.handle_state_input(input, out),
            AppState::PickSite { .. } => self.handle_site_input(input, out),
        }
    }

    fn handle_state_input<W: Write>(&mut self, input: &str, out: &mut W) -> Result<(), AppError> {
        let state = input.to_lowercase();
        let Some(state_url) = self.state_urls.get(&state).cloned() else {
            writeln!(out, "[Error] Enter proper state name")?;
            writeln!(out)?;
            return Ok(());
        };

        let sites = self
            .catalog
            .sites_for_state(&state_url, &self.http, &mut self.store)?;
        print_sites(out, &state, &sites)?;
        self.state = AppState::PickSite { state, sites };
        Ok(())
    }

    fn handle_site_input<W: Write>(&mut self, input: &str, out: &mut W) -> Result<(), AppError> {
        if input.eq_ignore_ascii_case("back") {
            self.state = AppState::PickState;
            return Ok(());
        }

        let AppState::PickSite { sites, .. } = &self.state else {
            return Ok(());
        };

        let Some(index) = parse_selection(input, sites.len()) else {
            writeln!(out, "[Error] Invalid input")?;
            writeln!(out)?;
            return Ok(());
        };

        let site = sites[index].clone();
        if !site.has_location() {
            writeln!(out, "[Error] No address info for the selected site")?;
            writeln!(out)?;
            return Ok(());
        }

        let places = self.places.places_near(&site, &self.http, &mut self.store)?;
        print_header(out, &format!("Places near in {}", site.name()))?;
        for place in &places {
            writeln!(out, "{}", place.line())?;
        }
        Ok(())
    }
}

/// Converts a 1-based menu choice into an index into a list of `len` items
fn parse_selection(input: &str, len: usize) -> Option<usize> {
    if input.is_empty() || !input.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let choice: usize = input.parse().ok()?;
    (1..=len).contains(&choice).then(|| choice - 1)
}

fn print_header<W: Write>(out: &mut W, header: &str) -> io::Result<()> {
    let rule = "-".repeat(header.chars().count());
    writeln!(out, "{}", rule)?;
    writeln!(out, "{}", header)?;
    writeln!(out, "{}", rule)
}

fn print_sites<W: Write>(out: &mut W, state: &str, sites: &[Site]) -> io::Result<()> {
    print_header(out, &format!("List of national sites in {}", state))?;
    for (i, site) in sites.iter().enumerate() {
        writeln!(out, "[{}] {}", i + 1, site.info())?;
    }
    Ok(())
}
