//! National site catalog scraped from nps.gov
//!
//! Turns the cached states index, per-state listing pages, and park detail pages
//! into `Site` records. Parsing is total: missing markup produces empty results or
//! absent fields, never an error.

use scraper::{Html, Selector};
use std::collections::BTreeMap;
use tracing::debug;

use super::{non_empty, Site};
use crate::cache::{CacheError, CacheStore, Fetcher, RequestCache};

/// Root of the National Park Service website
pub const NPS_BASE_URL: &str = "https://www.nps.gov";

const STATE_MENU_ITEM: &str = "ul.dropdown-menu.SearchBar-keywordSearch li";
const PARK_LINK: &str = "ul#list_parks li.clearfix h3 a[href]";
const LINK: &str = "a[href]";
const TITLE: &str = "div.Hero-titleContainer .Hero-title";
const DESIGNATION: &str = "div.Hero-titleContainer span.Hero-designation";
const LOCALITY: &str = "div.vcard span[itemprop=\"addressLocality\"]";
const REGION: &str = "div.vcard span[itemprop=\"addressRegion\"]";
const POSTAL_CODE: &str = "div.vcard span[itemprop=\"postalCode\"]";
const PHONE: &str = "div.vcard span.tel";

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("invalid selector")
}

/// Text of the first element matching `css`, if it has any non-blank text
fn first_text(document: &Html, css: &str) -> Option<String> {
    document
        .select(&selector(css))
        .next()
        .and_then(|element| non_empty(&element.text().collect::<String>()))
}

/// Resolves a site-relative link against the catalog root
fn absolute_url(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            href.trim_start_matches('/')
        )
    }
}

/// Maps lower-cased state names to their listing page URLs
pub fn parse_state_index(html: &str, base_url: &str) -> BTreeMap<String, String> {
    let document = Html::parse_document(html);
    let link = selector(LINK);

    document
        .select(&selector(STATE_MENU_ITEM))
        .filter_map(|item| {
            let name = non_empty(&item.text().collect::<String>())?.to_lowercase();
            let href = item.select(&link).next()?.value().attr("href")?;
            Some((name, absolute_url(base_url, href)))
        })
        .collect()
}

/// Detail page URLs of every park on a state listing page, in listing order
pub fn parse_state_page(html: &str, base_url: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    document
        .select(&selector(PARK_LINK))
        .filter_map(|link| link.value().attr("href"))
        .filter_map(|href| {
            let code = href.trim_matches('/');
            if code.is_empty() {
                None
            } else {
                Some(format!(
                    "{}/{}/index.htm",
                    base_url.trim_end_matches('/'),
                    code
                ))
            }
        })
        .collect()
}

/// Extracts a `Site` from a park detail page
pub fn parse_site_page(html: &str) -> Site {
    let document = Html::parse_document(html);

    let address = match (first_text(&document, LOCALITY), first_text(&document, REGION)) {
        (Some(locality), Some(region)) => Some(format!("{}, {}", locality, region)),
        _ => None,
    };

    Site {
        category: first_text(&document, DESIGNATION),
        name: first_text(&document, TITLE),
        address,
        zipcode: first_text(&document, POSTAL_CODE),
        phone: first_text(&document, PHONE),
    }
}

/// Fetches (through the request cache) and parses the nps.gov catalog
#[derive(Debug, Clone)]
pub struct SiteCatalog {
    /// Root URL (allows override for testing)
    base_url: String,
}

impl Default for SiteCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteCatalog {
    /// Creates a new SiteCatalog pointing at nps.gov
    pub fn new() -> Self {
        Self::with_base_url(NPS_BASE_URL)
    }

    /// Creates a new SiteCatalog with a custom root URL
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// URL of the page listing every state
    pub fn index_url(&self) -> String {
        format!("{}/index.htm", self.base_url.trim_end_matches('/'))
    }

    /// Loads the state name to listing URL map
    pub fn state_urls<F: Fetcher>(
        &self,
        http: &RequestCache<F>,
        store: &mut CacheStore,
    ) -> Result<BTreeMap<String, String>, CacheError> {
        let html = http.get_or_fetch_text(&self.index_url(), store)?;
        let states = parse_state_index(&html, &self.base_url);
        debug!(count = states.len(), "Parsed state index");
        Ok(states)
    }

    /// Loads every site listed on a state page
    pub fn sites_for_state<F: Fetcher>(
        &self,
        state_url: &str,
        http: &RequestCache<F>,
        store: &mut CacheStore,
    ) -> Result<Vec<Site>, CacheError> {
        let html = http.get_or_fetch_text(state_url, store)?;
        let mut sites = Vec::new();
        for site_url in parse_state_page(&html, &self.base_url) {
            sites.push(self.site(&site_url, http, store)?);
        }
        Ok(sites)
    }

    /// Loads a single park detail page
    pub fn site<F: Fetcher>(
        &self,
        site_url: &str,
        http: &RequestCache<F>,
        store: &mut CacheStore,
    ) -> Result<Site, CacheError> {
        let html = http.get_or_fetch_text(site_url, store)?;
        Ok(parse_site_page(&html))
    }
}
