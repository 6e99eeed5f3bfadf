//! MapQuest radius search client
//!
//! Looks up points of interest around a site's postal code. Raw API payloads
//! are cached; `Place` records are rebuilt from them on every call.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::{non_empty, Place, Site};
use crate::cache::{CacheError, CacheStore, Fetcher, Params, RequestCache, CREDENTIAL_PARAM};

/// Endpoint of the MapQuest radius search API
pub const PLACES_BASE_URL: &str = "http://www.mapquestapi.com/search/v2/radius";

/// Search radius around the origin, in miles
const SEARCH_RADIUS: u32 = 10;

/// Maximum number of places returned per search
const MAX_MATCHES: u32 = 10;

/// Response from the radius search API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    /// Absent when the API reports an error instead of results
    search_results: Option<Vec<SearchResult>>,
    #[serde(default)]
    info: Option<ApiInfo>,
}

/// Status block the API attaches to every response
#[derive(Debug, Default, Deserialize)]
struct ApiInfo {
    #[serde(default)]
    messages: Vec<String>,
}

/// A single search hit
#[derive(Debug, Deserialize)]
struct SearchResult {
    name: Option<String>,
    address: Option<String>,
    #[serde(default)]
    fields: ResultFields,
}

#[derive(Debug, Default, Deserialize)]
struct ResultFields {
    city: Option<String>,
    group_sic_code_name: Option<String>,
}

impl From<SearchResult> for Place {
    fn from(result: SearchResult) -> Self {
        Place {
            name: result.name.as_deref().and_then(non_empty),
            category: result.fields.group_sic_code_name.as_deref().and_then(non_empty),
            address: result.address.as_deref().and_then(non_empty),
            city: result.fields.city.as_deref().and_then(non_empty),
        }
    }
}

/// Converts a radius search payload into places
///
/// Payloads without a result list (error responses, unexpected shapes) yield an
/// empty list.
pub fn parse_places(payload: &Value) -> Vec<Place> {
    let response = match serde_json::from_value::<ApiResponse>(payload.clone()) {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "Unexpected nearby-places payload");
            return Vec::new();
        }
    };

    match response.search_results {
        Some(results) => results.into_iter().map(Place::from).collect(),
        None => {
            let messages = response.info.unwrap_or_default().messages;
            warn!(?messages, "Nearby-places response has no results");
            Vec::new()
        }
    }
}

/// Client for the nearby-places search
#[derive(Debug, Clone)]
pub struct PlacesClient {
    /// API endpoint (allows override for testing)
    base_url: String,
    /// MapQuest credential
    api_key: String,
}

impl PlacesClient {
    /// Creates a new PlacesClient against the public MapQuest endpoint
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(PLACES_BASE_URL, api_key)
    }

    /// Creates a new PlacesClient with a custom endpoint
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Query parameters for a radius search around `site`
    pub fn params_for(&self, site: &Site) -> Params {
        let mut params = Params::new();
        params.insert(CREDENTIAL_PARAM.to_string(), self.api_key.clone());
        params.insert("origin".to_string(), site.zipcode().to_string());
        params.insert("radius".to_string(), SEARCH_RADIUS.to_string());
        params.insert("maxMatches".to_string(), MAX_MATCHES.to_string());
        params.insert("ambiguities".to_string(), "ignore".to_string());
        params.insert("outFormat".to_string(), "json".to_string());
        params
    }

    /// Returns the raw search payload for `site`
    ///
    /// Callers should check [`Site::has_location`] first; without a postal code
    /// the search origin is meaningless.
    pub fn nearby_places<F: Fetcher>(
        &self,
        site: &Site,
        http: &RequestCache<F>,
        store: &mut CacheStore,
    ) -> Result<Value, CacheError> {
        http.get_or_fetch_json(&self.base_url, &self.params_for(site), store)
    }

    /// Returns the places around `site`
    pub fn places_near<F: Fetcher>(
        &self,
        site: &Site,
        http: &RequestCache<F>,
        store: &mut CacheStore,
    ) -> Result<Vec<Place>, CacheError> {
        let payload = self.nearby_places(site, http, store)?;
        Ok(parse_places(&payload))
    }
}
