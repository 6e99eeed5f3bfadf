//! Cached request layer
//!
//! `RequestCache` sits between callers and the network: it fingerprints each
//! request, answers from a [`CacheStore`] when it can, and otherwise performs a
//! single throttled fetch through a [`Fetcher`] and persists the result.

use reqwest::blocking::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use super::store::{CacheError, CacheStore};

/// Delay imposed before every request that misses the cache
pub const COURTESY_DELAY: Duration = Duration::from_secs(1);

/// Name of the query parameter carrying the API credential
pub const CREDENTIAL_PARAM: &str = "key";

/// How long a single request may take before giving up
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Query parameters of an API request
///
/// Sorted by name, so the same set of parameters always fingerprints the same way.
pub type Params = BTreeMap<String, String>;

/// Errors that can occur while talking to the network
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Request to {url} failed with status {status}")]
    Status { url: String, status: u16 },
}

/// Network transport used on cache misses
pub trait Fetcher {
    /// Fetches `url` and returns the response body as text
    fn fetch_text(&self, url: &str) -> Result<String, FetchError>;

    /// Issues a GET to `url` with `params` as the query string and decodes the JSON body
    fn fetch_json(&self, url: &str, params: &Params) -> Result<Value, FetchError>;
}

/// Blocking HTTP transport backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a new HttpFetcher with default settings
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    /// Creates a new HttpFetcher with a custom HTTP client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn check_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, FetchError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(FetchError::Status {
                url: response.url().to_string(),
                status: status.as_u16(),
            })
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let response = Self::check_status(self.client.get(url).send()?)?;
        Ok(response.text()?)
    }

    fn fetch_json(&self, url: &str, params: &Params) -> Result<Value, FetchError> {
        let response = Self::check_status(self.client.get(url).query(params).send()?)?;
        Ok(response.json::<Value>()?)
    }
}

/// Builds the cache key for a request
///
/// The key is `target` followed by `_<name>_<value>` for every parameter except
/// the credential, so requests made with different API keys share one entry.
pub fn fingerprint(target: &str, params: &Params) -> String {
    let mut key = target.to_string();
    for (name, value) in params {
        if name == CREDENTIAL_PARAM {
            continue;
        }
        key.push('_');
        key.push_str(name);
        key.push('_');
        key.push_str(value);
    }
    key
}

/// Get-or-fetch operations over a caller-owned [`CacheStore`]
#[derive(Debug, Clone)]
pub struct RequestCache<F> {
    /// Transport used on misses
    fetcher: F,
    /// Delay before each miss
    throttle: Duration,
}

impl<F: Fetcher> RequestCache<F> {
    /// Creates a RequestCache that waits [`COURTESY_DELAY`] before each miss
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            throttle: COURTESY_DELAY,
        }
    }

    /// Overrides the delay imposed before each miss
    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    /// Returns the underlying transport
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Returns the page at `url`, fetching it only if it has never been cached
    ///
    /// # Returns
    /// * `Ok(String)` - Cached or freshly fetched body
    /// * `Err(CacheError)` - If the fetch or the cache write fails
    pub fn get_or_fetch_text(&self, url: &str, store: &mut CacheStore) -> Result<String, CacheError> {
        if let Some(Value::String(text)) = store.get(url) {
            info!(key = url, "Using cache");
            return Ok(text.clone());
        }

        info!(url, "Fetching");
        self.wait();
        let body = self.fetcher.fetch_text(url)?;
        store.insert(url, Value::String(body.clone()));
        store.save()?;
        Ok(body)
    }

    /// Returns the decoded API response for `base_url` + `params`, calling the API
    /// only if this fingerprint has never been cached
    ///
    /// The request itself carries every parameter, including the credential.
    pub fn get_or_fetch_json(
        &self,
        base_url: &str,
        params: &Params,
        store: &mut CacheStore,
    ) -> Result<Value, CacheError> {
        let key = fingerprint(base_url, params);
        if let Some(value) = store.get(&key) {
            info!(key = %key, "Using cache");
            return Ok(value.clone());
        }

        info!(url = base_url, "Fetching");
        self.wait();
        let value = self.fetcher.fetch_json(base_url, params)?;
        store.insert(key, value.clone());
        store.save()?;
        Ok(value)
    }

    fn wait(&self) {
        if !self.throttle.is_zero() {
            thread::sleep(self.throttle);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StubFetcher;
    use super::*;
    use serde_json::json;
    use std::time::Instant;
    use tempfile::TempDir;

    const PAGE_URL: &str = "https://www.nps.gov/index.htm";
    const API_URL: &str = "http://www.mapquestapi.com/search/v2/radius";

    fn create_test_store() -> (CacheStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = CacheStore::load(temp_dir.path().join("cache.json"));
        (store, temp_dir)
    }

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_fingerprint_is_independent_of_insertion_order() {
        let mut first = Params::new();
        first.insert("origin".to_string(), "49931".to_string());
        first.insert("radius".to_string(), "10".to_string());
        first.insert("outFormat".to_string(), "json".to_string());

        let mut second = Params::new();
        second.insert("outFormat".to_string(), "json".to_string());
        second.insert("radius".to_string(), "10".to_string());
        second.insert("origin".to_string(), "49931".to_string());

        assert_eq!(fingerprint(API_URL, &first), fingerprint(API_URL, &second));
    }

    #[test]
    fn test_fingerprint_excludes_credential() {
        let with_a = params(&[("key", "AAA"), ("origin", "49931")]);
        let with_b = params(&[("key", "BBB"), ("origin", "49931")]);
        let without = params(&[("origin", "49931")]);

        assert_eq!(fingerprint(API_URL, &with_a), fingerprint(API_URL, &with_b));
        assert_eq!(fingerprint(API_URL, &with_a), fingerprint(API_URL, &without));
        assert!(!fingerprint(API_URL, &with_a).contains("AAA"));
    }

    #[test]
    fn test_fingerprint_differs_by_parameter_value() {
        let a = params(&[("origin", "49931")]);
        let b = params(&[("origin", "82190")]);

        assert_ne!(fingerprint(API_URL, &a), fingerprint(API_URL, &b));
    }

    #[test]
    fn test_fingerprint_format() {
        let p = params(&[("radius", "10"), ("origin", "49931")]);

        assert_eq!(
            fingerprint(API_URL, &p),
            format!("{}_origin_49931_radius_10", API_URL)
        );
        assert_eq!(fingerprint(API_URL, &Params::new()), API_URL);
    }

    #[test]
    fn test_get_or_fetch_text_fetches_once() {
        let (mut store, _temp_dir) = create_test_store();
        let cache = RequestCache::new(StubFetcher::new().with_page(PAGE_URL, "<html>hi</html>"))
            .with_throttle(Duration::ZERO);

        let first = cache.get_or_fetch_text(PAGE_URL, &mut store).unwrap();
        let second = cache.get_or_fetch_text(PAGE_URL, &mut store).unwrap();

        assert_eq!(first, "<html>hi</html>");
        assert_eq!(first, second);
        assert_eq!(cache.fetcher().request_count(), 1);
    }

    #[test]
    fn test_get_or_fetch_text_persists_on_miss() {
        let (mut store, _temp_dir) = create_test_store();
        let cache = RequestCache::new(StubFetcher::new().with_page(PAGE_URL, "body"))
            .with_throttle(Duration::ZERO);

        cache.get_or_fetch_text(PAGE_URL, &mut store).unwrap();

        let reloaded = CacheStore::load(store.path());
        assert_eq!(reloaded.get(PAGE_URL), Some(&json!("body")));
    }

    #[test]
    fn test_cached_text_survives_restart() {
        let (mut store, _temp_dir) = create_test_store();
        let warm = RequestCache::new(StubFetcher::new().with_page(PAGE_URL, "body"))
            .with_throttle(Duration::ZERO);
        warm.get_or_fetch_text(PAGE_URL, &mut store).unwrap();

        // New process: nothing to serve, so any fetch would fail
        let mut reloaded = CacheStore::load(store.path());
        let cold = RequestCache::new(StubFetcher::new()).with_throttle(Duration::ZERO);
        let body = cold.get_or_fetch_text(PAGE_URL, &mut reloaded).unwrap();

        assert_eq!(body, "body");
        assert_eq!(cold.fetcher().request_count(), 0);
    }

    #[test]
    fn test_hit_is_not_throttled() {
        let (mut store, _temp_dir) = create_test_store();
        let throttle = Duration::from_millis(200);
        let cache =
            RequestCache::new(StubFetcher::new().with_page(PAGE_URL, "body")).with_throttle(throttle);

        let start = Instant::now();
        cache.get_or_fetch_text(PAGE_URL, &mut store).unwrap();
        let miss = start.elapsed();

        let start = Instant::now();
        cache.get_or_fetch_text(PAGE_URL, &mut store).unwrap();
        let hit = start.elapsed();

        assert!(miss >= throttle, "Miss should wait for the courtesy delay");
        assert!(hit < throttle, "Hit should not be throttled");
    }

    #[test]
    fn test_non_string_entry_is_refetched_as_text() {
        let (mut store, _temp_dir) = create_test_store();
        store.insert(PAGE_URL, json!({"unexpected": true}));
        let cache = RequestCache::new(StubFetcher::new().with_page(PAGE_URL, "page"))
            .with_throttle(Duration::ZERO);

        let body = cache.get_or_fetch_text(PAGE_URL, &mut store).unwrap();

        assert_eq!(body, "page");
        assert_eq!(store.get(PAGE_URL), Some(&json!("page")));
    }

    #[test]
    fn test_fetch_failure_propagates_and_is_not_cached() {
        let (mut store, _temp_dir) = create_test_store();
        let cache = RequestCache::new(StubFetcher::new()).with_throttle(Duration::ZERO);

        let result = cache.get_or_fetch_text(PAGE_URL, &mut store);

        assert!(matches!(
            result,
            Err(CacheError::Fetch(FetchError::Status { status: 404, .. }))
        ));
        assert!(store.is_empty());
        assert!(!store.path().exists(), "Failed fetch should not write the cache");
    }

    #[test]
    fn test_get_or_fetch_json_fetches_once_and_sends_credential() {
        let (mut store, _temp_dir) = create_test_store();
        let payload = json!({"searchResults": []});
        let cache = RequestCache::new(StubFetcher::new().with_api(API_URL, payload.clone()))
            .with_throttle(Duration::ZERO);
        let p = params(&[("key", "secret"), ("origin", "49931")]);

        let first = cache.get_or_fetch_json(API_URL, &p, &mut store).unwrap();
        let second = cache.get_or_fetch_json(API_URL, &p, &mut store).unwrap();

        assert_eq!(first, payload);
        assert_eq!(second, payload);
        let requests = cache.fetcher().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].1.as_ref().unwrap().get("key").unwrap(), "secret");
    }

    #[test]
    fn test_get_or_fetch_json_shares_entry_across_api_keys() {
        let (mut store, _temp_dir) = create_test_store();
        let cache = RequestCache::new(StubFetcher::new().with_api(API_URL, json!({"n": 1})))
            .with_throttle(Duration::ZERO);

        cache
            .get_or_fetch_json(API_URL, &params(&[("key", "a"), ("origin", "1")]), &mut store)
            .unwrap();
        cache
            .get_or_fetch_json(API_URL, &params(&[("key", "b"), ("origin", "1")]), &mut store)
            .unwrap();

        assert_eq!(cache.fetcher().request_count(), 1);
        assert!(store.contains_key(&format!("{}_origin_1", API_URL)));
    }

    #[test]
    fn test_credential_is_never_written_to_cache_file() {
        let (mut store, _temp_dir) = create_test_store();
        let cache = RequestCache::new(StubFetcher::new().with_api(API_URL, json!({})))
            .with_throttle(Duration::ZERO);

        cache
            .get_or_fetch_json(API_URL, &params(&[("key", "topsecret"), ("origin", "1")]), &mut store)
            .unwrap();

        let content = std::fs::read_to_string(store.path()).unwrap();
        assert!(!content.contains("topsecret"));
    }
}
