//! Cache module for storing HTTP responses to disk
//!
//! This module provides a persistent request cache: a single JSON file mapping
//! request fingerprints to response payloads, plus the get-or-fetch operations
//! that consult it before touching the network. Entries never expire.

mod fetch;
mod store;

pub use fetch::{
    fingerprint, FetchError, Fetcher, HttpFetcher, Params, RequestCache, COURTESY_DELAY,
    CREDENTIAL_PARAM,
};
pub use store::{default_cache_path, CacheError, CacheStore, CACHE_FILE_NAME};

#[cfg(test)]
pub(crate) use fetch::testing;
