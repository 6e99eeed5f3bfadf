//! NPS Explorer Library
//!
//! This module exposes the request cache, scrapers, and session for use in
//! integration tests.

pub mod app;
pub mod cache;
pub mod cli;
pub mod data;
pub mod logging;
