//! Core data models for NPS Explorer
//!
//! This module contains the record types shown to the user (national sites and
//! nearby places) together with the clients that produce them from cached
//! responses.

pub mod places;
pub mod sites;

pub use places::{parse_places, PlacesClient, PLACES_BASE_URL};
pub use sites::{parse_site_page, parse_state_index, parse_state_page, SiteCatalog, NPS_BASE_URL};

/// Shown when a site or place has no name
pub const NO_NAME: &str = "no name";
/// Shown when a site or place has no address
pub const NO_ADDRESS: &str = "no address";
/// Shown when a site has no postal code
pub const NO_ZIPCODE: &str = "no zipcode";
/// Shown when a site has no phone number
pub const NO_PHONE: &str = "no phone";
/// Shown when a place has no city
pub const NO_CITY: &str = "no city";
/// Shown when a place has no category
pub const NO_CATEGORY: &str = "no category";

/// A national site scraped from its nps.gov detail page
///
/// Every field is optional because the source markup is not consistent between
/// parks; accessors substitute the sentinel strings above.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Site {
    /// Designation such as "National Park"; some sites have none
    pub category: Option<String>,
    /// Name of the site (e.g. "Isle Royale")
    pub name: Option<String>,
    /// City and state (e.g. "Houghton, MI")
    pub address: Option<String>,
    /// Postal code (e.g. "49931", "82190-0168")
    pub zipcode: Option<String>,
    /// Phone number (e.g. "(906) 482-0984")
    pub phone: Option<String>,
}

impl Site {
    pub fn category(&self) -> &str {
        self.category.as_deref().unwrap_or("")
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(NO_NAME)
    }

    pub fn address(&self) -> &str {
        self.address.as_deref().unwrap_or(NO_ADDRESS)
    }

    pub fn zipcode(&self) -> &str {
        self.zipcode.as_deref().unwrap_or(NO_ZIPCODE)
    }

    pub fn phone(&self) -> &str {
        self.phone.as_deref().unwrap_or(NO_PHONE)
    }

    /// Returns true if the site has a postal code usable as a search origin
    pub fn has_location(&self) -> bool {
        self.zipcode.as_deref().is_some_and(|z| !z.is_empty())
    }

    /// One-line summary used in site listings
    pub fn info(&self) -> String {
        format!(
            "{} ({}): {} {}",
            self.name(),
            self.category(),
            self.address(),
            self.zipcode()
        )
    }
}

/// A point of interest returned by the nearby-places search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Place {
    pub name: Option<String>,
    pub category: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
}

impl Place {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(NO_NAME)
    }

    pub fn category(&self) -> &str {
        self.category.as_deref().unwrap_or(NO_CATEGORY)
    }

    pub fn address(&self) -> &str {
        self.address.as_deref().unwrap_or(NO_ADDRESS)
    }

    pub fn city(&self) -> &str {
        self.city.as_deref().unwrap_or(NO_CITY)
    }

    /// Bulleted line used in place listings
    pub fn line(&self) -> String {
        format!(
            "- {} ({}): {}, {}",
            self.name(),
            self.category(),
            self.address(),
            self.city()
        )
    }
}

/// Trims a scraped or decoded value, treating blank text as absent
pub(crate) fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
