use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        GeoPoint { lat, lng }
    }
}

/// Formats as `lat,lng`, the shape the Places API expects for `location`.
impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// A business returned by the search provider. `screenshot_url` and
/// `navigation_failed` are filled in by the screenshot enricher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub place_id: String,
    pub name: String,
    pub address: String,
    pub location: GeoPoint,
    pub website: Option<String>,
    pub phone_number: Option<String>,
    pub rating: Option<f32>,
    pub user_ratings_total: Option<u32>,
    pub types: Vec<String>,
    pub screenshot_url: Option<String>,
    pub navigation_failed: bool,
}

impl BusinessRecord {
    pub fn new(place_id: &str, name: &str, address: &str, location: GeoPoint) -> Self {
        BusinessRecord {
            place_id: place_id.to_string(),
            name: name.to_string(),
            address: address.to_string(),
            location,
            website: None,
            phone_number: None,
            rating: None,
            user_ratings_total: None,
            types: vec![],
            screenshot_url: None,
            navigation_failed: false,
        }
    }

    pub fn with_website(mut self, website: &str) -> Self {
        self.website = Some(website.to_string());
        self
    }
}
