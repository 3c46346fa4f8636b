use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    configuration::PlacesSettings,
    domain::business::{BusinessRecord, GeoPoint},
};

/// Finds businesses around a point, already narrowed to the configured criteria.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn filtered_search(&self, point: GeoPoint) -> anyhow::Result<Vec<BusinessRecord>>;
}

const DETAIL_FIELDS: &str = "website,formatted_phone_number,formatted_address";

pub struct GooglePlacesClient {
    client: Client,
    settings: PlacesSettings,
}

#[derive(Serialize)]
struct NearbyQuery<'a> {
    location: String,
    radius: u32,
    key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    keyword: Option<&'a str>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    place_type: Option<&'a str>,
}

#[derive(Serialize)]
struct DetailsQuery<'a> {
    place_id: &'a str,
    fields: &'a str,
    key: &'a str,
}

#[derive(Deserialize)]
struct NearbyResponse {
    status: String,
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<NearbyPlace>,
}

#[derive(Deserialize, Clone)]
struct NearbyPlace {
    place_id: String,
    name: String,
    vicinity: Option<String>,
    geometry: Geometry,
    rating: Option<f32>,
    user_ratings_total: Option<u32>,
    business_status: Option<String>,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Deserialize, Clone)]
struct Geometry {
    location: Location,
}

#[derive(Deserialize, Clone)]
struct Location {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct DetailsResponse {
    status: String,
    error_message: Option<String>,
    result: Option<PlaceDetails>,
}

#[derive(Deserialize)]
struct PlaceDetails {
    website: Option<String>,
    formatted_phone_number: Option<String>,
    formatted_address: Option<String>,
}

impl GooglePlacesClient {
    pub fn new(settings: PlacesSettings) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(GooglePlacesClient { client, settings })
    }

    async fn nearby_search(&self, point: GeoPoint) -> anyhow::Result<Vec<NearbyPlace>> {
        let query = NearbyQuery {
            location: point.to_string(),
            radius: self.settings.radius_meters,
            key: &self.settings.api_key,
            keyword: self.settings.keyword.as_deref(),
            place_type: self.settings.place_type.as_deref(),
        };

        let res = self
            .client
            .get(format!("{}/nearbysearch/json", self.settings.base_url))
            .query(&query)
            .send()
            .await
            .context("No response from places nearby search")?
            .error_for_status()?
            .json::<NearbyResponse>()
            .await
            .context("Error when deserializing nearby search response")?;

        match res.status.as_str() {
            "OK" | "ZERO_RESULTS" => Ok(res.results),
            status => bail!(
                "Places nearby search returned {}: {}",
                status,
                res.error_message.unwrap_or_default()
            ),
        }
    }

    async fn place_details(&self, place_id: &str) -> anyhow::Result<PlaceDetails> {
        let query = DetailsQuery {
            place_id,
            fields: DETAIL_FIELDS,
            key: &self.settings.api_key,
        };

        let res = self
            .client
            .get(format!("{}/details/json", self.settings.base_url))
            .query(&query)
            .send()
            .await
            .context("No response from places details")?
            .error_for_status()?
            .json::<DetailsResponse>()
            .await
            .context("Error when deserializing place details response")?;

        match (res.status.as_str(), res.result) {
            ("OK", Some(details)) => Ok(details),
            (status, _) => bail!(
                "Places details for {} returned {}: {}",
                place_id,
                status,
                res.error_message.unwrap_or_default()
            ),
        }
    }
}

fn meets_criteria(settings: &PlacesSettings, place: &NearbyPlace) -> bool {
    if let Some(min_rating) = settings.min_rating {
        if place.rating.unwrap_or(0.0) < min_rating {
            return false;
        }
    }
    if let Some(min_total) = settings.min_user_ratings_total {
        if place.user_ratings_total.unwrap_or(0) < min_total {
            return false;
        }
    }
    if settings.only_operational
        && place
            .business_status
            .as_deref()
            .is_some_and(|status| status != "OPERATIONAL")
    {
        return false;
    }

    !place
        .types
        .iter()
        .any(|t| settings.excluded_types.contains(t))
}

fn into_record(place: NearbyPlace, details: Option<PlaceDetails>) -> BusinessRecord {
    let mut record = BusinessRecord::new(
        &place.place_id,
        &place.name,
        place.vicinity.as_deref().unwrap_or_default(),
        GeoPoint::new(place.geometry.location.lat, place.geometry.location.lng),
    );
    record.rating = place.rating;
    record.user_ratings_total = place.user_ratings_total;
    record.types = place.types;

    if let Some(details) = details {
        record.website = details.website;
        record.phone_number = details.formatted_phone_number;
        if let Some(address) = details.formatted_address {
            record.address = address;
        }
    }

    record
}

#[async_trait]
impl SearchProvider for GooglePlacesClient {
    async fn filtered_search(&self, point: GeoPoint) -> anyhow::Result<Vec<BusinessRecord>> {
        let places = self.nearby_search(point).await?;
        let total = places.len();

        let mut records = vec![];
        for place in places
            .into_iter()
            .filter(|p| meets_criteria(&self.settings, p))
        {
            let details = match self.place_details(&place.place_id).await {
                Ok(details) => Some(details),
                Err(e) => {
                    log::error!("Failed to get details for {}: {:?}", place.name, e);
                    None
                }
            };
            records.push(into_record(place, details));
        }

        log::info!(
            "{} of {} places around {} met the search criteria",
            records.len(),
            total,
            point
        );

        Ok(records)
    }
}
