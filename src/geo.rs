//! Turning coordinates into a readable place name.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{JournalError, Result};

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<String>;
}

/// OpenStreetMap Nominatim `/reverse` lookup.
pub struct NominatimGeocoder {
    base_url: String,
    client: reqwest::Client,
}

impl NominatimGeocoder {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("daybook/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| JournalError::ExternalService(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<String> {
        let url = format!("{}/reverse", self.base_url);
        let lat = lat.to_string();
        let lon = lon.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("format", "json"),
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("addressdetails", "1"),
            ])
            .send()
            .await
            .map_err(|e| JournalError::ExternalService(format!("geocoding request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(JournalError::ExternalService(format!(
                "geocoding request failed: {}",
                response.status()
            )));
        }

        let place: NominatimPlace = response
            .json()
            .await
            .map_err(|e| JournalError::ExternalService(format!("failed to parse geocoding response: {e}")))?;

        format_address(&place).ok_or_else(|| {
            JournalError::ExternalService("geocoding response had no address".to_string())
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NominatimPlace {
    pub display_name: Option<String>,
    pub address: Option<NominatimAddress>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NominatimAddress {
    pub house_number: Option<String>,
    pub road: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

/// "house road, city, state, country", skipping what is missing; falls back to
/// the display name. `None` when the place has neither.
pub fn format_address(place: &NominatimPlace) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();

    if let Some(address) = &place.address {
        match (&address.house_number, &address.road) {
            (Some(number), Some(road)) => parts.push(format!("{number} {road}")),
            (None, Some(road)) => parts.push(road.clone()),
            _ => {}
        }
        if let Some(locality) = address
            .city
            .as_ref()
            .or(address.town.as_ref())
            .or(address.village.as_ref())
        {
            parts.push(locality.clone());
        }
        parts.extend(address.state.iter().cloned());
        parts.extend(address.country.iter().cloned());
    }

    if parts.is_empty() {
        place.display_name.clone().filter(|name| !name.trim().is_empty())
    } else {
        Some(parts.join(", "))
    }
}

pub fn coordinates_text(lat: f64, lon: f64) -> String {
    format!("{lat:.6}, {lon:.6}")
}

/// A place name for the coordinates, or the coordinates themselves when the
/// lookup fails.
pub async fn resolve_location(geocoder: &dyn ReverseGeocoder, lat: f64, lon: f64) -> String {
    match geocoder.reverse_geocode(lat, lon).await {
        Ok(address) => address,
        Err(e) => {
            tracing::warn!("Reverse geocoding failed, using coordinates: {}", e);
            coordinates_text(lat, lon)
        }
    }
}
