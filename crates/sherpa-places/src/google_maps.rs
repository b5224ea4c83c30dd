//! Google Maps implementation of [`PlacesLookup`].
//!
//! Two calls per lookup: the Geocoding API turns the address into a
//! coordinate pair, then Places Text Search runs the category query inside
//! the configured radius around it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use sherpa_core::config::{HttpConfig, PlacesConfig};
use sherpa_core::types::{Coordinates, PlaceCategory, PointOfInterest};

use crate::error::PlacesError;
use crate::wire::{GeocodeResponse, TextSearchResponse};
use crate::PlacesLookup;

/// Places lookup backed by the Google Maps web services.
pub struct GoogleMapsPlaces {
    client: Client,
    api_key: SecretString,
    base_url: String,
    radius_m: u32,
    timeout_secs: u64,
}

impl GoogleMapsPlaces {
    pub fn new(
        api_key: SecretString,
        places: &PlacesConfig,
        http: &HttpConfig,
    ) -> Result<Self, PlacesError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(http.request_timeout_secs))
            .build()
            .map_err(|e| PlacesError::Request(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            base_url: places.base_url.trim_end_matches('/').to_string(),
            radius_m: places.radius_m,
            timeout_secs: http.request_timeout_secs,
        })
    }

    /// Resolve an address to coordinates. `None` when nothing matched.
    pub async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, PlacesError> {
        let url = format!("{}/geocode/json", self.base_url);
        let resp: GeocodeResponse = self
            .get_json(
                &url,
                &[
                    ("address", address.to_string()),
                    ("key", self.api_key.expose_secret().to_string()),
                ],
            )
            .await?;
        resp.into_location()
    }

    /// Text-search `query` around `location`, nearest first.
    pub async fn text_search(
        &self,
        query: &str,
        location: Coordinates,
    ) -> Result<Vec<PointOfInterest>, PlacesError> {
        let url = format!("{}/place/textsearch/json", self.base_url);
        let resp: TextSearchResponse = self
            .get_json(
                &url,
                &[
                    ("query", query.to_string()),
                    ("location", format!("{},{}", location.lat, location.lng)),
                    ("radius", self.radius_m.to_string()),
                    ("key", self.api_key.expose_secret().to_string()),
                ],
            )
            .await?;
        resp.into_points()
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, PlacesError> {
        let resp = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| self.map_reqwest(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PlacesError::Request(format!("HTTP {}", status.as_u16())));
        }

        resp.json::<T>()
            .await
            .map_err(|e| PlacesError::Malformed(e.without_url().to_string()))
    }

    // The request URL carries the API key, so it is stripped before the
    // error is rendered anywhere.
    fn map_reqwest(&self, err: reqwest::Error) -> PlacesError {
        if err.is_timeout() {
            PlacesError::Timeout(self.timeout_secs)
        } else {
            PlacesError::Request(err.without_url().to_string())
        }
    }
}

#[async_trait]
impl PlacesLookup for GoogleMapsPlaces {
    async fn nearest(
        &self,
        address: &str,
        category: PlaceCategory,
    ) -> Result<Vec<PointOfInterest>, PlacesError> {
        let Some(location) = self.geocode(address).await? else {
            tracing::info!(%category, "Address could not be geocoded");
            return Ok(Vec::new());
        };

        tracing::debug!(%category, lat = location.lat, lng = location.lng, "Address geocoded");

        let points = self.text_search(category.search_query(), location).await?;
        tracing::info!(%category, count = points.len(), "Places search complete");
        Ok(points)
    }
}
