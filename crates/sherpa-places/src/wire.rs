//! Response bodies of the Google Maps web services.
//!
//! Only the fields the lookup reads are modelled; everything else is ignored.

use serde::Deserialize;
use sherpa_core::types::{Coordinates, PointOfInterest};

use crate::error::PlacesError;

#[derive(Debug, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeResult {
    pub geometry: Geometry,
}

/// `GET /geocode/json`
#[derive(Debug, Deserialize)]
pub struct GeocodeResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaceResult {
    pub name: Option<String>,
    pub formatted_address: Option<String>,
    pub geometry: Option<Geometry>,
}

/// `GET /place/textsearch/json`
#[derive(Debug, Deserialize)]
pub struct TextSearchResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<PlaceResult>,
    pub error_message: Option<String>,
}

/// Interpret a service status. `Ok(true)` means results follow,
/// `Ok(false)` means the service found nothing.
pub fn check_status(
    service: &'static str,
    status: &str,
    error_message: Option<&str>,
) -> Result<bool, PlacesError> {
    match status {
        "OK" => Ok(true),
        "ZERO_RESULTS" => Ok(false),
        other => Err(PlacesError::ApiStatus {
            service,
            status: other.to_string(),
            message: error_message.map(str::to_string),
        }),
    }
}

impl GeocodeResponse {
    /// Coordinates of the best match, if the address resolved at all.
    pub fn into_location(self) -> Result<Option<Coordinates>, PlacesError> {
        if !check_status("geocoding", &self.status, self.error_message.as_deref())? {
            return Ok(None);
        }
        Ok(self
            .results
            .into_iter()
            .next()
            .map(|r| Coordinates::new(r.geometry.location.lat, r.geometry.location.lng)))
    }
}

impl TextSearchResponse {
    /// Points of interest in the order the service returned them.
    pub fn into_points(self) -> Result<Vec<PointOfInterest>, PlacesError> {
        if !check_status("places search", &self.status, self.error_message.as_deref())? {
            return Ok(Vec::new());
        }
        self.results
            .into_iter()
            .enumerate()
            .map(|(i, place)| {
                let geometry = place.geometry.ok_or_else(|| {
                    PlacesError::Malformed(format!("result {i} has no geometry"))
                })?;
                let name = place
                    .name
                    .ok_or_else(|| PlacesError::Malformed(format!("result {i} has no name")))?;
                Ok(PointOfInterest {
                    address: place.formatted_address.unwrap_or_default(),
                    coordinates: Coordinates::new(
                        geometry.location.lat,
                        geometry.location.lng,
                    ),
                    name,
                })
            })
            .collect()
    }
}
