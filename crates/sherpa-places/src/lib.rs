//! Nearest point-of-interest lookups.
//!
//! Resolves a free-text address to coordinates, then searches a fixed radius
//! around it for places of a given category.

pub mod error;
pub mod google_maps;
pub mod wire;

use async_trait::async_trait;
use sherpa_core::types::{PlaceCategory, PointOfInterest};

pub use error::PlacesError;
pub use google_maps::GoogleMapsPlaces;

/// Geocoder + places search collaborator.
#[async_trait]
pub trait PlacesLookup: Send + Sync {
    /// Return the places of `category` nearest to `address`, nearest first.
    ///
    /// An address that cannot be geocoded, or a search with no matches inside
    /// the search radius, yields an empty list rather than an error.
    async fn nearest(
        &self,
        address: &str,
        category: PlaceCategory,
    ) -> Result<Vec<PointOfInterest>, PlacesError>;
}
