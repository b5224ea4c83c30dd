//! Domain types shared by the router and its collaborators.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.lat, self.lng)
    }
}

/// A place returned by a places lookup.
///
/// Lookups return these nearest-first; the order is never recomputed locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    /// Formatted street address.
    pub address: String,
    /// Location of the place.
    pub coordinates: Coordinates,
    /// Display name.
    pub name: String,
}

/// The kinds of place the assistant can search for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceCategory {
    Charger,
    HyundaiService,
    KiaService,
}

impl PlaceCategory {
    pub const ALL: [PlaceCategory; 3] = [
        PlaceCategory::Charger,
        PlaceCategory::HyundaiService,
        PlaceCategory::KiaService,
    ];

    /// Free-text query sent to the places text search.
    pub fn search_query(self) -> &'static str {
        match self {
            PlaceCategory::Charger => "Nearest charging station",
            PlaceCategory::HyundaiService => "Nearest Hyundai Service Stations",
            PlaceCategory::KiaService => "Nearest Kia Service Stations",
        }
    }

    /// Plural noun used when talking to the user.
    pub fn plural_noun(self) -> &'static str {
        match self {
            PlaceCategory::Charger => "charging stations",
            PlaceCategory::HyundaiService => "Hyundai service centres",
            PlaceCategory::KiaService => "Kia service centres",
        }
    }

    pub fn capability(self) -> Capability {
        match self {
            PlaceCategory::Charger => Capability::Charger,
            PlaceCategory::HyundaiService => Capability::HyundaiService,
            PlaceCategory::KiaService => Capability::KiaService,
        }
    }
}

impl fmt::Display for PlaceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.capability().fmt(f)
    }
}

/// The four mutually exclusive things the assistant can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Manual,
    Charger,
    HyundaiService,
    KiaService,
}

impl Capability {
    /// Routing priority order. The first capability that matches wins.
    pub const PRIORITY: [Capability; 4] = [
        Capability::Manual,
        Capability::Charger,
        Capability::HyundaiService,
        Capability::KiaService,
    ];

    /// Stable identifier, as used in logs and serialized state.
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Manual => "manual",
            Capability::Charger => "charger",
            Capability::HyundaiService => "hyundai_service",
            Capability::KiaService => "kia_service",
        }
    }

    /// Human-readable name used in error replies.
    pub fn label(self) -> &'static str {
        match self {
            Capability::Manual => "vehicle manual lookup",
            Capability::Charger => "charging station lookup",
            Capability::HyundaiService => "Hyundai service centre lookup",
            Capability::KiaService => "Kia service centre lookup",
        }
    }

    /// The place category behind a places capability, if any.
    pub fn place_category(self) -> Option<PlaceCategory> {
        match self {
            Capability::Manual => None,
            Capability::Charger => Some(PlaceCategory::Charger),
            Capability::HyundaiService => Some(PlaceCategory::HyundaiService),
            Capability::KiaService => Some(PlaceCategory::KiaService),
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
