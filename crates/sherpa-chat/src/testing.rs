//! Recording fakes for the manual and places collaborators.

use std::sync::Mutex;

use async_trait::async_trait;
use sherpa_core::types::{Coordinates, PlaceCategory, PointOfInterest};
use sherpa_manual::{ManualAnswerer, ManualError};
use sherpa_places::{PlacesError, PlacesLookup};

#[derive(Default)]
pub struct FakeManual {
    answer: String,
    fail: bool,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeManual {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ManualAnswerer for FakeManual {
    async fn answer(&self, model: &str, problem: &str) -> Result<String, ManualError> {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), problem.to_string()));
        if self.fail {
            return Err(ManualError::Api {
                status: 503,
                message: "backend unavailable".to_string(),
            });
        }
        Ok(self.answer.clone())
    }
}

#[derive(Default)]
pub struct FakePlaces {
    points: Vec<PointOfInterest>,
    fail: bool,
    calls: Mutex<Vec<(String, PlaceCategory)>>,
}

impl FakePlaces {
    pub fn returning(points: Vec<PointOfInterest>) -> Self {
        Self {
            points,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, PlaceCategory)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlacesLookup for FakePlaces {
    async fn nearest(
        &self,
        address: &str,
        category: PlaceCategory,
    ) -> Result<Vec<PointOfInterest>, PlacesError> {
        self.calls
            .lock()
            .unwrap()
            .push((address.to_string(), category));
        if self.fail {
            return Err(PlacesError::Request("connection refused".to_string()));
        }
        Ok(self.points.clone())
    }
}

pub fn poi(name: &str, address: &str) -> PointOfInterest {
    PointOfInterest {
        address: address.to_string(),
        coordinates: Coordinates::new(1.0, 2.0),
        name: name.to_string(),
    }
}
