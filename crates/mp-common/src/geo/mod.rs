mod cache;
mod gazetteer;
mod haversine;

pub use cache::{CachedDistance, DEFAULT_CACHE_CAPACITY};
pub use gazetteer::{Gazetteer, normalize_city};
pub use haversine::{Coordinates, EARTH_RADIUS_KM, haversine_km};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DistanceError {
    #[error("unknown city: {0:?}")]
    UnknownCity(String),
    #[error("distance lookup failed: {0}")]
    Lookup(String),
}

/// Road-agnostic distance between two free-text city names.
pub trait DistanceCalculator: Send + Sync {
    fn distance_km(&self, city_a: &str, city_b: &str) -> Result<f64, DistanceError>;
}

/// Gazetteer lookup followed by great-circle distance.
#[derive(Debug, Clone, Default)]
pub struct GazetteerDistance {
    gazetteer: Gazetteer,
}

impl GazetteerDistance {
    pub fn new(gazetteer: Gazetteer) -> Self {
        Self { gazetteer }
    }

    pub fn gazetteer(&self) -> &Gazetteer {
        &self.gazetteer
    }
}

impl DistanceCalculator for GazetteerDistance {
    fn distance_km(&self, city_a: &str, city_b: &str) -> Result<f64, DistanceError> {
        let key_a = normalize_city(city_a);
        let key_b = normalize_city(city_b);

        if !key_a.is_empty() && key_a == key_b {
            return Ok(0.0);
        }

        let a = self
            .gazetteer
            .lookup(city_a)
            .ok_or_else(|| DistanceError::UnknownCity(city_a.to_string()))?;
        let b = self
            .gazetteer
            .lookup(city_b)
            .ok_or_else(|| DistanceError::UnknownCity(city_b.to_string()))?;

        Ok(haversine_km(a, b))
    }
}
