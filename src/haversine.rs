//! Haversine travel-time provider for offline planning.
//!
//! Uses great-circle distance to estimate travel time.
//! Less accurate than a road-network service (ignores roads) but needs no
//! network access. Callers choose it explicitly; the planner never falls
//! back to it on its own.

use crate::error::ProviderError;
use crate::traits::{Coordinate, TravelTimeProvider};

/// Average driving speed assumption for time estimation.
const DEFAULT_SPEED_KMH: f64 = 40.0;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone)]
pub struct HaversineProvider {
    /// Assumed average driving speed in km/h.
    pub speed_kmh: f64,
}

impl Default for HaversineProvider {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl HaversineProvider {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }

    /// Calculate haversine distance between two points in kilometers.
    fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
        let (lat1, lng1) = from;
        let (lat2, lng2) = to;

        let lat1_rad = lat1.to_radians();
        let lat2_rad = lat2.to_radians();
        let delta_lat = (lat2 - lat1).to_radians();
        let delta_lng = (lng2 - lng1).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_KM * c
    }

    /// Convert distance in km to whole travel minutes, rounded.
    fn km_to_minutes(&self, km: f64) -> i64 {
        let hours = km / self.speed_kmh;
        (hours * 60.0).round() as i64
    }
}

impl TravelTimeProvider for HaversineProvider {
    fn durations(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
    ) -> Result<Vec<Vec<i64>>, ProviderError> {
        if !(self.speed_kmh.is_finite() && self.speed_kmh > 0.0) {
            return Err(ProviderError::Malformed(format!("speed {} km/h", self.speed_kmh)));
        }
        Ok(origins
            .iter()
            .map(|from| {
                destinations
                    .iter()
                    .map(|to| self.km_to_minutes(Self::haversine_km(*from, *to)))
                    .collect()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_same_point() {
        let dist = HaversineProvider::haversine_km((36.1, -115.1), (36.1, -115.1));
        assert!(dist < 0.001, "Same point should have ~0 distance");
    }

    #[test]
    fn test_haversine_known_distance() {
        // Las Vegas (36.17, -115.14) to Los Angeles (34.05, -118.24)
        // Actual distance ~370 km
        let dist = HaversineProvider::haversine_km((36.17, -115.14), (34.05, -118.24));
        assert!(dist > 350.0 && dist < 400.0, "LV to LA should be ~370km, got {}", dist);
    }

    #[test]
    fn test_matrix_diagonal_is_zero() {
        let provider = HaversineProvider::default();
        let locations = vec![(36.1, -115.1), (36.2, -115.2), (36.3, -115.3)];
        let matrix = provider.durations(&locations, &locations).unwrap();

        for i in 0..locations.len() {
            assert_eq!(matrix[i][i], 0, "Diagonal should be zero");
        }
    }

    #[test]
    fn test_rectangular_block() {
        let provider = HaversineProvider::default();
        let matrix = provider
            .durations(&[(36.1, -115.1)], &[(36.2, -115.2), (36.3, -115.3)])
            .unwrap();
        assert_eq!(matrix.len(), 1);
        assert_eq!(matrix[0].len(), 2);
        assert!(matrix[0][0] < matrix[0][1]);
    }

    #[test]
    fn test_reasonable_travel_time() {
        let provider = HaversineProvider::new(40.0); // 40 km/h
        // 10 km at 40 km/h = 0.25 hours = 15 minutes
        assert_eq!(provider.km_to_minutes(10.0), 15);
    }

    #[test]
    fn test_invalid_speed() {
        let provider = HaversineProvider::new(0.0);
        assert!(provider.durations(&[(0.0, 0.0)], &[(0.0, 0.0)]).is_err());
    }
}
