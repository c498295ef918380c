// Elevation profile domain model - sampled series and its summary statistics
use serde::Serialize;

pub const FETCH_FAILED_STATUS: &str = "Elevation fetch failed";

/// Distances and elevations are index-aligned; an empty elevation list means "no data"
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ElevationProfile {
    pub distances_km: Vec<f64>,
    pub elevations_m: Vec<Option<f64>>,
    pub status: String,
}

impl ElevationProfile {
    pub fn from_elevations(
        provider: &str,
        distances_km: Vec<f64>,
        elevations_m: Vec<Option<f64>>,
    ) -> Self {
        match ProfileStats::from_samples(&elevations_m) {
            Some(stats) => Self {
                distances_km,
                elevations_m,
                status: stats.summary(provider),
            },
            None => Self {
                distances_km,
                elevations_m: Vec::new(),
                status: format!("{}: No elevation data", provider),
            },
        }
    }

    pub fn failed(distances_km: Vec<f64>) -> Self {
        Self {
            distances_km,
            elevations_m: Vec::new(),
            status: FETCH_FAILED_STATUS.to_string(),
        }
    }

    pub fn total_distance_km(&self) -> f64 {
        self.distances_km.last().copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileStats {
    pub min_m: f64,
    pub max_m: f64,
    pub gain_m: f64,
    pub loss_m: f64,
}

impl ProfileStats {
    /// Gain/loss only count deltas between consecutive present samples
    pub fn from_samples(elevations: &[Option<f64>]) -> Option<Self> {
        let mut valid = elevations.iter().flatten().copied().filter(|z| z.is_finite());
        let first = valid.next()?;

        let mut stats = ProfileStats {
            min_m: first,
            max_m: first,
            gain_m: 0.0,
            loss_m: 0.0,
        };
        let mut previous = first;
        for z in valid {
            stats.min_m = stats.min_m.min(z);
            stats.max_m = stats.max_m.max(z);
            let delta = z - previous;
            if delta > 0.0 {
                stats.gain_m += delta;
            } else {
                stats.loss_m -= delta;
            }
            previous = z;
        }
        Some(stats)
    }

    pub fn summary(&self, provider: &str) -> String {
        format!(
            "{}: Min {:.0} m  Max {:.0} m  +{:.0}/-{:.0} m",
            provider, self.min_m, self.max_m, self.gain_m, self.loss_m
        )
    }
}
