// Geographic primitives - coordinates, great-circle distance and line sampling
use geo::{Bearing, Distance, Haversine, Point};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Straight interpolation in lat/lng space, `t` in [0, 1]
    pub fn lerp(self, other: LatLng, t: f64) -> LatLng {
        LatLng::new(
            self.lat + (other.lat - self.lat) * t,
            self.lng + (other.lng - self.lng) * t,
        )
    }

    fn to_point(self) -> Point<f64> {
        Point::new(self.lng, self.lat)
    }
}

/// Great-circle distance in kilometres
pub fn haversine_km(a: LatLng, b: LatLng) -> f64 {
    Haversine.distance(a.to_point(), b.to_point()) / 1000.0
}

/// Initial bearing in degrees clockwise from north
pub fn bearing_deg(a: LatLng, b: LatLng) -> f64 {
    Haversine.bearing(a.to_point(), b.to_point())
}

/// Length and heading of a two-point line, shown while it is dragged
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LineReadout {
    pub distance_km: f64,
    pub bearing_deg: f64,
}

impl LineReadout {
    pub fn between(a: LatLng, b: LatLng) -> Self {
        Self {
            distance_km: haversine_km(a, b),
            bearing_deg: bearing_deg(a, b),
        }
    }
}

/// Sample coordinates along a line with the cumulative distance to each of them
#[derive(Debug, Clone, PartialEq)]
pub struct LineSamples {
    pub points: Vec<LatLng>,
    pub distances_km: Vec<f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct GeoSampler {
    steps: usize,
}

impl GeoSampler {
    /// `steps` intervals give `steps + 1` points, endpoints included
    pub fn new(steps: usize) -> Self {
        Self {
            steps: steps.max(1),
        }
    }

    pub fn sample(&self, a: LatLng, b: LatLng) -> LineSamples {
        let points: Vec<LatLng> = (0..=self.steps)
            .map(|i| a.lerp(b, i as f64 / self.steps as f64))
            .collect();
        let distances_km = cumulative_distances_km(&points);
        LineSamples {
            points,
            distances_km,
        }
    }
}

/// Running haversine total, starting at 0 for the first point
pub fn cumulative_distances_km(points: &[LatLng]) -> Vec<f64> {
    if points.is_empty() {
        return Vec::new();
    }

    let mut total = 0.0;
    std::iter::once(0.0)
        .chain(points.windows(2).map(|pair| {
            total += haversine_km(pair[0], pair[1]);
            total
        }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampler_yields_steps_plus_one_points() {
        let sampler = GeoSampler::new(20);
        let samples = sampler.sample(LatLng::new(46.0, 7.0), LatLng::new(46.5, 7.8));

        assert_eq!(samples.points.len(), 21);
        assert_eq!(samples.distances_km.len(), 21);
        assert_eq!(samples.points[0], LatLng::new(46.0, 7.0));
        assert_eq!(samples.points[20], LatLng::new(46.5, 7.8));
        assert_eq!(samples.distances_km[0], 0.0);
        assert!(samples.distances_km.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_degenerate_line_has_zero_distances() {
        let p = LatLng::new(10.0, 10.0);
        let samples = GeoSampler::new(20).sample(p, p);
        assert_eq!(samples.points.len(), 21);
        assert!(samples.distances_km.iter().all(|d| *d == 0.0));
    }

    #[test]
    fn test_one_degree_at_equator() {
        let d = haversine_km(LatLng::new(0.0, 0.0), LatLng::new(0.0, 1.0));
        assert!((d - 111.19).abs() < 0.01, "got {d}");

        let total = GeoSampler::new(20)
            .sample(LatLng::new(0.0, 0.0), LatLng::new(1.0, 0.0))
            .distances_km[20];
        assert!((total - 111.19).abs() < 0.01, "got {total}");
    }

    #[test]
    fn test_readout_bearing() {
        let east = LineReadout::between(LatLng::new(0.0, 0.0), LatLng::new(0.0, 1.0));
        assert!((east.bearing_deg - 90.0).abs() < 1e-6);

        let north = LineReadout::between(LatLng::new(0.0, 0.0), LatLng::new(1.0, 0.0));
        assert!(north.bearing_deg.abs() < 1e-6 || (north.bearing_deg - 360.0).abs() < 1e-6);
    }

    #[test]
    fn test_cumulative_distances_empty() {
        assert!(cumulative_distances_km(&[]).is_empty());
        assert_eq!(cumulative_distances_km(&[LatLng::new(1.0, 1.0)]), vec![0.0]);
    }
}
