// Live dots overlay - evenly spaced markers along the line being dragged
use crate::domain::geodesy::LatLng;
use serde::Serialize;

pub const DEFAULT_DOT_COUNT: usize = 12;
pub const DOT_COLOR: &str = "#ff9800";
pub const DOT_RADIUS_PX: f64 = 3.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlaySnapshot {
    pub color: &'static str,
    pub radius_px: f64,
    pub dots: Vec<LatLng>,
}

#[derive(Debug, Clone)]
pub struct LiveDotsOverlay {
    count: usize,
    dots: Vec<LatLng>,
}

impl LiveDotsOverlay {
    /// `count` intervals; a primed overlay holds `count - 1` interior dots
    pub fn new(count: usize) -> Self {
        Self {
            count: count.max(1),
            dots: Vec::new(),
        }
    }

    pub fn prime(&mut self, a: LatLng, b: LatLng) {
        self.dots = (1..self.count)
            .map(|i| a.lerp(b, i as f64 / self.count as f64))
            .collect();
    }

    /// Repositions the existing dots; does nothing until primed
    pub fn update(&mut self, a: LatLng, b: LatLng) {
        let n = self.dots.len() + 1;
        for (i, dot) in self.dots.iter_mut().enumerate() {
            *dot = a.lerp(b, (i + 1) as f64 / n as f64);
        }
    }

    pub fn clear(&mut self) {
        self.dots.clear();
    }

    pub fn dots(&self) -> &[LatLng] {
        &self.dots
    }

    pub fn snapshot(&self) -> OverlaySnapshot {
        OverlaySnapshot {
            color: DOT_COLOR,
            radius_px: DOT_RADIUS_PX,
            dots: self.dots.clone(),
        }
    }
}

impl Default for LiveDotsOverlay {
    fn default() -> Self {
        Self::new(DEFAULT_DOT_COUNT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prime_places_interior_dots() {
        let mut overlay = LiveDotsOverlay::default();
        overlay.prime(LatLng::new(0.0, 0.0), LatLng::new(0.0, 12.0));

        assert_eq!(overlay.dots().len(), 11);
        for (i, dot) in overlay.dots().iter().enumerate() {
            assert_eq!(dot.lat, 0.0);
            assert!((dot.lng - (i + 1) as f64).abs() < 1e-9, "dot {i} at {}", dot.lng);
        }
    }

    #[test]
    fn test_update_follows_endpoints() {
        let mut overlay = LiveDotsOverlay::new(4);
        overlay.prime(LatLng::new(0.0, 0.0), LatLng::new(0.0, 4.0));
        overlay.update(LatLng::new(0.0, 0.0), LatLng::new(8.0, 0.0));

        assert_eq!(
            overlay.dots(),
            &[
                LatLng::new(2.0, 0.0),
                LatLng::new(4.0, 0.0),
                LatLng::new(6.0, 0.0)
            ]
        );
    }

    #[test]
    fn test_update_before_prime_is_noop() {
        let mut overlay = LiveDotsOverlay::default();
        overlay.update(LatLng::new(0.0, 0.0), LatLng::new(1.0, 1.0));
        assert!(overlay.dots().is_empty());

        overlay.prime(LatLng::new(0.0, 0.0), LatLng::new(1.0, 1.0));
        overlay.clear();
        assert!(overlay.snapshot().dots.is_empty());
    }
}
