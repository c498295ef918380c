// Drawn shapes - one tagged union for everything a user can put on the map
use crate::domain::entities::{LineEntity, LineId, PointEntity, PointId};
use crate::domain::geodesy::LatLng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const DEFAULT_SHAPE_COLOR: &str = "#3388ff";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(pub u64);

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shape#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Marker,
    Polyline,
    Polygon,
    Rectangle,
    Circle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    Marker {
        id: PointId,
        position: LatLng,
        lines: Vec<LineId>,
    },
    Polyline {
        id: LineId,
        latlngs: [LatLng; 2],
        points: Option<[PointId; 2]>,
        color: String,
    },
    Polygon {
        id: ShapeId,
        latlngs: Vec<LatLng>,
        color: String,
    },
    Rectangle {
        id: ShapeId,
        south_west: LatLng,
        north_east: LatLng,
        color: String,
    },
    Circle {
        id: ShapeId,
        center: LatLng,
        radius_m: f64,
        color: String,
    },
}

impl Shape {
    pub fn marker(point: &PointEntity, lines: Vec<LineId>) -> Self {
        Shape::Marker {
            id: point.id,
            position: point.position,
            lines,
        }
    }

    pub fn polyline(line: &LineEntity) -> Self {
        Shape::Polyline {
            id: line.id,
            latlngs: line.endpoints,
            points: line.owners,
            color: line.state.color().to_string(),
        }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Marker { .. } => ShapeKind::Marker,
            Shape::Polyline { .. } => ShapeKind::Polyline,
            Shape::Polygon { .. } => ShapeKind::Polygon,
            Shape::Rectangle { .. } => ShapeKind::Rectangle,
            Shape::Circle { .. } => ShapeKind::Circle,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ShapeError {
    #[error("a polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),
    #[error("circle radius must be positive, got {0}")]
    InvalidRadius(f64),
}

/// Geometry of the shapes that carry no line metrics
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AreaGeometry {
    Polygon {
        latlngs: Vec<LatLng>,
    },
    Rectangle {
        south_west: LatLng,
        north_east: LatLng,
    },
    Circle {
        center: LatLng,
        radius_m: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewAreaShape {
    #[serde(flatten)]
    pub geometry: AreaGeometry,
    #[serde(default)]
    pub color: Option<String>,
}

impl NewAreaShape {
    pub fn into_shape(self, id: ShapeId) -> Result<Shape, ShapeError> {
        let color = self
            .color
            .unwrap_or_else(|| DEFAULT_SHAPE_COLOR.to_string());
        match self.geometry {
            AreaGeometry::Polygon { latlngs } if latlngs.len() < 3 => {
                Err(ShapeError::TooFewVertices(latlngs.len()))
            }
            AreaGeometry::Polygon { latlngs } => Ok(Shape::Polygon { id, latlngs, color }),
            AreaGeometry::Rectangle {
                south_west,
                north_east,
            } => Ok(Shape::Rectangle {
                id,
                south_west,
                north_east,
                color,
            }),
            AreaGeometry::Circle { radius_m, .. } if !(radius_m > 0.0) => {
                Err(ShapeError::InvalidRadius(radius_m))
            }
            AreaGeometry::Circle { center, radius_m } => Ok(Shape::Circle {
                id,
                center,
                radius_m,
                color,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_shape_from_json() {
        let body = r#"{"kind":"circle","center":{"lat":1.0,"lng":2.0},"radius_m":250.0}"#;
        let new_shape: NewAreaShape = serde_json::from_str(body).unwrap();
        let shape = new_shape.into_shape(ShapeId(7)).unwrap();

        assert_eq!(shape.kind(), ShapeKind::Circle);
        let json = serde_json::to_value(&shape).unwrap();
        assert_eq!(json["kind"], "circle");
        assert_eq!(json["id"], 7);
        assert_eq!(json["color"], DEFAULT_SHAPE_COLOR);
    }

    #[test]
    fn test_invalid_area_shapes() {
        let polygon = NewAreaShape {
            geometry: AreaGeometry::Polygon {
                latlngs: vec![LatLng::new(0.0, 0.0), LatLng::new(1.0, 1.0)],
            },
            color: None,
        };
        assert_eq!(
            polygon.into_shape(ShapeId(1)),
            Err(ShapeError::TooFewVertices(2))
        );

        let circle = NewAreaShape {
            geometry: AreaGeometry::Circle {
                center: LatLng::new(0.0, 0.0),
                radius_m: 0.0,
            },
            color: Some("#ff0000".to_string()),
        };
        assert_eq!(
            circle.into_shape(ShapeId(2)),
            Err(ShapeError::InvalidRadius(0.0))
        );
    }

    #[test]
    fn test_polyline_view_carries_state_color() {
        let line = LineEntity::new(
            LineId(3),
            [LatLng::new(0.0, 0.0), LatLng::new(1.0, 1.0)],
            Some([PointId(1), PointId(2)]),
        );
        let shape = Shape::polyline(&line);
        assert_eq!(shape.kind(), ShapeKind::Polyline);
        match shape {
            Shape::Polyline { color, points, .. } => {
                assert_eq!(color, "red");
                assert_eq!(points, Some([PointId(1), PointId(2)]));
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }
}
