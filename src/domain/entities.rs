// Map entities - draggable points and the two-endpoint lines they can terminate
use crate::domain::geodesy::LatLng;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(pub u64);

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "point#{}", self.0)
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointEntity {
    pub id: PointId,
    pub position: LatLng,
    pub draggable: bool,
}

impl PointEntity {
    pub fn new(id: PointId, position: LatLng) -> Self {
        Self {
            id,
            position,
            draggable: true,
        }
    }
}

/// The most recently created or selected line is drawn as selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineState {
    Selected,
    Unselected,
}

impl LineState {
    pub fn color(self) -> &'static str {
        match self {
            LineState::Selected => "red",
            LineState::Unselected => "blue",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineEntity {
    pub id: LineId,
    pub endpoints: [LatLng; 2],
    /// Points the endpoints are bound to; `None` for a free-standing line
    pub owners: Option<[PointId; 2]>,
    pub state: LineState,
}

impl LineEntity {
    pub fn new(id: LineId, endpoints: [LatLng; 2], owners: Option<[PointId; 2]>) -> Self {
        Self {
            id,
            endpoints,
            owners,
            state: LineState::Selected,
        }
    }
}
