// Drag session - lifecycle of the single point being dragged
use crate::domain::entities::{LineId, PointId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragPhase {
    #[default]
    Idle,
    Dragging {
        point: PointId,
    },
    /// Drag released; overlay and panel are being torn down
    Completing {
        point: PointId,
    },
}

#[derive(Debug, Default)]
pub struct DragSession {
    phase: DragPhase,
    /// Line resolved at drag start; the only one whose metrics this drag drives
    line: Option<LineId>,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    /// Starts dragging `point`; returns the point whose drag was interrupted, if any
    pub fn begin(&mut self, point: PointId) -> Option<PointId> {
        let interrupted = match self.phase {
            DragPhase::Dragging { point: previous } if previous != point => Some(previous),
            _ => None,
        };
        self.phase = DragPhase::Dragging { point };
        self.line = None;
        interrupted
    }

    pub fn bind_line(&mut self, line: LineId) {
        if matches!(self.phase, DragPhase::Dragging { .. }) {
            self.line = Some(line);
        }
    }

    /// Stops the drag from driving metrics; the point keeps moving
    pub fn unbind_line(&mut self) {
        self.line = None;
    }

    pub fn active_line(&self) -> Option<LineId> {
        self.line
    }

    pub fn is_dragging(&self, point: PointId) -> bool {
        self.phase == DragPhase::Dragging { point }
    }

    pub fn dragging_point(&self) -> Option<PointId> {
        match self.phase {
            DragPhase::Dragging { point } => Some(point),
            _ => None,
        }
    }

    /// Moves a drag of `point` into teardown; false when `point` was not being dragged
    pub fn complete(&mut self, point: PointId) -> bool {
        if !self.is_dragging(point) {
            return false;
        }
        self.phase = DragPhase::Completing { point };
        true
    }

    pub fn finish(&mut self) {
        self.phase = DragPhase::Idle;
        self.line = None;
    }
}
