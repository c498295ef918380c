// Marker/line graph - keeps linked line geometry in step with the points that own it
use crate::domain::entities::{LineEntity, LineId, LineState, PointEntity, PointId};
use crate::domain::geodesy::LatLng;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("unknown {0}")]
    UnknownPoint(PointId),
    #[error("unknown {0}")]
    UnknownLine(LineId),
    #[error("{0} cannot be linked to itself")]
    SelfLink(PointId),
    #[error("{0} is not bound to two live points")]
    LinkageViolation(LineId),
}

/// Bidirectional point <-> line index
#[derive(Debug, Default)]
pub struct LinkRegistry {
    lines_by_point: HashMap<PointId, BTreeSet<LineId>>,
    points_by_line: HashMap<LineId, [PointId; 2]>,
}

impl LinkRegistry {
    pub fn link(&mut self, line: LineId, owners: [PointId; 2]) {
        for point in owners {
            self.lines_by_point.entry(point).or_default().insert(line);
        }
        self.points_by_line.insert(line, owners);
    }

    /// Drops the line from both owners' sets; returns the former owners
    pub fn unlink_line(&mut self, line: LineId) -> Option<[PointId; 2]> {
        let owners = self.points_by_line.remove(&line)?;
        for point in owners {
            if let Some(lines) = self.lines_by_point.get_mut(&point) {
                lines.remove(&line);
                if lines.is_empty() {
                    self.lines_by_point.remove(&point);
                }
            }
        }
        Some(owners)
    }

    /// Unlinks every line the point terminates; returns those lines
    pub fn unlink_point(&mut self, point: PointId) -> Vec<LineId> {
        let lines: Vec<LineId> = self.lines_for(point).collect();
        for line in &lines {
            self.unlink_line(*line);
        }
        lines
    }

    pub fn lines_for(&self, point: PointId) -> impl Iterator<Item = LineId> + '_ {
        self.lines_by_point
            .get(&point)
            .into_iter()
            .flat_map(|lines| lines.iter().copied())
    }

    pub fn owners(&self, line: LineId) -> Option<[PointId; 2]> {
        self.points_by_line.get(&line).copied()
    }
}

#[derive(Debug, Default)]
pub struct MarkerLineGraph {
    next_id: u64,
    next_rank: u64,
    points: HashMap<PointId, PointEntity>,
    lines: HashMap<LineId, LineEntity>,
    links: LinkRegistry,
    /// Recency of creation/selection per line; the highest rank is preferred
    ranks: HashMap<LineId, u64>,
}

impl MarkerLineGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn place_point(&mut self, at: LatLng) -> PointId {
        let id = PointId(self.allocate_id());
        self.points.insert(id, PointEntity::new(id, at));
        id
    }

    pub fn point(&self, id: PointId) -> Option<&PointEntity> {
        self.points.get(&id)
    }

    pub fn line(&self, id: LineId) -> Option<&LineEntity> {
        self.lines.get(&id)
    }

    pub fn points(&self) -> impl Iterator<Item = &PointEntity> {
        self.points.values()
    }

    pub fn lines(&self) -> impl Iterator<Item = &LineEntity> {
        self.lines.values()
    }

    pub fn lines_for(&self, point: PointId) -> impl Iterator<Item = LineId> + '_ {
        self.links.lines_for(point)
    }

    /// Re-enables dragging on a point that lost it; returns true when a fix was needed
    pub fn ensure_draggable(&mut self, id: PointId) -> Result<bool, GraphError> {
        let point = self.points.get_mut(&id).ok_or(GraphError::UnknownPoint(id))?;
        let corrected = !point.draggable;
        point.draggable = true;
        Ok(corrected)
    }

    /// Creates a line between the points' current positions and makes it the newest
    pub fn link(&mut self, a: PointId, b: PointId) -> Result<LineId, GraphError> {
        if a == b {
            return Err(GraphError::SelfLink(a));
        }
        let start = self.points.get(&a).ok_or(GraphError::UnknownPoint(a))?.position;
        let end = self.points.get(&b).ok_or(GraphError::UnknownPoint(b))?.position;

        let id = LineId(self.allocate_id());
        self.lines
            .insert(id, LineEntity::new(id, [start, end], Some([a, b])));
        self.links.link(id, [a, b]);
        self.bump_rank(id);
        Ok(id)
    }

    /// Two-point line with no owning points
    pub fn add_free_line(&mut self, a: LatLng, b: LatLng) -> LineId {
        let id = LineId(self.allocate_id());
        self.lines.insert(id, LineEntity::new(id, [a, b], None));
        self.bump_rank(id);
        id
    }

    /// Removes the line from its points' linkage sets; both points and the line survive
    pub fn unlink(&mut self, line: LineId) -> Result<(), GraphError> {
        let entity = self.lines.get_mut(&line).ok_or(GraphError::UnknownLine(line))?;
        entity.owners = None;
        self.links.unlink_line(line);
        Ok(())
    }

    pub fn remove_line(&mut self, line: LineId) -> Result<LineEntity, GraphError> {
        let entity = self.lines.remove(&line).ok_or(GraphError::UnknownLine(line))?;
        self.links.unlink_line(line);
        self.ranks.remove(&line);
        self.restyle();
        Ok(entity)
    }

    /// Deletes the point; lines it terminated stay on the map as free lines
    pub fn remove_point(&mut self, id: PointId) -> Result<Vec<LineId>, GraphError> {
        self.points.remove(&id).ok_or(GraphError::UnknownPoint(id))?;
        let orphaned = self.links.unlink_point(id);
        for line in &orphaned {
            if let Some(entity) = self.lines.get_mut(line) {
                entity.owners = None;
            }
        }
        Ok(orphaned)
    }

    /// Moves a point and synchronously drags every linked line with it
    pub fn move_point(&mut self, id: PointId, at: LatLng) -> Result<Vec<LineId>, GraphError> {
        let point = self.points.get_mut(&id).ok_or(GraphError::UnknownPoint(id))?;
        point.position = at;
        self.on_point_moved(id)
    }

    /// Recomputes every line linked to `point` from its owners' current positions
    pub fn on_point_moved(&mut self, point: PointId) -> Result<Vec<LineId>, GraphError> {
        if !self.points.contains_key(&point) {
            return Err(GraphError::UnknownPoint(point));
        }
        let lines: Vec<LineId> = self.links.lines_for(point).collect();
        for line in &lines {
            self.refresh_line(*line)?;
        }
        Ok(lines)
    }

    pub fn refresh_line(&mut self, line: LineId) -> Result<(), GraphError> {
        if !self.lines.contains_key(&line) {
            return Err(GraphError::UnknownLine(line));
        }
        let [a, b] = self
            .links
            .owners(line)
            .ok_or(GraphError::LinkageViolation(line))?;
        let (Some(start), Some(end)) = (self.points.get(&a), self.points.get(&b)) else {
            return Err(GraphError::LinkageViolation(line));
        };
        let endpoints = [start.position, end.position];

        if let Some(entity) = self.lines.get_mut(&line) {
            entity.endpoints = endpoints;
        }
        Ok(())
    }

    /// The line whose metrics follow a drag of `point`: the newest of its lines
    pub fn pick_active_line(&self, point: PointId) -> Option<LineId> {
        let mut lines = self.links.lines_for(point);
        let first = lines.next()?;
        let rank = |line: &LineId| self.ranks.get(line).copied().unwrap_or(0);
        Some(lines.fold(first, |best, line| {
            if rank(&line) > rank(&best) { line } else { best }
        }))
    }

    /// Explicit selection makes the line the newest one
    pub fn select_line(&mut self, line: LineId) -> Result<(), GraphError> {
        if !self.lines.contains_key(&line) {
            return Err(GraphError::UnknownLine(line));
        }
        self.bump_rank(line);
        Ok(())
    }

    fn bump_rank(&mut self, line: LineId) {
        self.next_rank += 1;
        self.ranks.insert(line, self.next_rank);
        self.restyle();
    }

    fn restyle(&mut self) {
        let newest = self
            .ranks
            .iter()
            .max_by_key(|(_, rank)| **rank)
            .map(|(line, _)| *line);
        for line in self.lines.values_mut() {
            line.state = if Some(line.id) == newest {
                LineState::Selected
            } else {
                LineState::Unselected
            };
        }
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}
