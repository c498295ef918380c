// Map dispatcher - single task owning the graph, drag session, panel, overlay and profile service
use crate::application::drag_session::DragSession;
use crate::application::elevation_provider::ElevationProvider;
use crate::application::live_dots::{LiveDotsOverlay, OverlaySnapshot, DEFAULT_DOT_COUNT};
use crate::application::metrics_panel::{
    MetricsPanel, PanelFrame, PanelSnapshot, DEFAULT_HEIGHT, DEFAULT_WIDTH,
};
use crate::application::profile_service::{ElevationProfileService, ProfileEvent};
use crate::application::throttle::Throttle;
use crate::domain::entities::{LineId, PointId};
use crate::domain::geodesy::{GeoSampler, LatLng, LineReadout};
use crate::domain::line_graph::{GraphError, MarkerLineGraph};
use crate::domain::shape::{NewAreaShape, Shape, ShapeError, ShapeId};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

const COMMAND_BUFFER: usize = 100;
const EVENT_BUFFER: usize = 64;

#[derive(Debug, Error)]
pub enum MapError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error("unknown {0}")]
    UnknownShape(ShapeId),
    #[error("map dispatcher is not running")]
    Closed,
}

type Reply<T> = oneshot::Sender<Result<T, MapError>>;

pub enum MapCommand {
    PlacePoint { at: LatLng, reply: Reply<Shape> },
    RemovePoint { id: PointId, reply: Reply<Vec<LineId>> },
    DragStart { id: PointId, reply: Reply<Option<LineId>> },
    DragMove { id: PointId, at: LatLng, reply: Reply<Option<LineReadout>> },
    DragEnd { id: PointId, reply: Reply<bool> },
    Link { a: PointId, b: PointId, reply: Reply<Shape> },
    AddFreeLine { a: LatLng, b: LatLng, reply: Reply<Shape> },
    Inspect { line: LineId, reply: Reply<()> },
    Unlink { line: LineId, reply: Reply<()> },
    RemoveLine { line: LineId, reply: Reply<()> },
    AddShape { shape: NewAreaShape, reply: Reply<Shape> },
    RemoveShape { id: ShapeId, reply: Reply<Shape> },
    Shapes { reply: Reply<Vec<Shape>> },
    Overlay { reply: Reply<OverlaySnapshot> },
    Panel { reply: Reply<PanelSnapshot> },
    PanelFrame { reply: Reply<PanelFrame> },
    HidePanel { reply: Reply<()> },
}

/// Cloneable front door to the dispatcher task
#[derive(Clone)]
pub struct MapHandle {
    tx: mpsc::Sender<MapCommand>,
}

impl MapHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> MapCommand,
    ) -> Result<T, MapError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(build(reply)).await.map_err(|_| MapError::Closed)?;
        rx.await.map_err(|_| MapError::Closed)?
    }

    pub async fn place_point(&self, at: LatLng) -> Result<Shape, MapError> {
        self.request(|reply| MapCommand::PlacePoint { at, reply }).await
    }

    pub async fn remove_point(&self, id: PointId) -> Result<Vec<LineId>, MapError> {
        self.request(|reply| MapCommand::RemovePoint { id, reply }).await
    }

    pub async fn drag_start(&self, id: PointId) -> Result<Option<LineId>, MapError> {
        self.request(|reply| MapCommand::DragStart { id, reply }).await
    }

    pub async fn drag_move(&self, id: PointId, at: LatLng) -> Result<Option<LineReadout>, MapError> {
        self.request(|reply| MapCommand::DragMove { id, at, reply }).await
    }

    pub async fn drag_end(&self, id: PointId) -> Result<bool, MapError> {
        self.request(|reply| MapCommand::DragEnd { id, reply }).await
    }

    pub async fn link(&self, a: PointId, b: PointId) -> Result<Shape, MapError> {
        self.request(|reply| MapCommand::Link { a, b, reply }).await
    }

    pub async fn add_free_line(&self, a: LatLng, b: LatLng) -> Result<Shape, MapError> {
        self.request(|reply| MapCommand::AddFreeLine { a, b, reply }).await
    }

    pub async fn inspect(&self, line: LineId) -> Result<(), MapError> {
        self.request(|reply| MapCommand::Inspect { line, reply }).await
    }

    pub async fn unlink(&self, line: LineId) -> Result<(), MapError> {
        self.request(|reply| MapCommand::Unlink { line, reply }).await
    }

    pub async fn remove_line(&self, line: LineId) -> Result<(), MapError> {
        self.request(|reply| MapCommand::RemoveLine { line, reply }).await
    }

    pub async fn add_shape(&self, shape: NewAreaShape) -> Result<Shape, MapError> {
        self.request(|reply| MapCommand::AddShape { shape, reply }).await
    }

    pub async fn remove_shape(&self, id: ShapeId) -> Result<Shape, MapError> {
        self.request(|reply| MapCommand::RemoveShape { id, reply }).await
    }

    pub async fn shapes(&self) -> Result<Vec<Shape>, MapError> {
        self.request(|reply| MapCommand::Shapes { reply }).await
    }

    pub async fn overlay(&self) -> Result<OverlaySnapshot, MapError> {
        self.request(|reply| MapCommand::Overlay { reply }).await
    }

    pub async fn panel(&self) -> Result<PanelSnapshot, MapError> {
        self.request(|reply| MapCommand::Panel { reply }).await
    }

    pub async fn panel_frame(&self) -> Result<PanelFrame, MapError> {
        self.request(|reply| MapCommand::PanelFrame { reply }).await
    }

    pub async fn hide_panel(&self) -> Result<(), MapError> {
        self.request(|reply| MapCommand::HidePanel { reply }).await
    }
}

#[derive(Debug, Clone)]
pub struct DispatcherOptions {
    pub throttle: Duration,
    pub sample_steps: usize,
    pub dot_count: usize,
    pub panel_width: u32,
    pub panel_height: u32,
}

impl Default for DispatcherOptions {
    fn default() -> Self {
        Self {
            throttle: Duration::from_millis(300),
            sample_steps: 20,
            dot_count: DEFAULT_DOT_COUNT,
            panel_width: DEFAULT_WIDTH,
            panel_height: DEFAULT_HEIGHT,
        }
    }
}

pub struct MapDispatcher {
    graph: MarkerLineGraph,
    drag: DragSession,
    panel: MetricsPanel,
    overlay: LiveDotsOverlay,
    profiles: ElevationProfileService,
    areas: BTreeMap<ShapeId, Shape>,
    next_shape: u64,
    commands: mpsc::Receiver<MapCommand>,
    events: mpsc::Receiver<ProfileEvent>,
}

impl MapDispatcher {
    pub fn new(provider: ElevationProvider, options: DispatcherOptions) -> (Self, MapHandle) {
        let (command_tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let (event_tx, events) = mpsc::channel(EVENT_BUFFER);

        let profiles = ElevationProfileService::new(
            Arc::new(provider),
            GeoSampler::new(options.sample_steps),
            Throttle::new(options.throttle),
            event_tx,
        );
        let dispatcher = Self {
            graph: MarkerLineGraph::new(),
            drag: DragSession::new(),
            panel: MetricsPanel::new(options.panel_width, options.panel_height),
            overlay: LiveDotsOverlay::new(options.dot_count),
            profiles,
            areas: BTreeMap::new(),
            next_shape: 0,
            commands,
            events,
        };
        (dispatcher, MapHandle { tx: command_tx })
    }

    /// Runs until every `MapHandle` is dropped
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(event) = self.events.recv() => self.handle_event(event),
            }
        }
        tracing::debug!("map dispatcher stopped");
    }

    fn handle_command(&mut self, command: MapCommand) {
        // A dropped reply means the caller went away; the event still applied
        match command {
            MapCommand::PlacePoint { at, reply } => {
                let _ = reply.send(Ok(self.place_point(at)));
            }
            MapCommand::RemovePoint { id, reply } => {
                let _ = reply.send(self.remove_point(id));
            }
            MapCommand::DragStart { id, reply } => {
                let _ = reply.send(self.drag_start(id));
            }
            MapCommand::DragMove { id, at, reply } => {
                let _ = reply.send(self.drag_move(id, at));
            }
            MapCommand::DragEnd { id, reply } => {
                let _ = reply.send(Ok(self.drag_end(id)));
            }
            MapCommand::Link { a, b, reply } => {
                let _ = reply.send(self.link(a, b));
            }
            MapCommand::AddFreeLine { a, b, reply } => {
                let _ = reply.send(self.add_free_line(a, b));
            }
            MapCommand::Inspect { line, reply } => {
                let _ = reply.send(self.inspect(line));
            }
            MapCommand::Unlink { line, reply } => {
                let _ = reply.send(self.unlink(line));
            }
            MapCommand::RemoveLine { line, reply } => {
                let _ = reply.send(self.remove_line(line));
            }
            MapCommand::AddShape { shape, reply } => {
                let _ = reply.send(self.add_shape(shape));
            }
            MapCommand::RemoveShape { id, reply } => {
                let _ = reply.send(self.remove_shape(id));
            }
            MapCommand::Shapes { reply } => {
                let _ = reply.send(Ok(self.shapes()));
            }
            MapCommand::Overlay { reply } => {
                let _ = reply.send(Ok(self.overlay.snapshot()));
            }
            MapCommand::Panel { reply } => {
                let _ = reply.send(Ok(self.panel.snapshot(self.profiles.is_refreshing())));
            }
            MapCommand::PanelFrame { reply } => {
                let _ = reply.send(Ok(self.panel.frame()));
            }
            MapCommand::HidePanel { reply } => {
                if self.panel.is_visible() {
                    tracing::debug!("panel closed by host");
                }
                self.panel.hide();
                let _ = reply.send(Ok(()));
            }
        }
    }

    fn handle_event(&mut self, event: ProfileEvent) {
        match event {
            ProfileEvent::ThrottleFired { line } => {
                // The panel may have switched lines while the window was pending
                let target = self.panel.active_line().unwrap_or(line);
                let endpoints = self.graph.line(target).map(|entity| entity.endpoints);
                self.profiles.on_throttle_fired(target, endpoints);
            }
            ProfileEvent::Ready(update) => {
                if self
                    .panel
                    .active_line()
                    .is_some_and(|active| active != update.line)
                {
                    tracing::debug!("dropping profile #{} for {}, panel moved on", update.seq, update.line);
                    return;
                }
                if !self.profiles.accept(update.seq) {
                    tracing::debug!("discarding stale profile #{} for {}", update.seq, update.line);
                    return;
                }
                self.panel.publish_profile(update.profile);
                tracing::debug!("{} profile: {}", update.line, self.panel.profile().status);
            }
        }
    }

    fn place_point(&mut self, at: LatLng) -> Shape {
        Shape::Marker {
            id: self.graph.place_point(at),
            position: at,
            lines: Vec::new(),
        }
    }

    fn remove_point(&mut self, id: PointId) -> Result<Vec<LineId>, MapError> {
        if self.drag.dragging_point() == Some(id) {
            self.drag_end(id);
        }
        Ok(self.graph.remove_point(id)?)
    }

    fn drag_start(&mut self, id: PointId) -> Result<Option<LineId>, MapError> {
        if self.graph.ensure_draggable(id)? {
            tracing::warn!("{} had lost its drag capability, re-enabled", id);
        }
        tracing::trace!("drag start for {} in phase {:?}", id, self.drag.phase());
        if let Some(previous) = self.drag.begin(id) {
            tracing::debug!("drag of {} interrupted by {}", previous, id);
            self.panel.hide();
            self.overlay.clear();
        }

        let Some(line) = self.graph.pick_active_line(id) else {
            return Ok(None);
        };
        let Some([a, b]) = self.graph.line(line).map(|entity| entity.endpoints) else {
            return Ok(None);
        };
        self.drag.bind_line(line);
        self.panel.set_active_line(line);
        self.panel.reset();
        self.panel.show();
        self.overlay.prime(a, b);
        self.profiles.request_update(line);
        Ok(Some(line))
    }

    /// Geometry always follows the point; metrics only follow the point being dragged
    fn drag_move(&mut self, id: PointId, at: LatLng) -> Result<Option<LineReadout>, MapError> {
        self.graph.move_point(id, at)?;
        if !self.drag.is_dragging(id) {
            return Ok(None);
        }

        let Some(line) = self.drag.active_line() else {
            return Ok(None);
        };
        if let Err(e) = self.graph.refresh_line(line) {
            tracing::warn!("{} no longer follows {}: {}", line, id, e);
            self.release_drag_metrics();
            return Ok(None);
        }
        let Some([a, b]) = self.graph.line(line).map(|entity| entity.endpoints) else {
            return Ok(None);
        };

        self.overlay.update(a, b);
        tracing::trace!("{} dots track {}", self.overlay.dots().len(), line);
        let readout = LineReadout::between(a, b);
        self.panel.set_readout(readout);
        self.profiles.request_update(line);
        Ok(Some(readout))
    }

    fn drag_end(&mut self, id: PointId) -> bool {
        if !self.drag.complete(id) {
            return false;
        }
        self.panel.hide();
        self.overlay.clear();
        self.drag.finish();
        true
    }

    fn link(&mut self, a: PointId, b: PointId) -> Result<Shape, MapError> {
        let line = self.graph.link(a, b)?;
        self.line_shape(line)
    }

    fn add_free_line(&mut self, a: LatLng, b: LatLng) -> Result<Shape, MapError> {
        let line = self.graph.add_free_line(a, b);
        self.line_shape(line)
    }

    fn line_shape(&self, line: LineId) -> Result<Shape, MapError> {
        self.graph
            .line(line)
            .map(Shape::polyline)
            .ok_or(MapError::Graph(GraphError::UnknownLine(line)))
    }

    fn inspect(&mut self, line: LineId) -> Result<(), MapError> {
        self.graph.select_line(line)?;
        // An explicit selection takes the panel over from a running drag
        self.drag.unbind_line();
        self.overlay.clear();
        self.panel.set_active_line(line);
        self.panel.reset();
        self.panel.show();
        self.profiles.request_update(line);
        Ok(())
    }

    fn unlink(&mut self, line: LineId) -> Result<(), MapError> {
        self.graph.unlink(line)?;
        if self.drag.active_line() == Some(line) {
            self.release_drag_metrics();
        }
        Ok(())
    }

    fn remove_line(&mut self, line: LineId) -> Result<(), MapError> {
        self.graph.remove_line(line)?;
        if self.drag.active_line() == Some(line) {
            self.drag.unbind_line();
        }
        if self.panel.active_line() == Some(line) {
            self.panel.hide();
            self.overlay.clear();
        }
        Ok(())
    }

    /// The drag goes on moving its point, but its line no longer drives the panel
    fn release_drag_metrics(&mut self) {
        self.drag.unbind_line();
        self.panel.hide();
        self.overlay.clear();
    }

    fn add_shape(&mut self, shape: NewAreaShape) -> Result<Shape, MapError> {
        let id = ShapeId(self.next_shape + 1);
        let shape = shape.into_shape(id)?;
        self.next_shape = id.0;
        tracing::debug!("added {:?} {}", shape.kind(), id);
        self.areas.insert(id, shape.clone());
        Ok(shape)
    }

    fn remove_shape(&mut self, id: ShapeId) -> Result<Shape, MapError> {
        self.areas.remove(&id).ok_or(MapError::UnknownShape(id))
    }

    /// Markers, then polylines, then area shapes, each in id order
    fn shapes(&self) -> Vec<Shape> {
        let mut points: Vec<_> = self.graph.points().collect();
        points.sort_by_key(|point| point.id);
        let mut lines: Vec<_> = self.graph.lines().collect();
        lines.sort_by_key(|line| line.id);

        points
            .into_iter()
            .map(|point| Shape::marker(point, self.graph.lines_for(point.id).collect()))
            .chain(lines.into_iter().map(Shape::polyline))
            .chain(self.areas.values().cloned())
            .collect()
    }
}
