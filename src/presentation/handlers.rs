// HTTP request handlers
use crate::application::dispatcher::MapError;
use crate::application::live_dots::OverlaySnapshot;
use crate::application::metrics_panel::PanelSnapshot;
use crate::domain::entities::{LineId, PointId};
use crate::domain::geodesy::{LatLng, LineReadout};
use crate::domain::line_graph::GraphError;
use crate::domain::shape::{NewAreaShape, Shape, ShapeId};
use crate::presentation::app_state::AppState;
use crate::presentation::svg_renderer::render_svg;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Map(#[from] MapError),
    #[error(transparent)]
    Render(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Map(MapError::Graph(GraphError::UnknownPoint(_)))
            | ApiError::Map(MapError::Graph(GraphError::UnknownLine(_)))
            | ApiError::Map(MapError::UnknownShape(_)) => StatusCode::NOT_FOUND,
            ApiError::Map(MapError::Graph(_)) | ApiError::Map(MapError::Shape(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Map(MapError::Closed) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!("request failed: {}", self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Deserialize)]
pub struct LinkBody {
    pub a: PointId,
    pub b: PointId,
}

#[derive(Deserialize)]
pub struct FreeLineBody {
    pub a: LatLng,
    pub b: LatLng,
}

#[derive(Serialize)]
pub struct RemovedPoint {
    pub orphaned_lines: Vec<LineId>,
}

#[derive(Serialize)]
pub struct DragStarted {
    pub active_line: Option<LineId>,
}

#[derive(Serialize)]
pub struct DragMoved {
    pub readout: Option<LineReadout>,
}

#[derive(Serialize)]
pub struct DragEnded {
    pub completed: bool,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn place_point(
    State(state): State<Arc<AppState>>,
    Json(at): Json<LatLng>,
) -> Result<(StatusCode, Json<Shape>), ApiError> {
    let marker = state.map.place_point(at).await?;
    Ok((StatusCode::CREATED, Json(marker)))
}

pub async fn remove_point(
    Path(id): Path<u64>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<RemovedPoint>, ApiError> {
    let orphaned_lines = state.map.remove_point(PointId(id)).await?;
    Ok(Json(RemovedPoint { orphaned_lines }))
}

pub async fn drag_start(
    Path(id): Path<u64>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<DragStarted>, ApiError> {
    let active_line = state.map.drag_start(PointId(id)).await?;
    Ok(Json(DragStarted { active_line }))
}

pub async fn drag_move(
    Path(id): Path<u64>,
    State(state): State<Arc<AppState>>,
    Json(at): Json<LatLng>,
) -> Result<Json<DragMoved>, ApiError> {
    let readout = state.map.drag_move(PointId(id), at).await?;
    Ok(Json(DragMoved { readout }))
}

pub async fn drag_end(
    Path(id): Path<u64>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<DragEnded>, ApiError> {
    let completed = state.map.drag_end(PointId(id)).await?;
    Ok(Json(DragEnded { completed }))
}

pub async fn link_points(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LinkBody>,
) -> Result<(StatusCode, Json<Shape>), ApiError> {
    let line = state.map.link(body.a, body.b).await?;
    Ok((StatusCode::CREATED, Json(line)))
}

/// Two-vertex polyline drawn without markers
pub async fn add_free_line(
    State(state): State<Arc<AppState>>,
    Json(body): Json<FreeLineBody>,
) -> Result<(StatusCode, Json<Shape>), ApiError> {
    let line = state.map.add_free_line(body.a, body.b).await?;
    Ok((StatusCode::CREATED, Json(line)))
}

pub async fn inspect_line(
    Path(id): Path<u64>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    state.map.inspect(LineId(id)).await?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn unlink_line(
    Path(id): Path<u64>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    state.map.unlink(LineId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_line(
    Path(id): Path<u64>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    state.map.remove_line(LineId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_shape(
    State(state): State<Arc<AppState>>,
    Json(shape): Json<NewAreaShape>,
) -> Result<(StatusCode, Json<Shape>), ApiError> {
    let shape = state.map.add_shape(shape).await?;
    Ok((StatusCode::CREATED, Json(shape)))
}

pub async fn remove_shape(
    Path(id): Path<u64>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Shape>, ApiError> {
    let removed = state.map.remove_shape(ShapeId(id)).await?;
    Ok(Json(removed))
}

/// Markers, lines and area shapes currently on the map
pub async fn list_shapes(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Shape>>, ApiError> {
    Ok(Json(state.map.shapes().await?))
}

pub async fn live_overlay(
    State(state): State<Arc<AppState>>,
) -> Result<Json<OverlaySnapshot>, ApiError> {
    Ok(Json(state.map.overlay().await?))
}

pub async fn panel_state(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PanelSnapshot>, ApiError> {
    Ok(Json(state.map.panel().await?))
}

pub async fn panel_svg(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let frame = state.map.panel_frame().await?;
    let svg = render_svg(&frame)?;
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}

pub async fn hide_panel(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.map.hide_panel().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dispatcher::{DispatcherOptions, MapDispatcher};
    use crate::application::elevation_provider::test_support::{provider_of, ScriptedSource};

    fn spawn_state() -> Arc<AppState> {
        let provider = provider_of(&[&ScriptedSource::flat("Local DEM", 500.0, 21)]);
        let (dispatcher, map) = MapDispatcher::new(provider, DispatcherOptions::default());
        tokio::spawn(dispatcher.run());
        Arc::new(AppState { map })
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (MapError::Graph(GraphError::UnknownPoint(PointId(3))), StatusCode::NOT_FOUND),
            (MapError::Graph(GraphError::UnknownLine(LineId(1))), StatusCode::NOT_FOUND),
            (MapError::UnknownShape(ShapeId(9)), StatusCode::NOT_FOUND),
            (MapError::Graph(GraphError::SelfLink(PointId(1))), StatusCode::UNPROCESSABLE_ENTITY),
            (MapError::Closed, StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (error, expected) in cases {
            assert_eq!(ApiError::from(error).into_response().status(), expected);
        }
        let render = ApiError::from(anyhow::anyhow!("backend"));
        assert_eq!(render.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_link_and_drag_through_handlers() {
        let state = spawn_state();

        let (status, _) = place_point(State(state.clone()), Json(LatLng::new(0.0, 0.0)))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        place_point(State(state.clone()), Json(LatLng::new(0.0, 1.0)))
            .await
            .unwrap();

        let shapes = list_shapes(State(state.clone())).await.unwrap().0;
        let ids: Vec<PointId> = shapes
            .iter()
            .filter_map(|s| match s {
                Shape::Marker { id, .. } => Some(*id),
                _ => None,
            })
            .collect();
        assert_eq!(ids.len(), 2);

        link_points(State(state.clone()), Json(LinkBody { a: ids[0], b: ids[1] }))
            .await
            .unwrap();

        let started = drag_start(Path(ids[0].0), State(state.clone())).await.unwrap().0;
        assert!(started.active_line.is_some());

        let moved = drag_move(Path(ids[0].0), State(state.clone()), Json(LatLng::new(0.0, 0.5)))
            .await
            .unwrap()
            .0;
        let readout = moved.readout.unwrap();
        assert!((readout.distance_km - 55.6).abs() < 0.1);

        let panel = panel_state(State(state.clone())).await.unwrap().0;
        assert!(panel.visible);

        let ended = drag_end(Path(ids[0].0), State(state.clone())).await.unwrap().0;
        assert!(ended.completed);
        assert!(!panel_state(State(state)).await.unwrap().0.visible);
    }

    #[tokio::test]
    async fn test_unknown_line_is_not_found() {
        let state = spawn_state();
        let err = inspect_line(Path(42), State(state)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_panel_svg_content_type() {
        let state = spawn_state();
        let response = panel_svg(State(state)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/svg+xml"
        );
    }
}
