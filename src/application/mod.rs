// Application layer - event loop, drag lifecycle, profile pipeline and panel state
pub mod dispatcher;
pub mod drag_session;
pub mod elevation_provider;
pub mod live_dots;
pub mod metrics_panel;
pub mod profile_service;
pub mod throttle;
