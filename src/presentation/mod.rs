// Presentation layer - HTTP host adapter and panel rendering
pub mod app_state;
pub mod handlers;
pub mod svg_renderer;
