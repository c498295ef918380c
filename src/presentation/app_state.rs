// Application state for HTTP handlers
use crate::application::dispatcher::MapHandle;

#[derive(Clone)]
pub struct AppState {
    pub map: MapHandle,
}
