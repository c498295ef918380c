use crate::application::dispatcher::DispatcherOptions;
use crate::infrastructure::remote_elevation::{OPEN_ELEVATION_URL, OPEN_TOPO_DATA_URL};
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub profile: ProfileSettings,
    pub overlay: OverlaySettings,
    pub panel: PanelSettings,
    pub providers: ProviderSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProfileSettings {
    pub throttle_ms: u64,
    pub sample_steps: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OverlaySettings {
    pub dot_count: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PanelSettings {
    pub width: u32,
    pub height: u32,
}

/// Elevation sources, tried in declaration order
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderSettings {
    pub local_dem: LocalDemSettings,
    pub open_topo_data: RemoteSourceSettings,
    pub open_elevation: RemoteSourceSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LocalDemSettings {
    pub enabled: bool,
    pub name: String,
    /// Bridge executable; the source is skipped when unset
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RemoteSourceSettings {
    pub enabled: bool,
    pub name: String,
    pub url: String,
}

fn with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    config::Config::builder()
        .set_default("server.bind", "0.0.0.0:8080")?
        .set_default("profile.throttle_ms", 300)?
        .set_default("profile.sample_steps", 20)?
        .set_default("overlay.dot_count", 12)?
        .set_default("panel.width", 380)?
        .set_default("panel.height", 190)?
        .set_default("providers.local_dem.enabled", true)?
        .set_default("providers.local_dem.name", "Local DEM")?
        .set_default("providers.open_topo_data.enabled", true)?
        .set_default("providers.open_topo_data.name", "OpenTopoData")?
        .set_default("providers.open_topo_data.url", OPEN_TOPO_DATA_URL)?
        .set_default("providers.open_elevation.enabled", true)?
        .set_default("providers.open_elevation.name", "Open-Elevation")?
        .set_default("providers.open_elevation.url", OPEN_ELEVATION_URL)
}

/// Defaults, then `config/line_metrics.*` if present, then `LINE_METRICS__SECTION__KEY` variables
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = with_defaults()?
        .add_source(config::File::with_name("config/line_metrics").required(false))
        .add_source(config::Environment::with_prefix("LINE_METRICS").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

impl From<&AppConfig> for DispatcherOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            throttle: Duration::from_millis(config.profile.throttle_ms),
            sample_steps: config.profile.sample_steps,
            dot_count: config.overlay.dot_count,
            panel_width: config.panel.width,
            panel_height: config.panel.height,
        }
    }
}
