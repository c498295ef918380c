// Provider chain - builds the ordered elevation source list from configuration
use crate::application::elevation_provider::{ElevationProvider, ElevationSource};
use crate::infrastructure::config::ProviderSettings;
use crate::infrastructure::local_dem::LocalDemSource;
use crate::infrastructure::remote_elevation::{LookupDialect, RemoteElevationSource};
use std::sync::Arc;

/// Local DEM first, then OpenTopoData, then Open-Elevation; disabled sources are left out
pub fn build_elevation_provider(settings: &ProviderSettings) -> ElevationProvider {
    let mut sources: Vec<Arc<dyn ElevationSource>> = Vec::new();
    let client = reqwest::Client::new();

    let local = &settings.local_dem;
    match (&local.command, local.enabled) {
        (Some(command), true) => sources.push(Arc::new(LocalDemSource::new(
            local.name.clone(),
            command.clone(),
            local.args.clone(),
        ))),
        (None, true) => tracing::debug!("{} has no bridge command, skipping", local.name),
        (_, false) => {}
    }

    let remotes = [
        (&settings.open_topo_data, LookupDialect::OpenTopoData),
        (&settings.open_elevation, LookupDialect::OpenElevation),
    ];
    for (remote, dialect) in remotes {
        if remote.enabled {
            sources.push(Arc::new(RemoteElevationSource::new(
                client.clone(),
                remote.name.clone(),
                remote.url.clone(),
                dialect,
            )));
        }
    }

    ElevationProvider::new(sources)
}
