// Infrastructure layer - configuration and elevation source adapters
pub mod config;
pub mod local_dem;
pub mod provider_chain;
pub mod remote_elevation;
