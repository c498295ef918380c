// Remote elevation sources - OpenTopoData and Open-Elevation lookup APIs
use crate::application::elevation_provider::{ElevationSource, ProviderError};
use crate::domain::geodesy::LatLng;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const OPEN_TOPO_DATA_URL: &str = "https://api.opentopodata.org/v1/srtm90m";
pub const OPEN_ELEVATION_URL: &str = "https://api.open-elevation.com/api/v1/lookup";

/// Request body shape; the two services disagree on how a location is spelled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupDialect {
    /// `[[lat, lng], ..]` rounded to 6 decimals
    OpenTopoData,
    /// `[{"latitude": .., "longitude": ..}, ..]` at full precision
    OpenElevation,
}

#[derive(Debug, Serialize)]
struct PairRequest {
    locations: Vec<[f64; 2]>,
}

#[derive(Debug, Serialize)]
struct Location {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Serialize)]
struct ObjectRequest {
    locations: Vec<Location>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    results: Option<Vec<serde_json::Value>>,
}

pub struct RemoteElevationSource {
    client: reqwest::Client,
    name: String,
    url: String,
    dialect: LookupDialect,
}

impl RemoteElevationSource {
    pub fn new(client: reqwest::Client, name: String, url: String, dialect: LookupDialect) -> Self {
        Self {
            client,
            name,
            url,
            dialect,
        }
    }
}

fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

/// JSON request body for the given dialect
pub fn lookup_body(dialect: LookupDialect, points: &[LatLng]) -> serde_json::Value {
    let body = match dialect {
        LookupDialect::OpenTopoData => serde_json::to_value(PairRequest {
            locations: points.iter().map(|p| [round6(p.lat), round6(p.lng)]).collect(),
        }),
        LookupDialect::OpenElevation => serde_json::to_value(ObjectRequest {
            locations: points
                .iter()
                .map(|p| Location {
                    latitude: p.lat,
                    longitude: p.lng,
                })
                .collect(),
        }),
    };
    body.unwrap_or(serde_json::Value::Null)
}

/// `results[i].elevation` per point; a non-numeric or missing elevation is an absent sample
pub fn parse_lookup_response(body: &[u8], expected: usize) -> Result<Vec<Option<f64>>, ProviderError> {
    let response: LookupResponse = serde_json::from_slice(body)
        .map_err(|e| ProviderError::InvalidResponse(format!("unparsable body: {}", e)))?;
    let results = response
        .results
        .ok_or_else(|| ProviderError::InvalidResponse("missing results".to_string()))?;
    if results.len() != expected {
        return Err(ProviderError::InvalidResponse(format!(
            "{} results for {} points",
            results.len(),
            expected
        )));
    }

    Ok(results
        .iter()
        .map(|r| r.get("elevation").and_then(|z| z.as_f64()))
        .collect())
}

#[async_trait]
impl ElevationSource for RemoteElevationSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, points: &[LatLng]) -> Result<Vec<Option<f64>>, ProviderError> {
        tracing::debug!("querying {} for {} points", self.name, points.len());
        let response = self
            .client
            .post(&self.url)
            .json(&lookup_body(self.dialect, points))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Unavailable(format!(
                "{} returned status {}",
                self.name,
                response.status()
            )));
        }

        let body = response.bytes().await?;
        parse_lookup_response(&body, points.len())
    }
}
