// Local DEM source - elevations from a host-provided bridge command speaking JSON over stdio
use crate::application::elevation_provider::{ElevationSource, ProviderError};
use crate::domain::geodesy::LatLng;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Debug, Clone)]
pub struct LocalDemSource {
    name: String,
    command: String,
    args: Vec<String>,
}

#[derive(Debug, Serialize)]
struct BridgePoint {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct BridgeReply {
    #[serde(default)]
    elevations: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    error: Option<String>,
}

impl LocalDemSource {
    pub fn new(name: String, command: String, args: Vec<String>) -> Self {
        Self {
            name,
            command,
            args,
        }
    }

    async fn run_bridge(&self, request: Vec<u8>) -> Result<Vec<u8>, ProviderError> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ProviderError::Unavailable(format!("{} failed to start: {}", self.command, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&request).await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProviderError::Unavailable(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }
        Ok(output.stdout)
    }
}

/// Bridge reply to per-point values; a reported error counts as the DEM being unavailable
pub fn parse_bridge_reply(body: &[u8], expected: usize) -> Result<Vec<Option<f64>>, ProviderError> {
    let reply: BridgeReply = serde_json::from_slice(body)
        .map_err(|e| ProviderError::InvalidResponse(format!("bridge reply: {}", e)))?;

    if let Some(error) = reply.error {
        return Err(ProviderError::Unavailable(error));
    }
    let elevations = reply
        .elevations
        .ok_or_else(|| ProviderError::InvalidResponse("missing elevations".to_string()))?;
    if elevations.len() != expected {
        return Err(ProviderError::Unavailable(format!(
            "{} elevations for {} points",
            elevations.len(),
            expected
        )));
    }

    Ok(elevations
        .iter()
        .map(|value| value.as_f64().filter(|z| z.is_finite()))
        .collect())
}

#[async_trait]
impl ElevationSource for LocalDemSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, points: &[LatLng]) -> Result<Vec<Option<f64>>, ProviderError> {
        let request: Vec<BridgePoint> = points
            .iter()
            .map(|p| BridgePoint { lat: p.lat, lng: p.lng })
            .collect();
        let body = serde_json::to_vec(&request)
            .map_err(|e| ProviderError::InvalidResponse(format!("bridge request: {}", e)))?;

        let reply = self.run_bridge(body).await?;
        parse_bridge_reply(&reply, points.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reply_with_gaps() {
        let body = br#"{"elevations":[812.5,null,"n/a",790]}"#;
        assert_eq!(
            parse_bridge_reply(body, 4).unwrap(),
            vec![Some(812.5), None, None, Some(790.0)]
        );
    }

    #[test]
    fn test_reported_error_is_unavailable() {
        let body = br#"{"elevations":[null,null],"error":"dem_unavailable"}"#;
        assert!(matches!(
            parse_bridge_reply(body, 2),
            Err(ProviderError::Unavailable(reason)) if reason == "dem_unavailable"
        ));
    }

    #[test]
    fn test_malformed_replies() {
        assert!(matches!(
            parse_bridge_reply(br#"{"status":"ok"}"#, 2),
            Err(ProviderError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_bridge_reply(b"not json", 2),
            Err(ProviderError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_bridge_reply(br#"{"elevations":[1.0]}"#, 2),
            Err(ProviderError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_command_is_unavailable() {
        let source = LocalDemSource::new(
            "Local DEM".to_string(),
            "/nonexistent/dem-bridge".to_string(),
            Vec::new(),
        );
        let result = source.lookup(&[LatLng::new(0.0, 0.0)]).await;
        assert!(matches!(result, Err(ProviderError::Unavailable(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_bridge_round_trip_through_shell() {
        let source = LocalDemSource::new(
            "Local DEM".to_string(),
            "sh".to_string(),
            vec![
                "-c".to_string(),
                r#"cat > /dev/null; echo '{"elevations":[100.0,null]}'"#.to_string(),
            ],
        );
        let elevations = source
            .lookup(&[LatLng::new(0.0, 0.0), LatLng::new(0.0, 1.0)])
            .await
            .unwrap();
        assert_eq!(elevations, vec![Some(100.0), None]);
    }
}
