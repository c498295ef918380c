// Elevation provider - prioritized chain of terrain sources, each behind its own failure boundary
use crate::domain::geodesy::LatLng;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Not configured or not reachable; the chain moves on quietly
    #[error("source unavailable: {0}")]
    Unavailable(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("bridge failed: {0}")]
    Bridge(#[from] std::io::Error),
}

#[async_trait]
pub trait ElevationSource: Send + Sync {
    /// Shown as the prefix of the panel status line
    fn name(&self) -> &str;

    /// One entry per input coordinate; a point without data is `None`, not an error
    async fn lookup(&self, points: &[LatLng]) -> Result<Vec<Option<f64>>, ProviderError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedElevations {
    pub provider: String,
    pub elevations: Vec<Option<f64>>,
}

#[derive(Clone, Default)]
pub struct ElevationProvider {
    sources: Vec<Arc<dyn ElevationSource>>,
}

impl ElevationProvider {
    pub fn new(sources: Vec<Arc<dyn ElevationSource>>) -> Self {
        Self { sources }
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// First source that answers with one value per point wins; `None` once every source failed
    pub async fn resolve(&self, points: &[LatLng]) -> Option<ResolvedElevations> {
        for source in &self.sources {
            match source.lookup(points).await {
                Ok(elevations) if elevations.len() == points.len() => {
                    return Some(ResolvedElevations {
                        provider: source.name().to_string(),
                        elevations: elevations
                            .into_iter()
                            .map(|z| z.filter(|v| v.is_finite()))
                            .collect(),
                    });
                }
                Ok(elevations) => {
                    tracing::warn!(
                        "{} returned {} elevations for {} points, trying next source",
                        source.name(),
                        elevations.len(),
                        points.len()
                    );
                }
                Err(ProviderError::Unavailable(reason)) => {
                    tracing::debug!("{} unavailable ({}), trying next source", source.name(), reason);
                }
                Err(e) => {
                    tracing::warn!("{} failed: {}, trying next source", source.name(), e);
                }
            }
        }

        tracing::warn!("no elevation source produced data for {} points", points.len());
        None
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::Mutex;

    pub enum Behaviour {
        Values(Vec<Option<f64>>),
        Unavailable,
        Invalid,
    }

    /// Scripted source that records every batch it was asked for
    pub struct ScriptedSource {
        pub name: String,
        pub behaviour: Behaviour,
        pub calls: Mutex<Vec<Vec<LatLng>>>,
    }

    impl ScriptedSource {
        pub fn new(name: &str, behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                behaviour,
                calls: Mutex::new(Vec::new()),
            })
        }

        /// Answers every point with the same elevation
        pub fn flat(name: &str, elevation: f64, points: usize) -> Arc<Self> {
            Self::new(name, Behaviour::Values(vec![Some(elevation); points]))
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn last_call(&self) -> Option<Vec<LatLng>> {
            self.calls.lock().unwrap().last().cloned()
        }
    }

    pub fn provider_of(sources: &[&Arc<ScriptedSource>]) -> ElevationProvider {
        ElevationProvider::new(
            sources
                .iter()
                .map(|s| Arc::clone(*s) as Arc<dyn ElevationSource>)
                .collect(),
        )
    }

    #[async_trait]
    impl ElevationSource for ScriptedSource {
        fn name(&self) -> &str {
            &self.name
        }

        async fn lookup(&self, points: &[LatLng]) -> Result<Vec<Option<f64>>, ProviderError> {
            self.calls.lock().unwrap().push(points.to_vec());
            match &self.behaviour {
                Behaviour::Values(values) => Ok(values.clone()),
                Behaviour::Unavailable => Err(ProviderError::Unavailable("scripted".to_string())),
                Behaviour::Invalid => Err(ProviderError::InvalidResponse(
                    "missing results".to_string(),
                )),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{provider_of, Behaviour, ScriptedSource};
    use super::*;

    fn points(n: usize) -> Vec<LatLng> {
        (0..n).map(|i| LatLng::new(0.0, i as f64 * 0.1)).collect()
    }

    #[tokio::test]
    async fn test_falls_through_to_third_source() {
        let local = ScriptedSource::new("Local DEM", Behaviour::Unavailable);
        let remote_a = ScriptedSource::new("OpenTopoData", Behaviour::Invalid);
        let remote_b = ScriptedSource::flat("Open-Elevation", 250.0, 3);
        let provider = provider_of(&[&local, &remote_a, &remote_b]);

        let resolved = provider.resolve(&points(3)).await.unwrap();
        assert_eq!(resolved.provider, "Open-Elevation");
        assert_eq!(resolved.elevations, vec![Some(250.0); 3]);
        assert_eq!(local.call_count(), 1);
        assert_eq!(remote_a.call_count(), 1);
        assert_eq!(remote_b.call_count(), 1);
    }

    #[tokio::test]
    async fn test_first_answer_wins() {
        let local = ScriptedSource::flat("Local DEM", 10.0, 2);
        let remote = ScriptedSource::flat("OpenTopoData", 20.0, 2);
        let provider = provider_of(&[&local, &remote]);

        let resolved = provider.resolve(&points(2)).await.unwrap();
        assert_eq!(resolved.provider, "Local DEM");
        assert_eq!(remote.call_count(), 0);
    }

    #[tokio::test]
    async fn test_all_sources_failing() {
        let provider = provider_of(&[
            &ScriptedSource::new("Local DEM", Behaviour::Unavailable),
            &ScriptedSource::new("OpenTopoData", Behaviour::Invalid),
            &ScriptedSource::new("Open-Elevation", Behaviour::Unavailable),
        ]);
        assert_eq!(provider.resolve(&points(4)).await, None);
        assert_eq!(ElevationProvider::default().resolve(&points(4)).await, None);
    }

    #[tokio::test]
    async fn test_length_mismatch_and_non_finite_values() {
        let short = ScriptedSource::flat("Local DEM", 10.0, 1);
        let odd = ScriptedSource::new(
            "OpenTopoData",
            Behaviour::Values(vec![Some(f64::NAN), None, Some(12.5)]),
        );
        let provider = provider_of(&[&short, &odd]);

        let resolved = provider.resolve(&points(3)).await.unwrap();
        assert_eq!(resolved.provider, "OpenTopoData");
        assert_eq!(resolved.elevations, vec![None, None, Some(12.5)]);
        assert_eq!(provider.source_names(), vec!["Local DEM", "OpenTopoData"]);
    }
}
