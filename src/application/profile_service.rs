// Elevation profile service - throttled sampling and elevation lookup for a line
use crate::application::elevation_provider::ElevationProvider;
use crate::application::throttle::Throttle;
use crate::domain::entities::LineId;
use crate::domain::geodesy::{GeoSampler, LatLng, LineSamples};
use crate::domain::profile::ElevationProfile;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Completions the service posts back to the event loop that owns it
#[derive(Debug)]
pub enum ProfileEvent {
    /// The throttle window closed; the line's endpoints are read now, not when it opened
    ThrottleFired { line: LineId },
    Ready(ProfileUpdate),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileUpdate {
    pub seq: u64,
    pub line: LineId,
    pub profile: ElevationProfile,
}

pub struct ElevationProfileService {
    provider: Arc<ElevationProvider>,
    sampler: GeoSampler,
    throttle: Throttle,
    events: mpsc::Sender<ProfileEvent>,
    next_seq: u64,
    last_applied: u64,
}

impl ElevationProfileService {
    pub fn new(
        provider: Arc<ElevationProvider>,
        sampler: GeoSampler,
        throttle: Throttle,
        events: mpsc::Sender<ProfileEvent>,
    ) -> Self {
        Self {
            provider,
            sampler,
            throttle,
            events,
            next_seq: 0,
            last_applied: 0,
        }
    }

    /// Schedules a fetch unless one is already pending for any line; dropped requests are not queued
    pub fn request_update(&mut self, line: LineId) -> bool {
        if !self.throttle.try_arm() {
            tracing::trace!("profile request for {} dropped, window pending", line);
            return false;
        }

        let events = self.events.clone();
        let delay = self.throttle.delay();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(ProfileEvent::ThrottleFired { line }).await;
        });
        true
    }

    /// Starts the fetch pipeline; `endpoints` is `None` when the line no longer exists
    pub fn on_throttle_fired(
        &mut self,
        line: LineId,
        endpoints: Option<[LatLng; 2]>,
    ) -> Option<u64> {
        self.throttle.release();
        let Some([start, end]) = endpoints else {
            tracing::debug!("{} vanished before its profile fetch", line);
            return None;
        };

        self.next_seq += 1;
        let seq = self.next_seq;
        let samples = self.sampler.sample(start, end);
        let provider = self.provider.clone();
        let events = self.events.clone();

        tokio::spawn(async move {
            let profile = build_profile(&provider, samples).await;
            tracing::debug!("profile #{} for {}: {}", seq, line, profile.status);
            let _ = events
                .send(ProfileEvent::Ready(ProfileUpdate { seq, line, profile }))
                .await;
        });
        Some(seq)
    }

    /// Last-write-wins gate: rejects results older than the newest one applied
    pub fn accept(&mut self, seq: u64) -> bool {
        if seq < self.last_applied {
            return false;
        }
        self.last_applied = seq;
        true
    }

    pub fn is_refreshing(&self) -> bool {
        self.throttle.is_pending()
    }
}

pub async fn build_profile(provider: &ElevationProvider, samples: LineSamples) -> ElevationProfile {
    let LineSamples {
        points,
        distances_km,
    } = samples;

    match provider.resolve(&points).await {
        Some(resolved) => ElevationProfile::from_elevations(
            &resolved.provider,
            distances_km,
            resolved.elevations,
        ),
        None => ElevationProfile::failed(distances_km),
    }
}
