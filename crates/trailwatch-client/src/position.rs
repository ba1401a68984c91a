//! "Use current location": a one-shot device position feeding the draft.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};
use trailwatch_core::{Coordinates, IncidentDraft};

use crate::geocode::ReverseGeocoder;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("Geolocation is not supported.")]
    Unsupported,
    #[error("Timeout expired after {0:?}")]
    Timeout(Duration),
    #[error("{0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
        }
    }
}

#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn current_position(&self, options: &PositionOptions) -> Result<Coordinates, PositionError>;
}

/// A position supplied up front, e.g. from the command line.
pub struct FixedPosition(pub Coordinates);

#[async_trait]
impl PositionSource for FixedPosition {
    async fn current_position(&self, _options: &PositionOptions) -> Result<Coordinates, PositionError> {
        Ok(self.0)
    }
}

/// No positioning hardware or service available.
pub struct NoPositionSupport;

#[async_trait]
impl PositionSource for NoPositionSupport {
    async fn current_position(&self, _options: &PositionOptions) -> Result<Coordinates, PositionError> {
        Err(PositionError::Unsupported)
    }
}

/// Ask `source` for a fix, then fill the draft's coordinates and location text.
///
/// Failures are recorded on the draft's [`GeoStatus`](trailwatch_core::GeoStatus)
/// and returned; the rest of the form is left untouched.
pub async fn use_current_location<P, G>(
    draft: &mut IncidentDraft,
    source: &P,
    geocoder: &G,
) -> Result<Coordinates, PositionError>
where
    P: PositionSource + ?Sized,
    G: ReverseGeocoder + ?Sized,
{
    let options = PositionOptions::default();
    draft.geo.loading = true;
    draft.geo.error = None;
    draft.geo.locked = false;

    let result = match tokio::time::timeout(options.timeout, source.current_position(&options)).await {
        Ok(result) => result,
        Err(_) => Err(PositionError::Timeout(options.timeout)),
    };

    match result {
        Ok(coords) => {
            let text = geocoder.reverse(coords).await;
            info!(lat = coords.lat, lng = coords.lng, place = %text, "device position resolved");
            draft.apply_device_position(coords, text);
            Ok(coords)
        }
        Err(e) => {
            warn!(error = %e, "device position unavailable");
            draft.record_position_error(e.to_string());
            Err(e)
        }
    }
}
