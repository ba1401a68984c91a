//! Reverse geocoding: coordinates to a human-readable place name.
//!
//! Lookups are best effort. Any failure yields the coordinates formatted to
//! six decimals, so a successful fix never leaves the location text empty.

use async_trait::async_trait;
use trailwatch_core::Coordinates;

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Place name for `coords`; never empty.
    async fn reverse(&self, coords: Coordinates) -> String;
}

/// The service's `display_name`, or the formatted coordinates.
pub fn display_or_coordinates(display_name: Option<String>, coords: Coordinates) -> String {
    display_name
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| coords.display())
}

/// Geocoder that never calls out; always returns the formatted coordinates.
pub struct OfflineGeocoder;

#[async_trait]
impl ReverseGeocoder for OfflineGeocoder {
    async fn reverse(&self, coords: Coordinates) -> String {
        coords.display()
    }
}

#[cfg(feature = "http")]
pub use nominatim::Geocoder;

#[cfg(feature = "http")]
mod nominatim {
    use async_trait::async_trait;
    use serde::Deserialize;
    use tracing::{debug, warn};
    use trailwatch_core::{AppConfig, Coordinates};

    use super::{ReverseGeocoder, display_or_coordinates};
    use crate::error::ClientError;

    const USER_AGENT: &str = concat!("trailwatch/", env!("CARGO_PKG_VERSION"));

    #[derive(Deserialize)]
    struct ReverseResponse {
        display_name: Option<String>,
    }

    /// Nominatim-compatible reverse geocoder.
    pub struct Geocoder {
        client: reqwest::Client,
        endpoint: String,
    }

    impl Geocoder {
        pub fn new(endpoint: String) -> Self {
            Self {
                client: reqwest::Client::new(),
                endpoint,
            }
        }

        pub fn from_config(config: &AppConfig) -> Self {
            Self::new(config.geocoder_url.clone())
        }

        async fn lookup(&self, coords: Coordinates) -> Result<Option<String>, ClientError> {
            let lat = coords.lat.to_string();
            let lon = coords.lng.to_string();
            let resp = self
                .client
                .get(&self.endpoint)
                .header(reqwest::header::USER_AGENT, USER_AGENT)
                .query(&[
                    ("lat", lat.as_str()),
                    ("lon", lon.as_str()),
                    ("format", "json"),
                    ("zoom", "10"),
                    ("addressdetails", "1"),
                ])
                .send()
                .await?;
            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(ClientError::from_status(status.as_u16(), body));
            }
            let parsed: ReverseResponse = resp.json().await?;
            Ok(parsed.display_name)
        }
    }

    #[async_trait]
    impl ReverseGeocoder for Geocoder {
        async fn reverse(&self, coords: Coordinates) -> String {
            match self.lookup(coords).await {
                Ok(name) => {
                    debug!(found = name.is_some(), "reverse geocode complete");
                    display_or_coordinates(name, coords)
                }
                Err(e) => {
                    warn!(error = %e, "reverse geocoding failed");
                    coords.display()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_is_preferred() {
        let c = Coordinates::new(7.2906, 80.6337);
        assert_eq!(
            display_or_coordinates(Some("Kandy, Central Province".into()), c),
            "Kandy, Central Province"
        );
    }

    #[test]
    fn missing_or_blank_name_falls_back_to_coordinates() {
        let c = Coordinates::new(7.2906, 80.6337);
        assert_eq!(display_or_coordinates(None, c), "7.290600, 80.633700");
        assert_eq!(display_or_coordinates(Some("  ".into()), c), "7.290600, 80.633700");
    }

    #[tokio::test]
    async fn offline_geocoder_formats_coordinates() {
        let text = OfflineGeocoder.reverse(Coordinates::new(6.9, 79.8)).await;
        assert_eq!(text, "6.900000, 79.800000");
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn unreachable_service_falls_back_to_coordinates() {
        let geocoder = Geocoder::new("http://127.0.0.1:9/reverse".into());
        let text = geocoder.reverse(Coordinates::new(6.9, 79.8)).await;
        assert_eq!(text, "6.900000, 79.800000");
    }
}
