//! Client side of Trailwatch: the incident backend API, reverse geocoding,
//! device position, the submission pipeline and the dashboard session.
//!
//! The reqwest transport is behind the `http` feature; everything else runs
//! against the [`IncidentApi`] and [`ReverseGeocoder`] traits.

pub mod api;
pub mod dashboard;
pub mod error;
pub mod events;
pub mod geocode;
pub mod photos;
pub mod position;
pub mod submit;
pub mod users;

#[cfg(feature = "http")]
pub mod http;

#[cfg(test)]
mod testing;

pub use api::{IncidentApi, IncidentForm};
pub use dashboard::Dashboard;
pub use error::ClientError;
pub use events::{IncidentEvent, IncidentEvents};
pub use geocode::{OfflineGeocoder, ReverseGeocoder};
pub use photos::{scan_photos, select_photos};
pub use position::{
    FixedPosition, NoPositionSupport, PositionError, PositionOptions, PositionSource,
    use_current_location,
};
pub use submit::{MessageKind, StatusMessage, SubmissionPhase, Submission, SubmitError};
pub use users::{DirectoryUser, NewUser};

#[cfg(feature = "http")]
pub use geocode::Geocoder;
#[cfg(feature = "http")]
pub use http::IncidentClient;
