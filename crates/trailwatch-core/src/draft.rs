//! The client-side incident report before submission.

use thiserror::Error;

use crate::geotag::ExifBatch;
use crate::model::{Coordinates, IncidentType, LocationMode, MAX_PHOTOS, PhotoAttachment, Severity};

/// A user-correctable problem that blocks submission locally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please provide a description")]
    EmptyDescription,
    #[error("At most 5 photos can be attached (got {0})")]
    TooManyPhotos(usize),
    #[error("Please upload at least one photo with GPS metadata")]
    MissingPhoto,
    #[error(
        "Photo has no valid GPS data. Please use a geotagged photo or switch to \"Use GPS / Text\" mode"
    )]
    NoPhotoGps,
    #[error("Please provide a location description (trail name, landmark, or nearest town)")]
    MissingLocationText,
}

/// Progress of the "use current location" action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoStatus {
    pub loading: bool,
    pub error: Option<String>,
    /// A position has been resolved; the coordinates stay hidden in the form.
    pub locked: bool,
}

/// An incident report being composed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentDraft {
    pub incident_type: IncidentType,
    pub severity: Severity,
    pub description: String,
    pub location_mode: LocationMode,
    pub geo: GeoStatus,
    pub(crate) photos: Vec<PhotoAttachment>,
    pub(crate) exif: ExifBatch,
    pub(crate) location_text: String,
    pub(crate) lat_input: String,
    pub(crate) lng_input: String,
    pub(crate) coords: Option<Coordinates>,
}

impl IncidentDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn photos(&self) -> &[PhotoAttachment] {
        &self.photos
    }

    pub fn exif(&self) -> &ExifBatch {
        &self.exif
    }

    pub fn location_text(&self) -> &str {
        &self.location_text
    }

    /// Latitude and longitude inputs as typed, pasted or filled in.
    pub fn coordinate_inputs(&self) -> (&str, &str) {
        (&self.lat_input, &self.lng_input)
    }

    /// Replace the photo selection together with its EXIF results.
    pub fn set_photos(&mut self, photos: Vec<PhotoAttachment>, exif: ExifBatch) {
        self.photos = photos;
        self.exif = exif;
    }

    pub fn clear_photos(&mut self) {
        self.photos.clear();
        self.exif = ExifBatch::default();
    }

    /// Return every field to its initial value.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Check the draft against the rules of its location mode.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.description.trim().is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        if self.photos.len() > MAX_PHOTOS {
            return Err(ValidationError::TooManyPhotos(self.photos.len()));
        }

        match self.location_mode {
            LocationMode::PhotoMetadata => {
                if self.photos.is_empty() {
                    return Err(ValidationError::MissingPhoto);
                }
                match self.exif.primary() {
                    Some(fix) if fix.is_plausible() => Ok(()),
                    _ => Err(ValidationError::NoPhotoGps),
                }
            }
            LocationMode::GpsOrText => {
                if self.location_text.trim().is_empty() {
                    Err(ValidationError::MissingLocationText)
                } else {
                    Ok(())
                }
            }
        }
    }
}
