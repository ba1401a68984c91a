//! The incident backend as seen by the pipeline and the dashboard.

use std::sync::Arc;

use async_trait::async_trait;
use trailwatch_core::{
    Coordinates, Incident, IncidentDraft, IncidentType, LocationMode, PhotoAttachment, Severity,
    Status, ValidationError,
};

use crate::error::ClientError;

/// The multipart payload of `POST /incidents`.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentForm {
    pub incident_type: IncidentType,
    pub severity: Severity,
    pub description: String,
    pub location_text: String,
    pub location_mode: LocationMode,
    pub coordinates: Option<Coordinates>,
    pub photos: Vec<PhotoAttachment>,
}

impl IncidentForm {
    /// Validate a draft and package it for upload.
    pub fn from_draft(draft: &IncidentDraft) -> Result<Self, ValidationError> {
        draft.validate()?;
        Ok(Self {
            incident_type: draft.incident_type,
            severity: draft.severity,
            description: draft.description.clone(),
            location_text: draft.location_text().to_string(),
            location_mode: draft.location_mode,
            coordinates: draft.resolved_location(),
            photos: draft.photos().to_vec(),
        })
    }

    /// Text parts in wire order. `latitude`/`longitude` only when resolved.
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("type", self.incident_type.label().to_string()),
            ("severity", self.severity.label().to_string()),
            ("description", self.description.clone()),
            ("locationText", self.location_text.clone()),
            ("locationMode", self.location_mode.wire_value().to_string()),
        ];
        if let Some(c) = self.coordinates {
            fields.push(("latitude", c.lat.to_string()));
            fields.push(("longitude", c.lng.to_string()));
        }
        fields
    }
}

#[async_trait]
pub trait IncidentApi: Send + Sync {
    /// `POST /incidents` with bearer authorization.
    async fn create_incident(&self, form: &IncidentForm) -> Result<Incident, ClientError>;

    /// `GET /incidents`.
    async fn list_incidents(&self) -> Result<Vec<Incident>, ClientError>;

    /// `PUT /incidents/{id}`.
    async fn update_status(&self, id: &str, status: Status) -> Result<Incident, ClientError>;
}

#[async_trait]
impl<T: IncidentApi + ?Sized> IncidentApi for Arc<T> {
    async fn create_incident(&self, form: &IncidentForm) -> Result<Incident, ClientError> {
        (**self).create_incident(form).await
    }

    async fn list_incidents(&self) -> Result<Vec<Incident>, ClientError> {
        (**self).list_incidents().await
    }

    async fn update_status(&self, id: &str, status: Status) -> Result<Incident, ClientError> {
        (**self).update_status(id, status).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trailwatch_core::ExifBatch;

    #[test]
    fn text_only_report_sends_no_coordinates() {
        let mut draft = IncidentDraft::new();
        draft.description = "Bridge planks missing".into();
        draft.set_location_text("Kandy");
        let form = IncidentForm::from_draft(&draft).unwrap();
        let names: Vec<_> = form.text_fields().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            names,
            vec!["type", "severity", "description", "locationText", "locationMode"]
        );
        assert_eq!(form.location_text, "Kandy");
    }

    #[test]
    fn resolved_coordinates_are_sent_as_decimals() {
        let mut draft = IncidentDraft::new();
        draft.description = "Mud slide".into();
        draft.set_location_text("6.9271, 79.8612 near the tea estate");
        let fields = IncidentForm::from_draft(&draft).unwrap().text_fields();
        assert!(fields.contains(&("latitude", "6.9271".to_string())));
        assert!(fields.contains(&("longitude", "79.8612".to_string())));
        assert!(fields.contains(&("locationMode", "gps_or_text".to_string())));
    }

    #[test]
    fn photo_mode_sends_exif_fix() {
        let mut draft = IncidentDraft::new();
        draft.description = "Erosion".into();
        draft.location_mode = LocationMode::PhotoMetadata;
        draft.set_photos(
            vec![PhotoAttachment::new("a.jpg", vec![1, 2, 3])],
            ExifBatch::from_results(vec![("a.jpg", Some(Coordinates::new(6.9, 79.8)))]),
        );
        let form = IncidentForm::from_draft(&draft).unwrap();
        assert_eq!(form.coordinates, Some(Coordinates::new(6.9, 79.8)));
        assert_eq!(form.photos.len(), 1);
        assert!(form.text_fields().contains(&("locationText", String::new())));
    }

    #[test]
    fn invalid_draft_is_not_packaged() {
        let draft = IncidentDraft::new();
        assert_eq!(
            IncidentForm::from_draft(&draft),
            Err(ValidationError::EmptyDescription)
        );
    }
}
