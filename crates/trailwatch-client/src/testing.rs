//! In-memory backend for pipeline and dashboard tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use trailwatch_core::{Incident, Status};

use crate::api::{IncidentApi, IncidentForm};
use crate::error::ClientError;

#[derive(Default)]
pub struct MemoryBackend {
    pub incidents: Mutex<Vec<Incident>>,
    pub submitted: Mutex<Vec<IncidentForm>>,
    pub fail_with: Mutex<Option<String>>,
    pub list_calls: AtomicUsize,
}

impl MemoryBackend {
    pub fn with_incidents(incidents: Vec<Incident>) -> Self {
        Self {
            incidents: Mutex::new(incidents),
            ..Default::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Mutex::new(Some(message.to_string())),
            ..Default::default()
        }
    }

    pub fn submissions(&self) -> Vec<IncidentForm> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), ClientError> {
        match self.fail_with.lock().unwrap().clone() {
            Some(msg) => Err(ClientError::Rejected(msg)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl IncidentApi for MemoryBackend {
    async fn create_incident(&self, form: &IncidentForm) -> Result<Incident, ClientError> {
        self.check()?;
        self.submitted.lock().unwrap().push(form.clone());
        let mut incidents = self.incidents.lock().unwrap();
        let incident = Incident {
            id: format!("inc-{}", incidents.len() + 1),
            incident_type: form.incident_type.label().to_string(),
            severity: form.severity.label().to_string(),
            description: form.description.clone(),
            location_text: Some(form.location_text.clone()),
            latitude: form.coordinates.map(|c| c.lat),
            longitude: form.coordinates.map(|c| c.lng),
            created_at: Some("2026-10-19T08:00:00Z".into()),
            ..Default::default()
        };
        incidents.push(incident.clone());
        Ok(incident)
    }

    async fn list_incidents(&self) -> Result<Vec<Incident>, ClientError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.incidents.lock().unwrap().clone())
    }

    async fn update_status(&self, id: &str, status: Status) -> Result<Incident, ClientError> {
        self.check()?;
        let mut incidents = self.incidents.lock().unwrap();
        let incident = incidents
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(ClientError::NotFound)?;
        incident.status = status;
        Ok(incident.clone())
    }
}
