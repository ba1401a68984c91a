//! Admin dashboard state: the cached incident list, filters, selection and map.

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};
use trailwatch_core::{DashboardView, Incident, MapSync, Status, ViewState, ViewportCommand};

use crate::api::IncidentApi;
use crate::error::ClientError;
use crate::events::IncidentEvent;

pub struct Dashboard<A> {
    api: A,
    incidents: Vec<Incident>,
    state: ViewState,
    map: MapSync,
}

impl<A: IncidentApi> Dashboard<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            incidents: Vec::new(),
            state: ViewState::default(),
            map: MapSync::new(),
        }
    }

    pub fn incidents(&self) -> &[Incident] {
        &self.incidents
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Filters and selection; changing a filter clears the selection.
    pub fn state_mut(&mut self) -> &mut ViewState {
        &mut self.state
    }

    /// Reload from the backend. A failed fetch leaves the list empty.
    pub async fn refresh(&mut self) -> Result<usize, ClientError> {
        match self.api.list_incidents().await {
            Ok(incidents) => {
                info!(count = incidents.len(), "dashboard refreshed");
                self.incidents = incidents;
                Ok(self.incidents.len())
            }
            Err(e) => {
                warn!(error = %e, "failed to load incidents");
                self.incidents.clear();
                Err(e)
            }
        }
    }

    /// Mark an incident resolved, then reload.
    pub async fn resolve(&mut self, id: &str) -> Result<Incident, ClientError> {
        let updated = self.api.update_status(id, Status::Resolved).await?;
        info!(id = %updated.id, status = %updated.status, "incident status updated");
        // A failed reload is already logged and leaves the list empty.
        let _ = self.refresh().await;
        Ok(updated)
    }

    pub fn view(&self) -> DashboardView {
        DashboardView::build(&self.incidents, &self.state)
    }

    /// Next viewport command for the current view, if it changed.
    pub fn map_command(&mut self) -> Option<ViewportCommand> {
        let view = self.view();
        self.map.sync(&view.eligible, view.selected.as_deref())
    }

    /// Every incident event triggers a reload.
    pub async fn handle_event(&mut self, event: &IncidentEvent) {
        debug!(id = %event.incident().id, "incident event received");
        let _ = self.refresh().await;
    }

    /// Wait for the next event and apply it. Returns `false` once the bus is closed.
    pub async fn follow(&mut self, events: &mut broadcast::Receiver<IncidentEvent>) -> bool {
        match events.recv().await {
            Ok(event) => {
                self.handle_event(&event).await;
                true
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "dashboard fell behind incident events");
                let _ = self.refresh().await;
                true
            }
            Err(RecvError::Closed) => false,
        }
    }
}
