//! Process-wide incident notifications.
//!
//! The submission pipeline publishes; any open dashboard subscribes and
//! reloads. Publishing with no subscribers is not an error.

use tokio::sync::broadcast;
use tracing::debug;
use trailwatch_core::Incident;

const CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub enum IncidentEvent {
    Submitted(Incident),
    StatusChanged(Incident),
}

impl IncidentEvent {
    pub fn incident(&self) -> &Incident {
        match self {
            IncidentEvent::Submitted(i) | IncidentEvent::StatusChanged(i) => i,
        }
    }
}

/// Cloneable handle to the incident event channel.
#[derive(Debug, Clone)]
pub struct IncidentEvents {
    sender: broadcast::Sender<IncidentEvent>,
}

impl Default for IncidentEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl IncidentEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<IncidentEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of subscribers reached.
    pub fn publish(&self, event: IncidentEvent) -> usize {
        let id = event.incident().id.clone();
        match self.sender.send(event) {
            Ok(n) => {
                debug!(id = %id, subscribers = n, "incident event published");
                n
            }
            Err(_) => {
                debug!(id = %id, "incident event dropped: no subscribers");
                0
            }
        }
    }
}
