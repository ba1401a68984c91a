//! The submission pipeline: validate, upload, confirm, reset.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};
use trailwatch_core::{Incident, IncidentDraft, ValidationError};

use crate::api::{IncidentApi, IncidentForm};
use crate::error::ClientError;
use crate::events::{IncidentEvent, IncidentEvents};

/// How long a terminal status message stays on screen.
pub const STATUS_DISPLAY: Duration = Duration::from_secs(4);

const SUBMITTING: &str = "Submitting incident...";
const SUCCESS: &str = "Incident reported successfully!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionPhase {
    #[default]
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

impl SubmissionPhase {
    pub fn is_busy(self) -> bool {
        matches!(self, SubmissionPhase::Validating | SubmissionPhase::Submitting)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: MessageKind,
    pub shown_at: Instant,
}

impl StatusMessage {
    fn new(text: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            text: text.into(),
            kind,
            shown_at: Instant::now(),
        }
    }

    /// Info messages last as long as the phase that produced them.
    pub fn is_visible(&self, now: Instant) -> bool {
        match self.kind {
            MessageKind::Info => true,
            MessageKind::Success | MessageKind::Error => {
                now.saturating_duration_since(self.shown_at) < STATUS_DISPLAY
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("A submission is already in progress")]
    InFlight,
}

#[derive(Debug, Default)]
struct State {
    phase: SubmissionPhase,
    message: Option<StatusMessage>,
}

/// Submission state for one report form.
///
/// `submit` takes `&self` so the form can keep reading the phase while an
/// upload is in flight; a second submit during that time is refused.
#[derive(Debug, Default)]
pub struct Submission {
    state: Mutex<State>,
}

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.lock().phase
    }

    /// Whether the submit control is enabled.
    pub fn can_submit(&self) -> bool {
        !self.lock().phase.is_busy()
    }

    /// The message to display at `now`, if any.
    pub fn current_message(&self, now: Instant) -> Option<StatusMessage> {
        self.lock().message.clone().filter(|m| m.is_visible(now))
    }

    fn finish(&self, phase: SubmissionPhase, message: StatusMessage) {
        let mut state = self.lock();
        state.phase = phase;
        state.message = Some(message);
    }

    /// Validate `draft`, upload it, and on success reset it and notify subscribers.
    pub async fn submit<A>(
        &self,
        draft: &mut IncidentDraft,
        api: &A,
        events: &IncidentEvents,
    ) -> Result<Incident, SubmitError>
    where
        A: IncidentApi + ?Sized,
    {
        {
            let mut state = self.lock();
            if state.phase.is_busy() {
                return Err(SubmitError::InFlight);
            }
            state.phase = SubmissionPhase::Validating;
        }

        let form = match IncidentForm::from_draft(draft) {
            Ok(form) => form,
            Err(e) => {
                info!(error = %e, "incident draft rejected");
                self.finish(
                    SubmissionPhase::Failed,
                    StatusMessage::new(e.to_string(), MessageKind::Error),
                );
                return Err(e.into());
            }
        };

        {
            let mut state = self.lock();
            state.phase = SubmissionPhase::Submitting;
            state.message = Some(StatusMessage::new(SUBMITTING, MessageKind::Info));
        }
        let guard = InFlightGuard { submission: self };

        let result = api.create_incident(&form).await;
        std::mem::forget(guard);

        match result {
            Ok(incident) => {
                let text = confirmation(&incident);
                info!(id = %incident.id, "incident submitted");
                self.finish(
                    SubmissionPhase::Succeeded,
                    StatusMessage::new(text, MessageKind::Success),
                );
                draft.reset();
                events.publish(IncidentEvent::Submitted(incident.clone()));
                Ok(incident)
            }
            Err(e) => {
                warn!(error = %e, "incident submission failed");
                self.finish(
                    SubmissionPhase::Failed,
                    StatusMessage::new(e.to_string(), MessageKind::Error),
                );
                Err(e.into())
            }
        }
    }
}

/// Marks the submission failed if the upload future is dropped mid-flight.
struct InFlightGuard<'a> {
    submission: &'a Submission,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.submission.finish(
            SubmissionPhase::Failed,
            StatusMessage::new("Submission cancelled", MessageKind::Error),
        );
    }
}

/// Success text, with the stored location when the server returned one.
pub fn confirmation(incident: &Incident) -> String {
    match (incident.latitude, incident.longitude) {
        (Some(lat), Some(lng)) if lat != 0.0 && lng != 0.0 && !lat.is_nan() && !lng.is_nan() => {
            format!("{SUCCESS} Location: {lat:.6}, {lng:.6}")
        }
        _ => SUCCESS.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryBackend;
    use async_trait::async_trait;
    use trailwatch_core::{Coordinates, ExifBatch, LocationMode, PhotoAttachment, Status};

    struct NeverResponds;

    #[async_trait]
    impl IncidentApi for NeverResponds {
        async fn create_incident(&self, _form: &IncidentForm) -> Result<Incident, ClientError> {
            std::future::pending().await
        }

        async fn list_incidents(&self) -> Result<Vec<Incident>, ClientError> {
            Ok(Vec::new())
        }

        async fn update_status(&self, _id: &str, _status: Status) -> Result<Incident, ClientError> {
            Err(ClientError::NotFound)
        }
    }

    fn kandy_draft() -> IncidentDraft {
        let mut draft = IncidentDraft::new();
        draft.description = "Fallen tree blocking the trail".into();
        draft.set_location_text("Kandy");
        draft
    }

    #[tokio::test]
    async fn text_only_report_round_trips() {
        let backend = MemoryBackend::default();
        let events = IncidentEvents::new();
        let mut rx = events.subscribe();
        let submission = Submission::new();
        let mut draft = kandy_draft();

        let incident = submission.submit(&mut draft, &backend, &events).await.unwrap();

        let sent = backend.submissions();
        assert_eq!(sent.len(), 1);
        let names: Vec<_> = sent[0].text_fields().into_iter().map(|(k, _)| k).collect();
        assert!(!names.contains(&"latitude"));
        assert!(!names.contains(&"longitude"));
        assert_eq!(incident.location_text.as_deref(), Some("Kandy"));
        assert_eq!(submission.phase(), SubmissionPhase::Succeeded);
        assert_eq!(draft, IncidentDraft::default());

        let msg = submission.current_message(Instant::now()).unwrap();
        assert_eq!(msg.kind, MessageKind::Success);
        assert_eq!(msg.text, "Incident reported successfully!");

        match rx.recv().await.unwrap() {
            IncidentEvent::Submitted(i) => assert_eq!(i.id, incident.id),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn photo_mode_without_photos_never_calls_backend() {
        let backend = MemoryBackend::default();
        let submission = Submission::new();
        let mut draft = kandy_draft();
        draft.location_mode = LocationMode::PhotoMetadata;

        let err = submission
            .submit(&mut draft, &backend, &IncidentEvents::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::Validation(ValidationError::MissingPhoto)));
        assert!(backend.submissions().is_empty());
        assert_eq!(submission.phase(), SubmissionPhase::Failed);
        assert_eq!(draft.description, "Fallen tree blocking the trail");
        assert!(submission.can_submit());
    }

    #[tokio::test]
    async fn empty_location_text_is_rejected() {
        let backend = MemoryBackend::default();
        let submission = Submission::new();
        let mut draft = kandy_draft();
        draft.set_location_text("  ");

        let err = submission
            .submit(&mut draft, &backend, &IncidentEvents::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SubmitError::Validation(ValidationError::MissingLocationText)
        ));
        let msg = submission.current_message(Instant::now()).unwrap();
        assert_eq!(msg.kind, MessageKind::Error);
        assert!(msg.text.starts_with("Please provide a location description"));
    }

    #[tokio::test]
    async fn geotagged_photo_reports_location() {
        let backend = MemoryBackend::default();
        let submission = Submission::new();
        let mut draft = kandy_draft();
        draft.location_mode = LocationMode::PhotoMetadata;
        draft.set_photos(
            vec![PhotoAttachment::new("trail.jpg", vec![1])],
            ExifBatch::from_results(vec![("trail.jpg", Some(Coordinates::new(6.9, 79.8)))]),
        );

        submission
            .submit(&mut draft, &backend, &IncidentEvents::new())
            .await
            .unwrap();
        let msg = submission.current_message(Instant::now()).unwrap();
        assert_eq!(
            msg.text,
            "Incident reported successfully! Location: 6.900000, 79.800000"
        );
        assert_eq!(backend.submissions()[0].photos.len(), 1);
    }

    #[tokio::test]
    async fn server_rejection_keeps_the_draft() {
        let backend = MemoryBackend::failing("Storage unavailable");
        let submission = Submission::new();
        let mut draft = kandy_draft();

        let err = submission
            .submit(&mut draft, &backend, &IncidentEvents::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Storage unavailable");
        assert_eq!(submission.phase(), SubmissionPhase::Failed);
        assert_eq!(draft.location_text(), "Kandy");
    }

    #[test]
    fn terminal_messages_expire() {
        let msg = StatusMessage::new("done", MessageKind::Success);
        assert!(msg.is_visible(msg.shown_at));
        assert!(msg.is_visible(msg.shown_at + Duration::from_millis(3999)));
        assert!(!msg.is_visible(msg.shown_at + STATUS_DISPLAY));

        let info = StatusMessage::new(SUBMITTING, MessageKind::Info);
        assert!(info.is_visible(info.shown_at + Duration::from_secs(60)));
    }

    #[test]
    fn busy_phases_disable_submit() {
        let submission = Submission::new();
        assert!(submission.can_submit());
        submission.lock().phase = SubmissionPhase::Submitting;
        assert!(!submission.can_submit());
    }

    #[tokio::test]
    async fn second_submit_while_in_flight_is_refused() {
        let backend = MemoryBackend::default();
        let submission = Submission::new();
        submission.lock().phase = SubmissionPhase::Submitting;
        let err = submission
            .submit(&mut kandy_draft(), &backend, &IncidentEvents::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::InFlight));
        assert!(backend.submissions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_upload_leaves_submission_failed() {
        let submission = Submission::new();
        let mut draft = kandy_draft();
        let events = IncidentEvents::new();

        let outcome = tokio::time::timeout(
            Duration::from_secs(30),
            submission.submit(&mut draft, &NeverResponds, &events),
        )
        .await;

        assert!(outcome.is_err());
        assert_eq!(submission.phase(), SubmissionPhase::Failed);
        assert!(submission.can_submit());
        let msg = submission.current_message(Instant::now()).unwrap();
        assert_eq!(msg.kind, MessageKind::Error);
        assert_eq!(msg.text, "Submission cancelled");
        assert_eq!(draft.location_text(), "Kandy");
    }

    #[test]
    fn confirmation_skips_zero_coordinates() {
        let incident = Incident {
            latitude: Some(0.0),
            longitude: Some(79.8),
            ..Default::default()
        };
        assert_eq!(confirmation(&incident), "Incident reported successfully!");
    }
}
