use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Authentication token missing. Please log in again.")]
    MissingToken,

    #[error("unauthorized (401): {0}")]
    Unauthorized(String),

    #[error("forbidden (403): insufficient scope: {0}")]
    Forbidden(String),

    #[error("not found")]
    NotFound,

    #[error("validation error: {0}")]
    Validation(String),

    /// The backend refused a submission; carries its error text.
    #[error("{0}")]
    Rejected(String),

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    messages: Option<serde_json::Value>,
}

impl ClientError {
    /// Map a non-success status from the REST surface.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 => ClientError::Unauthorized(body),
            403 => ClientError::Forbidden(body),
            404 => ClientError::NotFound,
            422 => {
                let messages = serde_json::from_str::<ErrorBody>(&body)
                    .ok()
                    .and_then(|b| b.messages)
                    .map(|m| m.to_string())
                    .unwrap_or(body);
                ClientError::Validation(messages)
            }
            _ => ClientError::Server { status, body },
        }
    }

    /// A failed incident submission: the server's `error` text, or a generic message.
    pub fn rejected(body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "Submission failed".to_string());
        ClientError::Rejected(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert!(matches!(ClientError::from_status(401, String::new()), ClientError::Unauthorized(_)));
        assert!(matches!(ClientError::from_status(403, String::new()), ClientError::Forbidden(_)));
        assert!(matches!(ClientError::from_status(404, String::new()), ClientError::NotFound));
        assert!(matches!(
            ClientError::from_status(500, "boom".into()),
            ClientError::Server { status: 500, .. }
        ));
    }

    #[test]
    fn validation_messages_are_extracted() {
        let err = ClientError::from_status(422, r#"{"messages": {"email": ["taken"]}}"#.into());
        let ClientError::Validation(msg) = err else {
            panic!("expected validation error");
        };
        assert_eq!(msg, r#"{"email":["taken"]}"#);

        let err = ClientError::from_status(422, "plain text".into());
        assert_eq!(err.to_string(), "validation error: plain text");
    }

    #[test]
    fn rejected_uses_server_error_text() {
        assert_eq!(
            ClientError::rejected(r#"{"error": "Photo too large"}"#).to_string(),
            "Photo too large"
        );
        assert_eq!(ClientError::rejected("<html>").to_string(), "Submission failed");
        assert_eq!(ClientError::rejected(r#"{"error": ""}"#).to_string(), "Submission failed");
    }
}
