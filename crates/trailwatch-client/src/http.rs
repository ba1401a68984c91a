//! HTTP client for the incident backend and its user directory proxy.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{info, warn};
use trailwatch_core::{AppConfig, Incident, Status};

use crate::api::{IncidentApi, IncidentForm};
use crate::error::ClientError;
use crate::users::{DirectoryUser, NewUser, ScimListResponse};

/// Client for the REST surface behind `resourceServerURL`.
///
/// Every endpoint is resolved against the base URL given at construction.
pub struct IncidentClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl IncidentClient {
    /// `base_url` should be like `http://localhost:8000/api` (trailing slash is trimmed).
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.resource_server_url.clone())
    }

    /// Bearer token attached to authenticated calls.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, req: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let token = self.token.as_deref().ok_or(ClientError::MissingToken)?;
        Ok(req.bearer_auth(token))
    }

    /// Attach the token when one is configured; the request goes out either way.
    fn maybe_authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match self.token.as_deref() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn multipart(form: &IncidentForm) -> Result<Form, ClientError> {
        let mut body = Form::new();
        for (name, value) in form.text_fields() {
            body = body.text(name, value);
        }
        for photo in &form.photos {
            let part = Part::bytes(photo.bytes.clone())
                .file_name(photo.filename.clone())
                .mime_str(&photo.content_type)?;
            body = body.part("photos", part);
        }
        Ok(body)
    }

    /// List the user directory (`GET /users`).
    pub async fn list_users(&self) -> Result<Vec<DirectoryUser>, ClientError> {
        let url = self.url("users");
        info!(url = %url, "fetching user directory");
        let resp = self.authorized(self.client.get(&url))?.send().await?;
        let list: ScimListResponse = json_or_error(resp).await?;
        info!(count = list.resources.len(), "fetched users");
        Ok(list.resources.into_iter().map(DirectoryUser::from).collect())
    }

    /// Create a directory user (`POST /users`).
    pub async fn create_user(&self, user: &NewUser) -> Result<(), ClientError> {
        let url = self.url("users");
        info!(url = %url, user_name = %user.user_name, "creating user");
        let resp = self.authorized(self.client.post(&url))?.json(user).send().await?;
        ensure_success(resp).await?;
        Ok(())
    }

    /// Delete a directory user (`DELETE /users/{id}`).
    pub async fn delete_user(&self, id: &str) -> Result<(), ClientError> {
        let url = self.url(&format!("users/{id}"));
        info!(url = %url, "deleting user");
        let resp = self.authorized(self.client.delete(&url))?.send().await?;
        ensure_success(resp).await?;
        Ok(())
    }
}

#[async_trait]
impl IncidentApi for IncidentClient {
    async fn create_incident(&self, form: &IncidentForm) -> Result<Incident, ClientError> {
        let url = self.url("incidents");
        info!(
            url = %url,
            photos = form.photos.len(),
            has_coordinates = form.coordinates.is_some(),
            "submitting incident"
        );
        let body = Self::multipart(form)?;
        let resp = self
            .authorized(self.client.post(&url))?
            .multipart(body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "incident submission rejected");
            return Err(ClientError::rejected(&body));
        }
        let incident: Incident = resp.json().await?;
        info!(id = %incident.id, "incident created");
        Ok(incident)
    }

    async fn list_incidents(&self) -> Result<Vec<Incident>, ClientError> {
        let url = self.url("incidents");
        info!(url = %url, "fetching incidents");
        let resp = self.maybe_authorized(self.client.get(&url)).send().await?;
        let incidents: Vec<Incident> = json_or_error(resp).await?;
        info!(count = incidents.len(), "fetched incidents");
        Ok(incidents)
    }

    async fn update_status(&self, id: &str, status: Status) -> Result<Incident, ClientError> {
        let url = self.url(&format!("incidents/{id}"));
        info!(url = %url, status = %status, "updating incident status");
        let resp = self
            .maybe_authorized(self.client.put(&url))
            .json(&serde_json::json!({ "status": status.label() }))
            .send()
            .await?;
        json_or_error(resp).await
    }
}

async fn ensure_success(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), "request failed");
    Err(ClientError::from_status(status.as_u16(), body))
}

async fn json_or_error<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let resp = ensure_success(resp).await?;
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_trims_trailing_slash() {
        let client = IncidentClient::new("http://localhost:8000/api/".into());
        assert_eq!(client.base_url(), "http://localhost:8000/api");
        assert_eq!(client.url("/incidents"), "http://localhost:8000/api/incidents");
        assert_eq!(client.url("incidents/42"), "http://localhost:8000/api/incidents/42");
    }

    #[test]
    fn client_uses_configured_resource_server() {
        let config = AppConfig {
            resource_server_url: "https://trail.example/api".into(),
            ..Default::default()
        };
        let client = IncidentClient::from_config(&config);
        assert_eq!(client.url("users"), "https://trail.example/api/users");
    }

    #[test]
    fn blank_token_counts_as_missing() {
        let client = IncidentClient::new("http://localhost".into()).with_token(Some("  ".into()));
        let req = client.client.get("http://localhost/users");
        assert!(matches!(client.authorized(req), Err(ClientError::MissingToken)));
    }

    #[tokio::test]
    async fn create_without_token_fails_before_sending() {
        let client = IncidentClient::new("http://127.0.0.1:9".into());
        let form = IncidentForm {
            incident_type: Default::default(),
            severity: Default::default(),
            description: "x".into(),
            location_text: "Kandy".into(),
            location_mode: Default::default(),
            coordinates: None,
            photos: vec![],
        };
        assert!(matches!(
            client.create_incident(&form).await,
            Err(ClientError::MissingToken)
        ));
    }
}
