//! SCIM-shaped user directory resources.

use serde::{Deserialize, Serialize};

/// `GET /users` response envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScimListResponse {
    #[serde(rename = "Resources", default)]
    pub resources: Vec<ScimUser>,
    #[serde(rename = "totalResults", default)]
    pub total_results: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimUser {
    pub id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub name: Option<ScimName>,
    #[serde(default)]
    pub emails: Vec<ScimValue>,
    #[serde(default)]
    pub roles: Vec<ScimRole>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub meta: Option<ScimMeta>,
    #[serde(rename = "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User", default)]
    pub enterprise: Option<EnterpriseExtension>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimName {
    pub given_name: Option<String>,
    pub family_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScimValue {
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScimRole {
    pub display: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimMeta {
    pub created: Option<String>,
    pub last_modified: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnterpriseExtension {
    pub job_title: Option<String>,
    pub organization: Option<String>,
    pub department: Option<String>,
    pub manager: Option<ScimManager>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimManager {
    pub display_name: Option<String>,
}

/// A directory entry flattened for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryUser {
    pub id: String,
    pub user_name: String,
    pub email: String,
    pub display_name: String,
    pub given_name: String,
    pub family_name: String,
    pub job_title: String,
    pub organization: String,
    pub manager: String,
    pub department: String,
    pub roles: Vec<String>,
    pub active: bool,
    pub created_at: Option<String>,
    pub last_modified: Option<String>,
}

fn or_na(v: Option<String>) -> String {
    v.filter(|s| !s.is_empty()).unwrap_or_else(|| "N/A".to_string())
}

impl From<ScimUser> for DirectoryUser {
    fn from(user: ScimUser) -> Self {
        let enterprise = user.enterprise.unwrap_or_default();
        let name = user.name.unwrap_or_default();
        let meta = user.meta.unwrap_or_default();
        Self {
            email: or_na(user.emails.into_iter().next().map(|e| e.value)),
            display_name: user
                .display_name
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| user.user_name.clone()),
            given_name: or_na(name.given_name),
            family_name: or_na(name.family_name),
            job_title: enterprise
                .job_title
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "Not Assigned".to_string()),
            organization: or_na(enterprise.organization),
            manager: or_na(enterprise.manager.and_then(|m| m.display_name)),
            department: or_na(enterprise.department),
            roles: user
                .roles
                .into_iter()
                .filter_map(|r| r.display.or(r.value))
                .collect(),
            active: user.active.unwrap_or(false),
            created_at: meta.created,
            last_modified: meta.last_modified,
            id: user.id,
            user_name: user.user_name,
        }
    }
}

/// `POST /users` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub user_name: String,
    pub email: String,
    pub given_name: String,
    pub family_name: String,
    pub password: String,
    pub active: bool,
}
