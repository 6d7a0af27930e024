//! Client for the remote spreadsheet API.
//!
//! Every call is a JSON `POST` to a single endpoint:
//!
//! ```text
//! {"action": "updateTask", "caller": "web@example.com", "id": "...", "data": {...}}
//! ```
//!
//! answered by an envelope `{"success": bool, "data": ..., "error": {"kind", "message"}}`.
//! Authorization is the server's job; this client only maps its verdicts onto
//! [`CoreError`].

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{
    AuditEntry, BulkTaskUpdate, BulkUpdateOutcome, Identity, NewProjectData, NewTaskData, Project,
    ProjectCreated, ProjectDeleted, Task, UpdateProjectData, UpdateTaskData,
};

/// Request timeout used when none is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize, Serialize)]
struct ApiError {
    kind: String,
    #[serde(default)]
    message: String,
}

impl From<ApiError> for CoreError {
    fn from(err: ApiError) -> Self {
        match err.kind.as_str() {
            "validation" => CoreError::Validation(err.message),
            "permission_denied" | "forbidden" => CoreError::PermissionDenied(err.message),
            "not_found" => CoreError::NotFound(err.message),
            other => CoreError::Transport(format!("{}: {}", other, err.message)),
        }
    }
}

/// Decodes a response body into the payload of a successful envelope.
fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<T, CoreError> {
    let envelope: Envelope =
        serde_json::from_str(body).map_err(|e| CoreError::Format(format!("invalid envelope: {}", e)))?;

    if !envelope.success {
        return Err(envelope
            .error
            .map(CoreError::from)
            .unwrap_or_else(|| CoreError::Format("failure reported without an error".to_string())));
    }
    serde_json::from_value(envelope.data).map_err(|e| CoreError::Format(format!("invalid data: {}", e)))
}

/// Merges `action`, `caller` and the payload fields into one request body.
fn request_body(action: &str, caller: Option<&str>, payload: Value) -> Value {
    let mut body = json!({ "action": action });
    if let Some(caller) = caller {
        body["caller"] = json!(caller);
    }
    if let (Value::Object(target), Value::Object(fields)) = (&mut body, payload) {
        target.extend(fields);
    }
    body
}

/// Remote sheet store reached over HTTP
pub struct HttpRepository {
    endpoint: String,
    http: Client,
}

impl HttpRepository {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, CoreError> {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            return Err(CoreError::Configuration("the sheet API endpoint is empty".to_string()));
        }
        let http = Client::builder().timeout(timeout).build()?;
        debug!(endpoint, ?timeout, "HttpRepository::new");
        Ok(Self {
            endpoint: endpoint.to_string(),
            http,
        })
    }

    async fn call<T: DeserializeOwned>(&self, action: &str, caller: Option<&str>, payload: Value) -> Result<T, CoreError> {
        debug!(action, caller, "call: sending request");
        let response = self
            .http
            .post(&self.endpoint)
            .json(&request_body(action, caller, payload))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    warn!(action, "call: request timed out");
                    CoreError::Transport(format!("{} timed out", action))
                } else {
                    CoreError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(action, %status, "call: non-success status");
            return Err(CoreError::Transport(format!("{} failed with HTTP {}", action, status)));
        }

        let body = response.text().await?;
        debug!(action, bytes = body.len(), "call: response received");
        decode_envelope(&body)
    }
}

#[async_trait]
impl super::IdentityRepository for HttpRepository {
    async fn verify_identity(&self, email: &str) -> Result<Option<Identity>, CoreError> {
        let email = email.trim().to_lowercase();
        self.call("verifyIdentity", Some(email.as_str()), json!({ "email": email })).await
    }

    async fn register_user(&self, caller: Option<&Identity>, user: Identity) -> Result<Identity, CoreError> {
        let identity: Identity = self
            .call("registerUser", caller.map(|c| c.email.as_str()), json!({ "user": user }))
            .await?;
        info!(email = %identity.email, "user registered remotely");
        Ok(identity)
    }
}

#[async_trait]
impl super::ProjectRepository for HttpRepository {
    async fn list_projects(&self, caller: &Identity) -> Result<Vec<Project>, CoreError> {
        self.call("listProjects", Some(caller.email.as_str()), json!({})).await
    }

    async fn create_project(&self, caller: &Identity, data: NewProjectData) -> Result<ProjectCreated, CoreError> {
        self.call("createProject", Some(caller.email.as_str()), json!({ "data": data })).await
    }

    async fn update_project(&self, caller: &Identity, id: Uuid, data: UpdateProjectData) -> Result<Project, CoreError> {
        self.call("updateProject", Some(caller.email.as_str()), json!({ "id": id, "data": data }))
            .await
    }

    async fn delete_project(&self, caller: &Identity, id: Uuid) -> Result<ProjectDeleted, CoreError> {
        self.call("deleteProject", Some(caller.email.as_str()), json!({ "id": id })).await
    }
}

#[async_trait]
impl super::TaskRepository for HttpRepository {
    async fn list_tasks(&self, caller: &Identity, project_id: Uuid) -> Result<Vec<Task>, CoreError> {
        self.call("listTasks", Some(caller.email.as_str()), json!({ "projectId": project_id }))
            .await
    }

    async fn list_all_tasks(&self, caller: &Identity) -> Result<Vec<Task>, CoreError> {
        self.call("listAllTasks", Some(caller.email.as_str()), json!({})).await
    }

    async fn find_task(&self, caller: &Identity, id: Uuid) -> Result<Option<Task>, CoreError> {
        self.call("getTask", Some(caller.email.as_str()), json!({ "id": id })).await
    }

    async fn create_task(&self, caller: &Identity, data: NewTaskData) -> Result<Task, CoreError> {
        data.validate()?;
        self.call("createTask", Some(caller.email.as_str()), json!({ "data": data })).await
    }

    async fn update_task(&self, caller: &Identity, id: Uuid, data: UpdateTaskData) -> Result<Task, CoreError> {
        self.call("updateTask", Some(caller.email.as_str()), json!({ "id": id, "data": data }))
            .await
    }

    async fn delete_task(&self, caller: &Identity, id: Uuid) -> Result<Uuid, CoreError> {
        let _: Value = self.call("deleteTask", Some(caller.email.as_str()), json!({ "id": id })).await?;
        Ok(id)
    }

    async fn bulk_update_tasks(
        &self,
        caller: &Identity,
        ids: &[Uuid],
        update: BulkTaskUpdate,
    ) -> Result<BulkUpdateOutcome, CoreError> {
        update.validate()?;
        self.call(
            "bulkUpdateTasks",
            Some(caller.email.as_str()),
            json!({ "ids": ids, "data": update }),
        )
        .await
    }
}

#[async_trait]
impl super::AuditRepository for HttpRepository {
    async fn task_history(&self, caller: &Identity, task_id: Uuid) -> Result<Vec<AuditEntry>, CoreError> {
        self.call("taskHistory", Some(caller.email.as_str()), json!({ "taskId": task_id }))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use chrono::NaiveDate;

    #[test]
    fn test_decode_success_payload() {
        let body = r#"{"success": true, "data": {"email": "web@example.com", "name": "WEB", "role": "member"}}"#;
        let identity: Identity = decode_envelope(body).unwrap();
        assert_eq!(identity.name, "WEB");
        assert_eq!(identity.role, Role::Member);
    }

    #[test]
    fn test_decode_null_data_as_none() {
        let body = r#"{"success": true, "data": null}"#;
        let identity: Option<Identity> = decode_envelope(body).unwrap();
        assert!(identity.is_none());

        let body = r#"{"success": true}"#;
        let identity: Option<Identity> = decode_envelope(body).unwrap();
        assert!(identity.is_none());
    }

    #[test]
    fn test_decode_maps_error_kinds() {
        let denied = r#"{"success": false, "error": {"kind": "permission_denied", "message": "not your task"}}"#;
        assert!(matches!(
            decode_envelope::<Value>(denied),
            Err(CoreError::PermissionDenied(m)) if m == "not your task"
        ));

        let invalid = r#"{"success": false, "error": {"kind": "validation", "message": "note required"}}"#;
        assert!(matches!(decode_envelope::<Value>(invalid), Err(CoreError::Validation(_))));

        let missing = r#"{"success": false, "error": {"kind": "not_found", "message": "task"}}"#;
        assert!(matches!(decode_envelope::<Value>(missing), Err(CoreError::NotFound(_))));

        let unknown = r#"{"success": false, "error": {"kind": "quota", "message": "try later"}}"#;
        assert!(matches!(decode_envelope::<Value>(unknown), Err(CoreError::Transport(_))));
    }

    #[test]
    fn test_decode_rejects_malformed_bodies() {
        assert!(matches!(decode_envelope::<Value>("<html>oops</html>"), Err(CoreError::Format(_))));
        assert!(matches!(decode_envelope::<Value>(r#"{"success": false}"#), Err(CoreError::Format(_))));
        assert!(matches!(
            decode_envelope::<Vec<Task>>(r#"{"success": true, "data": {"not": "a list"}}"#),
            Err(CoreError::Format(_))
        ));
    }

    fn sheet_row(deadline: &str) -> String {
        format!(
            r#"{{"id": "{}", "projectId": "{}", "title": "Press kit", "phase": "Launch", "owner": "MARKETING",
                "deadline": {}, "status": "In Progress", "estHours": 4.0, "actualHours": null,
                "impactScore": null, "timeliness": null,
                "createdAt": "2026-03-01T09:00:00Z", "updatedAt": "2026-03-02T09:00:00Z"}}"#,
            Uuid::now_v7(),
            Uuid::now_v7(),
            deadline
        )
    }

    #[test]
    fn test_decode_tasks_with_sheet_deadlines() {
        let body = format!(
            r#"{{"success": true, "data": [{}, {}, {}]}}"#,
            sheet_row(r#""""#),
            sheet_row(r#""2026-04-30T00:00:00.000Z""#),
            sheet_row(r#""2026-05-02""#)
        );
        let tasks: Vec<Task> = decode_envelope(&body).unwrap();
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0].deadline, None);
        assert_eq!(tasks[1].deadline, NaiveDate::from_ymd_opt(2026, 4, 30));
        assert_eq!(tasks[2].deadline, NaiveDate::from_ymd_opt(2026, 5, 2));
    }

    #[test]
    fn test_decode_tasks_with_null_or_garbled_deadline() {
        let null_deadline = format!(r#"{{"success": true, "data": [{}]}}"#, sheet_row("null"));
        let tasks: Vec<Task> = decode_envelope(&null_deadline).unwrap();
        assert_eq!(tasks[0].deadline, None);

        let garbled = format!(r#"{{"success": true, "data": [{}]}}"#, sheet_row(r#""next week""#));
        assert!(matches!(decode_envelope::<Vec<Task>>(&garbled), Err(CoreError::Format(_))));
    }

    #[test]
    fn test_request_body_flattens_payload() {
        let id = Uuid::now_v7();
        let body = request_body("deleteTask", Some("web@example.com"), json!({ "id": id }));
        assert_eq!(body["action"], "deleteTask");
        assert_eq!(body["caller"], "web@example.com");
        assert_eq!(body["id"], json!(id));

        let anonymous = request_body("registerUser", None, json!({}));
        assert!(anonymous.get("caller").is_none());
    }

    #[test]
    fn test_update_payload_distinguishes_cleared_fields() {
        let update = UpdateTaskData {
            deadline: Some(None),
            audit_note: Some("descoped".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["deadline"], Value::Null);
        assert!(value.get("actualHours").is_none());

        let back: UpdateTaskData = serde_json::from_value(value).unwrap();
        assert_eq!(back.deadline, Some(None));
        assert_eq!(back.actual_hours, None);
    }

    #[test]
    fn test_empty_endpoint_is_configuration_error() {
        assert!(matches!(
            HttpRepository::new("  ", Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            Err(CoreError::Configuration(_))
        ));
    }
}
