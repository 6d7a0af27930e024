use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::error::CoreError;
use crate::timezone::parse_sheet_date;

/// Teams a task can be owned by, in the order dashboards list them.
pub const DEFAULT_TEAMS: [&str; 6] = ["WEB", "MARKETING", "SALES", "DESIGN", "CONTENT", "OPERATIONS"];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    /// Lower value = higher priority
    pub priority: i32,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
pub enum TaskStatus {
    #[serde(rename = "Not Started")]
    #[sqlx(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    #[sqlx(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Done")]
    #[sqlx(rename = "Done")]
    Done,
    #[serde(rename = "Blocked")]
    #[sqlx(rename = "Blocked")]
    Blocked,
    #[serde(rename = "Help Me")]
    #[sqlx(rename = "Help Me")]
    HelpMe,
    #[serde(rename = "On Hold")]
    #[sqlx(rename = "On Hold")]
    OnHold,
    #[serde(rename = "Cancelled")]
    #[sqlx(rename = "Cancelled")]
    Cancelled,
}

impl TaskStatus {
    /// Every status, in histogram order.
    pub const ALL: [TaskStatus; 7] = [
        TaskStatus::NotStarted,
        TaskStatus::InProgress,
        TaskStatus::Done,
        TaskStatus::Blocked,
        TaskStatus::HelpMe,
        TaskStatus::OnHold,
        TaskStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "Not Started",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
            TaskStatus::Blocked => "Blocked",
            TaskStatus::HelpMe => "Help Me",
            TaskStatus::OnHold => "On Hold",
            TaskStatus::Cancelled => "Cancelled",
        }
    }

    /// Done or Cancelled: no longer expected to be delivered.
    pub fn is_closed(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Cancelled)
    }

    /// Started but not finished.
    pub fn is_wip(&self) -> bool {
        matches!(self, TaskStatus::InProgress | TaskStatus::HelpMe | TaskStatus::Blocked)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid task status: {0}")]
pub struct ParseTaskStatusError(String);

impl FromStr for TaskStatus {
    type Err = ParseTaskStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "notstarted" | "todo" => Ok(TaskStatus::NotStarted),
            "inprogress" | "wip" => Ok(TaskStatus::InProgress),
            "done" | "completed" => Ok(TaskStatus::Done),
            "blocked" => Ok(TaskStatus::Blocked),
            "helpme" | "help" => Ok(TaskStatus::HelpMe),
            "onhold" => Ok(TaskStatus::OnHold),
            "cancelled" | "canceled" => Ok(TaskStatus::Cancelled),
            _ => Err(ParseTaskStatusError(s.to_string())),
        }
    }
}

/// Project lifecycle stage. Variants are declared in delivery order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
pub enum Phase {
    #[sqlx(rename = "Planning")]
    Planning,
    #[sqlx(rename = "Design")]
    Design,
    #[sqlx(rename = "Development")]
    Development,
    #[sqlx(rename = "Testing")]
    Testing,
    #[sqlx(rename = "Launch")]
    Launch,
    #[serde(rename = "Post-Launch")]
    #[sqlx(rename = "Post-Launch")]
    PostLaunch,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Planning,
        Phase::Design,
        Phase::Development,
        Phase::Testing,
        Phase::Launch,
        Phase::PostLaunch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Planning => "Planning",
            Phase::Design => "Design",
            Phase::Development => "Development",
            Phase::Testing => "Testing",
            Phase::Launch => "Launch",
            Phase::PostLaunch => "Post-Launch",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid phase: {0}")]
pub struct ParsePhaseError(String);

impl FromStr for Phase {
    type Err = ParsePhaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '_'], "-").as_str() {
            "planning" => Ok(Phase::Planning),
            "design" => Ok(Phase::Design),
            "development" | "dev" => Ok(Phase::Development),
            "testing" | "qa" => Ok(Phase::Testing),
            "launch" => Ok(Phase::Launch),
            "post-launch" | "postlaunch" => Ok(Phase::PostLaunch),
            _ => Err(ParsePhaseError(s.to_string())),
        }
    }
}

/// Delivery of a completed task relative to its deadline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
pub enum Timeliness {
    #[sqlx(rename = "Early")]
    Early,
    #[serde(rename = "On-Time")]
    #[sqlx(rename = "On-Time")]
    OnTime,
    #[sqlx(rename = "Delayed")]
    Delayed,
}

impl Timeliness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeliness::Early => "Early",
            Timeliness::OnTime => "On-Time",
            Timeliness::Delayed => "Delayed",
        }
    }

    pub fn is_on_time(&self) -> bool {
        matches!(self, Timeliness::Early | Timeliness::OnTime)
    }
}

impl fmt::Display for Timeliness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid timeliness: {0}")]
pub struct ParseTimelinessError(String);

impl FromStr for Timeliness {
    type Err = ParseTimelinessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '_'], "-").as_str() {
            "early" => Ok(Timeliness::Early),
            "on-time" | "ontime" => Ok(Timeliness::OnTime),
            "delayed" | "late" => Ok(Timeliness::Delayed),
            _ => Err(ParseTimelinessError(s.to_string())),
        }
    }
}

/// Open help request; only present while the task status is `Help Me`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HelpRequest {
    pub requested_at: DateTime<Utc>,
    /// Team asked to help
    pub assignee: String,
    pub details: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub phase: Phase,
    pub owner: String,
    /// Blank sheet cells and full timestamps both decode.
    #[serde(default, deserialize_with = "deserialize_sheet_date")]
    pub deadline: Option<NaiveDate>,
    pub status: TaskStatus,
    pub est_hours: f64,
    pub actual_hours: Option<f64>,
    pub impact_score: Option<u8>,
    pub timeliness: Option<Timeliness>,
    /// Notes/Result column; audit lines are appended here
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub feedback_to_team: String,
    /// Owner/Project feedback column
    #[serde(default)]
    pub owner_feedback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<HelpRequest>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn deserialize_sheet_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_sheet_date(&raw).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

impl Default for Task {
    fn default() -> Self {
        Self {
            id: Uuid::now_v7(),
            project_id: Uuid::nil(),
            title: String::new(),
            phase: Phase::Planning,
            owner: String::new(),
            deadline: None,
            status: TaskStatus::NotStarted,
            est_hours: 0.0,
            actual_hours: None,
            impact_score: None,
            timeliness: None,
            notes: String::new(),
            feedback_to_team: String::new(),
            owner_feedback: String::new(),
            help: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

/// Deadline or Status: the fields whose changes are audited.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AuditField {
    Deadline,
    Status,
}

impl fmt::Display for AuditField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditField::Deadline => write!(f, "Deadline"),
            AuditField::Status => write!(f, "Status"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub field: AuditField,
    pub before: Option<String>,
    pub after: Option<String>,
}

impl Task {
    /// Builds a fresh task from creation data. The id is issued here, once.
    pub fn create(data: NewTaskData, now: DateTime<Utc>) -> Result<Task, CoreError> {
        data.validate()?;
        let status = data.status.unwrap_or(TaskStatus::NotStarted);
        let help = match (status, data.help) {
            (TaskStatus::HelpMe, Some(help)) => Some(help.into_request(now)),
            (TaskStatus::HelpMe, None) => {
                return Err(CoreError::validation("a Help Me task needs a help assignee"))
            }
            (_, Some(_)) => {
                return Err(CoreError::validation(
                    "help details are only accepted for Help Me tasks",
                ))
            }
            (_, None) => None,
        };

        Ok(Task {
            id: Uuid::now_v7(),
            project_id: data.project_id,
            title: data.title.trim().to_string(),
            phase: data.phase.unwrap_or(Phase::Planning),
            owner: data.owner.trim().to_string(),
            deadline: data.deadline,
            status,
            est_hours: data.est_hours.unwrap_or(0.0),
            actual_hours: data.actual_hours,
            impact_score: data.impact_score,
            timeliness: if status == TaskStatus::Done { data.timeliness } else { None },
            notes: data.notes.unwrap_or_default(),
            feedback_to_team: data.feedback_to_team.unwrap_or_default(),
            owner_feedback: String::new(),
            help,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies an update and returns the audited field changes.
    ///
    /// The update is staged on a copy; `self` is untouched when validation
    /// fails. Deadline and status changes require `audit_note`, which is
    /// appended to the notes together with the before/after values.
    pub fn apply_update(
        &mut self,
        update: &UpdateTaskData,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<FieldChange>, CoreError> {
        let mut next = self.clone();
        let mut changes = Vec::new();

        if let Some(title) = &update.title {
            if title.trim().is_empty() {
                return Err(CoreError::validation("title cannot be empty"));
            }
            next.title = title.trim().to_string();
        }
        if let Some(phase) = update.phase {
            next.phase = phase;
        }
        if let Some(owner) = &update.owner {
            if owner.trim().is_empty() {
                return Err(CoreError::validation("owner cannot be empty"));
            }
            next.owner = owner.trim().to_string();
        }
        if let Some(deadline) = update.deadline {
            if deadline != self.deadline {
                changes.push(FieldChange {
                    field: AuditField::Deadline,
                    before: self.deadline.map(|d| d.to_string()),
                    after: deadline.map(|d| d.to_string()),
                });
            }
            next.deadline = deadline;
        }
        if let Some(status) = update.status {
            if status != self.status {
                changes.push(FieldChange {
                    field: AuditField::Status,
                    before: Some(self.status.to_string()),
                    after: Some(status.to_string()),
                });
            }
            next.status = status;
        }
        if let Some(hours) = update.est_hours {
            next.est_hours = hours;
        }
        if let Some(hours) = update.actual_hours {
            next.actual_hours = hours;
        }
        if let Some(score) = update.impact_score {
            next.impact_score = score;
        }
        if let Some(timeliness) = update.timeliness {
            next.timeliness = timeliness;
        }
        if let Some(feedback) = &update.feedback_to_team {
            next.feedback_to_team = feedback.clone();
        }
        if let Some(feedback) = &update.owner_feedback {
            next.owner_feedback = feedback.clone();
        }

        match (&update.help, next.status) {
            (Some(help), TaskStatus::HelpMe) => next.help = Some(help.clone().into_request(now)),
            (Some(_), _) => {
                return Err(CoreError::validation(
                    "help details are only accepted for Help Me tasks",
                ))
            }
            (None, TaskStatus::HelpMe) if next.help.is_none() => {
                return Err(CoreError::validation("a Help Me task needs a help assignee"))
            }
            (None, TaskStatus::HelpMe) => {}
            (None, _) => next.help = None,
        }
        if next.status != TaskStatus::Done {
            next.timeliness = None;
        }

        next.validate()?;

        if !changes.is_empty() {
            let note = update
                .audit_note
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .ok_or_else(|| {
                    CoreError::validation("changing the deadline or status requires a note")
                })?;
            for change in &changes {
                next.append_note(&format!(
                    "[{} {}] {}: {} -> {}: {}",
                    now.date_naive(),
                    actor,
                    change.field,
                    change.before.as_deref().unwrap_or("none"),
                    change.after.as_deref().unwrap_or("none"),
                    note
                ));
            }
        }

        next.updated_at = now;
        *self = next;
        Ok(changes)
    }

    fn append_note(&mut self, line: &str) {
        if !self.notes.is_empty() {
            self.notes.push('\n');
        }
        self.notes.push_str(line);
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        validate_hours("estimated hours", Some(self.est_hours))?;
        validate_hours("actual hours", self.actual_hours)?;
        validate_impact(self.impact_score)?;
        if self.help.is_some() && self.status != TaskStatus::HelpMe {
            return Err(CoreError::validation("help fields set on a task that is not Help Me"));
        }
        Ok(())
    }
}

fn validate_hours(label: &str, hours: Option<f64>) -> Result<(), CoreError> {
    match hours {
        Some(h) if !h.is_finite() || h < 0.0 => Err(CoreError::Validation(format!(
            "{} must be a non-negative number, got {}",
            label, h
        ))),
        _ => Ok(()),
    }
}

fn validate_impact(score: Option<u8>) -> Result<(), CoreError> {
    match score {
        Some(s) if !(1..=5).contains(&s) => Err(CoreError::Validation(format!(
            "impact score must be between 1 and 5, got {}",
            s
        ))),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HelpRequestData {
    pub assignee: String,
    #[serde(default)]
    pub details: String,
}

impl HelpRequestData {
    fn into_request(self, now: DateTime<Utc>) -> HelpRequest {
        HelpRequest {
            requested_at: now,
            assignee: self.assignee.trim().to_string(),
            details: self.details,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTaskData {
    pub project_id: Uuid,
    pub title: String,
    pub owner: String,
    pub phase: Option<Phase>,
    pub deadline: Option<NaiveDate>,
    pub status: Option<TaskStatus>,
    pub est_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub impact_score: Option<u8>,
    pub timeliness: Option<Timeliness>,
    pub notes: Option<String>,
    pub feedback_to_team: Option<String>,
    pub help: Option<HelpRequestData>,
}

impl NewTaskData {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.title.trim().is_empty() {
            return Err(CoreError::validation("task title is required"));
        }
        if self.owner.trim().is_empty() {
            return Err(CoreError::validation("task owner is required"));
        }
        validate_hours("estimated hours", self.est_hours)?;
        validate_hours("actual hours", self.actual_hours)?;
        validate_impact(self.impact_score)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskData {
    pub title: Option<String>,
    pub phase: Option<Phase>,
    pub owner: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    pub deadline: Option<Option<NaiveDate>>,
    pub status: Option<TaskStatus>,
    pub est_hours: Option<f64>,
    #[serde(default, with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    pub actual_hours: Option<Option<f64>>,
    #[serde(default, with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    pub impact_score: Option<Option<u8>>,
    #[serde(default, with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    pub timeliness: Option<Option<Timeliness>>,
    pub feedback_to_team: Option<String>,
    pub owner_feedback: Option<String>,
    pub help: Option<HelpRequestData>,
    /// Required when the deadline or status changes
    pub audit_note: Option<String>,
}

/// Changes applied to every task of a bulk request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkTaskUpdate {
    #[serde(default, with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    pub deadline: Option<Option<NaiveDate>>,
    pub status: Option<TaskStatus>,
    pub audit_note: Option<String>,
}

impl BulkTaskUpdate {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.deadline.is_none() && self.status.is_none() {
            return Err(CoreError::validation("bulk update needs a deadline or a status"));
        }
        if self.audit_note.as_deref().map_or(true, |n| n.trim().is_empty()) {
            return Err(CoreError::validation("bulk updates require a note"));
        }
        Ok(())
    }

    pub fn to_update(&self) -> UpdateTaskData {
        UpdateTaskData {
            deadline: self.deadline,
            status: self.status,
            audit_note: self.audit_note.clone(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateOutcome {
    pub updated: usize,
    /// (task id, reason) for every rejected task
    pub failures: Vec<(String, String)>,
}

impl BulkUpdateOutcome {
    pub fn into_result(self) -> Result<usize, CoreError> {
        if self.failures.is_empty() {
            Ok(self.updated)
        } else {
            Err(CoreError::PartialFailure {
                updated: self.updated,
                failed: self.failures.len(),
                details: self.failures,
            })
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProjectData {
    pub name: String,
    pub priority: i32,
    pub details: Option<String>,
    /// Seed tasks; their `project_id` is overwritten with the new project's id
    #[serde(default)]
    pub tasks: Vec<NewTaskData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectData {
    pub name: Option<String>,
    pub priority: Option<i32>,
    #[serde(default, with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    pub details: Option<Option<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCreated {
    pub project: Project,
    pub tasks_added: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDeleted {
    pub id: Uuid,
    pub tasks_deleted: usize,
}

/// The standard seed list offered when a project is created from the template.
pub fn template_tasks() -> Vec<NewTaskData> {
    [
        ("Kick-off and scope sign-off", Phase::Planning, "OPERATIONS", 2.0),
        ("Audience and messaging brief", Phase::Planning, "MARKETING", 4.0),
        ("Wireframes and visual direction", Phase::Design, "DESIGN", 8.0),
        ("Copy and content drafts", Phase::Design, "CONTENT", 6.0),
        ("Build and integration", Phase::Development, "WEB", 16.0),
        ("QA pass and fixes", Phase::Testing, "WEB", 6.0),
        ("Launch announcement", Phase::Launch, "MARKETING", 3.0),
        ("Sales enablement follow-up", Phase::PostLaunch, "SALES", 3.0),
    ]
    .into_iter()
    .map(|(title, phase, owner, hours)| NewTaskData {
        title: title.to_string(),
        owner: owner.to_string(),
        phase: Some(phase),
        est_hours: Some(hours),
        ..Default::default()
    })
    .collect()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Member => write!(f, "member"),
        }
    }
}

/// A verified caller. Members act for the team named by `name`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Identity {
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Update,
    BulkUpdate,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditAction::Update => write!(f, "update"),
            AuditAction::BulkUpdate => write!(f, "bulk update"),
        }
    }
}

/// One append-only history row for a deadline or status change.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: i64,
    pub task_id: Uuid,
    pub actor: String,
    pub action: AuditAction,
    pub field: AuditField,
    pub before_value: Option<String>,
    pub after_value: Option<String>,
    pub note: String,
    pub recorded_at: DateTime<Utc>,
}

/// Dashboard tuning shared by the engine and the aggregator.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Teams in display order
    pub teams: Vec<String>,
    /// Days ahead of today (inclusive) that count as "warning"
    pub warning_window_days: i64,
    /// Whether an unreachable owner selection is reset like project/status
    pub reset_owner: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            teams: DEFAULT_TEAMS.iter().map(|t| t.to_string()).collect(),
            warning_window_days: 10,
            reset_owner: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task() -> Task {
        Task {
            title: "Landing page".to_string(),
            owner: "WEB".to_string(),
            deadline: NaiveDate::from_ymd_opt(2026, 3, 1),
            ..Default::default()
        }
    }

    #[test]
    fn test_status_parsing_accepts_sheet_spellings() {
        assert_eq!("Not Started".parse::<TaskStatus>(), Ok(TaskStatus::NotStarted));
        assert_eq!("in-progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert_eq!("HELP ME".parse::<TaskStatus>(), Ok(TaskStatus::HelpMe));
        assert!("finished".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_phase_order_follows_delivery_sequence() {
        let mut phases = vec![Phase::Launch, Phase::Planning, Phase::Testing, Phase::Design];
        phases.sort();
        assert_eq!(phases, vec![Phase::Planning, Phase::Design, Phase::Testing, Phase::Launch]);
        assert_eq!("post launch".parse::<Phase>(), Ok(Phase::PostLaunch));
    }

    #[test]
    fn test_status_change_requires_note() {
        let mut task = sample_task();
        let before = task.clone();
        let update = UpdateTaskData {
            status: Some(TaskStatus::InProgress),
            ..Default::default()
        };

        let err = task.apply_update(&update, "WEB", Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(task, before);
    }

    #[test]
    fn test_deadline_change_appends_audit_line() {
        let mut task = sample_task();
        let update = UpdateTaskData {
            deadline: Some(NaiveDate::from_ymd_opt(2026, 3, 8)),
            audit_note: Some("vendor slipped".to_string()),
            ..Default::default()
        };

        let changes = task.apply_update(&update, "ana@example.com", Utc::now()).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, AuditField::Deadline);
        assert_eq!(changes[0].before.as_deref(), Some("2026-03-01"));
        assert_eq!(changes[0].after.as_deref(), Some("2026-03-08"));
        assert!(task.notes.contains("Deadline: 2026-03-01 -> 2026-03-08: vendor slipped"));
        assert!(task.notes.contains("ana@example.com"));
    }

    #[test]
    fn test_leaving_help_me_clears_help_fields() {
        let mut task = sample_task();
        task.apply_update(
            &UpdateTaskData {
                status: Some(TaskStatus::HelpMe),
                help: Some(HelpRequestData {
                    assignee: "DESIGN".to_string(),
                    details: "need hero image".to_string(),
                }),
                audit_note: Some("stuck".to_string()),
                ..Default::default()
            },
            "WEB",
            Utc::now(),
        )
        .unwrap();
        assert_eq!(task.help.as_ref().map(|h| h.assignee.as_str()), Some("DESIGN"));

        task.apply_update(
            &UpdateTaskData {
                status: Some(TaskStatus::InProgress),
                audit_note: Some("unblocked".to_string()),
                ..Default::default()
            },
            "WEB",
            Utc::now(),
        )
        .unwrap();
        assert!(task.help.is_none());
    }

    #[test]
    fn test_help_without_help_me_is_rejected() {
        let mut task = sample_task();
        let err = task
            .apply_update(
                &UpdateTaskData {
                    help: Some(HelpRequestData {
                        assignee: "SALES".to_string(),
                        details: String::new(),
                    }),
                    ..Default::default()
                },
                "WEB",
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_impact_score_bounds() {
        let data = NewTaskData {
            title: "Press kit".to_string(),
            owner: "MARKETING".to_string(),
            impact_score: Some(6),
            ..Default::default()
        };
        assert!(Task::create(data, Utc::now()).is_err());
    }

    #[test]
    fn test_create_applies_defaults_and_drops_timeliness_for_open_tasks() {
        let data = NewTaskData {
            title: "  Press kit ".to_string(),
            owner: "MARKETING".to_string(),
            timeliness: Some(Timeliness::Early),
            ..Default::default()
        };
        let task = Task::create(data, Utc::now()).unwrap();
        assert_eq!(task.title, "Press kit");
        assert_eq!(task.status, TaskStatus::NotStarted);
        assert_eq!(task.phase, Phase::Planning);
        assert_eq!(task.timeliness, None);
    }

    #[test]
    fn test_bulk_outcome_reports_partial_failure() {
        let outcome = BulkUpdateOutcome {
            updated: 3,
            failures: vec![("abc".to_string(), "not yours".to_string())],
        };
        match outcome.into_result() {
            Err(CoreError::PartialFailure { updated, failed, .. }) => {
                assert_eq!(updated, 3);
                assert_eq!(failed, 1);
            }
            other => panic!("expected partial failure, got {:?}", other),
        }
    }
}
