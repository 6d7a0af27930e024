use crate::access::{can_act, can_view};
use crate::error::CoreError;
use crate::models::{
    AuditAction, BulkTaskUpdate, BulkUpdateOutcome, FieldChange, HelpRequest, Identity,
    NewTaskData, Phase, Task, TaskStatus, Timeliness, UpdateTaskData,
};
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, SqliteConnection};
use std::collections::HashSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Flat sheet row; help columns are folded into `Task::help`.
#[derive(Debug, FromRow)]
pub(crate) struct TaskRow {
    id: Uuid,
    project_id: Uuid,
    title: String,
    phase: Phase,
    owner: String,
    deadline: Option<NaiveDate>,
    status: TaskStatus,
    est_hours: f64,
    actual_hours: Option<f64>,
    impact_score: Option<i64>,
    timeliness: Option<Timeliness>,
    notes: String,
    feedback_to_team: String,
    owner_feedback: String,
    help_requested_at: Option<DateTime<Utc>>,
    help_assignee: Option<String>,
    help_details: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        let help = match (row.status, row.help_assignee) {
            (TaskStatus::HelpMe, Some(assignee)) => Some(HelpRequest {
                requested_at: row.help_requested_at.unwrap_or(row.updated_at),
                assignee,
                details: row.help_details.unwrap_or_default(),
            }),
            _ => None,
        };
        Task {
            id: row.id,
            project_id: row.project_id,
            title: row.title,
            phase: row.phase,
            owner: row.owner,
            deadline: row.deadline,
            status: row.status,
            est_hours: row.est_hours,
            actual_hours: row.actual_hours,
            impact_score: row.impact_score.and_then(|s| u8::try_from(s).ok()),
            timeliness: row.timeliness,
            notes: row.notes,
            feedback_to_team: row.feedback_to_team,
            owner_feedback: row.owner_feedback,
            help,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_TASKS: &str = "SELECT id, project_id, title, phase, owner, deadline, status, est_hours, actual_hours, \
     impact_score, timeliness, notes, feedback_to_team, owner_feedback, help_requested_at, help_assignee, \
     help_details, created_at, updated_at FROM tasks";

pub(crate) async fn fetch_task(conn: &mut SqliteConnection, id: Uuid) -> Result<Option<Task>, CoreError> {
    let row: Option<TaskRow> = sqlx::query_as(&format!("{} WHERE id = $1", SELECT_TASKS))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.map(Task::from))
}

pub(crate) async fn fetch_all_tasks(conn: &mut SqliteConnection) -> Result<Vec<Task>, CoreError> {
    let rows: Vec<TaskRow> = sqlx::query_as(&format!("{} ORDER BY row_order", SELECT_TASKS))
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows.into_iter().map(Task::from).collect())
}

pub(crate) async fn insert_task(conn: &mut SqliteConnection, task: &Task) -> Result<(), CoreError> {
    let help = task.help.as_ref();
    sqlx::query(
        r#"INSERT INTO tasks (id, project_id, row_order, title, phase, owner, deadline, status, est_hours,
            actual_hours, impact_score, timeliness, notes, feedback_to_team, owner_feedback,
            help_requested_at, help_assignee, help_details, created_at, updated_at)
        VALUES ($1, $2, (SELECT COALESCE(MAX(row_order), 0) + 1 FROM tasks), $3, $4, $5, $6, $7, $8,
            $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
        "#,
    )
    .bind(task.id)
    .bind(task.project_id)
    .bind(&task.title)
    .bind(task.phase)
    .bind(&task.owner)
    .bind(task.deadline)
    .bind(task.status)
    .bind(task.est_hours)
    .bind(task.actual_hours)
    .bind(task.impact_score.map(i64::from))
    .bind(task.timeliness)
    .bind(&task.notes)
    .bind(&task.feedback_to_team)
    .bind(&task.owner_feedback)
    .bind(help.map(|h| h.requested_at))
    .bind(help.map(|h| h.assignee.clone()))
    .bind(help.map(|h| h.details.clone()))
    .bind(task.created_at)
    .bind(task.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn write_task(conn: &mut SqliteConnection, task: &Task) -> Result<(), CoreError> {
    let help = task.help.as_ref();
    let result = sqlx::query(
        r#"UPDATE tasks
        SET title = $1, phase = $2, owner = $3, deadline = $4, status = $5, est_hours = $6,
            actual_hours = $7, impact_score = $8, timeliness = $9, notes = $10, feedback_to_team = $11,
            owner_feedback = $12, help_requested_at = $13, help_assignee = $14, help_details = $15,
            updated_at = $16
        WHERE id = $17
        "#,
    )
    .bind(&task.title)
    .bind(task.phase)
    .bind(&task.owner)
    .bind(task.deadline)
    .bind(task.status)
    .bind(task.est_hours)
    .bind(task.actual_hours)
    .bind(task.impact_score.map(i64::from))
    .bind(task.timeliness)
    .bind(&task.notes)
    .bind(&task.feedback_to_team)
    .bind(&task.owner_feedback)
    .bind(help.map(|h| h.requested_at))
    .bind(help.map(|h| h.assignee.clone()))
    .bind(help.map(|h| h.details.clone()))
    .bind(task.updated_at)
    .bind(task.id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(CoreError::NotFound(format!("task {}", task.id)));
    }
    Ok(())
}

async fn record_changes(
    conn: &mut SqliteConnection,
    task_id: Uuid,
    actor: &Identity,
    action: AuditAction,
    changes: &[FieldChange],
    note: &str,
    at: DateTime<Utc>,
) -> Result<(), CoreError> {
    for change in changes {
        sqlx::query(
            r#"INSERT INTO task_history (task_id, actor, action, field, before_value, after_value, note, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(task_id)
        .bind(&actor.email)
        .bind(action)
        .bind(change.field)
        .bind(&change.before)
        .bind(&change.after)
        .bind(note)
        .bind(at)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn project_exists(conn: &mut SqliteConnection, id: Uuid) -> Result<bool, CoreError> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM projects WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(found.is_some())
}

/// Loads a task and checks the caller may mutate it.
async fn load_owned_task(conn: &mut SqliteConnection, caller: &Identity, id: Uuid) -> Result<Task, CoreError> {
    let task = fetch_task(conn, id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("task {}", id)))?;
    if !can_act(caller, &task.owner) {
        warn!(caller = %caller.email, task = %id, owner = %task.owner, "task mutation denied");
        return Err(CoreError::PermissionDenied(format!(
            "{} cannot modify tasks owned by {}",
            caller.name, task.owner
        )));
    }
    Ok(task)
}

/// Members may not hand a task over to another team.
fn check_reassignment(caller: &Identity, update: &UpdateTaskData) -> Result<(), CoreError> {
    match &update.owner {
        Some(owner) if !can_act(caller, owner) => Err(CoreError::PermissionDenied(format!(
            "{} cannot assign tasks to {}",
            caller.name, owner
        ))),
        _ => Ok(()),
    }
}

/// Applies `update` to one task inside an open transaction.
async fn update_in_transaction(
    conn: &mut SqliteConnection,
    caller: &Identity,
    id: Uuid,
    update: &UpdateTaskData,
    action: AuditAction,
) -> Result<Task, CoreError> {
    let mut task = load_owned_task(conn, caller, id).await?;
    let now = Utc::now();
    let changes = task.apply_update(update, &caller.email, now)?;
    write_task(conn, &task).await?;
    if !changes.is_empty() {
        let note = update.audit_note.as_deref().unwrap_or_default().trim();
        record_changes(conn, id, caller, action, &changes, note, now).await?;
    }
    Ok(task)
}

#[async_trait]
impl super::TaskRepository for SqliteRepository {
    async fn list_tasks(&self, caller: &Identity, project_id: Uuid) -> Result<Vec<Task>, CoreError> {
        let mut conn = self.pool().acquire().await?;
        if !project_exists(&mut conn, project_id).await? {
            return Err(CoreError::NotFound(format!("project {}", project_id)));
        }
        let rows: Vec<TaskRow> = sqlx::query_as(&format!(
            "{} WHERE project_id = $1 ORDER BY row_order",
            SELECT_TASKS
        ))
        .bind(project_id)
        .fetch_all(&mut *conn)
        .await?;

        let tasks: Vec<Task> = rows
            .into_iter()
            .map(Task::from)
            .filter(|t| can_view(caller, t))
            .collect();
        debug!(project = %project_id, count = tasks.len(), "list_tasks");
        Ok(tasks)
    }

    async fn list_all_tasks(&self, caller: &Identity) -> Result<Vec<Task>, CoreError> {
        let mut conn = self.pool().acquire().await?;
        let tasks: Vec<Task> = fetch_all_tasks(&mut conn)
            .await?
            .into_iter()
            .filter(|t| can_view(caller, t))
            .collect();
        debug!(count = tasks.len(), "list_all_tasks");
        Ok(tasks)
    }

    async fn find_task(&self, caller: &Identity, id: Uuid) -> Result<Option<Task>, CoreError> {
        let mut conn = self.pool().acquire().await?;
        match fetch_task(&mut conn, id).await? {
            Some(task) if !can_view(caller, &task) => Err(CoreError::PermissionDenied(format!(
                "{} cannot view task {}",
                caller.name, id
            ))),
            found => Ok(found),
        }
    }

    async fn create_task(&self, caller: &Identity, data: NewTaskData) -> Result<Task, CoreError> {
        data.validate()?;
        if !can_act(caller, &data.owner) {
            return Err(CoreError::PermissionDenied(format!(
                "{} cannot create tasks for {}",
                caller.name, data.owner
            )));
        }

        let mut tx = self.pool().begin().await?;
        if !project_exists(&mut tx, data.project_id).await? {
            return Err(CoreError::NotFound(format!("project {}", data.project_id)));
        }
        let task = Task::create(data, Utc::now())?;
        insert_task(&mut tx, &task).await?;
        tx.commit().await?;

        info!(task = %task.id, project = %task.project_id, by = %caller.email, "task created");
        Ok(task)
    }

    async fn update_task(&self, caller: &Identity, id: Uuid, data: UpdateTaskData) -> Result<Task, CoreError> {
        check_reassignment(caller, &data)?;
        let mut tx = self.pool().begin().await?;
        let task = update_in_transaction(&mut tx, caller, id, &data, AuditAction::Update).await?;
        tx.commit().await?;

        info!(task = %id, by = %caller.email, "task updated");
        Ok(task)
    }

    async fn delete_task(&self, caller: &Identity, id: Uuid) -> Result<Uuid, CoreError> {
        let mut tx = self.pool().begin().await?;
        load_owned_task(&mut tx, caller, id).await?;
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("task {}", id)));
        }
        tx.commit().await?;

        info!(task = %id, by = %caller.email, "task deleted");
        Ok(id)
    }

    async fn bulk_update_tasks(
        &self,
        caller: &Identity,
        ids: &[Uuid],
        update: BulkTaskUpdate,
    ) -> Result<BulkUpdateOutcome, CoreError> {
        update.validate()?;
        if ids.is_empty() {
            return Err(CoreError::validation("bulk update needs at least one task"));
        }
        let data = update.to_update();

        // Each task counts once, in first-seen order.
        let mut seen = HashSet::with_capacity(ids.len());
        let ids: Vec<Uuid> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();

        let mut tx = self.pool().begin().await?;
        let mut outcome = BulkUpdateOutcome::default();
        for id in &ids {
            match update_in_transaction(&mut tx, caller, *id, &data, AuditAction::BulkUpdate).await {
                Ok(_) => outcome.updated += 1,
                Err(e @ (CoreError::PermissionDenied(_) | CoreError::NotFound(_) | CoreError::Validation(_))) => {
                    outcome.failures.push((id.to_string(), e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }
        tx.commit().await?;

        if outcome.failures.is_empty() {
            info!(updated = outcome.updated, by = %caller.email, "bulk update applied");
        } else {
            warn!(
                updated = outcome.updated,
                failed = outcome.failures.len(),
                by = %caller.email,
                "bulk update partially rejected"
            );
        }
        Ok(outcome)
    }
}
