use crate::access::can_view;
use crate::error::CoreError;
use crate::models::{AuditEntry, Identity};
use crate::repository::tasks::fetch_task;
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
impl super::AuditRepository for SqliteRepository {
    async fn task_history(&self, caller: &Identity, task_id: Uuid) -> Result<Vec<AuditEntry>, CoreError> {
        let mut conn = self.pool().acquire().await?;
        match fetch_task(&mut conn, task_id).await? {
            Some(task) if !can_view(caller, &task) => {
                return Err(CoreError::PermissionDenied(format!(
                    "{} cannot view history of task {}",
                    caller.name, task_id
                )))
            }
            Some(_) => {}
            // History outlives the task; only admins may read it afterwards.
            None if caller.is_admin() => {}
            None => return Err(CoreError::NotFound(format!("task {}", task_id))),
        }

        let entries: Vec<AuditEntry> = sqlx::query_as(
            r#"SELECT id, task_id, actor, action, field, before_value, after_value, note, recorded_at
            FROM task_history WHERE task_id = $1 ORDER BY id"#,
        )
        .bind(task_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(entries)
    }
}
