use crate::access::{can_administer, can_view};
use crate::error::CoreError;
use crate::models::{
    Identity, NewProjectData, Project, ProjectCreated, ProjectDeleted, Task, UpdateProjectData,
};
use crate::repository::tasks::{fetch_all_tasks, insert_task};
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

fn require_admin(caller: &Identity, action: &str) -> Result<(), CoreError> {
    if can_administer(caller) {
        Ok(())
    } else {
        warn!(caller = %caller.email, action, "project mutation denied");
        Err(CoreError::PermissionDenied(format!(
            "only admins can {} projects",
            action
        )))
    }
}

fn validate_name(name: &str) -> Result<String, CoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::validation("project name is required"));
    }
    Ok(name.to_string())
}

#[async_trait]
impl super::ProjectRepository for SqliteRepository {
    async fn list_projects(&self, caller: &Identity) -> Result<Vec<Project>, CoreError> {
        let mut conn = self.pool().acquire().await?;
        let projects: Vec<Project> = sqlx::query_as(
            "SELECT id, name, priority, details, created_at FROM projects ORDER BY priority, name",
        )
        .fetch_all(&mut *conn)
        .await?;

        if can_administer(caller) {
            return Ok(projects);
        }

        let visible: HashSet<Uuid> = fetch_all_tasks(&mut conn)
            .await?
            .iter()
            .filter(|t| can_view(caller, t))
            .map(|t| t.project_id)
            .collect();
        let projects: Vec<Project> = projects
            .into_iter()
            .filter(|p| visible.contains(&p.id))
            .collect();
        debug!(caller = %caller.email, count = projects.len(), "list_projects");
        Ok(projects)
    }

    async fn create_project(&self, caller: &Identity, data: NewProjectData) -> Result<ProjectCreated, CoreError> {
        require_admin(caller, "create")?;
        let name = validate_name(&data.name)?;
        for seed in &data.tasks {
            seed.validate()?;
        }

        let now = Utc::now();
        let project = Project {
            id: Uuid::now_v7(),
            name,
            priority: data.priority,
            details: data.details.filter(|d| !d.trim().is_empty()),
            created_at: now,
        };

        // Project row and seed tasks land together or not at all.
        let mut tx = self.pool().begin().await?;
        sqlx::query(
            "INSERT INTO projects (id, name, priority, details, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(project.id)
        .bind(&project.name)
        .bind(project.priority)
        .bind(&project.details)
        .bind(project.created_at)
        .execute(&mut *tx)
        .await?;

        let mut tasks_added = 0;
        for mut seed in data.tasks {
            seed.project_id = project.id;
            let task = Task::create(seed, now)?;
            insert_task(&mut tx, &task).await?;
            tasks_added += 1;
        }
        tx.commit().await?;

        info!(project = %project.id, name = %project.name, tasks_added, "project created");
        Ok(ProjectCreated { project, tasks_added })
    }

    async fn update_project(&self, caller: &Identity, id: Uuid, data: UpdateProjectData) -> Result<Project, CoreError> {
        require_admin(caller, "edit")?;
        let mut tx = self.pool().begin().await?;
        let mut project: Project = sqlx::query_as(
            "SELECT id, name, priority, details, created_at FROM projects WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("project {}", id)))?;

        if let Some(name) = &data.name {
            project.name = validate_name(name)?;
        }
        if let Some(priority) = data.priority {
            project.priority = priority;
        }
        if let Some(details) = data.details {
            project.details = details.filter(|d| !d.trim().is_empty());
        }

        sqlx::query("UPDATE projects SET name = $1, priority = $2, details = $3 WHERE id = $4")
            .bind(&project.name)
            .bind(project.priority)
            .bind(&project.details)
            .bind(project.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(project = %id, "project updated");
        Ok(project)
    }

    async fn delete_project(&self, caller: &Identity, id: Uuid) -> Result<ProjectDeleted, CoreError> {
        require_admin(caller, "delete")?;
        let mut tx = self.pool().begin().await?;
        let tasks_deleted: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE project_id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        // Tasks go with the project through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("project {}", id)));
        }
        tx.commit().await?;

        info!(project = %id, tasks_deleted, "project deleted");
        Ok(ProjectDeleted {
            id,
            tasks_deleted: tasks_deleted as usize,
        })
    }
}
