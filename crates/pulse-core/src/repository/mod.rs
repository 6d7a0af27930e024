use crate::db::DbPool;
use crate::error::CoreError;
use crate::models::{
    AuditEntry, BulkTaskUpdate, BulkUpdateOutcome, Identity, NewProjectData, NewTaskData,
    Project, ProjectCreated, ProjectDeleted, Task, UpdateProjectData, UpdateTaskData,
};
use async_trait::async_trait;
use uuid::Uuid;

// Re-export domain modules
pub mod audit;
pub mod http;
pub mod identity;
pub mod projects;
pub mod tasks;

pub use http::HttpRepository;

// Every mutating call is checked against the caller. Privileged callers may act
// on anything; members only on what `access::can_act` allows. Violations are
// reported as `CoreError::PermissionDenied`, never as a silent no-op.

/// Identity verification and user registration
#[async_trait]
pub trait IdentityRepository {
    /// Resolves an email to an identity. Unknown emails yield `Ok(None)`.
    async fn verify_identity(&self, email: &str) -> Result<Option<Identity>, CoreError>;
    /// Adds a user. Requires an admin caller unless no user exists yet.
    async fn register_user(&self, caller: Option<&Identity>, user: Identity) -> Result<Identity, CoreError>;
}

/// Domain-specific trait for project operations
#[async_trait]
pub trait ProjectRepository {
    /// Members only see projects holding at least one task they can view.
    async fn list_projects(&self, caller: &Identity) -> Result<Vec<Project>, CoreError>;
    async fn create_project(&self, caller: &Identity, data: NewProjectData) -> Result<ProjectCreated, CoreError>;
    async fn update_project(&self, caller: &Identity, id: Uuid, data: UpdateProjectData) -> Result<Project, CoreError>;
    /// Deletes the project and every task referencing it.
    async fn delete_project(&self, caller: &Identity, id: Uuid) -> Result<ProjectDeleted, CoreError>;
}

/// Domain-specific trait for task operations
#[async_trait]
pub trait TaskRepository {
    async fn list_tasks(&self, caller: &Identity, project_id: Uuid) -> Result<Vec<Task>, CoreError>;
    async fn list_all_tasks(&self, caller: &Identity) -> Result<Vec<Task>, CoreError>;
    async fn find_task(&self, caller: &Identity, id: Uuid) -> Result<Option<Task>, CoreError>;
    async fn create_task(&self, caller: &Identity, data: NewTaskData) -> Result<Task, CoreError>;
    async fn update_task(&self, caller: &Identity, id: Uuid, data: UpdateTaskData) -> Result<Task, CoreError>;
    async fn delete_task(&self, caller: &Identity, id: Uuid) -> Result<Uuid, CoreError>;
    /// One logical request; per-task rejections are reported in the outcome.
    async fn bulk_update_tasks(
        &self,
        caller: &Identity,
        ids: &[Uuid],
        update: BulkTaskUpdate,
    ) -> Result<BulkUpdateOutcome, CoreError>;
}

/// Append-only deadline/status history
#[async_trait]
pub trait AuditRepository {
    /// Entries for one task, oldest first.
    async fn task_history(&self, caller: &Identity, task_id: Uuid) -> Result<Vec<AuditEntry>, CoreError>;
}

/// Main repository trait that composes all domain traits
pub trait Repository:
    IdentityRepository +
    ProjectRepository +
    TaskRepository +
    AuditRepository +
    Send +
    Sync
{
}

/// SQLite implementation of the sheet store
pub struct SqliteRepository {
    pool: DbPool,
}

impl SqliteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the database pool for internal use across modules
    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl Repository for SqliteRepository {}
impl Repository for HttpRepository {}
