//! Per-user dashboard state.
//!
//! A [`Session`] owns everything a signed-in user is looking at: the project
//! list, the loaded tasks, the current filter selections and the active
//! project. It is created by [`Session::start`] and consumed by
//! [`Session::logout`], so no state leaks from one user to the next.
//!
//! Task fetches go through a generation ticket. Starting a newer fetch or
//! switching projects invalidates every ticket issued before, and a response
//! carrying an outdated ticket is dropped instead of overwriting newer data.

use chrono::NaiveDate;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::CoreError;
use crate::filter::{self, FilterSelections, ReconcilePolicy, Refined};
use crate::metrics::{self, DashboardMetrics, MetricsScope};
use crate::models::{Identity, NewTaskData, Project, Task, TaskStatus, UpdateTaskData};
use crate::repository::{ProjectRepository, Repository, TaskRepository};

/// Which tasks a fetch loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskScope {
    All,
    Project(Uuid),
}

/// Proof of which fetch a response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    pub scope: TaskScope,
}

#[derive(Debug)]
pub struct Session {
    identity: Identity,
    policy: ReconcilePolicy,
    projects: Vec<Project>,
    tasks: Vec<Task>,
    selections: FilterSelections,
    active_project: Option<Uuid>,
    generation: u64,
}

impl Session {
    pub fn start(identity: Identity, policy: ReconcilePolicy) -> Self {
        info!(email = %identity.email, role = %identity.role, "session started");
        Self {
            identity,
            policy,
            projects: Vec::new(),
            tasks: Vec::new(),
            selections: FilterSelections::default(),
            active_project: None,
            generation: 0,
        }
    }

    pub fn logout(self) {
        info!(email = %self.identity.email, "session closed");
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn selections(&self) -> &FilterSelections {
        &self.selections
    }

    pub fn active_project(&self) -> Option<Uuid> {
        self.active_project
    }

    /// Replaces every selection at once; the next [`refresh_view`](Self::refresh_view) reconciles them.
    pub fn set_selections(&mut self, selections: FilterSelections) {
        self.selections = selections;
    }

    pub fn set_owner(&mut self, owner: Option<String>) {
        self.selections.owner = owner.filter(|o| !o.trim().is_empty());
    }

    pub fn set_status(&mut self, status: Option<TaskStatus>) {
        self.selections.status = status;
    }

    pub fn set_date_range(&mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) {
        self.selections.start_date = start;
        self.selections.end_date = end;
    }

    pub fn set_search(&mut self, query: &str) {
        self.selections.search = query.to_string();
    }

    /// Switches the active project. Any fetch still in flight becomes stale.
    pub fn select_project(&mut self, project: Option<Uuid>) {
        self.active_project = project;
        self.selections.project_id = project;
        self.generation += 1;
        debug!(?project, generation = self.generation, "select_project");
    }

    pub fn begin_task_fetch(&mut self, scope: TaskScope) -> FetchTicket {
        self.generation += 1;
        debug!(?scope, generation = self.generation, "begin_task_fetch");
        FetchTicket {
            generation: self.generation,
            scope,
        }
    }

    /// Commits fetched tasks if `ticket` is still current. Returns whether it was.
    pub fn complete_task_fetch(&mut self, ticket: FetchTicket, tasks: Vec<Task>) -> bool {
        if ticket.generation != self.generation {
            warn!(
                ticket = ticket.generation,
                current = self.generation,
                "complete_task_fetch: dropping stale response"
            );
            return false;
        }
        debug!(count = tasks.len(), scope = ?ticket.scope, "complete_task_fetch");
        self.tasks = tasks;
        true
    }

    pub fn replace_projects(&mut self, projects: Vec<Project>) {
        self.projects = projects;
    }

    /// Records a task the store has confirmed, replacing any copy with the same id.
    pub fn apply_saved_task(&mut self, task: Task) {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => *slot = task,
            None => self.tasks.push(task),
        }
    }

    pub fn forget_task(&mut self, id: Uuid) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    /// Drops a deleted project together with its tasks.
    pub fn forget_project(&mut self, id: Uuid) {
        self.projects.retain(|p| p.id != id);
        self.tasks.retain(|t| t.project_id != id);
        if self.active_project == Some(id) {
            self.select_project(None);
        }
    }

    /// Filters the loaded tasks with the current selections, resetting any
    /// that became unreachable.
    pub fn refresh_view(&mut self) -> Refined<'_> {
        filter::refine(&self.tasks, &self.projects, &mut self.selections, self.policy)
    }

    pub fn metrics(
        &self,
        scope: MetricsScope,
        teams: &[String],
        today: NaiveDate,
        warning_window_days: i64,
    ) -> DashboardMetrics {
        metrics::aggregate_scoped(&self.tasks, scope, teams, today, warning_window_days)
    }

    pub async fn load_projects<R: Repository + ?Sized>(&mut self, repo: &R) -> Result<usize, CoreError> {
        let projects = repo.list_projects(&self.identity).await?;
        self.replace_projects(projects);
        Ok(self.projects.len())
    }

    /// Fetches tasks for `scope`; returns `false` when a newer fetch superseded this one.
    pub async fn load_tasks<R: Repository + ?Sized>(&mut self, repo: &R, scope: TaskScope) -> Result<bool, CoreError> {
        let ticket = self.begin_task_fetch(scope);
        let tasks = match scope {
            TaskScope::All => repo.list_all_tasks(&self.identity).await?,
            TaskScope::Project(id) => repo.list_tasks(&self.identity, id).await?,
        };
        Ok(self.complete_task_fetch(ticket, tasks))
    }

    pub async fn create_task<R: Repository + ?Sized>(&mut self, repo: &R, data: NewTaskData) -> Result<Task, CoreError> {
        let task = repo.create_task(&self.identity, data).await?;
        self.apply_saved_task(task.clone());
        Ok(task)
    }

    pub async fn save_task<R: Repository + ?Sized>(
        &mut self,
        repo: &R,
        id: Uuid,
        update: UpdateTaskData,
    ) -> Result<Task, CoreError> {
        let task = repo.update_task(&self.identity, id, update).await?;
        self.apply_saved_task(task.clone());
        Ok(task)
    }

    pub async fn delete_task<R: Repository + ?Sized>(&mut self, repo: &R, id: Uuid) -> Result<(), CoreError> {
        repo.delete_task(&self.identity, id).await?;
        self.forget_task(id);
        Ok(())
    }

    pub async fn delete_project<R: Repository + ?Sized>(&mut self, repo: &R, id: Uuid) -> Result<usize, CoreError> {
        let deleted = repo.delete_project(&self.identity, id).await?;
        self.forget_project(id);
        Ok(deleted.tasks_deleted)
    }
}
