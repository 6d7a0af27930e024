use clap::{Args, Parser, Subcommand};
use pulse_core::models::{Phase, TaskStatus, Timeliness};

/// Pulse: project and task dashboard for small teams
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Act as this user instead of the configured `user_email`
    #[arg(long = "as", global = true, value_name = "EMAIL")]
    pub as_user: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Manage users
    #[command(subcommand)]
    User(UserCommand),
    /// Show the acting user
    Whoami,
    /// Manage projects
    #[command(subcommand)]
    Project(ProjectCommand),
    /// List tasks with faceted filters
    List(ListCommand),
    /// Add a new task
    Add(AddCommand),
    /// Edit a task
    Edit(EditCommand),
    /// Delete a task
    Delete(DeleteCommand),
    /// Move the deadline of several tasks at once
    BulkDeadline(BulkDeadlineCommand),
    /// Show dashboard metrics
    Stats(StatsCommand),
    /// Show the deadline/status history of a task
    History(HistoryCommand),
}

#[derive(Subcommand, Debug, Clone)]
pub enum UserCommand {
    /// Register a user. The first user may register without an identity.
    Add {
        email: String,
        /// Display name; for members this is the team they act for
        name: String,
        #[arg(long)]
        admin: bool,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProjectCommand {
    /// List projects by priority
    List,
    /// Create a project
    Add {
        name: String,
        /// Lower value = higher priority
        #[arg(long, default_value_t = 5)]
        priority: i32,
        #[arg(long)]
        details: Option<String>,
        /// Seed the project with the standard task template
        #[arg(long)]
        with_template: bool,
        /// Extra seed task as "title:OWNER"; may be repeated
        #[arg(long = "task", value_name = "TITLE:OWNER")]
        tasks: Vec<String>,
    },
    /// Edit a project
    Edit {
        /// Project name or id prefix
        project: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        priority: Option<i32>,
        #[arg(long)]
        details: Option<String>,
        #[arg(long, conflicts_with = "details")]
        details_clear: bool,
    },
    /// Delete a project and all of its tasks
    Delete {
        /// Project name or id prefix
        project: String,
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListCommand {
    /// Team owning the task or asked for help on it
    #[arg(long)]
    pub owner: Option<String>,
    /// Project name or id prefix
    #[arg(long)]
    pub project: Option<String>,
    #[arg(long)]
    pub status: Option<TaskStatus>,
    /// Earliest deadline (inclusive)
    #[arg(long)]
    pub from: Option<String>,
    /// Latest deadline (inclusive)
    #[arg(long)]
    pub to: Option<String>,
    /// Case-insensitive text search
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct AddCommand {
    /// The title of the task
    pub title: String,
    /// Project name or id prefix
    #[arg(short, long)]
    pub project: String,
    /// Owning team; defaults to the acting user's team
    #[arg(short, long)]
    pub owner: Option<String>,
    #[arg(long)]
    pub phase: Option<Phase>,
    #[arg(short, long)]
    pub deadline: Option<String>,
    #[arg(long)]
    pub status: Option<TaskStatus>,
    /// Estimated hours
    #[arg(long)]
    pub est: Option<f64>,
    /// Actual hours
    #[arg(long)]
    pub actual: Option<f64>,
    /// Impact score, 1-5
    #[arg(long)]
    pub impact: Option<u8>,
    #[arg(long)]
    pub timeliness: Option<Timeliness>,
    #[arg(long)]
    pub notes: Option<String>,
    /// Team asked for help (requires --status "Help Me")
    #[arg(long)]
    pub help_assignee: Option<String>,
    #[arg(long, requires = "help_assignee")]
    pub help_details: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct EditCommand {
    /// The ID (or prefix) of the task to edit
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub phase: Option<Phase>,
    #[arg(long)]
    pub owner: Option<String>,

    #[arg(long)]
    pub status: Option<TaskStatus>,
    #[arg(long)]
    pub deadline: Option<String>,
    #[arg(long, conflicts_with = "deadline")]
    pub deadline_clear: bool,

    #[arg(long)]
    pub est: Option<f64>,
    #[arg(long)]
    pub actual: Option<f64>,
    #[arg(long, conflicts_with = "actual")]
    pub actual_clear: bool,
    #[arg(long)]
    pub impact: Option<u8>,
    #[arg(long, conflicts_with = "impact")]
    pub impact_clear: bool,
    #[arg(long)]
    pub timeliness: Option<Timeliness>,

    #[arg(long)]
    pub feedback: Option<String>,
    #[arg(long)]
    pub owner_feedback: Option<String>,

    #[arg(long)]
    pub help_assignee: Option<String>,
    #[arg(long, requires = "help_assignee")]
    pub help_details: Option<String>,

    /// Reason for a deadline or status change
    #[arg(short, long)]
    pub note: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteCommand {
    /// The ID (or prefix) of the task to delete
    pub id: String,
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug, Clone)]
pub struct BulkDeadlineCommand {
    /// Task IDs or prefixes
    #[arg(required = true)]
    pub ids: Vec<String>,
    #[arg(short, long)]
    pub deadline: String,
    #[arg(short, long)]
    pub note: String,
}

#[derive(Args, Debug, Clone, Default)]
pub struct StatsCommand {
    /// Restrict to one project (name or id prefix)
    #[arg(long)]
    pub project: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct HistoryCommand {
    /// The ID (or prefix) of the task
    pub id: String,
}
