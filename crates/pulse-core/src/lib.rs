//! # Pulse Core Library
//!
//! The dashboard engine behind `pulse`: a faceted task filter, a performance
//! metrics aggregator, and the store contract for a spreadsheet-style task
//! sheet.
//!
//! ## Core Modules
//!
//! - [`models`]: Tasks, projects, identities, audit entries and transfer objects
//! - [`filter`]: Single-pass faceting and reconciliation of filter selections
//! - [`metrics`]: Status/owner histograms and dashboard KPIs
//! - [`access`]: The capability predicate shared by stores and filters
//! - [`session`]: Per-user state with a stale-fetch guard
//! - [`repository`]: Async store traits with SQLite and HTTP implementations
//! - [`db`]: SQLite connection and migration management
//! - [`timezone`]: Calendar helpers for "today" in a configured zone
//! - [`error`]: Error types
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use pulse_core::{
//!     db,
//!     filter::{self, FilterSelections, ReconcilePolicy},
//!     repository::{IdentityRepository, ProjectRepository, SqliteRepository, TaskRepository},
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = db::establish_connection("pulse.db").await?;
//!     let repo = SqliteRepository::new(pool);
//!
//!     let me = repo.verify_identity("web@example.com").await?.ok_or("unknown user")?;
//!     let projects = repo.list_projects(&me).await?;
//!     let tasks = repo.list_all_tasks(&me).await?;
//!
//!     let mut selections = FilterSelections {
//!         owner: Some("WEB".to_string()),
//!         ..Default::default()
//!     };
//!     let refined = filter::refine(&tasks, &projects, &mut selections, ReconcilePolicy::default());
//!     println!("{} task(s) match", refined.view.tasks.len());
//!     Ok(())
//! }
//! ```

pub mod access;
pub mod db;
pub mod error;
pub mod filter;
pub mod metrics;
pub mod models;
pub mod repository;
pub mod session;
pub mod timezone;
