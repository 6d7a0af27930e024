use anyhow::Result;
use owo_colors::OwoColorize;
use pulse_core::filter::ReconcilePolicy;
use pulse_core::metrics::MetricsScope;
use pulse_core::session::{Session, TaskScope};

use super::Context;
use crate::cli::StatsCommand;
use crate::util::find_project;
use crate::views::table::display_metrics;

pub async fn show_stats(ctx: &Context<'_>, command: StatsCommand) -> Result<()> {
    let dashboard = ctx.config.dashboard();
    let mut session = Session::start(ctx.me.clone(), ReconcilePolicy::from(&dashboard));
    session.load_projects(ctx.repo).await?;

    let scope = match &command.project {
        Some(reference) => {
            let project = find_project(session.projects(), reference)?;
            println!("{} {}", "Project:".blue().bold(), project.name);
            MetricsScope::Project(project.id)
        }
        None => {
            println!("{}", "All projects".blue().bold());
            MetricsScope::Global
        }
    };
    session.load_tasks(ctx.repo, TaskScope::All).await?;

    let metrics = session.metrics(scope, &dashboard.teams, ctx.today()?, dashboard.warning_window_days);
    display_metrics(&metrics);
    session.logout();
    Ok(())
}
