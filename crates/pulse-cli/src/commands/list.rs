use anyhow::Result;
use pulse_core::filter::{FilterSelections, ReconcilePolicy};
use pulse_core::session::{Session, TaskScope};

use super::Context;
use crate::cli::ListCommand;
use crate::parser::parse_deadline;
use crate::util::find_project;
use crate::views::table::{display_options, display_resets, display_tasks};

pub async fn list_tasks(ctx: &Context<'_>, command: ListCommand) -> Result<()> {
    let dashboard = ctx.config.dashboard();
    let timezone = &ctx.config.dashboard.timezone;
    let today = ctx.today()?;

    let mut session = Session::start(ctx.me.clone(), ReconcilePolicy::from(&dashboard));
    session.load_projects(ctx.repo).await?;
    session.load_tasks(ctx.repo, TaskScope::All).await?;

    let project_id = match &command.project {
        Some(reference) => Some(find_project(session.projects(), reference)?.id),
        None => None,
    };
    let start_date = command.from.as_deref().map(|d| parse_deadline(d, timezone)).transpose()?;
    let end_date = command.to.as_deref().map(|d| parse_deadline(d, timezone)).transpose()?;

    let selections = FilterSelections {
        owner: command.owner.filter(|o| !o.trim().is_empty()),
        project_id,
        status: command.status,
        start_date,
        end_date,
        search: command.search.unwrap_or_default(),
    };
    let filtered = !selections.is_unconstrained();
    session.set_selections(selections);

    let projects = session.projects().to_vec();
    let session_total = session.tasks().len();
    let refined = session.refresh_view();
    display_resets(&refined.reset);
    display_tasks(
        &refined.view.tasks,
        &projects,
        today,
        dashboard.warning_window_days,
    );
    if filtered {
        println!("{} of {} task(s) match.", refined.view.tasks.len(), session_total);
    }
    println!();
    display_options(&refined.view.options, &dashboard.teams);
    session.logout();
    Ok(())
}
