use anyhow::Result;
use owo_colors::{OwoColorize, Style};
use pulse_core::models::{HelpRequestData, UpdateTaskData};
use pulse_core::repository::TaskRepository;

use super::Context;
use crate::cli::EditCommand;
use crate::parser::parse_deadline;
use crate::util::{resolve_task_id, short_id};

pub async fn edit_task(ctx: &Context<'_>, command: EditCommand) -> Result<()> {
    let task_id = resolve_task_id(ctx.repo, ctx.me, &command.id).await?;

    let deadline = if command.deadline_clear {
        Some(None)
    } else if let Some(deadline) = command.deadline.as_deref() {
        Some(Some(parse_deadline(deadline, &ctx.config.dashboard.timezone)?))
    } else {
        None
    };
    let actual_hours = if command.actual_clear {
        Some(None)
    } else {
        command.actual.map(Some)
    };
    let impact_score = if command.impact_clear {
        Some(None)
    } else {
        command.impact.map(Some)
    };
    let help = command.help_assignee.map(|assignee| HelpRequestData {
        assignee,
        details: command.help_details.unwrap_or_default(),
    });

    let update_data = UpdateTaskData {
        title: command.title,
        phase: command.phase,
        owner: command.owner,
        deadline,
        status: command.status,
        est_hours: command.est,
        actual_hours,
        impact_score,
        timeliness: command.timeliness.map(Some),
        feedback_to_team: command.feedback,
        owner_feedback: command.owner_feedback,
        help,
        audit_note: command.note,
    };

    let updated = ctx.repo.update_task(ctx.me, task_id, update_data).await?;
    println!(
        "{} Updated task: {} ({})",
        "✓".style(Style::new().green().bold()),
        updated.title.bright_white().bold(),
        short_id(&updated.id).yellow()
    );
    println!("  {} Status: {}", "→".style(Style::new().blue()), updated.status);
    Ok(())
}
