use anyhow::{anyhow, Result};
use owo_colors::{OwoColorize, Style};
use pulse_core::error::CoreError;
use pulse_core::models::{HelpRequestData, NewTaskData};
use pulse_core::repository::{ProjectRepository, TaskRepository};
use uuid::Uuid;

use super::Context;
use crate::cli::AddCommand;
use crate::parser::parse_deadline;
use crate::util::{find_project, short_id};

pub async fn add_task(ctx: &Context<'_>, command: AddCommand) -> Result<()> {
    // Members only list projects they already have tasks in, so a full id is
    // accepted without a lookup.
    let project_id = match Uuid::parse_str(command.project.trim()) {
        Ok(id) => id,
        Err(_) => {
            let projects = ctx.repo.list_projects(ctx.me).await?;
            find_project(&projects, &command.project)?.id
        }
    };

    let owner = match command.owner {
        Some(owner) => owner,
        None if ctx.me.is_admin() => {
            return Err(anyhow!(CoreError::validation("admins must pass --owner")));
        }
        None => ctx.me.name.clone(),
    };
    let deadline = command
        .deadline
        .as_deref()
        .map(|d| parse_deadline(d, &ctx.config.dashboard.timezone))
        .transpose()?;
    let help = command.help_assignee.map(|assignee| HelpRequestData {
        assignee,
        details: command.help_details.unwrap_or_default(),
    });

    let new_task = NewTaskData {
        project_id,
        title: command.title,
        owner,
        phase: command.phase,
        deadline,
        status: command.status,
        est_hours: command.est,
        actual_hours: command.actual,
        impact_score: command.impact,
        timeliness: command.timeliness,
        notes: command.notes,
        feedback_to_team: None,
        help,
    };

    let added_task = ctx.repo.create_task(ctx.me, new_task).await?;

    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();
    println!(
        "{} Created task: {}",
        "✓".style(success_style),
        added_task.title.bright_white().bold()
    );
    println!(
        "  {} Task ID: {} ({})",
        "→".style(info_style),
        short_id(&added_task.id).yellow(),
        added_task.id
    );
    if let Some(deadline) = added_task.deadline {
        println!("  {} Deadline: {}", "→".style(info_style), deadline.to_string().cyan());
    }
    Ok(())
}
