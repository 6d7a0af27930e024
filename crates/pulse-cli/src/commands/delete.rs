use anyhow::{anyhow, Result};
use dialoguer::Confirm;
use owo_colors::{OwoColorize, Style};
use pulse_core::error::CoreError;
use pulse_core::repository::TaskRepository;

use super::Context;
use crate::cli::DeleteCommand;
use crate::util::resolve_task_id;

pub async fn delete_task(ctx: &Context<'_>, command: DeleteCommand) -> Result<()> {
    let task_id = resolve_task_id(ctx.repo, ctx.me, &command.id).await?;
    let task = ctx
        .repo
        .find_task(ctx.me, task_id)
        .await?
        .ok_or_else(|| anyhow!(CoreError::not_found(format!("Task with ID '{}' not found.", task_id))))?;

    if !command.force {
        let confirmation = Confirm::new()
            .with_prompt(format!("Are you sure you want to delete task '{}'?", task.title))
            .default(false)
            .interact()
            .unwrap_or(false);

        if !confirmation {
            println!("Deletion cancelled.");
            return Ok(());
        }
    }

    ctx.repo.delete_task(ctx.me, task_id).await?;
    println!("{} Deleted task: {}", "✓".style(Style::new().green().bold()), task.title);
    Ok(())
}
