use anyhow::Result;
use owo_colors::{OwoColorize, Style};
use pulse_core::models::BulkTaskUpdate;
use pulse_core::repository::TaskRepository;

use super::Context;
use crate::cli::BulkDeadlineCommand;
use crate::parser::parse_deadline;
use crate::util::resolve_task_id;

pub async fn bulk_deadline(ctx: &Context<'_>, command: BulkDeadlineCommand) -> Result<()> {
    let deadline = parse_deadline(&command.deadline, &ctx.config.dashboard.timezone)?;
    let mut ids = Vec::with_capacity(command.ids.len());
    for id in &command.ids {
        ids.push(resolve_task_id(ctx.repo, ctx.me, id).await?);
    }

    let outcome = ctx
        .repo
        .bulk_update_tasks(
            ctx.me,
            &ids,
            BulkTaskUpdate {
                deadline: Some(Some(deadline)),
                status: None,
                audit_note: Some(command.note),
            },
        )
        .await?;

    println!(
        "{} Moved {} task(s) to {}",
        "✓".style(Style::new().green().bold()),
        outcome.updated,
        deadline.to_string().cyan()
    );
    // Rejected ids are reported with the partial-failure error.
    outcome.into_result()?;
    Ok(())
}
