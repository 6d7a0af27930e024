use anyhow::Result;
use pulse_core::repository::AuditRepository;

use super::Context;
use crate::cli::HistoryCommand;
use crate::util::resolve_task_id;
use crate::views::table::display_history;

pub async fn show_history(ctx: &Context<'_>, command: HistoryCommand) -> Result<()> {
    let task_id = resolve_task_id(ctx.repo, ctx.me, &command.id).await?;
    let entries = ctx.repo.task_history(ctx.me, task_id).await?;
    display_history(&entries);
    Ok(())
}
