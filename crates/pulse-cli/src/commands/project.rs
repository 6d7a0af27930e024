use anyhow::Result;
use dialoguer::Confirm;
use owo_colors::{OwoColorize, Style};
use pulse_core::models::{template_tasks, NewProjectData, NewTaskData, UpdateProjectData};
use pulse_core::repository::ProjectRepository;

use super::Context;
use crate::cli::ProjectCommand;
use crate::parser::parse_seed_task;
use crate::util::{find_project, short_id};
use crate::views::table::display_projects;

pub async fn project_command(ctx: &Context<'_>, command: ProjectCommand) -> Result<()> {
    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();

    match command {
        ProjectCommand::List => {
            let projects = ctx.repo.list_projects(ctx.me).await?;
            display_projects(&projects);
        }
        ProjectCommand::Add {
            name,
            priority,
            details,
            with_template,
            tasks,
        } => {
            let mut seeds = if with_template { template_tasks() } else { Vec::new() };
            for seed in &tasks {
                let (title, owner) = parse_seed_task(seed)?;
                seeds.push(NewTaskData {
                    title,
                    owner,
                    ..Default::default()
                });
            }

            let created = ctx
                .repo
                .create_project(
                    ctx.me,
                    NewProjectData {
                        name,
                        priority,
                        details,
                        tasks: seeds,
                    },
                )
                .await?;
            println!(
                "{} Created project: {}",
                "✓".style(success_style),
                created.project.name.bright_white().bold()
            );
            println!(
                "  {} Project ID: {}",
                "→".style(info_style),
                created.project.id.to_string().yellow()
            );
            println!("  {} {} task(s) seeded", "→".style(info_style), created.tasks_added);
        }
        ProjectCommand::Edit {
            project,
            name,
            priority,
            details,
            details_clear,
        } => {
            let projects = ctx.repo.list_projects(ctx.me).await?;
            let target = find_project(&projects, &project)?;
            let details = if details_clear { Some(None) } else { details.map(Some) };

            let updated = ctx
                .repo
                .update_project(ctx.me, target.id, UpdateProjectData { name, priority, details })
                .await?;
            println!(
                "{} Updated project: {} ({})",
                "✓".style(success_style),
                updated.name.bright_white().bold(),
                short_id(&updated.id).yellow()
            );
        }
        ProjectCommand::Delete { project, force } => {
            let projects = ctx.repo.list_projects(ctx.me).await?;
            let target = find_project(&projects, &project)?;

            if !force {
                let confirmation = Confirm::new()
                    .with_prompt(format!(
                        "Delete project '{}' and all of its tasks?",
                        target.name
                    ))
                    .default(false)
                    .interact()
                    .unwrap_or(false);

                if !confirmation {
                    println!("Deletion cancelled.");
                    return Ok(());
                }
            }

            let deleted = ctx.repo.delete_project(ctx.me, target.id).await?;
            println!(
                "{} Deleted project '{}' and {} task(s)",
                "✓".style(success_style),
                target.name,
                deleted.tasks_deleted
            );
        }
    }
    Ok(())
}
