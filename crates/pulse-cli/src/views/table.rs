use chrono::NaiveDate;
use chrono_humanize::Humanize;
use comfy_table::{Attribute, Cell, Color, Row, Table};
use owo_colors::OwoColorize;
use pulse_core::access::same_name;
use pulse_core::filter::{Dimension, FacetOptions};
use pulse_core::metrics::{classify_deadline, DashboardMetrics, DeadlineState};
use pulse_core::models::{AuditEntry, Project, Task, TaskStatus};

use crate::util::short_id;

pub fn display_tasks(tasks: &[&Task], projects: &[Project], today: NaiveDate, warning_window_days: i64) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Project", "Phase", "Owner", "Status", "Deadline", "Impact"]);

    for task in tasks {
        let mut row = Row::new();
        row.add_cell(Cell::new(short_id(&task.id)));

        let mut title_cell = Cell::new(&task.title);
        if task.status.is_closed() {
            title_cell = title_cell.add_attribute(Attribute::CrossedOut).fg(Color::DarkGrey);
        }
        row.add_cell(title_cell);

        let project_name = projects
            .iter()
            .find(|p| p.id == task.project_id)
            .map(|p| p.name.as_str())
            .unwrap_or("Unknown");
        row.add_cell(Cell::new(project_name));
        row.add_cell(Cell::new(task.phase));

        let owner = match &task.help {
            Some(help) => format!("{} (help: {})", task.owner, help.assignee),
            None => task.owner.clone(),
        };
        row.add_cell(Cell::new(owner));

        let status_cell = Cell::new(task.status);
        row.add_cell(match task.status {
            TaskStatus::Done => status_cell.fg(Color::Green),
            TaskStatus::Cancelled => status_cell.fg(Color::DarkGrey),
            TaskStatus::Blocked | TaskStatus::HelpMe => status_cell.fg(Color::Red),
            TaskStatus::InProgress => status_cell.fg(Color::Cyan),
            TaskStatus::NotStarted | TaskStatus::OnHold => status_cell,
        });

        let deadline_cell = match task.deadline {
            Some(deadline) => {
                let cell = Cell::new(deadline.format("%Y-%m-%d"));
                match classify_deadline(task, today, warning_window_days) {
                    DeadlineState::Overdue => cell.fg(Color::Red).add_attribute(Attribute::Bold),
                    DeadlineState::Warning => cell.fg(Color::Yellow),
                    _ => cell,
                }
            }
            None => Cell::new("-"),
        };
        row.add_cell(deadline_cell);

        row.add_cell(Cell::new(
            task.impact_score.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
        ));
        table.add_row(row);
    }

    println!("{table}");
}

/// Configured teams first, in configured order, then any other names.
pub fn order_owners(owners: &[String], teams: &[String]) -> Vec<String> {
    let mut ordered: Vec<String> = teams
        .iter()
        .filter_map(|team| owners.iter().find(|o| same_name(o, team)).cloned())
        .collect();
    ordered.extend(
        owners
            .iter()
            .filter(|o| !teams.iter().any(|t| same_name(o, t)))
            .cloned(),
    );
    ordered
}

pub fn display_options(options: &FacetOptions, teams: &[String]) {
    let projects: Vec<&str> = options.projects.iter().map(|p| p.name.as_str()).collect();
    let statuses: Vec<&str> = options.statuses.iter().map(|s| s.as_str()).collect();

    println!("{}", "Available filters".blue().bold());
    println!("  {} {}", "Owners:  ".bright_black(), order_owners(&options.owners, teams).join(", "));
    println!("  {} {}", "Projects:".bright_black(), projects.join(", "));
    println!("  {} {}", "Statuses:".bright_black(), statuses.join(", "));
}

pub fn display_resets(reset: &[Dimension]) {
    for dimension in reset {
        let name = match dimension {
            Dimension::Owner => "owner",
            Dimension::Project => "project",
            Dimension::Status => "status",
        };
        println!(
            "{} The {} filter matched nothing with the other filters and was cleared.",
            "Note:".yellow().bold(),
            name
        );
    }
}

pub fn display_projects(projects: &[Project]) {
    if projects.is_empty() {
        println!("No projects found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Priority", "Details", "Created"]);

    for project in projects {
        let mut row = Row::new();
        row.add_cell(Cell::new(short_id(&project.id)));
        row.add_cell(Cell::new(&project.name));
        row.add_cell(Cell::new(project.priority));
        row.add_cell(Cell::new(project.details.as_deref().unwrap_or("-")));
        row.add_cell(Cell::new(project.created_at.humanize()));
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_metrics(metrics: &DashboardMetrics) {
    let mut cards = Table::new();
    cards.set_header(vec![
        "Tasks",
        "Done",
        "Completion",
        "In progress",
        "Overdue",
        "Due soon",
        "Operation score",
        "Efficiency",
        "On time",
    ]);
    cards.add_row(vec![
        Cell::new(metrics.total),
        Cell::new(metrics.done_count).fg(Color::Green),
        Cell::new(format!("{:.1}%", metrics.completion_rate())),
        Cell::new(metrics.wip_count).fg(Color::Cyan),
        overdue_cell(metrics.overdue_count),
        Cell::new(metrics.warning_count).fg(Color::Yellow),
        Cell::new(metrics.operation_score_label()),
        Cell::new(format!("{}%", metrics.efficiency_ratio_label())),
        Cell::new(format!("{}%", metrics.on_time_performance_label())),
    ]);
    println!("{cards}");

    let mut statuses = Table::new();
    statuses.set_header(vec!["Status", "Count"]);
    for entry in &metrics.status_histogram {
        statuses.add_row(vec![Cell::new(entry.status), Cell::new(entry.count)]);
    }
    println!("{statuses}");

    if metrics.owner_histogram.is_empty() {
        return;
    }
    let mut owners = Table::new();
    owners.set_header(vec!["Team", "Tasks"]);
    for entry in &metrics.owner_histogram {
        owners.add_row(vec![Cell::new(&entry.owner), Cell::new(entry.count)]);
    }
    println!("{owners}");
}

fn overdue_cell(count: usize) -> Cell {
    let cell = Cell::new(count);
    if count > 0 {
        cell.fg(Color::Red).add_attribute(Attribute::Bold)
    } else {
        cell
    }
}

pub fn display_history(entries: &[AuditEntry]) {
    if entries.is_empty() {
        println!("No recorded changes.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["When", "By", "Action", "Field", "Before", "After", "Note"]);
    for entry in entries {
        table.add_row(vec![
            Cell::new(entry.recorded_at.format("%Y-%m-%d %H:%M")),
            Cell::new(&entry.actor),
            Cell::new(entry.action),
            Cell::new(entry.field),
            Cell::new(entry.before_value.as_deref().unwrap_or("-")),
            Cell::new(entry.after_value.as_deref().unwrap_or("-")),
            Cell::new(&entry.note),
        ]);
    }
    println!("{table}");
}
