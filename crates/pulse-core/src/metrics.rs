//! Dashboard KPIs and histograms derived from a task collection.
//!
//! Everything here is recomputed from its input on every call; nothing is
//! cached between calls and no input can make a ratio NaN.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use crate::access::normalize_name;
use crate::models::{Task, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: TaskStatus,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerCount {
    pub owner: String,
    pub count: usize,
}

/// Where a task stands relative to its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeadlineState {
    /// Done or Cancelled
    Closed,
    NoDeadline,
    /// Deadline before today
    Overdue,
    /// Deadline within [today, today + window]
    Warning,
    OnTrack,
}

pub fn classify_deadline(task: &Task, today: NaiveDate, warning_window_days: i64) -> DeadlineState {
    if task.status.is_closed() {
        return DeadlineState::Closed;
    }
    let Some(deadline) = task.deadline else {
        return DeadlineState::NoDeadline;
    };
    if deadline < today {
        DeadlineState::Overdue
    } else if within_window(deadline, today, warning_window_days) {
        DeadlineState::Warning
    } else {
        DeadlineState::OnTrack
    }
}

/// A window reaching past the last representable date is unbounded.
fn within_window(deadline: NaiveDate, today: NaiveDate, warning_window_days: i64) -> bool {
    match Duration::try_days(warning_window_days.max(0)).and_then(|window| today.checked_add_signed(window)) {
        Some(horizon) => deadline <= horizon,
        None => true,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsScope {
    Global,
    Project(Uuid),
}

impl MetricsScope {
    pub fn includes(&self, task: &Task) -> bool {
        match self {
            MetricsScope::Global => true,
            MetricsScope::Project(id) => task.project_id == *id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardMetrics {
    /// Every status in enumeration order, zero-filled
    pub status_histogram: Vec<StatusCount>,
    /// Configured teams in order, zero counts omitted
    pub owner_histogram: Vec<OwnerCount>,
    /// Mean impact score of Done tasks
    pub operation_score: f64,
    /// Estimated over actual hours of Done tasks, as a percentage
    pub efficiency_ratio: f64,
    /// Share of Done tasks delivered Early or On-Time, as a percentage
    pub on_time_performance: f64,
    pub overdue_count: usize,
    pub warning_count: usize,
    pub done_count: usize,
    pub wip_count: usize,
    pub incomplete_count: usize,
    pub total: usize,
}

impl DashboardMetrics {
    pub fn operation_score_label(&self) -> String {
        format!("{:.2}", self.operation_score)
    }

    pub fn efficiency_ratio_label(&self) -> String {
        format!("{:.1}", self.efficiency_ratio)
    }

    pub fn on_time_performance_label(&self) -> String {
        format!("{:.1}", self.on_time_performance)
    }

    /// Done over all tasks, as a percentage.
    pub fn completion_rate(&self) -> f64 {
        ratio(self.done_count as f64, self.total as f64) * 100.0
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

pub fn aggregate<'a, I>(tasks: I, teams: &[String], today: NaiveDate, warning_window_days: i64) -> DashboardMetrics
where
    I: IntoIterator<Item = &'a Task>,
{
    let team_keys: Vec<String> = teams.iter().map(|t| normalize_name(t)).collect();
    let mut status_counts = [0usize; TaskStatus::ALL.len()];
    let mut owner_counts = vec![0usize; teams.len()];

    let mut total = 0;
    let mut done = 0;
    let mut impact_sum = 0u64;
    let mut impact_n = 0u64;
    let mut est_sum = 0.0;
    let mut actual_sum = 0.0;
    let mut on_time = 0;
    let mut overdue = 0;
    let mut warning = 0;
    let mut wip = 0;
    let mut incomplete = 0;

    for task in tasks {
        total += 1;
        if let Some(slot) = TaskStatus::ALL.iter().position(|s| *s == task.status) {
            status_counts[slot] += 1;
        }
        let owner_key = normalize_name(&task.owner);
        if let Some(slot) = team_keys.iter().position(|k| *k == owner_key) {
            owner_counts[slot] += 1;
        }

        if task.status == TaskStatus::Done {
            done += 1;
            if let Some(score) = task.impact_score {
                impact_sum += u64::from(score);
                impact_n += 1;
            }
            est_sum += task.est_hours;
            actual_sum += task.actual_hours.unwrap_or(0.0);
            if task.timeliness.is_some_and(|t| t.is_on_time()) {
                on_time += 1;
            }
        }
        if !task.status.is_closed() {
            incomplete += 1;
        }
        if task.status.is_wip() {
            wip += 1;
        }
        match classify_deadline(task, today, warning_window_days) {
            DeadlineState::Overdue => overdue += 1,
            DeadlineState::Warning => warning += 1,
            _ => {}
        }
    }

    DashboardMetrics {
        status_histogram: TaskStatus::ALL
            .iter()
            .zip(status_counts)
            .map(|(status, count)| StatusCount { status: *status, count })
            .collect(),
        owner_histogram: teams
            .iter()
            .zip(owner_counts)
            .filter(|(_, count)| *count > 0)
            .map(|(owner, count)| OwnerCount { owner: owner.clone(), count })
            .collect(),
        operation_score: ratio(impact_sum as f64, impact_n as f64),
        efficiency_ratio: ratio(est_sum, actual_sum) * 100.0,
        on_time_performance: ratio(on_time as f64, done as f64) * 100.0,
        overdue_count: overdue,
        warning_count: warning,
        done_count: done,
        wip_count: wip,
        incomplete_count: incomplete,
        total,
    }
}

pub fn aggregate_scoped(
    tasks: &[Task],
    scope: MetricsScope,
    teams: &[String],
    today: NaiveDate,
    warning_window_days: i64,
) -> DashboardMetrics {
    aggregate(
        tasks.iter().filter(|t| scope.includes(t)),
        teams,
        today,
        warning_window_days,
    )
}
