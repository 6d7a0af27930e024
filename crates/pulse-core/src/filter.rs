//! Faceted task filtering.
//!
//! [`facet`] walks the task collection once and produces both the tasks that
//! satisfy every active selection and, for the owner, project and status
//! dimensions, the values that remain reachable when that dimension's own
//! selection is ignored. [`reconcile`] then drops selections that fell out of
//! their option set, and [`refine`] runs the two as one step.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;
use uuid::Uuid;

use crate::access::normalize_name;
use crate::models::{DashboardConfig, Project, Task, TaskStatus};

/// Current dropdown/search state. `None` or an empty string means no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelections {
    pub owner: Option<String>,
    pub project_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub search: String,
}

impl FilterSelections {
    pub fn is_unconstrained(&self) -> bool {
        self.owner.as_deref().map_or(true, |o| o.trim().is_empty())
            && self.project_id.is_none()
            && self.status.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.search.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectOption {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacetOptions {
    /// Owner and helper names, deduplicated on their normalised form and
    /// ordered by it. The first spelling seen wins.
    pub owners: Vec<String>,
    /// Reachable projects in project-collection order
    pub projects: Vec<ProjectOption>,
    /// Reachable statuses in [`TaskStatus::ALL`] order
    pub statuses: Vec<TaskStatus>,
}

impl FacetOptions {
    pub fn has_owner(&self, owner: &str) -> bool {
        let key = normalize_name(owner);
        self.owners.iter().any(|o| normalize_name(o) == key)
    }

    pub fn has_project(&self, id: Uuid) -> bool {
        self.projects.iter().any(|p| p.id == id)
    }

    pub fn has_status(&self, status: TaskStatus) -> bool {
        self.statuses.contains(&status)
    }
}

#[derive(Debug, Clone)]
pub struct FacetResult<'a> {
    /// Tasks matching every active selection, in collection order
    pub tasks: Vec<&'a Task>,
    pub options: FacetOptions,
}

/// Facet dimensions that can be reset by reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Owner,
    Project,
    Status,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcilePolicy {
    /// Project and status are always reset when unreachable; owner only on request.
    pub reset_owner: bool,
}

impl From<&DashboardConfig> for ReconcilePolicy {
    fn from(config: &DashboardConfig) -> Self {
        Self {
            reset_owner: config.reset_owner,
        }
    }
}

/// Selections compiled once per pass: owner normalised, search lowercased.
struct Predicates {
    owner: Option<String>,
    project_id: Option<Uuid>,
    status: Option<TaskStatus>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    search: Option<String>,
}

impl Predicates {
    fn compile(selections: &FilterSelections) -> Self {
        let owner = selections
            .owner
            .as_deref()
            .map(normalize_name)
            .filter(|o| !o.is_empty());
        let search = Some(selections.search.trim().to_lowercase()).filter(|q| !q.is_empty());
        Self {
            owner,
            project_id: selections.project_id,
            status: selections.status,
            start_date: selections.start_date,
            end_date: selections.end_date,
            search,
        }
    }

    /// Primary owner or the team currently helping.
    fn owner(&self, task: &Task) -> bool {
        let Some(owner) = &self.owner else {
            return true;
        };
        normalize_name(&task.owner) == *owner
            || task
                .help
                .as_ref()
                .is_some_and(|help| normalize_name(&help.assignee) == *owner)
    }

    fn project(&self, task: &Task) -> bool {
        self.project_id.map_or(true, |id| task.project_id == id)
    }

    fn status(&self, task: &Task) -> bool {
        self.status.map_or(true, |status| task.status == status)
    }

    fn date_range(&self, task: &Task) -> bool {
        if self.start_date.is_none() && self.end_date.is_none() {
            return true;
        }
        let Some(deadline) = task.deadline else {
            return false;
        };
        self.start_date.map_or(true, |start| deadline >= start)
            && self.end_date.map_or(true, |end| deadline <= end)
    }

    fn search(&self, task: &Task) -> bool {
        let Some(query) = &self.search else {
            return true;
        };
        let help_details = task.help.as_ref().map(|h| h.details.as_str()).unwrap_or("");
        [
            task.title.as_str(),
            task.notes.as_str(),
            task.feedback_to_team.as_str(),
            task.owner_feedback.as_str(),
            task.owner.as_str(),
            help_details,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(query.as_str()))
    }
}

/// Whether `task` satisfies every active selection.
pub fn matches(task: &Task, selections: &FilterSelections) -> bool {
    let p = Predicates::compile(selections);
    p.owner(task) && p.project(task) && p.status(task) && p.date_range(task) && p.search(task)
}

/// Filters `tasks` and computes the reachable values of each facet in one pass.
///
/// A task contributes to dimension D's options when it satisfies every
/// predicate except D's own. Date range and search are not facets; a task
/// failing either contributes nothing.
pub fn facet<'a>(tasks: &'a [Task], projects: &[Project], selections: &FilterSelections) -> FacetResult<'a> {
    let predicates = Predicates::compile(selections);

    let mut matched = Vec::new();
    let mut owners: BTreeMap<String, String> = BTreeMap::new();
    let mut project_ids: HashSet<Uuid> = HashSet::new();
    let mut statuses: BTreeSet<TaskStatus> = BTreeSet::new();

    for task in tasks {
        if !(predicates.date_range(task) && predicates.search(task)) {
            continue;
        }
        let owner_ok = predicates.owner(task);
        let project_ok = predicates.project(task);
        let status_ok = predicates.status(task);

        if project_ok && status_ok {
            add_owner(&mut owners, &task.owner);
            if let Some(help) = &task.help {
                add_owner(&mut owners, &help.assignee);
            }
        }
        if owner_ok && status_ok {
            project_ids.insert(task.project_id);
        }
        if owner_ok && project_ok {
            statuses.insert(task.status);
        }
        if owner_ok && project_ok && status_ok {
            matched.push(task);
        }
    }

    let options = FacetOptions {
        owners: owners.into_values().collect(),
        projects: projects
            .iter()
            .filter(|p| project_ids.contains(&p.id))
            .map(|p| ProjectOption {
                id: p.id,
                name: p.name.clone(),
            })
            .collect(),
        statuses: statuses.into_iter().collect(),
    };

    FacetResult {
        tasks: matched,
        options,
    }
}

fn add_owner(owners: &mut BTreeMap<String, String>, name: &str) {
    let key = normalize_name(name);
    if !key.is_empty() {
        owners.entry(key).or_insert_with(|| name.trim().to_string());
    }
}

/// Drops selections that are no longer present in their own option set.
///
/// Applying this to its own output is a no-op: clearing a selection only
/// widens the other dimensions' option sets, so nothing that survived the
/// first application can become unreachable.
pub fn reconcile(
    selections: &FilterSelections,
    options: &FacetOptions,
    policy: ReconcilePolicy,
) -> FilterSelections {
    let mut next = selections.clone();
    if let Some(id) = next.project_id {
        if !options.has_project(id) {
            next.project_id = None;
        }
    }
    if let Some(status) = next.status {
        if !options.has_status(status) {
            next.status = None;
        }
    }
    if policy.reset_owner {
        if let Some(owner) = &next.owner {
            if !normalize_name(owner).is_empty() && !options.has_owner(owner) {
                next.owner = None;
            }
        }
    }
    next
}

#[derive(Debug, Clone)]
pub struct Refined<'a> {
    pub view: FacetResult<'a>,
    /// Dimensions whose selection was reset during this step
    pub reset: Vec<Dimension>,
}

/// Facets, reconciles, and commits the reconciled selections only when they
/// differ by value, recomputing once in that case.
pub fn refine<'a>(
    tasks: &'a [Task],
    projects: &[Project],
    selections: &mut FilterSelections,
    policy: ReconcilePolicy,
) -> Refined<'a> {
    let first = facet(tasks, projects, selections);
    let reconciled = reconcile(selections, &first.options, policy);
    if reconciled == *selections {
        return Refined {
            view: first,
            reset: Vec::new(),
        };
    }

    let mut reset = Vec::new();
    if reconciled.owner != selections.owner {
        reset.push(Dimension::Owner);
    }
    if reconciled.project_id != selections.project_id {
        reset.push(Dimension::Project);
    }
    if reconciled.status != selections.status {
        reset.push(Dimension::Status);
    }
    debug!(?reset, "refine: clearing unreachable selections");

    *selections = reconciled;
    Refined {
        view: facet(tasks, projects, selections),
        reset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HelpRequest;
    use chrono::Utc;
    use proptest::prelude::*;
    use rstest::rstest;

    fn project(name: &str, priority: i32) -> Project {
        Project {
            id: Uuid::now_v7(),
            name: name.to_string(),
            priority,
            details: None,
            created_at: Utc::now(),
        }
    }

    fn task(project_id: Uuid, title: &str, owner: &str, status: TaskStatus) -> Task {
        Task {
            project_id,
            title: title.to_string(),
            owner: owner.to_string(),
            status,
            ..Default::default()
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_unconstrained_returns_everything() {
        let web = project("Website", 1);
        let tasks = vec![
            task(web.id, "Hero", "WEB", TaskStatus::InProgress),
            task(web.id, "Copy", "CONTENT", TaskStatus::Done),
        ];
        let selections = FilterSelections::default();
        assert!(selections.is_unconstrained());

        let result = facet(&tasks, &[web.clone()], &selections);
        assert_eq!(result.tasks.len(), 2);
        assert_eq!(result.options.owners, vec!["CONTENT".to_string(), "WEB".to_string()]);
        assert_eq!(result.options.projects.len(), 1);
        assert_eq!(
            result.options.statuses,
            vec![TaskStatus::InProgress, TaskStatus::Done]
        );
    }

    #[test]
    fn test_owner_matches_help_assignee() {
        let p = project("Launch", 1);
        let mut helped = task(p.id, "Landing page", "WEB", TaskStatus::HelpMe);
        helped.help = Some(HelpRequest {
            requested_at: Utc::now(),
            assignee: "MARKETING".to_string(),
            details: "copy review".to_string(),
        });
        let tasks = vec![
            task(p.id, "Campaign", "MARKETING", TaskStatus::InProgress),
            task(p.id, "Newsletter", "MARKETING", TaskStatus::NotStarted),
            helped,
            task(p.id, "Checkout", "WEB", TaskStatus::InProgress),
        ];
        let selections = FilterSelections {
            owner: Some("MARKETING".to_string()),
            ..Default::default()
        };

        let result = facet(&tasks, &[p], &selections);
        let titles: Vec<_> = result.tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Campaign", "Newsletter", "Landing page"]);
    }

    #[rstest]
    #[case("@Dealers")]
    #[case("@dealers")]
    #[case("  @DEALERS ")]
    fn test_search_covers_feedback_fields(#[case] query: &str) {
        let p = project("Dealer portal", 1);
        let mut reviewed = task(p.id, "Price list", "SALES", TaskStatus::InProgress);
        reviewed.feedback_to_team = "@Dealers please review".to_string();
        let mut pinged = task(p.id, "Catalogue", "MARKETING", TaskStatus::Blocked);
        pinged.owner_feedback = "waiting on @dealers".to_string();
        let tasks = vec![reviewed, pinged, task(p.id, "Logo", "DESIGN", TaskStatus::Done)];
        let selections = FilterSelections {
            search: query.to_string(),
            ..Default::default()
        };

        let result = facet(&tasks, &[p], &selections);
        let titles: Vec<&str> = result.tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Price list", "Catalogue"]);
    }

    #[test]
    fn test_date_range_excludes_undated_tasks() {
        let p = project("Ops", 1);
        let mut early = task(p.id, "Early", "OPERATIONS", TaskStatus::NotStarted);
        early.deadline = Some(date(2026, 1, 5));
        let mut inside = task(p.id, "Inside", "OPERATIONS", TaskStatus::NotStarted);
        inside.deadline = Some(date(2026, 1, 10));
        let mut edge = task(p.id, "Edge", "OPERATIONS", TaskStatus::NotStarted);
        edge.deadline = Some(date(2026, 1, 20));
        let undated = task(p.id, "Undated", "OPERATIONS", TaskStatus::NotStarted);
        let tasks = vec![early, inside, edge, undated];

        let bounded = FilterSelections {
            start_date: Some(date(2026, 1, 10)),
            end_date: Some(date(2026, 1, 20)),
            ..Default::default()
        };
        let titles: Vec<_> = facet(&tasks, &[p.clone()], &bounded)
            .tasks
            .iter()
            .map(|t| t.title.clone())
            .collect();
        assert_eq!(titles, vec!["Inside", "Edge"]);

        let open_ended = FilterSelections {
            end_date: Some(date(2026, 1, 9)),
            ..Default::default()
        };
        let titles: Vec<_> = facet(&tasks, &[p], &open_ended)
            .tasks
            .iter()
            .map(|t| t.title.clone())
            .collect();
        assert_eq!(titles, vec!["Early"]);
    }

    #[test]
    fn test_options_ignore_own_dimension() {
        let a = project("Alpha", 1);
        let b = project("Beta", 2);
        let tasks = vec![
            task(a.id, "a1", "WEB", TaskStatus::Done),
            task(a.id, "a2", "SALES", TaskStatus::Blocked),
            task(b.id, "b1", "WEB", TaskStatus::InProgress),
        ];
        let selections = FilterSelections {
            owner: Some("WEB".to_string()),
            project_id: Some(a.id),
            ..Default::default()
        };

        let result = facet(&tasks, &[a.clone(), b.clone()], &selections);
        assert_eq!(result.tasks.len(), 1);
        // Projects reachable for WEB: both.
        assert_eq!(
            result.options.projects.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![a.id, b.id]
        );
        // Owners reachable inside Alpha: both teams.
        assert_eq!(result.options.owners, vec!["SALES".to_string(), "WEB".to_string()]);
        // Statuses for WEB inside Alpha only.
        assert_eq!(result.options.statuses, vec![TaskStatus::Done]);
    }

    #[test]
    fn test_unmatched_search_still_computes_options_from_other_constraints() {
        let p = project("Alpha", 1);
        let tasks = vec![task(p.id, "Banner", "WEB", TaskStatus::Done)];
        let selections = FilterSelections {
            search: "nothing like this".to_string(),
            ..Default::default()
        };
        let result = facet(&tasks, &[p], &selections);
        assert!(result.tasks.is_empty());
        assert!(result.options.owners.is_empty());

        let q = project("Beta", 2);
        let tasks = vec![
            task(q.id, "Banner", "WEB", TaskStatus::Done),
            task(q.id, "Brochure", "DESIGN", TaskStatus::Done),
        ];
        let selections = FilterSelections {
            owner: Some("SALES".to_string()),
            search: "b".to_string(),
            ..Default::default()
        };
        let result = facet(&tasks, &[q], &selections);
        assert!(result.tasks.is_empty());
        assert_eq!(result.options.owners, vec!["DESIGN".to_string(), "WEB".to_string()]);
    }

    #[test]
    fn test_reset_when_project_tasks_disappear() {
        let doomed = project("Doomed", 1);
        let kept = project("Kept", 2);
        let mut tasks = vec![
            task(doomed.id, "d1", "WEB", TaskStatus::NotStarted),
            task(kept.id, "k1", "WEB", TaskStatus::NotStarted),
        ];
        let projects = vec![doomed.clone(), kept.clone()];
        let mut selections = FilterSelections {
            project_id: Some(doomed.id),
            ..Default::default()
        };

        let refined = refine(&tasks, &projects, &mut selections, ReconcilePolicy::default());
        assert!(refined.reset.is_empty());
        assert_eq!(refined.view.tasks.len(), 1);

        tasks.retain(|t| t.project_id != doomed.id);
        let refined = refine(&tasks, &projects, &mut selections, ReconcilePolicy::default());
        assert_eq!(refined.reset, vec![Dimension::Project]);
        assert!(!refined.view.options.has_project(doomed.id));
        assert_eq!(refined.view.tasks.len(), 1);
        assert_eq!(selections.project_id, None);
    }

    #[test]
    fn test_owner_reset_follows_policy() {
        let p = project("Alpha", 1);
        let tasks = vec![task(p.id, "a", "WEB", TaskStatus::Done)];
        let base = FilterSelections {
            owner: Some("SALES".to_string()),
            ..Default::default()
        };

        let mut kept = base.clone();
        refine(&tasks, &[p.clone()], &mut kept, ReconcilePolicy::default());
        assert_eq!(kept.owner.as_deref(), Some("SALES"));

        let mut cleared = base;
        let refined = refine(&tasks, &[p], &mut cleared, ReconcilePolicy { reset_owner: true });
        assert_eq!(refined.reset, vec![Dimension::Owner]);
        assert_eq!(cleared.owner, None);
    }

    #[test]
    fn test_status_reset_widens_to_remaining_constraints() {
        let p = project("Alpha", 1);
        let tasks = vec![
            task(p.id, "a", "WEB", TaskStatus::Done),
            task(p.id, "b", "WEB", TaskStatus::Blocked),
        ];
        let mut selections = FilterSelections {
            status: Some(TaskStatus::Cancelled),
            ..Default::default()
        };
        let refined = refine(&tasks, &[p], &mut selections, ReconcilePolicy::default());
        assert_eq!(refined.reset, vec![Dimension::Status]);
        assert_eq!(refined.view.tasks.len(), 2);
    }

    fn fixed_project_ids() -> [Uuid; 3] {
        [
            Uuid::from_u128(0x1111),
            Uuid::from_u128(0x2222),
            Uuid::from_u128(0x3333),
        ]
    }

    fn fixed_projects() -> Vec<Project> {
        fixed_project_ids()
            .iter()
            .enumerate()
            .map(|(i, id)| Project {
                id: *id,
                name: format!("Project {}", i),
                priority: i as i32,
                details: None,
                created_at: Utc::now(),
            })
            .collect()
    }

    const OWNERS: [&str; 3] = ["WEB", "MARKETING", "SALES"];
    const TITLES: [&str; 4] = ["Banner ad", "Dealer kit", "Landing page", "Price sheet"];

    fn arb_task() -> impl Strategy<Value = Task> {
        (
            0..3usize,
            0..4usize,
            0..3usize,
            0..TaskStatus::ALL.len(),
            proptest::option::of(0..30u32),
            proptest::option::of(0..3usize),
        )
            .prop_map(|(p, t, o, s, day, helper)| {
                let status = TaskStatus::ALL[s];
                let help = match (status, helper) {
                    (TaskStatus::HelpMe, Some(h)) => Some(HelpRequest {
                        requested_at: Utc::now(),
                        assignee: OWNERS[h].to_string(),
                        details: String::new(),
                    }),
                    _ => None,
                };
                Task {
                    project_id: fixed_project_ids()[p],
                    title: TITLES[t].to_string(),
                    owner: OWNERS[o].to_string(),
                    status,
                    deadline: day.map(|d| date(2026, 6, 1) + chrono::Duration::days(d as i64)),
                    help,
                    ..Default::default()
                }
            })
    }

    fn arb_selections() -> impl Strategy<Value = FilterSelections> {
        (
            proptest::option::of(0..4usize),
            proptest::option::of(0..4usize),
            proptest::option::of(0..TaskStatus::ALL.len()),
            proptest::option::of(0..30u32),
            proptest::option::of(0..30u32),
            prop_oneof![Just(""), Just("page"), Just("DEALER"), Just("zzz")],
        )
            .prop_map(|(o, p, s, start, end, q)| FilterSelections {
                // Index 3 selects a value no task carries.
                owner: o.map(|i| OWNERS.get(i).copied().unwrap_or("CONTENT").to_string()),
                project_id: p.map(|i| {
                    fixed_project_ids()
                        .get(i)
                        .copied()
                        .unwrap_or(Uuid::from_u128(0x9999))
                }),
                status: s.map(|i| TaskStatus::ALL[i]),
                start_date: start.map(|d| date(2026, 6, 1) + chrono::Duration::days(d as i64)),
                end_date: end.map(|d| date(2026, 6, 1) + chrono::Duration::days(d as i64)),
                search: q.to_string(),
            })
    }

    proptest! {
        #[test]
        fn prop_result_is_conjunction_of_predicates(
            tasks in proptest::collection::vec(arb_task(), 0..40),
            selections in arb_selections(),
        ) {
            let projects = fixed_projects();
            let result = facet(&tasks, &projects, &selections);
            let expected: Vec<&Task> = tasks.iter().filter(|t| matches(t, &selections)).collect();
            prop_assert_eq!(result.tasks.len(), expected.len());
            for (got, want) in result.tasks.iter().zip(expected) {
                prop_assert!(std::ptr::eq(*got, want));
            }
            for t in &result.tasks {
                if let Some(status) = selections.status {
                    prop_assert_eq!(t.status, status);
                }
                if let Some(id) = selections.project_id {
                    prop_assert_eq!(t.project_id, id);
                }
                if selections.start_date.is_some() || selections.end_date.is_some() {
                    prop_assert!(t.deadline.is_some());
                }
            }
        }

        #[test]
        fn prop_every_option_yields_results(
            tasks in proptest::collection::vec(arb_task(), 0..40),
            selections in arb_selections(),
        ) {
            let projects = fixed_projects();
            let options = facet(&tasks, &projects, &selections).options;
            for owner in &options.owners {
                let narrowed = FilterSelections { owner: Some(owner.clone()), ..selections.clone() };
                prop_assert!(!facet(&tasks, &projects, &narrowed).tasks.is_empty());
            }
            for project in &options.projects {
                let narrowed = FilterSelections { project_id: Some(project.id), ..selections.clone() };
                prop_assert!(!facet(&tasks, &projects, &narrowed).tasks.is_empty());
            }
            for status in &options.statuses {
                let narrowed = FilterSelections { status: Some(*status), ..selections.clone() };
                prop_assert!(!facet(&tasks, &projects, &narrowed).tasks.is_empty());
            }
        }

        #[test]
        fn prop_reconcile_reaches_fixed_point(
            tasks in proptest::collection::vec(arb_task(), 0..40),
            selections in arb_selections(),
            reset_owner in any::<bool>(),
        ) {
            let projects = fixed_projects();
            let policy = ReconcilePolicy { reset_owner };
            let mut state = selections;
            refine(&tasks, &projects, &mut state, policy);
            let settled = state.clone();
            let again = refine(&tasks, &projects, &mut state, policy);
            prop_assert!(again.reset.is_empty());
            prop_assert_eq!(state, settled);
        }
    }
}
