use anyhow::{anyhow, Result};
use pulse_core::error::CoreError;
use pulse_core::models::{Identity, Project};
use pulse_core::repository::{Repository, TaskRepository};
use uuid::Uuid;

pub const MIN_PREFIX_LEN: usize = 4;

pub async fn resolve_task_id(repo: &dyn Repository, caller: &Identity, short_id: &str) -> Result<Uuid> {
    let short_id = short_id.trim().to_lowercase();
    if let Ok(id) = Uuid::parse_str(&short_id) {
        return Ok(id);
    }
    if short_id.len() < MIN_PREFIX_LEN {
        return Err(anyhow!(CoreError::Validation(format!(
            "Short ID must be at least {} characters long.",
            MIN_PREFIX_LEN
        ))));
    }

    let mut matches: Vec<(Uuid, String)> = repo
        .list_all_tasks(caller)
        .await?
        .into_iter()
        .filter(|t| matches_short_id(&t.id, &short_id))
        .map(|t| (t.id, t.title))
        .collect();

    match matches.len() {
        1 => Ok(matches.remove(0).0),
        0 => Err(anyhow!(CoreError::NotFound(format!(
            "No task found with ID prefix '{}'",
            short_id
        )))),
        _ => Err(anyhow!(CoreError::AmbiguousId(
            matches
                .into_iter()
                .map(|(id, title)| (id.to_string(), title))
                .collect()
        ))),
    }
}

/// Finds a project by exact (case-insensitive) name, falling back to an id prefix.
pub fn find_project<'a>(projects: &'a [Project], reference: &str) -> Result<&'a Project> {
    let reference = reference.trim();
    if let Some(project) = projects.iter().find(|p| p.name.eq_ignore_ascii_case(reference)) {
        return Ok(project);
    }

    let prefix = reference.to_lowercase();
    let candidates: Vec<&Project> = if prefix.len() >= MIN_PREFIX_LEN {
        projects
            .iter()
            .filter(|p| matches_short_id(&p.id, &prefix))
            .collect()
    } else {
        Vec::new()
    };

    match candidates.as_slice() {
        [project] => Ok(project),
        [] => Err(anyhow!(CoreError::NotFound(format!("No project named '{}'", reference)))),
        many => Err(anyhow!(CoreError::AmbiguousId(
            many.iter().map(|p| (p.id.to_string(), p.name.clone())).collect()
        ))),
    }
}

/// The random tail of the id. UUIDv7 heads are timestamps and collide for
/// tasks created together.
pub fn short_id(id: &Uuid) -> String {
    let simple = id.simple().to_string();
    simple[simple.len() - 8..].to_string()
}

fn matches_short_id(id: &Uuid, fragment: &str) -> bool {
    let fragment = fragment.replace('-', "");
    let simple = id.simple().to_string();
    simple.starts_with(&fragment) || simple.ends_with(&fragment)
}
