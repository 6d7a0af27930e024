//! Capability checks shared by the stores (authorisation, visibility) and the
//! filter engine (owner matching).

use crate::models::{Identity, Task};

/// Trims, collapses inner whitespace and lowercases a team or person name.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Whether two names refer to the same team once normalised.
pub fn same_name(a: &str, b: &str) -> bool {
    let (a, b) = (normalize_name(a), normalize_name(b));
    !a.is_empty() && a == b
}

/// Whether `identity` may act on a resource owned by `resource_owner`.
pub fn can_act(identity: &Identity, resource_owner: &str) -> bool {
    identity.is_admin() || same_name(&identity.name, resource_owner)
}

/// Members see the tasks they own and the tasks they were asked to help on.
pub fn can_view(identity: &Identity, task: &Task) -> bool {
    can_act(identity, &task.owner)
        || task
            .help
            .as_ref()
            .is_some_and(|help| can_act(identity, &help.assignee))
}

pub fn can_administer(identity: &Identity) -> bool {
    identity.is_admin()
}
