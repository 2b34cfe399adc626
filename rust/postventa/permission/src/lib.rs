//! Pure role-based policy predicates for the observation engine.
//!
//! Every function here decides over already-loaded entities; none of them
//! touch storage. Callers resolve the acting user and the entities first,
//! then gate each mutation through these checks.

use std::collections::HashMap;

use model_actor::{Actor, Role};
use models_housing::{Dwelling, Project};
use models_observations::{AttachmentRecord, Observation, status};
use uuid::Uuid;

/// Whether the actor's role scope covers the project at all.
///
/// Administrators and the housing agency see every project; regional
/// agencies are limited to their region (an actor with no region set acts
/// nationally); construction companies only see projects they built.
/// Beneficiaries are never scoped by project, only by dwelling.
pub fn in_project_scope(actor: &Actor, project: &Project) -> bool {
    match actor.role {
        Role::Administrator | Role::HousingAgency => true,
        Role::RegionalAgency => match actor.region_id {
            Some(region_id) => project.region_id == Some(region_id),
            None => true,
        },
        Role::ConstructionCompany => match actor.company.as_deref() {
            Some(company) => project.constructor.eq_ignore_ascii_case(company),
            None => false,
        },
        Role::Beneficiary => false,
    }
}

/// Whether the dwelling belongs to the acting beneficiary.
///
/// An actor with a national id matches only on an exact id; only accounts
/// without one fall back to matching the registered beneficiary or family
/// name against the actor's display name, case-insensitively.
pub fn is_own_dwelling(actor: &Actor, dwelling: &Dwelling) -> bool {
    match actor.national_id.as_deref() {
        Some(actor_id) => dwelling.beneficiary_national_id.as_deref() == Some(actor_id),
        None => name_fragment_matches(actor, dwelling),
    }
}

fn name_fragment_matches(actor: &Actor, dwelling: &Dwelling) -> bool {
    let needle = actor.display_name.trim().to_lowercase();
    if needle.is_empty() {
        return false;
    }
    let beneficiary = dwelling
        .beneficiary_name
        .as_deref()
        .is_some_and(|name| name.to_lowercase().contains(&needle));
    beneficiary || dwelling.family_name.to_lowercase().contains(&needle)
}

/// Resolves the beneficiary's own dwelling out of the loaded set: exact
/// national-id match first, then the name-fragment fallback. First match
/// wins; uniqueness is not guaranteed on the fallback path.
#[tracing::instrument(skip(actor, dwellings), fields(actor_id = %actor.id))]
pub fn resolve_own_dwelling<'a>(actor: &Actor, dwellings: &'a [Dwelling]) -> Option<&'a Dwelling> {
    if let Some(national_id) = actor.national_id.as_deref() {
        return dwellings
            .iter()
            .filter(|d| d.active)
            .find(|d| d.beneficiary_national_id.as_deref() == Some(national_id));
    }
    let matched = dwellings
        .iter()
        .filter(|d| d.active)
        .find(|d| name_fragment_matches(actor, d));
    if let Some(dwelling) = matched {
        tracing::warn!(
            dwelling_id = %dwelling.id,
            "beneficiary dwelling resolved by name fragment, not national id"
        );
    }
    matched
}

/// Whether the actor may see the observation.
pub fn can_view(actor: &Actor, _obs: &Observation, dwelling: &Dwelling, project: &Project) -> bool {
    match actor.role {
        Role::Beneficiary => is_own_dwelling(actor, dwelling),
        _ => in_project_scope(actor, project),
    }
}

/// Whether the actor may report an observation against the dwelling.
pub fn can_create(actor: &Actor, dwelling: &Dwelling, project: &Project) -> bool {
    if !dwelling.active || !project.active {
        return false;
    }
    match actor.role {
        Role::Beneficiary => is_own_dwelling(actor, dwelling),
        _ => in_project_scope(actor, project),
    }
}

/// Whether the actor may edit the observation. Same scope rule as viewing,
/// except a beneficiary loses edit once the observation is closed.
pub fn can_edit(actor: &Actor, obs: &Observation, dwelling: &Dwelling, project: &Project) -> bool {
    if !can_view(actor, obs, dwelling, project) {
        return false;
    }
    match actor.role {
        Role::Beneficiary => !obs.is_closed(),
        _ => true,
    }
}

/// Whether the actor may attach files to the observation. Beneficiaries may
/// only attach while the observation is still open.
pub fn can_attach(actor: &Actor, obs: &Observation, dwelling: &Dwelling, project: &Project) -> bool {
    if !can_view(actor, obs, dwelling, project) {
        return false;
    }
    match actor.role {
        Role::Beneficiary => obs.status.name == status::OPEN,
        _ => true,
    }
}

/// Whether the actor may change the observation's status at all.
/// Beneficiaries never may; a construction company only while the
/// observation is open.
pub fn can_change_status(actor: &Actor, obs: &Observation, project: &Project) -> bool {
    if !in_project_scope(actor, project) {
        return false;
    }
    match actor.role {
        Role::Beneficiary => false,
        Role::ConstructionCompany => obs.status.name == status::OPEN,
        _ => true,
    }
}

/// Whether the actor may move the observation to the status named `target`.
///
/// Layered on the structural transition table: a construction company may
/// only close, and reopening a closed observation is reserved for the
/// administrator and the housing agency.
pub fn can_transition(actor: &Actor, obs: &Observation, project: &Project, target: &str) -> bool {
    if !can_change_status(actor, obs, project) {
        return false;
    }
    if !status::allowed_transition(&obs.status.name, target) {
        return false;
    }
    match actor.role {
        Role::ConstructionCompany => target == status::CLOSED,
        Role::Administrator | Role::HousingAgency => true,
        // the remaining privileged roles may not reopen
        _ => !(obs.status.name == status::CLOSED && target == status::OPEN),
    }
}

/// Whether the actor may remove an attachment: its uploader, or an
/// administrator.
pub fn can_remove_attachment(actor: &Actor, record: &AttachmentRecord) -> bool {
    record.uploaded_by == actor.id || actor.role == Role::Administrator
}

/// Narrows a loaded observation list to what the actor may see. Pure
/// narrowing: every retained observation passes [`can_view`]; observations
/// whose dwelling or project is missing from the lookup maps are dropped.
pub fn filter_by_role<'a>(
    actor: &Actor,
    observations: impl IntoIterator<Item = &'a Observation>,
    dwellings: &HashMap<Uuid, Dwelling>,
    projects: &HashMap<Uuid, Project>,
) -> Vec<&'a Observation> {
    observations
        .into_iter()
        .filter(|obs| {
            let Some(dwelling) = dwellings.get(&obs.dwelling_id) else {
                return false;
            };
            let Some(project) = projects.get(&obs.project_id) else {
                return false;
            };
            can_view(actor, obs, dwelling, project)
        })
        .collect()
}

#[cfg(test)]
mod tests;
