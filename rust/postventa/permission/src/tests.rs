use std::collections::HashMap;

use chrono::Utc;
use model_actor::{Actor, Role};
use models_housing::{Dwelling, Project};
use models_observations::{AttachmentRecord, Category, Observation, Priority, StatusRef, status};
use uuid::Uuid;

use super::*;

fn actor(role: Role) -> Actor {
    Actor {
        id: Uuid::new_v4(),
        role,
        national_id: None,
        display_name: "Test User".to_string(),
        region_id: None,
        company: None,
    }
}

fn project() -> Project {
    Project {
        id: Uuid::new_v4(),
        code: "LC1".to_string(),
        name: "Las Cumbres 1".to_string(),
        constructor: "Constructora Sur".to_string(),
        region_id: Some(Uuid::new_v4()),
        active: true,
    }
}

fn dwelling(project: &Project) -> Dwelling {
    Dwelling {
        id: Uuid::new_v4(),
        project_id: project.id,
        code: "A-12".to_string(),
        family_name: "Rojas Fuentes".to_string(),
        beneficiary_national_id: Some("12.345.678-9".to_string()),
        beneficiary_name: Some("Carmen Rojas".to_string()),
        active: true,
    }
}

fn observation(dwelling: &Dwelling, status_name: &str) -> Observation {
    Observation {
        id: Uuid::new_v4(),
        dwelling_id: dwelling.id,
        project_id: dwelling.project_id,
        room_id: None,
        element: "bathroom door".to_string(),
        category: Category::Terminations,
        description: "does not close".to_string(),
        is_urgent: false,
        priority: Priority::Normal,
        status: StatusRef {
            id: Uuid::new_v4(),
            name: status_name.to_string(),
        },
        created_at: Utc::now(),
        due_date: Utc::now().date_naive(),
        closed_at: None,
        created_by: Uuid::new_v4(),
        follow_up_notes: String::new(),
        active: true,
    }
}

fn beneficiary_for(dwelling: &Dwelling) -> Actor {
    Actor {
        national_id: dwelling.beneficiary_national_id.clone(),
        ..actor(Role::Beneficiary)
    }
}

#[test]
fn agency_roles_see_every_project() {
    let project = project();
    let dwelling = dwelling(&project);
    let obs = observation(&dwelling, status::OPEN);
    for role in [Role::Administrator, Role::HousingAgency] {
        assert!(can_view(&actor(role), &obs, &dwelling, &project));
    }
}

#[test]
fn regional_agency_is_scoped_to_its_region() {
    let project = project();
    let dwelling = dwelling(&project);
    let obs = observation(&dwelling, status::OPEN);

    let mut regional = actor(Role::RegionalAgency);
    regional.region_id = project.region_id;
    assert!(can_view(&regional, &obs, &dwelling, &project));

    regional.region_id = Some(Uuid::new_v4());
    assert!(!can_view(&regional, &obs, &dwelling, &project));

    // no region set acts nationally
    regional.region_id = None;
    assert!(can_view(&regional, &obs, &dwelling, &project));
}

#[test]
fn construction_company_is_scoped_to_its_own_projects() {
    let project = project();
    let dwelling = dwelling(&project);
    let obs = observation(&dwelling, status::OPEN);

    let mut company = actor(Role::ConstructionCompany);
    company.company = Some("constructora sur".to_string());
    assert!(can_view(&company, &obs, &dwelling, &project));

    company.company = Some("Otra Constructora".to_string());
    assert!(!can_view(&company, &obs, &dwelling, &project));

    company.company = None;
    assert!(!can_view(&company, &obs, &dwelling, &project));
}

#[test]
fn beneficiary_sees_only_their_own_dwelling() {
    let project = project();
    let own = dwelling(&project);
    let other = Dwelling {
        id: Uuid::new_v4(),
        beneficiary_national_id: Some("9.876.543-2".to_string()),
        ..dwelling(&project)
    };
    let beneficiary = beneficiary_for(&own);

    assert!(can_view(
        &beneficiary,
        &observation(&own, status::OPEN),
        &own,
        &project
    ));
    assert!(!can_view(
        &beneficiary,
        &observation(&other, status::OPEN),
        &other,
        &project
    ));
}

#[test]
fn beneficiary_without_id_matches_by_name_fragment() {
    let project = project();
    let dwelling = dwelling(&project);
    let mut beneficiary = actor(Role::Beneficiary);
    beneficiary.display_name = "carmen".to_string();

    assert!(is_own_dwelling(&beneficiary, &dwelling));

    beneficiary.display_name = "Rojas".to_string();
    assert!(is_own_dwelling(&beneficiary, &dwelling));

    beneficiary.display_name = "Pérez".to_string();
    assert!(!is_own_dwelling(&beneficiary, &dwelling));

    // a blank name must not match everything
    beneficiary.display_name = "  ".to_string();
    assert!(!is_own_dwelling(&beneficiary, &dwelling));
}

#[test]
fn beneficiary_with_id_never_falls_back_to_names() {
    let project = project();
    let mut unlinked = dwelling(&project);
    unlinked.beneficiary_national_id = None;

    let mut beneficiary = beneficiary_for(&dwelling(&project));
    beneficiary.display_name = "Carmen Rojas".to_string();

    // the name matches, but the actor carries an id and the dwelling does not
    assert!(!is_own_dwelling(&beneficiary, &unlinked));
}

#[test]
fn resolve_own_dwelling_prefers_exact_id_match() {
    let project = project();
    let by_name = Dwelling {
        beneficiary_national_id: None,
        beneficiary_name: Some("Carmen Rojas".to_string()),
        ..dwelling(&project)
    };
    let by_id = dwelling(&project);
    let dwellings = vec![by_name, by_id.clone()];

    let mut beneficiary = beneficiary_for(&by_id);
    beneficiary.display_name = "Carmen Rojas".to_string();

    let resolved = resolve_own_dwelling(&beneficiary, &dwellings).unwrap();
    assert_eq!(resolved.id, by_id.id);
}

#[test]
fn resolve_own_dwelling_skips_inactive() {
    let project = project();
    let mut inactive = dwelling(&project);
    inactive.active = false;
    let beneficiary = beneficiary_for(&inactive);

    assert!(resolve_own_dwelling(&beneficiary, std::slice::from_ref(&inactive)).is_none());
}

#[test]
fn beneficiary_cannot_edit_after_closure() {
    let project = project();
    let dwelling = dwelling(&project);
    let beneficiary = beneficiary_for(&dwelling);

    assert!(can_edit(
        &beneficiary,
        &observation(&dwelling, status::OPEN),
        &dwelling,
        &project
    ));
    assert!(!can_edit(
        &beneficiary,
        &observation(&dwelling, status::CLOSED),
        &dwelling,
        &project
    ));
    // the agency still can
    assert!(can_edit(
        &actor(Role::HousingAgency),
        &observation(&dwelling, status::CLOSED),
        &dwelling,
        &project
    ));
}

#[test]
fn beneficiary_attaches_only_while_open() {
    let project = project();
    let dwelling = dwelling(&project);
    let beneficiary = beneficiary_for(&dwelling);

    assert!(can_attach(
        &beneficiary,
        &observation(&dwelling, status::OPEN),
        &dwelling,
        &project
    ));
    assert!(!can_attach(
        &beneficiary,
        &observation(&dwelling, status::IN_PROCESS),
        &dwelling,
        &project
    ));
}

#[test]
fn beneficiary_never_changes_status() {
    let project = project();
    let dwelling = dwelling(&project);
    let beneficiary = beneficiary_for(&dwelling);
    let obs = observation(&dwelling, status::OPEN);

    assert!(!can_change_status(&beneficiary, &obs, &project));
}

#[test]
fn construction_company_may_only_close_an_open_observation() {
    let project = project();
    let dwelling = dwelling(&project);
    let mut company = actor(Role::ConstructionCompany);
    company.company = Some(project.constructor.clone());

    let open = observation(&dwelling, status::OPEN);
    assert!(can_transition(&company, &open, &project, status::CLOSED));
    assert!(!can_transition(&company, &open, &project, status::IN_PROCESS));
    assert!(!can_transition(&company, &open, &project, status::REJECTED));

    // once it left Open, the company may no longer act on it
    let in_process = observation(&dwelling, status::IN_PROCESS);
    assert!(!can_change_status(&company, &in_process, &project));
    let closed = observation(&dwelling, status::CLOSED);
    assert!(!can_transition(&company, &closed, &project, status::OPEN));
}

#[test]
fn reopen_is_reserved_for_administrator_and_housing_agency() {
    let project = project();
    let dwelling = dwelling(&project);
    let closed = observation(&dwelling, status::CLOSED);

    assert!(can_transition(
        &actor(Role::Administrator),
        &closed,
        &project,
        status::OPEN
    ));
    assert!(can_transition(
        &actor(Role::HousingAgency),
        &closed,
        &project,
        status::OPEN
    ));
    assert!(!can_transition(
        &actor(Role::RegionalAgency),
        &closed,
        &project,
        status::OPEN
    ));
}

#[test]
fn transitions_respect_the_structural_table() {
    let project = project();
    let dwelling = dwelling(&project);
    let admin = actor(Role::Administrator);

    let rejected = observation(&dwelling, status::REJECTED);
    assert!(!can_transition(&admin, &rejected, &project, status::OPEN));

    let closed = observation(&dwelling, status::CLOSED);
    assert!(!can_transition(&admin, &closed, &project, status::IN_PROCESS));
}

#[test]
fn attachment_removal_is_uploader_or_administrator() {
    let uploader = actor(Role::Beneficiary);
    let record = AttachmentRecord {
        id: Uuid::new_v4(),
        observation_id: Uuid::new_v4(),
        content_ref: "blob-1".to_string(),
        original_name: "leak.jpg".to_string(),
        uploaded_by: uploader.id,
        uploaded_at: Utc::now(),
        size_bytes: 1024,
    };

    assert!(can_remove_attachment(&uploader, &record));
    assert!(can_remove_attachment(&actor(Role::Administrator), &record));
    assert!(!can_remove_attachment(&actor(Role::HousingAgency), &record));
    assert!(!can_remove_attachment(&actor(Role::Beneficiary), &record));
}

#[test]
fn filter_by_role_never_widens_access() {
    let project_a = project();
    let project_b = Project {
        id: Uuid::new_v4(),
        constructor: "Otra Constructora".to_string(),
        ..project()
    };
    let dwelling_a = dwelling(&project_a);
    let dwelling_b = dwelling(&project_b);
    let observations = vec![
        observation(&dwelling_a, status::OPEN),
        observation(&dwelling_b, status::OPEN),
    ];

    let dwellings: HashMap<Uuid, Dwelling> = [
        (dwelling_a.id, dwelling_a.clone()),
        (dwelling_b.id, dwelling_b.clone()),
    ]
    .into();
    let projects: HashMap<Uuid, Project> = [
        (project_a.id, project_a.clone()),
        (project_b.id, project_b.clone()),
    ]
    .into();

    let mut company = actor(Role::ConstructionCompany);
    company.company = Some(project_a.constructor.clone());

    let visible = filter_by_role(&company, &observations, &dwellings, &projects);
    assert_eq!(visible.len(), 1);
    for obs in &visible {
        let dwelling = &dwellings[&obs.dwelling_id];
        let project = &projects[&obs.project_id];
        assert!(can_view(&company, obs, dwelling, project));
    }

    // a missing project lookup drops the row rather than widening access
    let visible = filter_by_role(&company, &observations, &dwellings, &HashMap::new());
    assert!(visible.is_empty());
}

#[test]
fn beneficiary_filter_keeps_only_their_dwelling() {
    let project = project();
    let own = dwelling(&project);
    let other = Dwelling {
        id: Uuid::new_v4(),
        beneficiary_national_id: Some("9.876.543-2".to_string()),
        ..dwelling(&project)
    };
    let observations = vec![
        observation(&own, status::OPEN),
        observation(&other, status::OPEN),
        observation(&own, status::CLOSED),
    ];
    let dwellings: HashMap<Uuid, Dwelling> =
        [(own.id, own.clone()), (other.id, other.clone())].into();
    let projects: HashMap<Uuid, Project> = [(project.id, project.clone())].into();

    let beneficiary = beneficiary_for(&own);
    let visible = filter_by_role(&beneficiary, &observations, &dwellings, &projects);
    assert_eq!(visible.len(), 2);
    assert!(visible.iter().all(|obs| obs.dwelling_id == own.id));
}
