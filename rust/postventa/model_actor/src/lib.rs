#![deny(missing_docs)]
//! This crate splits out the acting user model so that policy code does not
//! depend on any service crate.

use uuid::Uuid;

/// The role a user acts under. Closed set: permission checks match on the
/// variant, never on role-name strings.
#[derive(
    serde::Serialize,
    serde::Deserialize,
    Eq,
    PartialEq,
    Debug,
    Clone,
    Copy,
    Hash,
    utoipa::ToSchema,
    strum::EnumString,
    strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    /// Full access to every project and the SLA configuration.
    Administrator,
    /// The housing agency running the post-sale program.
    HousingAgency,
    /// A regional office of the agency, scoped to its region's projects.
    RegionalAgency,
    /// The company that built the project, scoped to its own projects.
    ConstructionCompany,
    /// The household assigned a dwelling, scoped to that dwelling.
    Beneficiary,
}

impl Role {
    /// Whether the role is one of the agency-side roles rather than a
    /// beneficiary household.
    pub fn is_privileged(self) -> bool {
        !matches!(self, Role::Beneficiary)
    }
}

/// The acting user as supplied by the identity provider.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, utoipa::ToSchema)]
pub struct Actor {
    /// The user's id.
    pub id: Uuid,
    /// The role the user acts under.
    pub role: Role,
    /// National identifier, when the account has one. Beneficiary accounts
    /// created before ids were mandatory may lack it.
    pub national_id: Option<String>,
    /// Display name, used as the fallback for beneficiary dwelling matching.
    pub display_name: String,
    /// Region the user belongs to; scopes [`Role::RegionalAgency`] users.
    pub region_id: Option<Uuid>,
    /// Employer name; scopes [`Role::ConstructionCompany`] users.
    pub company: Option<String>,
}

impl Actor {
    /// Whether the actor holds one of the agency-side roles.
    pub fn is_privileged(&self) -> bool {
        self.role.is_privileged()
    }
}

#[cfg(test)]
mod tests {
    use super::Role;

    #[test]
    fn beneficiary_is_the_only_unprivileged_role() {
        assert!(Role::Administrator.is_privileged());
        assert!(Role::HousingAgency.is_privileged());
        assert!(Role::RegionalAgency.is_privileged());
        assert!(Role::ConstructionCompany.is_privileged());
        assert!(!Role::Beneficiary.is_privileged());
    }

    #[test]
    fn role_round_trips_through_strum() {
        let role: Role = "construction_company".parse().unwrap();
        assert_eq!(role, Role::ConstructionCompany);
        assert_eq!(Role::HousingAgency.to_string(), "housing_agency");
    }
}
