#![deny(missing_docs)]
//! Read models for the housing master data the observation engine consults.
//! Master-data CRUD lives elsewhere; the core only ever reads these.

use uuid::Uuid;

/// A social-housing construction project.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, sqlx::FromRow, utoipa::ToSchema)]
pub struct Project {
    /// The project's id.
    pub id: Uuid,
    /// Short unique code, e.g. `LC1`.
    pub code: String,
    /// Project name.
    pub name: String,
    /// Name of the construction company that built it.
    pub constructor: String,
    /// Region the project belongs to.
    pub region_id: Option<Uuid>,
    /// Soft-delete flag; inactive projects are invisible to the engine.
    pub active: bool,
}

/// A single housing unit within a project, optionally linked to the
/// beneficiary household that received it.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, sqlx::FromRow, utoipa::ToSchema)]
pub struct Dwelling {
    /// The dwelling's id.
    pub id: Uuid,
    /// The owning project.
    pub project_id: Uuid,
    /// Code unique within the project.
    pub code: String,
    /// Registered family name for the household.
    pub family_name: String,
    /// National id of the linked beneficiary, when known.
    pub beneficiary_national_id: Option<String>,
    /// Full name of the linked beneficiary, when known.
    pub beneficiary_name: Option<String>,
    /// Soft-delete flag.
    pub active: bool,
}

/// A room within a dwelling typology, with the elements that can carry
/// observations in it.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, sqlx::FromRow, utoipa::ToSchema)]
pub struct Room {
    /// The room's id.
    pub id: Uuid,
    /// Room name, e.g. `Kitchen`.
    pub name: String,
    /// Elements observations may reference in this room.
    pub available_elements: Vec<String>,
    /// Soft-delete flag.
    pub active: bool,
}

/// One entry of the observation status catalog. The catalog is data, not an
/// enum, so an administrator can add statuses without a schema change; the
/// engine hardcodes the semantics of the four canonical names only.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, sqlx::FromRow, utoipa::ToSchema)]
pub struct ObservationStatus {
    /// The status's id.
    pub id: Uuid,
    /// Stable numeric code; code 1 is the well-known initial status.
    pub code: i32,
    /// Display name; the engine recognizes `Open`, `InProcess`, `Closed`
    /// and `Rejected`.
    pub name: String,
    /// Soft-delete flag.
    pub active: bool,
}

/// The well-known catalog code of the initial status assigned at creation.
pub const INITIAL_STATUS_CODE: i32 = 1;
