//! Canonical status names and the allowed-transition table.
//!
//! Status identity is a catalog reference resolved by name at runtime, but
//! the engine hardcodes the semantics of exactly these four names.

use uuid::Uuid;

/// Initial status of every observation.
pub const OPEN: &str = "Open";
/// A constructor is working on the defect.
pub const IN_PROCESS: &str = "InProcess";
/// The defect was resolved. Terminal except for an explicit reopen.
pub const CLOSED: &str = "Closed";
/// The report was rejected. Terminal.
pub const REJECTED: &str = "Rejected";

/// A resolved reference into the status catalog.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq, utoipa::ToSchema)]
pub struct StatusRef {
    /// Catalog row id.
    pub id: Uuid,
    /// Catalog row name at the time it was resolved.
    pub name: String,
}

/// Whether the lifecycle permits moving from `current` to `target`.
///
/// Open → {InProcess, Closed, Rejected}; InProcess → {Closed, Rejected};
/// Closed → {Open} (explicit reopen); Rejected is terminal. Names outside
/// the canonical four are never valid transition targets or sources.
pub fn allowed_transition(current: &str, target: &str) -> bool {
    match (current, target) {
        (OPEN, IN_PROCESS | CLOSED | REJECTED) => true,
        (IN_PROCESS, CLOSED | REJECTED) => true,
        (CLOSED, OPEN) => true,
        _ => false,
    }
}
