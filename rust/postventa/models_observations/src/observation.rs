use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::status::{self, StatusRef};

/// Priority of an observation. Redundant with [`Observation::is_urgent`];
/// the pair is kept in sync by [`Observation::sync_priority`].
#[derive(
    serde::Serialize,
    serde::Deserialize,
    Eq,
    PartialEq,
    Debug,
    Clone,
    Copy,
    utoipa::ToSchema,
    strum::EnumString,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
    /// Resolved within the configured day count (default 120 days).
    Normal,
    /// Resolved within the configured hour count (default 48 hours).
    Urgent,
}

/// What kind of defect is being reported.
#[derive(
    serde::Serialize,
    serde::Deserialize,
    Eq,
    PartialEq,
    Debug,
    Clone,
    Copy,
    utoipa::ToSchema,
    strum::EnumString,
    strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    /// Paint, coatings, doors, cabinetry.
    Terminations,
    /// Electrical, sanitary or gas installations.
    Installations,
    /// Walls, slabs, load-bearing elements.
    Structural,
    /// Leaks and humidity.
    Waterproofing,
    /// Anything else.
    Other,
}

/// A single reported housing defect.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, utoipa::ToSchema)]
pub struct Observation {
    /// The observation's id.
    pub id: Uuid,
    /// The dwelling the defect was found in.
    pub dwelling_id: Uuid,
    /// The dwelling's project, denormalized for query efficiency. Always
    /// equals the dwelling's own project.
    pub project_id: Uuid,
    /// Room within the dwelling, when the reporter picked one.
    pub room_id: Option<Uuid>,
    /// The affected element, free text (e.g. `kitchen faucet`).
    pub element: String,
    /// Defect category.
    pub category: Category,
    /// Free-text description of the defect.
    pub description: String,
    /// Urgency flag. Invariant: `is_urgent == (priority == Priority::Urgent)`.
    pub is_urgent: bool,
    /// Redundant priority, kept in sync with the urgency flag.
    pub priority: Priority,
    /// Current lifecycle status (catalog reference).
    pub status: StatusRef,
    /// When the observation was reported.
    pub created_at: DateTime<Utc>,
    /// Deadline computed at creation from the SLA configuration. Immutable.
    pub due_date: NaiveDate,
    /// Set exactly once, on the first transition into `Closed`.
    pub closed_at: Option<DateTime<Utc>>,
    /// The reporting user.
    pub created_by: Uuid,
    /// Follow-up notes added by the agency.
    pub follow_up_notes: String,
    /// Soft-delete flag.
    pub active: bool,
}

impl Observation {
    /// Re-establishes the urgency/priority invariant after either field was
    /// set independently: an urgent flag forces the urgent priority and an
    /// urgent priority forces the flag.
    pub fn sync_priority(&mut self) {
        if self.is_urgent {
            self.priority = Priority::Urgent;
        } else if self.priority == Priority::Urgent {
            self.is_urgent = true;
        }
    }

    /// Whether the observation currently sits in the canonical `Closed`
    /// status.
    pub fn is_closed(&self) -> bool {
        self.status.name == status::CLOSED
    }
}
