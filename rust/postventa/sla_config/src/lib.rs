#![deny(missing_docs)]
//! The SLA configuration record and the due-date calculator that reads it.
//!
//! Deadline assignment must never block observation creation: every entry
//! point here tolerates a missing configuration by substituting the
//! defaults.

use chrono::{Days, NaiveDate};
use uuid::Uuid;

/// Default day count for normal observations.
pub const DEFAULT_NORMAL_DAYS: u32 = 120;
/// Default hour count for urgent observations.
pub const DEFAULT_URGENT_HOURS: u32 = 48;

/// The two tunable deadline parameters. Exactly one live record exists;
/// readers re-read it at time of use rather than caching it.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq, utoipa::ToSchema)]
pub struct SlaConfig {
    /// Days granted to resolve a normal observation.
    pub normal_days: u32,
    /// Hours granted to resolve an urgent observation.
    pub urgent_hours: u32,
    /// Who last edited the record.
    pub updated_by: Option<Uuid>,
}

impl Default for SlaConfig {
    fn default() -> Self {
        SlaConfig {
            normal_days: DEFAULT_NORMAL_DAYS,
            urgent_hours: DEFAULT_URGENT_HOURS,
            updated_by: None,
        }
    }
}

impl SlaConfig {
    /// Builds a config after checking both counts are positive.
    pub fn validated(
        normal_days: u32,
        urgent_hours: u32,
        updated_by: Uuid,
    ) -> Result<Self, InvalidSlaConfig> {
        if normal_days == 0 || urgent_hours == 0 {
            return Err(InvalidSlaConfig);
        }
        Ok(SlaConfig {
            normal_days,
            urgent_hours,
            updated_by: Some(updated_by),
        })
    }

    /// The urgent hour count expressed in whole days, rounded up:
    /// 48 h → 2 days, 50 h → 3 days, 1 h → 1 day.
    pub fn urgent_days(&self) -> u32 {
        self.urgent_hours.div_ceil(24)
    }
}

/// Both SLA counts must be positive.
#[derive(Debug, PartialEq, Eq)]
pub struct InvalidSlaConfig;

impl std::fmt::Display for InvalidSlaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SLA day and hour counts must be positive")
    }
}

impl std::error::Error for InvalidSlaConfig {}

/// Derives the due date for an observation created on `created_on`.
pub fn compute_due_date(created_on: NaiveDate, is_urgent: bool, config: &SlaConfig) -> NaiveDate {
    let days = if is_urgent {
        config.urgent_days()
    } else {
        config.normal_days
    };
    // a zero count would put the deadline on the creation day itself
    let days = days.max(1);
    created_on
        .checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(created_on)
}

/// Like [`compute_due_date`], substituting the defaults when no
/// configuration could be read.
pub fn compute_due_date_or_default(
    created_on: NaiveDate,
    is_urgent: bool,
    config: Option<&SlaConfig>,
) -> NaiveDate {
    match config {
        Some(config) => compute_due_date(created_on, is_urgent, config),
        None => compute_due_date(created_on, is_urgent, &SlaConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(normal_days: u32, urgent_hours: u32) -> SlaConfig {
        SlaConfig {
            normal_days,
            urgent_hours,
            updated_by: None,
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn urgent_hours_round_up_to_whole_days() {
        assert_eq!(config(120, 24).urgent_days(), 1);
        assert_eq!(config(120, 48).urgent_days(), 2);
        assert_eq!(config(120, 50).urgent_days(), 3);
        assert_eq!(config(120, 1).urgent_days(), 1);
    }

    #[test]
    fn normal_deadline_adds_configured_days() {
        let created = day(2026, 1, 1);
        assert_eq!(
            compute_due_date(created, false, &config(120, 48)),
            day(2026, 5, 1)
        );
        assert_eq!(
            compute_due_date(created, false, &config(7, 48)),
            day(2026, 1, 8)
        );
    }

    #[test]
    fn urgent_deadline_uses_hours() {
        let created = day(2026, 1, 1);
        assert_eq!(
            compute_due_date(created, true, &config(120, 48)),
            day(2026, 1, 3)
        );
        assert_eq!(
            compute_due_date(created, true, &config(120, 50)),
            day(2026, 1, 4)
        );
    }

    #[test]
    fn due_date_is_monotonic_in_the_configured_counts() {
        let created = day(2026, 1, 1);
        let mut previous = created;
        for days in 1..=200 {
            let due = compute_due_date(created, false, &config(days, 48));
            assert!(due >= previous);
            previous = due;
        }
        let mut previous = created;
        for hours in 1..=200 {
            let due = compute_due_date(created, true, &config(120, hours));
            assert!(due >= previous);
            previous = due;
        }
    }

    #[test]
    fn due_date_is_strictly_after_creation() {
        let created = day(2026, 1, 1);
        for (is_urgent, normal_days, urgent_hours) in
            [(false, 1, 1), (true, 1, 1), (false, 120, 48), (true, 120, 48)]
        {
            assert!(compute_due_date(created, is_urgent, &config(normal_days, urgent_hours)) > created);
        }
    }

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let created = day(2026, 1, 1);
        assert_eq!(
            compute_due_date_or_default(created, true, None),
            day(2026, 1, 3)
        );
        assert_eq!(
            compute_due_date_or_default(created, false, None),
            day(2026, 5, 1)
        );
    }

    #[test]
    fn validation_rejects_zero_counts() {
        let editor = Uuid::new_v4();
        assert_eq!(SlaConfig::validated(0, 48, editor), Err(InvalidSlaConfig));
        assert_eq!(SlaConfig::validated(120, 0, editor), Err(InvalidSlaConfig));
        let config = SlaConfig::validated(90, 24, editor).unwrap();
        assert_eq!(config.normal_days, 90);
        assert_eq!(config.updated_by, Some(editor));
    }
}
