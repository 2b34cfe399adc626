//! On-time/late classification relative to the computed deadline. Always
//! recomputed on read; never stored.

use chrono::NaiveDate;

use crate::{Observation, status};

/// Whether an observation met (or is still within) its deadline.
#[derive(serde::Serialize, serde::Deserialize, Eq, PartialEq, Debug, Clone, Copy, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Compliance {
    /// Closed on or before the due date, or not yet due.
    OnTime,
    /// Closed after the due date, or past due and not closed.
    Late,
}

impl Observation {
    /// Classifies the observation as of `today`.
    ///
    /// Closed observations compare their close date against the due date;
    /// everything else counts as on-time while the due date lies in the
    /// future.
    pub fn compliance(&self, today: NaiveDate) -> Compliance {
        match self.closed_at {
            Some(closed_at) if self.is_closed() => {
                if closed_at.date_naive() <= self.due_date {
                    Compliance::OnTime
                } else {
                    Compliance::Late
                }
            }
            _ => {
                if self.due_date > today {
                    Compliance::OnTime
                } else {
                    Compliance::Late
                }
            }
        }
    }
}

/// Aggregate counts over a set of observations, as used by the compliance
/// reports.
#[derive(serde::Serialize, Debug, Clone, Copy, PartialEq, Eq, utoipa::ToSchema)]
pub struct ComplianceSummary {
    /// Observations closed in time or not yet due.
    pub on_time: u64,
    /// Observations that missed their deadline.
    pub late: u64,
}

impl ComplianceSummary {
    /// On-time share in whole percent; 0 when nothing was counted.
    pub fn on_time_percent(&self) -> u8 {
        let total = self.on_time + self.late;
        if total == 0 {
            return 0;
        }
        ((self.on_time * 100) / total) as u8
    }
}

/// Tallies compliance as of `today`. Rejected observations carry no deadline
/// commitment and stay out of the count.
pub fn compliance_summary<'a>(
    observations: impl IntoIterator<Item = &'a Observation>,
    today: NaiveDate,
) -> ComplianceSummary {
    let mut summary = ComplianceSummary { on_time: 0, late: 0 };
    for obs in observations {
        if obs.status.name == status::REJECTED {
            continue;
        }
        match obs.compliance(today) {
            Compliance::OnTime => summary.on_time += 1,
            Compliance::Late => summary.late += 1,
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Category, Priority, StatusRef};
    use chrono::{Days, TimeZone, Utc};
    use uuid::Uuid;

    fn observation(status_name: &str, due_date: NaiveDate) -> Observation {
        Observation {
            id: Uuid::new_v4(),
            dwelling_id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            room_id: None,
            element: "window seal".to_string(),
            category: Category::Waterproofing,
            description: "rain comes in".to_string(),
            is_urgent: false,
            priority: Priority::Normal,
            status: StatusRef {
                id: Uuid::new_v4(),
                name: status_name.to_string(),
            },
            created_at: Utc::now(),
            due_date,
            closed_at: None,
            created_by: Uuid::new_v4(),
            follow_up_notes: String::new(),
            active: true,
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn closed_on_or_before_due_is_on_time() {
        let due = day(2026, 3, 10);
        let mut obs = observation(status::CLOSED, due);
        obs.closed_at = Some(Utc.with_ymd_and_hms(2026, 3, 10, 17, 0, 0).unwrap());
        assert_eq!(obs.compliance(day(2026, 6, 1)), Compliance::OnTime);

        obs.closed_at = Some(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap());
        assert_eq!(obs.compliance(day(2026, 6, 1)), Compliance::OnTime);
    }

    #[test]
    fn closed_the_day_after_due_is_late() {
        let due = day(2026, 3, 10);
        let mut obs = observation(status::CLOSED, due);
        obs.closed_at = Some(Utc.with_ymd_and_hms(2026, 3, 11, 0, 30, 0).unwrap());
        assert_eq!(obs.compliance(day(2026, 6, 1)), Compliance::Late);
    }

    #[test]
    fn open_due_tomorrow_is_on_time_due_yesterday_is_late() {
        let today = day(2026, 3, 10);
        let tomorrow = today.checked_add_days(Days::new(1)).unwrap();
        let yesterday = today.checked_sub_days(Days::new(1)).unwrap();

        assert_eq!(
            observation(status::OPEN, tomorrow).compliance(today),
            Compliance::OnTime
        );
        assert_eq!(
            observation(status::OPEN, yesterday).compliance(today),
            Compliance::Late
        );
        // due today counts as late: the day to resolve it has arrived
        assert_eq!(
            observation(status::OPEN, today).compliance(today),
            Compliance::Late
        );
    }

    #[test]
    fn summary_skips_rejected_and_computes_percent() {
        let today = day(2026, 3, 10);
        let future = today.checked_add_days(Days::new(5)).unwrap();
        let past = today.checked_sub_days(Days::new(5)).unwrap();

        let observations = vec![
            observation(status::OPEN, future),
            observation(status::OPEN, past),
            observation(status::IN_PROCESS, future),
            observation(status::REJECTED, past),
        ];
        let summary = compliance_summary(&observations, today);
        assert_eq!(summary, ComplianceSummary { on_time: 2, late: 1 });
        assert_eq!(summary.on_time_percent(), 66);
    }

    #[test]
    fn empty_summary_percent_is_zero() {
        let summary = compliance_summary(std::iter::empty(), day(2026, 1, 1));
        assert_eq!(summary.on_time_percent(), 0);
    }
}
