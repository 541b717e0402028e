use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub struct RiskPolicy {
    pub inactivity: Duration,
    pub remind_every: Duration,
}

impl RiskPolicy {
    pub fn new(inactivity_days: i64, remind_every_hours: i64) -> Self {
        Self {
            inactivity: Duration::days(inactivity_days),
            remind_every: Duration::hours(remind_every_hours),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RiskInput {
    pub enrolled_at: DateTime<Utc>,
    pub last_activity: Option<DateTime<Utc>>,
    pub overdue_assignments: i64,
    pub reminded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RiskReason {
    Inactive { idle_days: i64 },
    OverdueAssignments { count: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct RiskAssessment {
    pub at_risk: bool,
    pub reminder_due: bool,
    pub reasons: Vec<RiskReason>,
}

pub fn assess(policy: &RiskPolicy, input: &RiskInput, now: DateTime<Utc>) -> RiskAssessment {
    let mut reasons = Vec::new();

    let last_seen = input
        .last_activity
        .map_or(input.enrolled_at, |a| a.max(input.enrolled_at));
    let idle = now - last_seen;
    if idle > policy.inactivity {
        reasons.push(RiskReason::Inactive {
            idle_days: idle.num_days(),
        });
    }

    if input.overdue_assignments > 0 {
        reasons.push(RiskReason::OverdueAssignments {
            count: input.overdue_assignments,
        });
    }

    let at_risk = !reasons.is_empty();
    let reminder_due = at_risk
        && input
            .reminded_at
            .is_none_or(|at| now - at >= policy.remind_every);

    RiskAssessment {
        at_risk,
        reminder_due,
        reasons,
    }
}

/// Due moment of an assignment: end of day `start + offset_days`, UTC.
pub fn due_at(cohort_start: NaiveDate, offset_days: Option<i32>) -> Option<DateTime<Utc>> {
    let offset = offset_days?;
    let due_day = cohort_start.checked_add_signed(Duration::days(i64::from(offset) + 1))?;
    Some(due_day.and_hms_opt(0, 0, 0)?.and_utc())
}

/// Assignments past due that have no submission at all.
pub fn count_overdue(
    cohort_start: NaiveDate,
    assignments: &[(Uuid, Option<i32>)],
    submitted: &HashSet<Uuid>,
    now: DateTime<Utc>,
) -> i64 {
    assignments
        .iter()
        .filter(|(id, _)| !submitted.contains(id))
        .filter_map(|(_, offset)| due_at(cohort_start, *offset))
        .filter(|due| *due <= now)
        .count() as i64
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap()
    }

    fn policy() -> RiskPolicy {
        RiskPolicy::new(7, 24)
    }

    #[test]
    fn recent_activity_is_fine() {
        let input = RiskInput {
            enrolled_at: now() - Duration::days(30),
            last_activity: Some(now() - Duration::days(2)),
            overdue_assignments: 0,
            reminded_at: None,
        };
        let assessment = assess(&policy(), &input, now());
        assert!(!assessment.at_risk);
        assert!(!assessment.reminder_due);
        assert!(assessment.reasons.is_empty());
    }

    #[test]
    fn no_activity_falls_back_to_enrollment_time() {
        let fresh = RiskInput {
            enrolled_at: now() - Duration::days(1),
            last_activity: None,
            overdue_assignments: 0,
            reminded_at: None,
        };
        assert!(!assess(&policy(), &fresh, now()).at_risk);

        let stale = RiskInput {
            enrolled_at: now() - Duration::days(10),
            ..fresh
        };
        let assessment = assess(&policy(), &stale, now());
        assert!(assessment.at_risk);
        assert_eq!(assessment.reasons, vec![RiskReason::Inactive { idle_days: 10 }]);
    }

    #[test]
    fn overdue_work_flags_and_reminders_are_throttled() {
        let input = RiskInput {
            enrolled_at: now() - Duration::days(3),
            last_activity: Some(now()),
            overdue_assignments: 2,
            reminded_at: Some(now() - Duration::hours(3)),
        };
        let assessment = assess(&policy(), &input, now());
        assert!(assessment.at_risk);
        assert!(!assessment.reminder_due);
        assert_eq!(
            assessment.reasons,
            vec![RiskReason::OverdueAssignments { count: 2 }]
        );

        let later = RiskInput {
            reminded_at: Some(now() - Duration::hours(25)),
            ..input
        };
        assert!(assess(&policy(), &later, now()).reminder_due);
    }

    #[test]
    fn due_date_is_end_of_offset_day() {
        let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let due = due_at(start, Some(5)).unwrap();
        assert_eq!(due, Utc.with_ymd_and_hms(2025, 3, 7, 0, 0, 0).unwrap());
        assert!(due_at(start, None).is_none());
    }

    #[test]
    fn overdue_ignores_submitted_and_undated() {
        let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let (a, b, c, d) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let assignments = vec![(a, Some(3)), (b, Some(5)), (c, None), (d, Some(60))];
        let submitted: HashSet<Uuid> = [b].into_iter().collect();

        assert_eq!(count_overdue(start, &assignments, &submitted, now()), 1);
    }
}
