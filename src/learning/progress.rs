use serde::{Deserialize, Serialize};

/// Rounded completion percentage, half-up, clamped to `0..=100`.
pub fn percent(done: i64, total: i64) -> u8 {
    if total <= 0 {
        return 0;
    }
    let done = done.clamp(0, total);
    ((done * 100 + total / 2) / total) as u8
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ProgressSummary {
    pub total_lessons: i64,
    pub completed_lessons: i64,
    pub total_assignments: i64,
    pub approved_assignments: i64,
    pub percent: u8,
}

impl ProgressSummary {
    pub fn new(
        total_lessons: i64,
        completed_lessons: i64,
        total_assignments: i64,
        approved_assignments: i64,
    ) -> Self {
        let percent = percent(
            completed_lessons + approved_assignments,
            total_lessons + total_assignments,
        );

        Self {
            total_lessons,
            completed_lessons,
            total_assignments,
            approved_assignments,
            percent,
        }
    }

    /// An empty program is never complete.
    pub fn is_complete(&self) -> bool {
        let total = self.total_lessons + self.total_assignments;
        total > 0
            && self.completed_lessons >= self.total_lessons
            && self.approved_assignments >= self.total_assignments
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn percent_edges() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(0, 3), 0);
        assert_eq!(percent(3, 3), 100);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 8), 13); // 12.5 rounds up
        assert_eq!(percent(5, 3), 100);
    }

    #[test]
    fn summary_combines_lessons_and_assignments() {
        let summary = ProgressSummary::new(8, 6, 2, 1);
        assert_eq!(summary.percent, 70);
        assert!(!summary.is_complete());

        let done = ProgressSummary::new(8, 8, 2, 2);
        assert_eq!(done.percent, 100);
        assert!(done.is_complete());
    }

    #[test]
    fn empty_program_is_not_complete() {
        let summary = ProgressSummary::new(0, 0, 0, 0);
        assert_eq!(summary.percent, 0);
        assert!(!summary.is_complete());
    }
}
