use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::{
    config::Reminders,
    learning::{RiskAssessment, RiskPolicy},
    model::{
        DatabaseResult, ModelManager,
        entity::{ActiveEnrollmentRow, Enrollment},
    },
};

/// Counters of one pass over the active enrollments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub checked: usize,
    pub at_risk: usize,
    pub reminded: usize,
}

impl SweepReport {
    fn record(&mut self, assessment: &RiskAssessment) {
        self.checked += 1;
        if assessment.at_risk {
            self.at_risk += 1;
        }
        if assessment.reminder_due {
            self.reminded += 1;
        }
    }
}

/// Periodically flags at-risk enrollments and sends their reminders.
#[derive(Debug, Clone)]
pub struct ReminderWorker {
    mm: ModelManager,
    policy: RiskPolicy,
    every: Duration,
}

impl ReminderWorker {
    pub fn new(mm: ModelManager, reminders: &Reminders) -> Self {
        Self {
            mm,
            policy: RiskPolicy::new(reminders.inactivity_days(), reminders.remind_every_hours()),
            every: Duration::from_secs(reminders.interval_secs().max(1)),
        }
    }

    /// Sweeps every `interval_secs` until `token` is cancelled. A failed sweep is logged and retried on the next tick.
    pub async fn run(self, token: CancellationToken) {
        let mut interval = tokio::time::interval(self.every);
        tracing::info!(every_secs = self.every.as_secs(), "reminders worker started");

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = interval.tick() => {
                    match self.sweep(Utc::now()).await {
                        Ok(report) => tracing::debug!(?report, "reminders sweep finished"),
                        Err(e) => crate::error::log_error(&e),
                    }
                }
            }
        }

        tracing::info!("reminders worker stopped");
    }

    pub async fn sweep(&self, now: DateTime<Utc>) -> DatabaseResult<SweepReport> {
        let rows = ActiveEnrollmentRow::fetch_all(&self.mm).await?;
        let mut report = SweepReport::default();

        for row in rows {
            let assessment = row.assess(&self.mm, &self.policy, now).await?;
            report.record(&assessment);

            let reminded_at = assessment.reminder_due.then_some(now);
            if assessment.reminder_due {
                tracing::info!(
                    enrollment_id = %row.id,
                    trainee = %row.username,
                    reasons = ?assessment.reasons,
                    "reminder sent to at-risk trainee"
                );
            }

            Enrollment::mark_risk(&self.mm, row.id, assessment.at_risk, reminded_at).await?;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod test {
    use crate::learning::RiskReason;

    use super::*;

    #[test]
    fn report_counts_risk_and_reminders() {
        let mut report = SweepReport::default();
        report.record(&RiskAssessment {
            at_risk: false,
            reminder_due: false,
            reasons: vec![],
        });
        report.record(&RiskAssessment {
            at_risk: true,
            reminder_due: true,
            reasons: vec![RiskReason::OverdueAssignments { count: 1 }],
        });
        report.record(&RiskAssessment {
            at_risk: true,
            reminder_due: false,
            reasons: vec![RiskReason::Inactive { idle_days: 9 }],
        });

        assert_eq!(
            report,
            SweepReport {
                checked: 3,
                at_risk: 2,
                reminded: 1,
            }
        );
    }
}
