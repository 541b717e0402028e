use std::collections::HashSet;

use crate::learning::{RiskAssessment, RiskInput, RiskPolicy, risk};
use crate::model::access::HasOwner;
use crate::model::entity::Assignment;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize, utoipa::ToSchema)]
#[sqlx(type_name = "enrollment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    Active,
    Completed,
    Dropped,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Enrollment {
    id: Uuid,
    cohort_id: Uuid,
    trainee_id: Uuid,
    status: EnrollmentStatus,
    enrolled_at: DateTime<Utc>,
    at_risk: bool,
    reminded_at: Option<DateTime<Utc>>,
}

impl ResourceTyped for Enrollment {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Enrollment
    }
}

impl Enrollment {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn cohort_id(&self) -> Uuid {
        self.cohort_id
    }

    pub fn trainee_id(&self) -> Uuid {
        self.trainee_id
    }

    pub fn status(&self) -> EnrollmentStatus {
        self.status
    }

    pub fn enrolled_at(&self) -> &DateTime<Utc> {
        &self.enrolled_at
    }

    pub fn at_risk(&self) -> bool {
        self.at_risk
    }

    pub fn reminded_at(&self) -> Option<&DateTime<Utc>> {
        self.reminded_at.as_ref()
    }
}

impl Enrollment {
    pub async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        cohort_id: Uuid,
        trainee_id: Uuid,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO enrollments (id, cohort_id, trainee_id)
            VALUES ($1,$2,$3)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(cohort_id)
        .bind(trainee_id)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    pub async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM enrollments WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    pub async fn all_by_cohort(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        cohort_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM enrollments WHERE cohort_id = $1 ORDER BY enrolled_at, id",
        )
        .bind(cohort_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn set_status(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        status: EnrollmentStatus,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE enrollments SET status = $1 WHERE id = $2")
            .bind(status)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.status = status;
        Ok(self)
    }

    pub async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM enrollments WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    pub async fn mark_risk(
        mm: &ModelManager,
        id: Uuid,
        at_risk: bool,
        reminded_at: Option<DateTime<Utc>>,
    ) -> DatabaseResult<()> {
        sqlx::query(
            "UPDATE enrollments SET at_risk = $1, reminded_at = COALESCE($2, reminded_at) WHERE id = $3",
        )
        .bind(at_risk)
        .bind(reminded_at)
        .bind(id)
        .execute(mm.executor())
        .await?;
        Ok(())
    }
}

#[async_trait]
impl HasOwner for Enrollment {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.trainee_id)
    }
}

// Utils

/// An enrollment joined with what risk assessment needs about its cohort.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActiveEnrollmentRow {
    pub id: Uuid,
    pub cohort_id: Uuid,
    pub trainee_id: Uuid,
    pub username: String,
    pub program_id: Uuid,
    pub cohort_start: NaiveDate,
    pub enrolled_at: DateTime<Utc>,
    pub reminded_at: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
}

const ACTIVE_ENROLLMENT_SELECT: &str = r#"
    SELECT
        e.id,
        e.cohort_id,
        e.trainee_id,
        u.username,
        c.program_id,
        c.start_date AS cohort_start,
        e.enrolled_at,
        e.reminded_at,
        GREATEST(
            (SELECT MAX(p.completed_at) FROM progress p WHERE p.user_id = e.trainee_id),
            (SELECT MAX(la.last_opened_at) FROM lesson_access la WHERE la.user_id = e.trainee_id),
            (SELECT MAX(s.submitted_at) FROM submissions s WHERE s.trainee_id = e.trainee_id)
        ) AS last_activity
    FROM enrollments e
    JOIN cohorts c ON c.id = e.cohort_id
    JOIN users u ON u.id = e.trainee_id
    WHERE e.status = 'ACTIVE'
"#;

impl ActiveEnrollmentRow {
    pub async fn fetch_all(mm: &ModelManager) -> DatabaseResult<Vec<Self>> {
        let sql = format!("{ACTIVE_ENROLLMENT_SELECT} ORDER BY e.enrolled_at, e.id");
        let rows = sqlx::query_as(&sql).fetch_all(mm.executor()).await?;
        Ok(rows)
    }

    pub async fn fetch_by_cohort(mm: &ModelManager, cohort_id: Uuid) -> DatabaseResult<Vec<Self>> {
        let sql =
            format!("{ACTIVE_ENROLLMENT_SELECT} AND e.cohort_id = $1 ORDER BY e.enrolled_at, e.id");
        let rows = sqlx::query_as(&sql)
            .bind(cohort_id)
            .fetch_all(mm.executor())
            .await?;
        Ok(rows)
    }

    pub async fn submitted_assignments(&self, mm: &ModelManager) -> DatabaseResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar("SELECT assignment_id FROM submissions WHERE trainee_id = $1")
            .bind(self.trainee_id)
            .fetch_all(mm.executor())
            .await?;
        Ok(ids)
    }

    /// Runs the risk rules against this enrollment's current activity and deadlines.
    pub async fn assess(
        &self,
        mm: &ModelManager,
        policy: &RiskPolicy,
        now: DateTime<Utc>,
    ) -> DatabaseResult<RiskAssessment> {
        let (deadlines, submitted) = tokio::try_join!(
            Assignment::deadlines_by_program(mm, self.program_id),
            self.submitted_assignments(mm),
        )?;
        let submitted: HashSet<Uuid> = submitted.into_iter().collect();

        let input = RiskInput {
            enrolled_at: self.enrolled_at,
            last_activity: self.last_activity,
            overdue_assignments: risk::count_overdue(self.cohort_start, &deadlines, &submitted, now),
            reminded_at: self.reminded_at,
        };

        Ok(risk::assess(policy, &input, now))
    }
}
