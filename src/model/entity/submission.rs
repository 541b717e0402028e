use crate::model::access::HasOwner;
use crate::model::entity::Feedback;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize, utoipa::ToSchema)]
#[sqlx(type_name = "submission_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
    ResubmitRequested,
}

impl SubmissionStatus {
    /// Statuses a reviewer may set. PENDING is only ever set by the trainee.
    pub fn is_review_outcome(self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn allows_resubmission(self) -> bool {
        matches!(self, Self::Rejected | Self::ResubmitRequested)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Submission {
    id: Uuid,
    assignment_id: Uuid,
    trainee_id: Uuid,
    content: String,
    attachment_url: Option<String>,
    status: SubmissionStatus,
    attempt: i32,
    submitted_at: DateTime<Utc>,
    reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize, Validate, utoipa::ToSchema)]
pub struct SubmissionCreate {
    pub assignment_id: Uuid,
    #[validate(length(min = 1, max = 20000, message = "content must be 1-20000 characters"))]
    pub content: String,
    #[validate(length(max = 500, message = "attachment_url is too long"))]
    pub attachment_url: Option<String>,
}

impl ResourceTyped for Submission {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Submission
    }
}

impl Submission {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn assignment_id(&self) -> Uuid {
        self.assignment_id
    }

    pub fn trainee_id(&self) -> Uuid {
        self.trainee_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn status(&self) -> SubmissionStatus {
        self.status
    }

    pub fn attempt(&self) -> i32 {
        self.attempt
    }
}

impl Submission {
    pub async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: SubmissionCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO submissions (id, assignment_id, trainee_id, content, attachment_url)
            VALUES ($1,$2,$3,$4,$5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.assignment_id)
        .bind(actor.user_id())
        .bind(&data.content)
        .bind(&data.attachment_url)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    /// Replaces the content and puts the submission back into review.
    ///
    /// `None` when the submission left REJECTED/RESUBMIT_REQUESTED in the meantime.
    pub async fn resubmit(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: SubmissionCreate,
    ) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as(
            r#"
            UPDATE submissions
            SET content = $1,
                attachment_url = $2,
                status = 'PENDING',
                attempt = attempt + 1,
                submitted_at = now(),
                reviewed_at = NULL
            WHERE id = $3 AND status IN ('REJECTED', 'RESUBMIT_REQUESTED')
            RETURNING *
            "#,
        )
        .bind(&data.content)
        .bind(&data.attachment_url)
        .bind(self.id)
        .fetch_optional(mm.executor())
        .await?;

        Ok(row)
    }

    /// Sets the review outcome and stores the reviewer's comment as feedback in one transaction.
    pub async fn review(
        self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        status: SubmissionStatus,
        comment: Option<String>,
    ) -> DatabaseResult<(Self, Option<Feedback>)> {
        let mut tx = mm.executor().begin().await?;

        let row: Self = sqlx::query_as(
            "UPDATE submissions SET status = $1, reviewed_at = now() WHERE id = $2 RETURNING *",
        )
        .bind(status)
        .bind(self.id)
        .fetch_one(&mut *tx)
        .await?;

        let feedback = match comment {
            Some(comment) => {
                let feedback = sqlx::query_as(
                    r#"
                    INSERT INTO feedback (id, submission_id, author_id, comment)
                    VALUES ($1,$2,$3,$4)
                    RETURNING *
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(row.id)
                .bind(actor.user_id())
                .bind(&comment)
                .fetch_one(&mut *tx)
                .await?;
                Some(feedback)
            }
            None => None,
        };

        tx.commit().await?;
        Ok((row, feedback))
    }

    pub async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM submissions WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    pub async fn find_for_trainee(
        mm: &ModelManager,
        assignment_id: Uuid,
        trainee_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM submissions WHERE assignment_id = $1 AND trainee_id = $2",
        )
        .bind(assignment_id)
        .bind(trainee_id)
        .fetch_optional(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn all_by_trainee(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM submissions WHERE trainee_id = $1 ORDER BY submitted_at DESC, id",
        )
        .bind(actor.user_id())
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    /// Mentors only get submissions from trainees in cohorts they run.
    pub async fn all_by_assignment(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        assignment_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = if actor.is_admin() {
            sqlx::query_as(
                "SELECT * FROM submissions WHERE assignment_id = $1 ORDER BY submitted_at, id",
            )
            .bind(assignment_id)
            .fetch_all(mm.executor())
            .await?
        } else {
            sqlx::query_as(
                r#"
                SELECT s.* FROM submissions s
                WHERE s.assignment_id = $1
                AND EXISTS (
                    SELECT 1 FROM enrollments e
                    JOIN cohorts c ON c.id = e.cohort_id
                    WHERE e.trainee_id = s.trainee_id AND c.mentor_id = $2
                )
                ORDER BY s.submitted_at, s.id
                "#,
            )
            .bind(assignment_id)
            .bind(actor.user_id())
            .fetch_all(mm.executor())
            .await?
        };
        Ok(result)
    }

    pub async fn count_approved_by_program(
        mm: &ModelManager,
        trainee_id: Uuid,
        program_id: Uuid,
    ) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM submissions s
            JOIN assignments a ON a.id = s.assignment_id
            JOIN modules m ON m.id = a.module_id
            JOIN courses c ON c.id = m.course_id
            WHERE s.trainee_id = $1 AND c.program_id = $2 AND s.status = 'APPROVED'
            "#,
        )
        .bind(trainee_id)
        .bind(program_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }
}

#[async_trait]
impl HasOwner for Submission {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.trainee_id)
    }
}
