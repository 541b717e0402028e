use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A cohort-wide session run by a mentor.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Call {
    id: Uuid,
    cohort_id: Uuid,
    mentor_id: Uuid,
    title: String,
    starts_at: DateTime<Utc>,
    duration_minutes: i32,
    meeting_url: String,
}

#[derive(Debug, Deserialize, Serialize, Validate, utoipa::ToSchema)]
pub struct CallCreate {
    pub cohort_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    pub starts_at: DateTime<Utc>,
    #[validate(range(min = 5, max = 480, message = "duration_minutes must be 5-480"))]
    pub duration_minutes: i32,
    #[serde(default)]
    #[validate(length(max = 500, message = "meeting_url is too long"))]
    pub meeting_url: String,
}

impl ResourceTyped for Call {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Call
    }
}

impl Call {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn cohort_id(&self) -> Uuid {
        self.cohort_id
    }

    pub fn mentor_id(&self) -> Uuid {
        self.mentor_id
    }

    pub fn starts_at(&self) -> &DateTime<Utc> {
        &self.starts_at
    }
}

#[async_trait]
impl CrudRepository<Call, CallCreate, Uuid> for Call {
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: CallCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO calls (id, cohort_id, mentor_id, title, starts_at, duration_minutes, meeting_url)
            VALUES ($1,$2,$3,$4,$5,$6,$7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.cohort_id)
        .bind(actor.user_id())
        .bind(&data.title)
        .bind(data.starts_at)
        .bind(data.duration_minutes)
        .bind(&data.meeting_url)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CallCreate,
    ) -> DatabaseResult<Self> {
        // a call never moves between cohorts
        let row = sqlx::query_as(
            r#"
            UPDATE calls
            SET title = $1, starts_at = $2, duration_minutes = $3, meeting_url = $4
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(&data.title)
        .bind(data.starts_at)
        .bind(data.duration_minutes)
        .bind(&data.meeting_url)
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM calls WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM calls WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM calls WHERE mentor_id = $1 ORDER BY starts_at, id LIMIT $2 OFFSET $3",
        )
        .bind(actor.user_id())
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM calls WHERE mentor_id = $1")
            .bind(actor.user_id())
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Call, CallCreate, Uuid);

#[async_trait]
impl HasOwner for Call {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.mentor_id)
    }
}

impl Call {
    pub async fn all_by_cohort(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        cohort_id: Uuid,
        upcoming_only: bool,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            r#"
            SELECT * FROM calls
            WHERE cohort_id = $1
            AND (NOT $2 OR starts_at + make_interval(mins => duration_minutes) >= now())
            ORDER BY starts_at, id
            "#,
        )
        .bind(cohort_id)
        .bind(upcoming_only)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }
}
