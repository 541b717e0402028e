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

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Feedback {
    id: Uuid,
    submission_id: Uuid,
    author_id: Uuid,
    comment: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, Validate, utoipa::ToSchema)]
pub struct FeedbackCreate {
    #[serde(skip_deserializing)]
    pub submission_id: Uuid,
    #[validate(length(min = 1, max = 10000, message = "comment must be 1-10000 characters"))]
    pub comment: String,
}

impl ResourceTyped for Feedback {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Feedback
    }
}

impl Feedback {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn submission_id(&self) -> Uuid {
        self.submission_id
    }

    pub fn author_id(&self) -> Uuid {
        self.author_id
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }
}

#[async_trait]
impl CrudRepository<Feedback, FeedbackCreate, Uuid> for Feedback {
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: FeedbackCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO feedback (id, submission_id, author_id, comment)
            VALUES ($1,$2,$3,$4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.submission_id)
        .bind(actor.user_id())
        .bind(&data.comment)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: FeedbackCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE feedback SET comment = $1 WHERE id = $2")
            .bind(&data.comment)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.comment = data.comment;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM feedback WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM feedback WHERE id = $1")
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
            "SELECT * FROM feedback WHERE author_id = $1 ORDER BY created_at DESC, id LIMIT $2 OFFSET $3",
        )
        .bind(actor.user_id())
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feedback WHERE author_id = $1")
            .bind(actor.user_id())
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

#[async_trait]
impl HasOwner for Feedback {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.author_id)
    }
}

impl Feedback {
    pub async fn all_by_submission(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        submission_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM feedback WHERE submission_id = $1 ORDER BY created_at, id",
        )
        .bind(submission_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }
}
