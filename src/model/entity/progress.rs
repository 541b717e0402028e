use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// A lesson the user marked as done.
#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct LessonProgress {
    id: Uuid,
    user_id: Uuid,
    lesson_id: Uuid,
    completed_at: DateTime<Utc>,
}

impl ResourceTyped for LessonProgress {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Progress
    }
}

impl LessonProgress {
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn lesson_id(&self) -> Uuid {
        self.lesson_id
    }

    pub fn completed_at(&self) -> &DateTime<Utc> {
        &self.completed_at
    }
}

impl LessonProgress {
    /// Idempotent: marking a lesson twice keeps the first completion time.
    pub async fn mark_done(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        lesson_id: Uuid,
    ) -> DatabaseResult<Self> {
        sqlx::query(
            r#"
            INSERT INTO progress (id, user_id, lesson_id)
            VALUES ($1,$2,$3)
            ON CONFLICT (user_id, lesson_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor.user_id())
        .bind(lesson_id)
        .execute(mm.executor())
        .await?;

        let row = sqlx::query_as("SELECT * FROM progress WHERE user_id = $1 AND lesson_id = $2")
            .bind(actor.user_id())
            .bind(lesson_id)
            .fetch_one(mm.executor())
            .await?;

        Ok(row)
    }

    pub async fn count_completed_by_program(
        mm: &ModelManager,
        user_id: Uuid,
        program_id: Uuid,
    ) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM progress p
            JOIN lessons l ON l.id = p.lesson_id
            JOIN modules m ON m.id = l.module_id
            JOIN courses c ON c.id = m.course_id
            WHERE p.user_id = $1 AND c.program_id = $2
            "#,
        )
        .bind(user_id)
        .bind(program_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }
}

#[async_trait]
impl HasOwner for LessonProgress {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.user_id)
    }
}
