use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::{
    model::{DatabaseResult, ModelManager},
    web::AuthenticatedUser,
};

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct LessonAccess {
    id: Uuid,
    user_id: Uuid,
    lesson_id: Uuid,
    first_opened_at: DateTime<Utc>,
    last_opened_at: DateTime<Utc>,
}

impl LessonAccess {
    pub fn first_opened_at(&self) -> &DateTime<Utc> {
        &self.first_opened_at
    }

    pub fn last_opened_at(&self) -> &DateTime<Utc> {
        &self.last_opened_at
    }

    /// Records that the actor opened the lesson, bumping `last_opened_at` on repeat visits.
    pub async fn record(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        lesson_id: Uuid,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO lesson_access (id, user_id, lesson_id)
            VALUES ($1,$2,$3)
            ON CONFLICT (user_id, lesson_id)
            DO UPDATE SET last_opened_at = now()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor.user_id())
        .bind(lesson_id)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }
}
