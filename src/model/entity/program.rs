use crate::impl_paginatable_for;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Program {
    id: Uuid,
    title: String,
    description: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, Validate, utoipa::ToSchema)]
pub struct ProgramCreate {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl ResourceTyped for Program {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Program
    }
}

impl Program {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

#[async_trait]
impl CrudRepository<Program, ProgramCreate, Uuid> for Program {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: ProgramCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            "INSERT INTO programs (id, title, description) VALUES ($1,$2,$3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&data.title)
        .bind(&data.description)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: ProgramCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE programs SET title = $1, description = $2 WHERE id = $3")
            .bind(&data.title)
            .bind(&data.description)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.title = data.title;
        self.description = data.description;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM programs WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM programs WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    /// Trainees only see programs they are enrolled in.
    async fn list(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = if actor.is_trainee() {
            sqlx::query_as(
                r#"
                SELECT DISTINCT p.*
                FROM programs p
                JOIN cohorts c ON c.program_id = p.id
                JOIN enrollments e ON e.cohort_id = c.id
                WHERE e.trainee_id = $1
                ORDER BY p.created_at, p.id
                LIMIT $2 OFFSET $3
                "#,
            )
            .bind(actor.user_id())
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?
        } else {
            sqlx::query_as("SELECT * FROM programs ORDER BY created_at, id LIMIT $1 OFFSET $2")
                .bind(limit)
                .bind(offset)
                .fetch_all(mm.executor())
                .await?
        };
        Ok(result)
    }

    async fn count(mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = if actor.is_trainee() {
            sqlx::query_scalar(
                r#"
                SELECT COUNT(DISTINCT c.program_id)
                FROM cohorts c
                JOIN enrollments e ON e.cohort_id = c.id
                WHERE e.trainee_id = $1
                "#,
            )
            .bind(actor.user_id())
            .fetch_one(mm.executor())
            .await?
        } else {
            sqlx::query_scalar("SELECT COUNT(*) FROM programs")
                .fetch_one(mm.executor())
                .await?
        };

        Ok(result)
    }
}

impl_paginatable_for!(Program, ProgramCreate, Uuid);

impl Program {
    /// True when the user is enrolled (any status) in a cohort of this program.
    pub async fn is_member(
        mm: &ModelManager,
        program_id: Uuid,
        user_id: Uuid,
    ) -> DatabaseResult<bool> {
        let found: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM enrollments e
                JOIN cohorts c ON c.id = e.cohort_id
                WHERE c.program_id = $1 AND e.trainee_id = $2
            )
            "#,
        )
        .bind(program_id)
        .bind(user_id)
        .fetch_one(mm.executor())
        .await?;

        Ok(found)
    }
}
