use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Assignment {
    id: Uuid,
    module_id: Uuid,
    title: String,
    description: String,
    /// Days after the cohort start the work is due, if it has a deadline.
    due_offset_days: Option<i32>,
}

#[derive(Debug, Deserialize, Serialize, Validate, utoipa::ToSchema)]
pub struct AssignmentCreate {
    pub module_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 0, max = 3650, message = "due_offset_days must be 0-3650"))]
    pub due_offset_days: Option<i32>,
}

impl ResourceTyped for Assignment {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Assignment
    }
}

impl Assignment {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn module_id(&self) -> Uuid {
        self.module_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn due_offset_days(&self) -> Option<i32> {
        self.due_offset_days
    }
}

#[async_trait]
impl CrudRepository<Assignment, AssignmentCreate, Uuid> for Assignment {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: AssignmentCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO assignments (id, module_id, title, description, due_offset_days)
            VALUES ($1,$2,$3,$4,$5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.module_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.due_offset_days)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: AssignmentCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query(
            "UPDATE assignments SET module_id = $1, title = $2, description = $3, due_offset_days = $4 WHERE id = $5",
        )
        .bind(data.module_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.due_offset_days)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.module_id = data.module_id;
        self.title = data.title;
        self.description = data.description;
        self.due_offset_days = data.due_offset_days;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM assignments WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM assignments WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM assignments ORDER BY module_id, id LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM assignments")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}


#[async_trait]
impl HasOwner for Assignment {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        let program_id = sqlx::query_scalar(
            r#"
            SELECT c.program_id
            FROM modules m
            JOIN courses c ON c.id = m.course_id
            WHERE m.id = $1
            "#,
        )
        .bind(self.module_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(program_id)
    }
}

impl Assignment {
    pub async fn all_by_module(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        module_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM assignments WHERE module_id = $1 ORDER BY due_offset_days NULLS LAST, id",
        )
        .bind(module_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    /// `(id, due_offset_days)` for every assignment in the program.
    pub async fn deadlines_by_program(
        mm: &ModelManager,
        program_id: Uuid,
    ) -> DatabaseResult<Vec<(Uuid, Option<i32>)>> {
        let rows = sqlx::query_as(
            r#"
            SELECT a.id, a.due_offset_days
            FROM assignments a
            JOIN modules m ON m.id = a.module_id
            JOIN courses c ON c.id = m.course_id
            WHERE c.program_id = $1
            "#,
        )
        .bind(program_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }

    pub async fn count_by_program(mm: &ModelManager, program_id: Uuid) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM assignments a
            JOIN modules m ON m.id = a.module_id
            JOIN courses c ON c.id = m.course_id
            WHERE c.program_id = $1
            "#,
        )
        .bind(program_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }
}
