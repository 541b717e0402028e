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
pub struct Course {
    id: Uuid,
    program_id: Uuid,
    title: String,
    description: String,
    order_index: i32,
}

#[derive(Debug, Deserialize, Serialize, Validate, utoipa::ToSchema)]
pub struct CourseCreate {
    pub program_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 0, message = "order_index must not be negative"))]
    pub order_index: Option<i32>,
}

impl ResourceTyped for Course {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Course
    }
}

impl Course {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn program_id(&self) -> Uuid {
        self.program_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn order_index(&self) -> i32 {
        self.order_index
    }
}

#[async_trait]
impl CrudRepository<Course, CourseCreate, Uuid> for Course {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CourseCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO courses (id, program_id, title, description, order_index)
            VALUES ($1,$2,$3,$4,$5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.program_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.order_index.unwrap_or(0))
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CourseCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query(
            "UPDATE courses SET program_id = $1, title = $2, description = $3, order_index = $4 WHERE id = $5",
        )
        .bind(data.program_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.order_index.unwrap_or(0))
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.program_id = data.program_id;
        self.title = data.title;
        self.description = data.description;
        self.order_index = data.order_index.unwrap_or(0);
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM courses WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM courses WHERE id = $1")
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
        let result = sqlx::query_as(
            "SELECT * FROM courses ORDER BY program_id, order_index, id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}


#[async_trait]
impl HasOwner for Course {
    type OwnerId = Uuid;

    /// Curriculum nodes belong to their program.
    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.program_id)
    }
}

impl Course {
    pub async fn all_by_program(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        program_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM courses WHERE program_id = $1 ORDER BY order_index, id",
        )
        .bind(program_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }
}
