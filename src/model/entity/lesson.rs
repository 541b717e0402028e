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
pub struct Lesson {
    id: Uuid,
    module_id: Uuid,
    title: String,
    content: String,
    order_index: i32,
}

impl ResourceTyped for Lesson {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Lesson
    }
}

impl Lesson {
    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn module_id(&self) -> uuid::Uuid {
        self.module_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn order_index(&self) -> i32 {
        self.order_index
    }

    pub fn strip_content(&mut self) {
        self.content.clear();
    }
}

#[derive(Debug, Deserialize, Serialize, Validate, utoipa::ToSchema)]
pub struct LessonCreate {
    pub module_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[validate(range(min = 0, message = "order_index must not be negative"))]
    pub order_index: Option<i32>,
}

#[async_trait]
impl CrudRepository<Lesson, LessonCreate, uuid::Uuid> for Lesson {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: LessonCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO lessons (id, module_id, title, content, order_index)
            VALUES ($1,$2,$3,$4,$5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.module_id)
        .bind(&data.title)
        .bind(&data.content)
        .bind(data.order_index.unwrap_or(0))
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: LessonCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE lessons SET module_id = $1, title = $2, content = $3, order_index = $4 WHERE id = $5")
            .bind(data.module_id)
            .bind(&data.title)
            .bind(&data.content)
            .bind(data.order_index.unwrap_or(0))
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.module_id = data.module_id;
        self.title = data.title;
        self.content = data.content;
        self.order_index = data.order_index.unwrap_or(0);
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM lessons WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: uuid::Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM lessons WHERE id = $1")
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
            "SELECT * FROM lessons ORDER BY module_id, order_index, id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lessons")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl Lesson {
    pub async fn all_by_module(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        mid: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM lessons WHERE module_id = $1 ORDER BY order_index, id",
        )
        .bind(mid)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn count_by_program(mm: &ModelManager, program_id: Uuid) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM lessons l
            JOIN modules m ON m.id = l.module_id
            JOIN courses c ON c.id = m.course_id
            WHERE c.program_id = $1
            "#,
        )
        .bind(program_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn course_id(&self, mm: &ModelManager) -> DatabaseResult<Uuid> {
        let course_id = sqlx::query_scalar("SELECT course_id FROM modules WHERE id = $1")
            .bind(self.module_id)
            .fetch_one(mm.executor())
            .await?;
        Ok(course_id)
    }
}


#[async_trait]
impl HasOwner for Lesson {
    type OwnerId = uuid::Uuid;

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

// Utils

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct LessonWithStatusRow {
    pub id: Uuid,
    pub module_id: Uuid,
    pub title: String,
    pub content: String,
    pub order_index: i32,
    pub completed: bool,
}

impl ResourceTyped for LessonWithStatusRow {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Lesson
    }
}

impl LessonWithStatusRow {
    pub async fn find_by_id(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        lesson_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as(
            r#"
            SELECT
                l.id,
                l.module_id,
                l.title,
                l.content,
                l.order_index,
                p.id IS NOT NULL AS completed
            FROM lessons l
            LEFT JOIN progress p
                ON l.id = p.lesson_id AND p.user_id = $2
            WHERE l.id = $1
            "#,
        )
        .bind(lesson_id)
        .bind(actor.user_id())
        .fetch_optional(mm.executor())
        .await?;

        Ok(row)
    }
}
