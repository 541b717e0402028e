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
pub struct Module {
    id: uuid::Uuid,
    course_id: uuid::Uuid,
    title: String,
    description: String,
    order_index: i32,
}

#[derive(Debug, Deserialize, Serialize, Validate, utoipa::ToSchema)]
pub struct ModuleCreate {
    pub course_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 0, message = "order_index must not be negative"))]
    pub order_index: Option<i32>,
}

impl ResourceTyped for Module {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Module
    }
}

impl Module {
    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn course_id(&self) -> uuid::Uuid {
        self.course_id
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
impl CrudRepository<Module, ModuleCreate, uuid::Uuid> for Module {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: ModuleCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO modules (id, course_id, title, description, order_index)
            VALUES ($1,$2,$3,$4,$5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.course_id)
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
        data: ModuleCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query(
            "UPDATE modules SET course_id = $1, title = $2, description = $3, order_index = $4 WHERE id = $5",
        )
        .bind(data.course_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.order_index.unwrap_or(0))
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.course_id = data.course_id;
        self.title = data.title;
        self.description = data.description;
        self.order_index = data.order_index.unwrap_or(0);
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM modules WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM modules WHERE id = $1")
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
            "SELECT * FROM modules ORDER BY course_id, order_index, id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM modules")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl Module {
    pub async fn all_by_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM modules WHERE course_id = $1 ORDER BY order_index, id",
        )
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }
}


#[async_trait]
impl HasOwner for Module {
    type OwnerId = uuid::Uuid;

    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        let program_id = sqlx::query_scalar("SELECT program_id FROM courses WHERE id = $1")
            .bind(self.course_id)
            .fetch_one(mm.executor())
            .await?;
        Ok(program_id)
    }
}

// Utils

const MODULE_OUTLINE_SELECT: &str = r#"
    SELECT
    m.id,
    m.course_id,
    m.title,
    m.description,
    m.order_index,
    COALESCE(
        json_agg(
            json_build_object(
                'id', l.id,
                'title', l.title,
                'order_index', l.order_index,
                'completed', p.id IS NOT NULL
            )
            ORDER BY l.order_index, l.id
        ) FILTER (WHERE l.id IS NOT NULL),
        '[]'
    ) AS lessons,
    COALESCE(
        (
            SELECT json_agg(
                json_build_object(
                    'id', a.id,
                    'title', a.title,
                    'due_offset_days', a.due_offset_days
                )
                ORDER BY a.due_offset_days NULLS LAST, a.id
            )
            FROM assignments a
            WHERE a.module_id = m.id
        ),
        '[]'
    ) AS assignments
    FROM modules m
    JOIN courses c ON c.id = m.course_id
    LEFT JOIN lessons l ON l.module_id = m.id
    LEFT JOIN progress p
    ON p.lesson_id = l.id
    AND p.user_id = $2
"#;

/// A module with its lessons (plus per-user completion) and assignments as JSON arrays.
#[derive(Debug, sqlx::FromRow)]
pub struct ModuleWithLessonsRow {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub order_index: i32,
    pub lessons: serde_json::Value,
    pub assignments: serde_json::Value,
}

impl ModuleWithLessonsRow {
    pub async fn fetch_by_program(
        mm: &ModelManager,
        user_id: Uuid,
        program_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let sql = format!(
            "{MODULE_OUTLINE_SELECT} WHERE c.program_id = $1 GROUP BY m.id ORDER BY m.order_index, m.id"
        );
        let rows = sqlx::query_as(&sql)
            .bind(program_id)
            .bind(user_id)
            .fetch_all(mm.executor())
            .await?;

        Ok(rows)
    }

    pub async fn fetch_by_course(
        mm: &ModelManager,
        user_id: Uuid,
        course_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let sql = format!(
            "{MODULE_OUTLINE_SELECT} WHERE m.course_id = $1 GROUP BY m.id ORDER BY m.order_index, m.id"
        );
        let rows = sqlx::query_as(&sql)
            .bind(course_id)
            .bind(user_id)
            .fetch_all(mm.executor())
            .await?;

        Ok(rows)
    }
}
