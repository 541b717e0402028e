use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::model::entity::LessonWithStatusRow;

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct LessonResponse {
    id: Uuid,
    module_id: Uuid,
    title: String,
    content: String,
    order_index: i32,
    completed: bool,
    /// When the caller first opened the lesson, absent for staff.
    #[serde(skip_serializing_if = "Option::is_none")]
    first_opened_at: Option<DateTime<Utc>>,
}

impl LessonResponse {
    pub fn new(row: LessonWithStatusRow, first_opened_at: Option<DateTime<Utc>>) -> Self {
        Self {
            id: row.id,
            module_id: row.module_id,
            title: row.title,
            content: row.content,
            order_index: row.order_index,
            completed: row.completed,
            first_opened_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct LessonDoneResponse {
    pub lesson_id: Uuid,
    pub completed_at: DateTime<Utc>,
}
