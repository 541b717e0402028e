use std::borrow::Cow;

use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize, utoipa::ToSchema)]
#[sqlx(type_name = "schedule_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl ScheduleStatus {
    /// Decisions and cancellations only apply to open requests.
    pub fn is_open(self) -> bool {
        self == Self::Pending
    }

    pub fn is_decision(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

/// A session a trainee asked to book with their cohort's mentor.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct ScheduledEvent {
    id: Uuid,
    trainee_id: Uuid,
    cohort_id: Uuid,
    title: String,
    notes: String,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    status: ScheduleStatus,
    decided_by: Option<Uuid>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ScheduledEventCreate {
    pub cohort_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub notes: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl Validate for ScheduledEventCreate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title_len = self.title.trim().chars().count();
        if title_len == 0 || title_len > 200 {
            errors.add(
                "title",
                ValidationError::new("length")
                    .with_message(Cow::Borrowed("title must be 1-200 characters")),
            );
        }

        if self.notes.chars().count() > 2000 {
            errors.add(
                "notes",
                ValidationError::new("length")
                    .with_message(Cow::Borrowed("notes must be at most 2000 characters")),
            );
        }

        if self.ends_at <= self.starts_at {
            errors.add(
                "ends_at",
                ValidationError::new("range")
                    .with_message(Cow::Borrowed("ends_at must be after starts_at")),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl ResourceTyped for ScheduledEvent {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::ScheduledEvent
    }
}

impl ScheduledEvent {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn trainee_id(&self) -> Uuid {
        self.trainee_id
    }

    pub fn cohort_id(&self) -> Uuid {
        self.cohort_id
    }

    pub fn status(&self) -> ScheduleStatus {
        self.status
    }

    pub fn decided_by(&self) -> Option<Uuid> {
        self.decided_by
    }
}

impl ScheduledEvent {
    pub async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: ScheduledEventCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO scheduled_events (id, trainee_id, cohort_id, title, notes, starts_at, ends_at)
            VALUES ($1,$2,$3,$4,$5,$6,$7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor.user_id())
        .bind(data.cohort_id)
        .bind(data.title.trim())
        .bind(&data.notes)
        .bind(data.starts_at)
        .bind(data.ends_at)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    pub async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM scheduled_events WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    /// Moves an open request to `status`. Returns `None` if it was no longer pending.
    pub async fn transition(
        &self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        status: ScheduleStatus,
    ) -> DatabaseResult<Option<Self>> {
        // guarded in SQL too, two reviewers may race
        let row = sqlx::query_as(
            r#"
            UPDATE scheduled_events
            SET status = $1, decided_by = $2
            WHERE id = $3 AND status = 'PENDING'
            RETURNING *
            "#,
        )
        .bind(status)
        .bind(actor.user_id())
        .bind(self.id)
        .fetch_optional(mm.executor())
        .await?;

        Ok(row)
    }

    pub async fn all_by_trainee(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM scheduled_events WHERE trainee_id = $1 ORDER BY starts_at, id",
        )
        .bind(actor.user_id())
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn all_by_cohort(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        cohort_id: Uuid,
        status: Option<ScheduleStatus>,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            r#"
            SELECT * FROM scheduled_events
            WHERE cohort_id = $1 AND ($2::schedule_status IS NULL OR status = $2)
            ORDER BY starts_at, id
            "#,
        )
        .bind(cohort_id)
        .bind(status)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }
}

#[async_trait]
impl HasOwner for ScheduledEvent {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.trainee_id)
    }
}

#[cfg(test)]
mod test {
    use chrono::Duration;

    use super::*;

    fn request(length: Duration) -> ScheduledEventCreate {
        let starts_at = Utc::now();
        ScheduledEventCreate {
            cohort_id: Uuid::new_v4(),
            title: "1:1 review".into(),
            notes: String::new(),
            starts_at,
            ends_at: starts_at + length,
        }
    }

    #[test]
    fn event_must_end_after_it_starts() {
        assert!(request(Duration::minutes(30)).validate().is_ok());

        let errors = request(Duration::zero()).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("ends_at"));
    }

    #[test]
    fn only_pending_requests_are_open() {
        assert!(ScheduleStatus::Pending.is_open());
        assert!(!ScheduleStatus::Approved.is_open());
        assert!(!ScheduleStatus::Cancelled.is_open());
        assert!(ScheduleStatus::Rejected.is_decision());
        assert!(!ScheduleStatus::Cancelled.is_decision());
        assert!(!ScheduleStatus::Pending.is_decision());
    }
}
