use std::borrow::Cow;

use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::{AuthenticatedUser, UserRole};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Cohort {
    id: Uuid,
    program_id: Uuid,
    mentor_id: Uuid,
    name: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CohortCreate {
    pub program_id: Uuid,
    pub mentor_id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Validate for CohortCreate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name_len = self.name.trim().chars().count();
        if name_len == 0 || name_len > 200 {
            errors.add(
                "name",
                ValidationError::new("length")
                    .with_message(Cow::Borrowed("name must be 1-200 characters")),
            );
        }

        if self.end_date < self.start_date {
            errors.add(
                "end_date",
                ValidationError::new("range")
                    .with_message(Cow::Borrowed("end_date must not precede start_date")),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl ResourceTyped for Cohort {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Cohort
    }
}

impl Cohort {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn program_id(&self) -> Uuid {
        self.program_id
    }

    pub fn mentor_id(&self) -> Uuid {
        self.mentor_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }
}

#[async_trait]
impl CrudRepository<Cohort, CohortCreate, Uuid> for Cohort {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CohortCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO cohorts (id, program_id, mentor_id, name, start_date, end_date)
            VALUES ($1,$2,$3,$4,$5,$6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.program_id)
        .bind(data.mentor_id)
        .bind(data.name.trim())
        .bind(data.start_date)
        .bind(data.end_date)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CohortCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            UPDATE cohorts
            SET program_id = $1, mentor_id = $2, name = $3, start_date = $4, end_date = $5
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(data.program_id)
        .bind(data.mentor_id)
        .bind(data.name.trim())
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM cohorts WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM cohorts WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    /// Admins see every cohort, mentors their own, trainees the ones they are enrolled in.
    async fn list(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let query = match actor.user_role() {
            UserRole::Admin => sqlx::query_as(
                "SELECT * FROM cohorts ORDER BY start_date DESC, id LIMIT $1 OFFSET $2",
            ),
            UserRole::Mentor => sqlx::query_as(
                r#"
                SELECT * FROM cohorts
                WHERE mentor_id = $3
                ORDER BY start_date DESC, id
                LIMIT $1 OFFSET $2
                "#,
            ),
            UserRole::Trainee => sqlx::query_as(
                r#"
                SELECT c.* FROM cohorts c
                JOIN enrollments e ON e.cohort_id = c.id
                WHERE e.trainee_id = $3
                ORDER BY c.start_date DESC, c.id
                LIMIT $1 OFFSET $2
                "#,
            ),
        };

        let mut query = query.bind(limit).bind(offset);
        if !actor.is_admin() {
            query = query.bind(actor.user_id());
        }

        Ok(query.fetch_all(mm.executor()).await?)
    }

    async fn count(mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let query = match actor.user_role() {
            UserRole::Admin => sqlx::query_scalar("SELECT COUNT(*) FROM cohorts"),
            UserRole::Mentor => sqlx::query_scalar("SELECT COUNT(*) FROM cohorts WHERE mentor_id = $1"),
            UserRole::Trainee => {
                sqlx::query_scalar("SELECT COUNT(*) FROM enrollments WHERE trainee_id = $1")
            }
        };

        let query = if actor.is_admin() {
            query
        } else {
            query.bind(actor.user_id())
        };

        let result: i64 = query.fetch_one(mm.executor()).await?;
        Ok(result)
    }
}

impl_paginatable_for!(Cohort, CohortCreate, Uuid);

#[async_trait]
impl HasOwner for Cohort {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.mentor_id)
    }
}

impl Cohort {
    /// True when `mentor_id` runs any cohort the trainee is enrolled in.
    pub async fn mentors_trainee(
        mm: &ModelManager,
        mentor_id: Uuid,
        trainee_id: Uuid,
    ) -> DatabaseResult<bool> {
        let found: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM cohorts c
                JOIN enrollments e ON e.cohort_id = c.id
                WHERE c.mentor_id = $1 AND e.trainee_id = $2
            )
            "#,
        )
        .bind(mentor_id)
        .bind(trainee_id)
        .fetch_one(mm.executor())
        .await?;

        Ok(found)
    }

    /// Cohort of `program_id` in which the trainee is actively enrolled, if any.
    pub async fn active_for_trainee(
        mm: &ModelManager,
        trainee_id: Uuid,
        program_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as(
            r#"
            SELECT c.* FROM cohorts c
            JOIN enrollments e ON e.cohort_id = c.id
            WHERE e.trainee_id = $1 AND c.program_id = $2 AND e.status = 'ACTIVE'
            ORDER BY c.start_date DESC
            LIMIT 1
            "#,
        )
        .bind(trainee_id)
        .bind(program_id)
        .fetch_optional(mm.executor())
        .await?;

        Ok(row)
    }

    pub async fn has_trainee(&self, mm: &ModelManager, trainee_id: Uuid) -> DatabaseResult<bool> {
        let found: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM enrollments WHERE cohort_id = $1 AND trainee_id = $2)",
        )
        .bind(self.id)
        .bind(trainee_id)
        .fetch_one(mm.executor())
        .await?;

        Ok(found)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn create(start: (i32, u32, u32), end: (i32, u32, u32), name: &str) -> CohortCreate {
        CohortCreate {
            program_id: Uuid::new_v4(),
            mentor_id: Uuid::new_v4(),
            name: name.to_string(),
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
        }
    }

    #[test]
    fn same_day_cohort_is_valid() {
        assert!(create((2025, 1, 1), (2025, 1, 1), "Spring").validate().is_ok());
    }

    #[test]
    fn reversed_dates_and_blank_name_are_reported_per_field() {
        let errors = create((2025, 2, 1), (2025, 1, 1), "  ").validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("end_date"));
        assert!(fields.contains_key("name"));
    }
}
