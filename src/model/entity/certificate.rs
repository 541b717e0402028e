use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// Issued once per enrollment after the program is complete.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Certificate {
    id: Uuid,
    enrollment_id: Uuid,
    code: String,
    issued_at: DateTime<Utc>,
}

impl ResourceTyped for Certificate {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Certificate
    }
}

impl Certificate {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn enrollment_id(&self) -> Uuid {
        self.enrollment_id
    }

    pub fn code(&self) -> &str {
        &self.code
    }
}

/// Public verification codes are the uppercase simple form of a v4 UUID.
pub fn new_verification_code() -> String {
    Uuid::new_v4().simple().to_string().to_uppercase()
}

impl Certificate {
    /// Stores the certificate and marks the enrollment COMPLETED in one transaction.
    /// `None` when the enrollment is no longer ACTIVE.
    pub async fn issue(mm: &ModelManager, enrollment_id: Uuid) -> DatabaseResult<Option<Self>> {
        let mut tx = mm.executor().begin().await?;

        let completed: Option<Uuid> = sqlx::query_scalar(
            "UPDATE enrollments SET status = 'COMPLETED' WHERE id = $1 AND status = 'ACTIVE' RETURNING id",
        )
        .bind(enrollment_id)
        .fetch_optional(&mut *tx)
        .await?;
        if completed.is_none() {
            return Ok(None);
        }

        let row = sqlx::query_as(
            r#"
            INSERT INTO certificates (id, enrollment_id, code)
            VALUES ($1,$2,$3)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(enrollment_id)
        .bind(new_verification_code())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(row))
    }

    pub async fn find_by_enrollment(
        mm: &ModelManager,
        enrollment_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM certificates WHERE enrollment_id = $1")
            .bind(enrollment_id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    pub async fn all_by_trainee(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            r#"
            SELECT cert.*
            FROM certificates cert
            JOIN enrollments e ON e.id = cert.enrollment_id
            WHERE e.trainee_id = $1
            ORDER BY cert.issued_at, cert.id
            "#,
        )
        .bind(actor.user_id())
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }
}

#[async_trait]
impl HasOwner for Certificate {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        let trainee_id = sqlx::query_scalar("SELECT trainee_id FROM enrollments WHERE id = $1")
            .bind(self.enrollment_id)
            .fetch_one(mm.executor())
            .await?;
        Ok(trainee_id)
    }
}

/// Public view returned by code verification.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct CertificateDetailsRow {
    pub code: String,
    pub issued_at: DateTime<Utc>,
    pub trainee: String,
    pub program: String,
    pub cohort: String,
}

impl CertificateDetailsRow {
    pub async fn find_by_code(mm: &ModelManager, code: &str) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as(
            r#"
            SELECT
                cert.code,
                cert.issued_at,
                u.username AS trainee,
                p.title AS program,
                c.name AS cohort
            FROM certificates cert
            JOIN enrollments e ON e.id = cert.enrollment_id
            JOIN users u ON u.id = e.trainee_id
            JOIN cohorts c ON c.id = e.cohort_id
            JOIN programs p ON p.id = c.program_id
            WHERE cert.code = $1
            "#,
        )
        .bind(code.to_uppercase())
        .fetch_optional(mm.executor())
        .await?;

        Ok(row)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn verification_code_format() {
        let code = new_verification_code();
        assert_eq!(code.len(), 32);
        assert!(code.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        assert_ne!(code, new_verification_code());
    }
}
