use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    model::{
        CrudRepository, ResourceTyped, check_access,
        entity::{Certificate, CertificateDetailsRow, Cohort, Enrollment, EnrollmentStatus},
    },
    web::{
        AppState, ErrorResponse, RequestContext, ValidatedJson, WebError, WebResult, middlewares,
        routes::{db, found, progress::program_progress},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(certificates_issue_handler))
        .route("/mine", get(certificates_mine_handler))
        .route("/verify/{code}", get(certificates_verify_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[derive(Debug, Deserialize, Serialize, Validate, utoipa::ToSchema)]
pub struct CertificateRequestBody {
    pub enrollment_id: Uuid,
}

#[utoipa::path(
    post,
    path = "/api/v1/certificates/",
    request_body = CertificateRequestBody,
    description = "Issues the certificate for a fully completed program and marks the enrollment COMPLETED",
    responses(
        (status = 201, description = "Certificate issued", body = Certificate),
        (status = 403, description = "Not your enrollment or program not complete", body = ErrorResponse),
        (status = 404, description = "Enrollment not found", body = ErrorResponse),
        (status = 409, description = "Certificate already issued or enrollment not active", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "certificates",
    security(
        ("cookie" = [])
    )
)]
pub async fn certificates_issue_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CertificateRequestBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let enrollment = found(Enrollment::find_by_id(state.pool(), user, payload.enrollment_id).await)?;
    check_access(state.pool(), user, &enrollment, user.user_id())
        .await
        .map_err(db::<Enrollment>)?;

    let issued = Certificate::find_by_enrollment(state.pool(), enrollment.id())
        .await
        .map_err(db::<Certificate>)?;
    if issued.is_some() {
        return Err(WebError::resource_conflict(
            Certificate::get_resource_type(),
            "certificate already issued",
        ));
    }

    if enrollment.status() != EnrollmentStatus::Active {
        return Err(WebError::resource_conflict(
            Certificate::get_resource_type(),
            format!("enrollment is {:?}", enrollment.status()),
        ));
    }

    let cohort = found(Cohort::find_by_id(state.pool(), user, enrollment.cohort_id()).await)?;
    let progress = program_progress(state.pool(), enrollment.trainee_id(), cohort.program_id())
        .await
        .map_err(db::<Certificate>)?;
    if !progress.is_complete() {
        return Err(WebError::resource_locked(Certificate::get_resource_type()));
    }

    let certificate = Certificate::issue(state.pool(), enrollment.id())
        .await
        .map_err(db::<Certificate>)?
        .ok_or_else(|| {
            WebError::resource_conflict(Certificate::get_resource_type(), "enrollment is not active")
        })?;

    tracing::info!(
        enrollment_id = %certificate.enrollment_id(),
        code = certificate.code(),
        "certificate issued"
    );
    Ok((StatusCode::CREATED, Json(certificate)))
}

#[utoipa::path(
    get,
    path = "/api/v1/certificates/mine",
    responses(
        (status = 200, description = "Your certificates", body = Vec<Certificate>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "certificates",
    security(
        ("cookie" = [])
    )
)]
pub async fn certificates_mine_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let certificates = Certificate::all_by_trainee(state.pool(), user)
        .await
        .map_err(db::<Certificate>)?;

    Ok((StatusCode::OK, Json(certificates)))
}

#[utoipa::path(
    get,
    path = "/api/v1/certificates/verify/{code}",
    description = "Public lookup of a certificate by its verification code",
    params(
        ("code" = String, Path, description = "Verification code, case-insensitive")
    ),
    responses(
        (status = 200, description = "Certificate is valid", body = CertificateDetailsRow),
        (status = 404, description = "No certificate with this code", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "certificates"
)]
pub async fn certificates_verify_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> WebResult<impl IntoResponse> {
    let details = CertificateDetailsRow::find_by_code(state.pool(), &code)
        .await
        .map_err(db::<Certificate>)?
        .ok_or_else(|| WebError::resource_not_found(Certificate::get_resource_type()))?;

    Ok((StatusCode::OK, Json(details)))
}
