use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, put},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, ResourceTyped,
        entity::{Cohort, Enrollment},
    },
    web::{
        AppState, ErrorResponse, RequestContext, ValidatedJson, WebResult,
        dto::cohorts::EnrollmentStatusBody,
        middlewares,
        routes::{db, found, require_cohort_staff},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/{id}", delete(enrollments_delete_handler))
        .route("/{id}/status", put(enrollments_status_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    put,
    path = "/api/v1/enrollments/{id}/status",
    request_body = EnrollmentStatusBody,
    params(
        ("id" = Uuid, Path, description = "ID of the enrollment")
    ),
    responses(
        (status = 200, description = "Status changed", body = Enrollment),
        (status = 400, description = "Unknown status", body = ErrorResponse),
        (status = 403, description = "Not your cohort", body = ErrorResponse),
        (status = 404, description = "Enrollment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "enrollments",
    security(
        ("cookie" = [])
    )
)]
pub async fn enrollments_status_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<EnrollmentStatusBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_staff(Enrollment::get_resource_type())?;

    let enrollment = found(Enrollment::find_by_id(state.pool(), user, id).await)?;
    let cohort = found(Cohort::find_by_id(state.pool(), user, enrollment.cohort_id()).await)?;
    require_cohort_staff(state.pool(), user, &cohort).await?;

    let updated = enrollment
        .set_status(state.pool(), user, payload.status)
        .await
        .map_err(db::<Enrollment>)?;

    tracing::info!(enrollment_id = %id, status = ?payload.status, "enrollment status changed");
    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/enrollments/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the enrollment")
    ),
    responses(
        (status = 200, description = "Enrollment removed"),
        (status = 403, description = "Only admins may remove enrollments", body = ErrorResponse),
        (status = 404, description = "Enrollment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "enrollments",
    security(
        ("cookie" = [])
    )
)]
pub async fn enrollments_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_admin(Enrollment::get_resource_type())?;

    let enrollment = found(Enrollment::find_by_id(state.pool(), user, id).await)?;
    enrollment
        .delete(state.pool(), user)
        .await
        .map_err(db::<Enrollment>)?;

    Ok(StatusCode::OK)
}
