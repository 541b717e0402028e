use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, HasOwner, ResourceTyped,
        entity::{Assignment, AssignmentCreate, Module, Submission},
    },
    web::{
        AppState, ErrorResponse, RequestContext, ValidatedJson, WebResult, middlewares,
        routes::{db, found, require_program_member},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(assignments_create_handler))
        .route(
            "/{id}",
            get(assignments_get_handler)
                .put(assignments_update_handler)
                .delete(assignments_delete_handler),
        )
        .route("/{id}/submissions", get(assignments_submissions_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/v1/assignments/",
    request_body = AssignmentCreate,
    responses(
        (status = 201, description = "Assignment created", body = Assignment),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 403, description = "Only admins may create assignments", body = ErrorResponse),
        (status = 404, description = "Module not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "assignments",
    security(
        ("cookie" = [])
    )
)]
pub async fn assignments_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<AssignmentCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_admin(Assignment::get_resource_type())?;
    found(Module::find_by_id(state.pool(), user, payload.module_id).await)?;

    let created = Assignment::create(state.pool(), user, payload)
        .await
        .map_err(db::<Assignment>)?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/assignments/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the assignment")
    ),
    responses(
        (status = 200, description = "Assignment found", body = Assignment),
        (status = 403, description = "You're not enrolled in this program", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "assignments",
    security(
        ("cookie" = [])
    )
)]
pub async fn assignments_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let assignment = found(Assignment::find_by_id(state.pool(), user, id).await)?;
    let program_id = assignment
        .get_owner_id(state.pool(), user)
        .await
        .map_err(db::<Assignment>)?;
    require_program_member(state.pool(), user, program_id).await?;

    Ok((StatusCode::OK, Json(assignment)))
}

#[utoipa::path(
    put,
    path = "/api/v1/assignments/{id}",
    request_body = AssignmentCreate,
    params(
        ("id" = Uuid, Path, description = "ID of the assignment")
    ),
    responses(
        (status = 200, description = "Assignment updated", body = Assignment),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 403, description = "Only admins may edit assignments", body = ErrorResponse),
        (status = 404, description = "Assignment or module not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "assignments",
    security(
        ("cookie" = [])
    )
)]
pub async fn assignments_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<AssignmentCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_admin(Assignment::get_resource_type())?;

    let assignment = found(Assignment::find_by_id(state.pool(), user, id).await)?;
    if payload.module_id != assignment.module_id() {
        found(Module::find_by_id(state.pool(), user, payload.module_id).await)?;
    }

    let updated = assignment
        .update(state.pool(), user, payload)
        .await
        .map_err(db::<Assignment>)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/assignments/{id}",
    description = "Deletes the assignment with its submissions",
    params(
        ("id" = Uuid, Path, description = "ID of the assignment")
    ),
    responses(
        (status = 200, description = "Assignment deleted"),
        (status = 403, description = "Only admins may delete assignments", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "assignments",
    security(
        ("cookie" = [])
    )
)]
pub async fn assignments_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_admin(Assignment::get_resource_type())?;

    let assignment = found(Assignment::find_by_id(state.pool(), user, id).await)?;
    assignment
        .delete(state.pool(), user)
        .await
        .map_err(db::<Assignment>)?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/v1/assignments/{id}/submissions",
    description = "Submissions for an assignment. Mentors only see trainees from their cohorts",
    params(
        ("id" = Uuid, Path, description = "ID of the assignment")
    ),
    responses(
        (status = 200, description = "Submissions", body = Vec<Submission>),
        (status = 403, description = "Only staff may list submissions", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "assignments",
    security(
        ("cookie" = [])
    )
)]
pub async fn assignments_submissions_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_staff(Submission::get_resource_type())?;
    found(Assignment::find_by_id(state.pool(), user, id).await)?;

    let submissions = Submission::all_by_assignment(state.pool(), user, id)
        .await
        .map_err(db::<Submission>)?;

    Ok((StatusCode::OK, Json(submissions)))
}
