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
        entity::{Course, CourseCreate, Module, Program},
    },
    web::{
        AppState, ErrorResponse, RequestContext, ValidatedJson, WebResult, middlewares,
        routes::{db, found, require_program_member},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(courses_create_handler))
        .route(
            "/{id}",
            get(courses_get_handler)
                .put(courses_update_handler)
                .delete(courses_delete_handler),
        )
        .route("/{id}/modules", get(courses_modules_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/",
    request_body = CourseCreate,
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 403, description = "Only admins may create courses", body = ErrorResponse),
        (status = 404, description = "Program not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
pub async fn courses_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CourseCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_admin(Course::get_resource_type())?;
    found(Program::find_by_id(state.pool(), user, payload.program_id).await)?;

    let created = Course::create(state.pool(), user, payload)
        .await
        .map_err(db::<Course>)?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Course found", body = Course),
        (status = 403, description = "You're not enrolled in this program", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
pub async fn courses_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = found(Course::find_by_id(state.pool(), user, id).await)?;
    require_program_member(state.pool(), user, course.program_id()).await?;

    Ok((StatusCode::OK, Json(course)))
}

#[utoipa::path(
    put,
    path = "/api/v1/courses/{id}",
    request_body = CourseCreate,
    params(
        ("id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 403, description = "Only admins may edit courses", body = ErrorResponse),
        (status = 404, description = "Course or program not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
pub async fn courses_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<CourseCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_admin(Course::get_resource_type())?;

    let course = found(Course::find_by_id(state.pool(), user, id).await)?;
    if payload.program_id != course.program_id() {
        found(Program::find_by_id(state.pool(), user, payload.program_id).await)?;
    }

    let updated = course
        .update(state.pool(), user, payload)
        .await
        .map_err(db::<Course>)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}",
    description = "Deletes the course with its modules, lessons and assignments",
    params(
        ("id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Course deleted"),
        (status = 403, description = "Only admins may delete courses", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
pub async fn courses_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_admin(Course::get_resource_type())?;

    let course = found(Course::find_by_id(state.pool(), user, id).await)?;
    course
        .delete(state.pool(), user)
        .await
        .map_err(db::<Course>)?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}/modules",
    params(
        ("id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Modules in order", body = Vec<Module>),
        (status = 403, description = "You're not enrolled in this program", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
pub async fn courses_modules_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = found(Course::find_by_id(state.pool(), user, id).await)?;
    let program_id = course
        .get_owner_id(state.pool(), user)
        .await
        .map_err(db::<Course>)?;
    require_program_member(state.pool(), user, program_id).await?;

    let modules = Module::all_by_course(state.pool(), user, id)
        .await
        .map_err(db::<Module>)?;

    Ok((StatusCode::OK, Json(modules)))
}
