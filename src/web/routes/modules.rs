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
        entity::{Assignment, Course, Lesson, Module, ModuleCreate},
    },
    web::{
        AppState, AuthenticatedUser, ErrorResponse, RequestContext, ValidatedJson, WebResult,
        middlewares,
        routes::{db, found, require_program_member},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(modules_create_handler))
        .route(
            "/{id}",
            get(modules_get_handler)
                .put(modules_update_handler)
                .delete(modules_delete_handler),
        )
        .route("/{id}/lessons", get(modules_lessons_handler))
        .route("/{id}/assignments", get(modules_assignments_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

async fn visible_module(state: &AppState, user: &AuthenticatedUser, id: Uuid) -> WebResult<Module> {
    let module = found(Module::find_by_id(state.pool(), user, id).await)?;
    let program_id = module
        .get_owner_id(state.pool(), user)
        .await
        .map_err(db::<Module>)?;
    require_program_member(state.pool(), user, program_id).await?;
    Ok(module)
}

#[utoipa::path(
    post,
    path = "/api/v1/modules/",
    request_body = ModuleCreate,
    responses(
        (status = 201, description = "Module created", body = Module),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 403, description = "Only admins may create modules", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "modules",
    security(
        ("cookie" = [])
    )
)]
pub async fn modules_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ModuleCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_admin(Module::get_resource_type())?;
    found(Course::find_by_id(state.pool(), user, payload.course_id).await)?;

    let created = Module::create(state.pool(), user, payload)
        .await
        .map_err(db::<Module>)?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/modules/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the module")
    ),
    responses(
        (status = 200, description = "Module found", body = Module),
        (status = 403, description = "You're not enrolled in this program", body = ErrorResponse),
        (status = 404, description = "Module not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "modules",
    security(
        ("cookie" = [])
    )
)]
pub async fn modules_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let module = visible_module(&state, user, id).await?;
    Ok((StatusCode::OK, Json(module)))
}

#[utoipa::path(
    put,
    path = "/api/v1/modules/{id}",
    request_body = ModuleCreate,
    params(
        ("id" = Uuid, Path, description = "ID of the module")
    ),
    responses(
        (status = 200, description = "Module updated", body = Module),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 403, description = "Only admins may edit modules", body = ErrorResponse),
        (status = 404, description = "Module or course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "modules",
    security(
        ("cookie" = [])
    )
)]
pub async fn modules_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ModuleCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_admin(Module::get_resource_type())?;

    let module = found(Module::find_by_id(state.pool(), user, id).await)?;
    if payload.course_id != module.course_id() {
        found(Course::find_by_id(state.pool(), user, payload.course_id).await)?;
    }

    let updated = module
        .update(state.pool(), user, payload)
        .await
        .map_err(db::<Module>)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/modules/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the module")
    ),
    responses(
        (status = 200, description = "Module deleted"),
        (status = 403, description = "Only admins may delete modules", body = ErrorResponse),
        (status = 404, description = "Module not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "modules",
    security(
        ("cookie" = [])
    )
)]
pub async fn modules_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_admin(Module::get_resource_type())?;

    let module = found(Module::find_by_id(state.pool(), user, id).await)?;
    module
        .delete(state.pool(), user)
        .await
        .map_err(db::<Module>)?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/v1/modules/{id}/lessons",
    description = "Lessons of a module without their content",
    params(
        ("id" = Uuid, Path, description = "ID of the module")
    ),
    responses(
        (status = 200, description = "Lessons in order", body = Vec<Lesson>),
        (status = 403, description = "You're not enrolled in this program", body = ErrorResponse),
        (status = 404, description = "Module not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "modules",
    security(
        ("cookie" = [])
    )
)]
pub async fn modules_lessons_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    visible_module(&state, user, id).await?;

    let mut lessons = Lesson::all_by_module(state.pool(), user, id)
        .await
        .map_err(db::<Lesson>)?;

    // content is only served through the lesson endpoint, which checks unlocking
    if !user.is_staff() {
        lessons.iter_mut().for_each(Lesson::strip_content);
    }

    Ok((StatusCode::OK, Json(lessons)))
}

#[utoipa::path(
    get,
    path = "/api/v1/modules/{id}/assignments",
    params(
        ("id" = Uuid, Path, description = "ID of the module")
    ),
    responses(
        (status = 200, description = "Assignments of the module", body = Vec<Assignment>),
        (status = 403, description = "You're not enrolled in this program", body = ErrorResponse),
        (status = 404, description = "Module not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "modules",
    security(
        ("cookie" = [])
    )
)]
pub async fn modules_assignments_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    visible_module(&state, user, id).await?;

    let assignments = Assignment::all_by_module(state.pool(), user, id)
        .await
        .map_err(db::<Assignment>)?;

    Ok((StatusCode::OK, Json(assignments)))
}
