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
        entity::{Lesson, LessonAccess, LessonCreate, LessonProgress, LessonWithStatusRow, Module, ModuleWithLessonsRow},
    },
    web::{
        AppState, AuthenticatedUser, ErrorResponse, RequestContext, UserRole, ValidatedJson,
        WebError, WebResult,
        dto::{
            lessons::{LessonDoneResponse, LessonResponse},
            outline::{ModuleOutline, apply_unlocks},
        },
        middlewares,
        routes::{db, found, require_program_member},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(lessons_create_handler))
        .route(
            "/{id}",
            get(lessons_get_handler)
                .put(lessons_update_handler)
                .delete(lessons_delete_handler),
        )
        .route("/{id}/done", post(lessons_mark_done_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

/// Membership plus linear unlocking. Staff skip both.
async fn ensure_lesson_open(
    state: &AppState,
    user: &AuthenticatedUser,
    lesson: &Lesson,
) -> WebResult<()> {
    let program_id = lesson
        .get_owner_id(state.pool(), user)
        .await
        .map_err(db::<Lesson>)?;
    require_program_member(state.pool(), user, program_id).await?;

    if user.is_staff() {
        return Ok(());
    }

    let course_id = lesson.course_id(state.pool()).await.map_err(db::<Lesson>)?;
    let rows = ModuleWithLessonsRow::fetch_by_course(state.pool(), user.user_id(), course_id)
        .await
        .map_err(db::<Module>)?;
    let mut modules = ModuleOutline::from_rows(rows).map_err(db::<Module>)?;
    apply_unlocks(&mut modules, false);

    let unlocked = modules
        .iter()
        .flat_map(|m| m.lessons.iter())
        .any(|l| l.id == lesson.id() && l.unlocked);

    if unlocked {
        Ok(())
    } else {
        Err(WebError::resource_locked(Lesson::get_resource_type()))
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/lessons/",
    request_body = LessonCreate,
    responses(
        (status = 201, description = "Lesson created", body = Lesson),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 403, description = "Only admins may create lessons", body = ErrorResponse),
        (status = 404, description = "Module not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "lessons",
    security(
        ("cookie" = [])
    )
)]
pub async fn lessons_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LessonCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_admin(Lesson::get_resource_type())?;
    found(Module::find_by_id(state.pool(), user, payload.module_id).await)?;

    let created = Lesson::create(state.pool(), user, payload)
        .await
        .map_err(db::<Lesson>)?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/lessons/{lesson_id}",
    description = "Fetch comprehensive info about lesson including its content",
    params(
        ("lesson_id" = Uuid, Path, description = "ID of the lesson to get")
    ),
    responses(
        (status = 200, description = "Lesson found", body = LessonResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Lesson is locked or program not joined", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "lessons"
)]
pub async fn lessons_get_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let lesson = found(Lesson::find_by_id(state.pool(), user, id).await)?;
    ensure_lesson_open(&state, user, &lesson).await?;

    let first_opened_at = if user.is_trainee() {
        let access = LessonAccess::record(state.pool(), user, id)
            .await
            .map_err(db::<Lesson>)?;
        Some(*access.first_opened_at())
    } else {
        None
    };

    let row = found(LessonWithStatusRow::find_by_id(state.pool(), user, id).await)?;
    Ok((StatusCode::OK, Json(LessonResponse::new(row, first_opened_at))))
}

#[utoipa::path(
    put,
    path = "/api/v1/lessons/{lesson_id}",
    request_body = LessonCreate,
    params(
        ("lesson_id" = Uuid, Path, description = "ID of the lesson")
    ),
    responses(
        (status = 200, description = "Lesson updated", body = Lesson),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 403, description = "Only admins may edit lessons", body = ErrorResponse),
        (status = 404, description = "Lesson or module not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "lessons",
    security(
        ("cookie" = [])
    )
)]
pub async fn lessons_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<LessonCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_admin(Lesson::get_resource_type())?;

    let lesson = found(Lesson::find_by_id(state.pool(), user, id).await)?;
    if payload.module_id != lesson.module_id() {
        found(Module::find_by_id(state.pool(), user, payload.module_id).await)?;
    }

    let updated = lesson
        .update(state.pool(), user, payload)
        .await
        .map_err(db::<Lesson>)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/lessons/{lesson_id}",
    params(
        ("lesson_id" = Uuid, Path, description = "ID of the lesson")
    ),
    responses(
        (status = 200, description = "Lesson deleted"),
        (status = 403, description = "Only admins may delete lessons", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "lessons",
    security(
        ("cookie" = [])
    )
)]
pub async fn lessons_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_admin(Lesson::get_resource_type())?;

    let lesson = found(Lesson::find_by_id(state.pool(), user, id).await)?;
    lesson
        .delete(state.pool(), user)
        .await
        .map_err(db::<Lesson>)?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/lessons/{lesson_id}/done",
    description = "Mark lesson as done. Repeated calls keep the first completion time",
    params(
        ("lesson_id" = Uuid, Path, description = "ID of the lesson to mark")
    ),
    responses(
        (status = 200, description = "Lesson marked", body = LessonDoneResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Lesson is locked or you're not a trainee", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "lessons"
)]
pub async fn lessons_mark_done_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_any(&[UserRole::Trainee], LessonProgress::get_resource_type())?;

    let lesson = found(Lesson::find_by_id(state.pool(), user, id).await)?;
    ensure_lesson_open(&state, user, &lesson).await?;

    let progress = LessonProgress::mark_done(state.pool(), user, id)
        .await
        .map_err(db::<LessonProgress>)?;

    let res = LessonDoneResponse {
        lesson_id: progress.lesson_id(),
        completed_at: *progress.completed_at(),
    };
    Ok((StatusCode::OK, Json(res)))
}
