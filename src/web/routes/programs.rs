use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, PaginatableRepository, ResourceTyped,
        entity::{Cohort, Course, ModuleWithLessonsRow, Program, ProgramCreate},
    },
    web::{
        AppState, ErrorResponse, RequestContext, ValidatedJson, WebResult,
        dto::outline::ProgramOutline,
        middlewares,
        routes::{PaginationQuery, db, found, require_program_member},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(programs_list_handler).post(programs_create_handler))
        .route(
            "/{id}",
            get(programs_get_handler)
                .put(programs_update_handler)
                .delete(programs_delete_handler),
        )
        .route("/{id}/outline", get(programs_outline_handler))
        .route("/{id}/courses", get(programs_courses_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/programs/",
    description = "Lists programs. Trainees only get programs they are enrolled in",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Requested page", body = crate::model::Page<Program>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "programs",
    security(
        ("cookie" = [])
    )
)]
pub async fn programs_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Query(page): Query<PaginationQuery>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let programs = Program::page(state.pool(), user, page.limit(), page.offset())
        .await
        .map_err(db::<Program>)?;

    Ok((StatusCode::OK, Json(programs)))
}

#[utoipa::path(
    post,
    path = "/api/v1/programs/",
    request_body = ProgramCreate,
    responses(
        (status = 201, description = "Program created", body = Program),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Only admins may create programs", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "programs",
    security(
        ("cookie" = [])
    )
)]
pub async fn programs_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ProgramCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_admin(Program::get_resource_type())?;

    let created = Program::create(state.pool(), user, payload)
        .await
        .map_err(db::<Program>)?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/programs/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the program")
    ),
    responses(
        (status = 200, description = "Program found", body = Program),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You're not enrolled in this program", body = ErrorResponse),
        (status = 404, description = "Program not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "programs",
    security(
        ("cookie" = [])
    )
)]
pub async fn programs_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let program = found(Program::find_by_id(state.pool(), user, id).await)?;
    require_program_member(state.pool(), user, program.id()).await?;

    Ok((StatusCode::OK, Json(program)))
}

#[utoipa::path(
    put,
    path = "/api/v1/programs/{id}",
    request_body = ProgramCreate,
    params(
        ("id" = Uuid, Path, description = "ID of the program")
    ),
    responses(
        (status = 200, description = "Program updated", body = Program),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 403, description = "Only admins may edit programs", body = ErrorResponse),
        (status = 404, description = "Program not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "programs",
    security(
        ("cookie" = [])
    )
)]
pub async fn programs_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ProgramCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_admin(Program::get_resource_type())?;

    let program = found(Program::find_by_id(state.pool(), user, id).await)?;
    let updated = program
        .update(state.pool(), user, payload)
        .await
        .map_err(db::<Program>)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/programs/{id}",
    description = "Deletes the program with all its courses and cohorts",
    params(
        ("id" = Uuid, Path, description = "ID of the program")
    ),
    responses(
        (status = 200, description = "Program deleted"),
        (status = 403, description = "Only admins may delete programs", body = ErrorResponse),
        (status = 404, description = "Program not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "programs",
    security(
        ("cookie" = [])
    )
)]
pub async fn programs_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_admin(Program::get_resource_type())?;

    let program = found(Program::find_by_id(state.pool(), user, id).await)?;
    program
        .delete(state.pool(), user)
        .await
        .map_err(db::<Program>)?;

    tracing::info!(program_id = %id, "program deleted");
    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/v1/programs/{id}/outline",
    description = "Courses, modules, lessons and assignments of a program with the caller's completion and unlock state",
    params(
        ("id" = Uuid, Path, description = "ID of the program")
    ),
    responses(
        (status = 200, description = "Program outline", body = ProgramOutline),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You're not enrolled in this program", body = ErrorResponse),
        (status = 404, description = "Program not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "programs",
    security(
        ("cookie" = [])
    )
)]
pub async fn programs_outline_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let program = found(Program::find_by_id(state.pool(), user, id).await)?;
    require_program_member(state.pool(), user, program.id()).await?;

    let (courses, rows, cohort) = tokio::try_join!(
        Course::all_by_program(state.pool(), user, id),
        ModuleWithLessonsRow::fetch_by_program(state.pool(), user.user_id(), id),
        Cohort::active_for_trainee(state.pool(), user.user_id(), id),
    )
    .map_err(db::<Program>)?;

    let outline = ProgramOutline::build(
        &program,
        courses,
        rows,
        user.is_staff(),
        cohort.map(|c| c.start_date()),
    )
    .map_err(db::<Program>)?;

    Ok((StatusCode::OK, Json(outline)))
}

#[utoipa::path(
    get,
    path = "/api/v1/programs/{id}/courses",
    params(
        ("id" = Uuid, Path, description = "ID of the program")
    ),
    responses(
        (status = 200, description = "Courses in order", body = Vec<Course>),
        (status = 403, description = "You're not enrolled in this program", body = ErrorResponse),
        (status = 404, description = "Program not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "programs",
    security(
        ("cookie" = [])
    )
)]
pub async fn programs_courses_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let program = found(Program::find_by_id(state.pool(), user, id).await)?;
    require_program_member(state.pool(), user, program.id()).await?;

    let courses = Course::all_by_program(state.pool(), user, id)
        .await
        .map_err(db::<Course>)?;

    Ok((StatusCode::OK, Json(courses)))
}
