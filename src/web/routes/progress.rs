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
    learning::ProgressSummary,
    model::{
        CrudRepository, DatabaseResult, ModelManager,
        entity::{Assignment, Lesson, LessonProgress, Program, Submission},
    },
    web::{
        AppState, ErrorResponse, RequestContext, WebResult,
        dto::progress::{ProgressQuery, ProgressResponse},
        middlewares,
        routes::{db, found, require_program_member, require_trainee_visibility},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/programs/{id}", get(progress_program_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

/// Lesson and assignment completion of one trainee across a program.
pub(crate) async fn program_progress(
    mm: &ModelManager,
    trainee_id: Uuid,
    program_id: Uuid,
) -> DatabaseResult<ProgressSummary> {
    let (total_lessons, completed_lessons, total_assignments, approved_assignments) = tokio::try_join!(
        Lesson::count_by_program(mm, program_id),
        LessonProgress::count_completed_by_program(mm, trainee_id, program_id),
        Assignment::count_by_program(mm, program_id),
        Submission::count_approved_by_program(mm, trainee_id, program_id),
    )?;

    Ok(ProgressSummary::new(
        total_lessons,
        completed_lessons,
        total_assignments,
        approved_assignments,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/progress/programs/{id}",
    description = "Completion of a program. Staff may ask for one of their trainees",
    params(
        ("id" = Uuid, Path, description = "ID of the program"),
        ProgressQuery,
    ),
    responses(
        (status = 200, description = "Progress summary", body = ProgressResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Not enrolled or not your trainee", body = ErrorResponse),
        (status = 404, description = "Program not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "progress",
    security(
        ("cookie" = [])
    )
)]
pub async fn progress_program_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ProgressQuery>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let program = found(Program::find_by_id(state.pool(), user, id).await)?;

    let trainee_id = match query.trainee_id {
        Some(trainee_id) if trainee_id != user.user_id() => {
            require_trainee_visibility::<LessonProgress>(state.pool(), user, trainee_id).await?;
            trainee_id
        }
        _ => {
            require_program_member(state.pool(), user, program.id()).await?;
            user.user_id()
        }
    };

    let summary = program_progress(state.pool(), trainee_id, program.id())
        .await
        .map_err(db::<LessonProgress>)?;

    Ok((
        StatusCode::OK,
        Json(ProgressResponse::new(program.id(), trainee_id, summary)),
    ))
}
