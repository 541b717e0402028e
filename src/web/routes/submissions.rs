use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, HasOwner, ResourceTyped,
        entity::{Assignment, Cohort, Feedback, FeedbackCreate, Submission, SubmissionCreate},
    },
    web::{
        AppState, AuthenticatedUser, ErrorResponse, RequestContext, UserRole, ValidatedJson,
        WebError, WebResult,
        dto::submissions::{ReviewBody, ReviewResponse},
        middlewares,
        routes::{db, found, require_trainee_visibility},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(submissions_submit_handler))
        .route("/mine", get(submissions_mine_handler))
        .route("/{id}", get(submissions_get_handler))
        .route("/{id}/review", put(submissions_review_handler))
        .route(
            "/{id}/feedback",
            get(submissions_feedback_list_handler).post(submissions_feedback_create_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

/// Loads a submission the caller may look at: its trainee, admins, or a mentor of the trainee.
async fn visible_submission(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<Submission> {
    let submission = found(Submission::find_by_id(state.pool(), user, id).await)?;
    require_trainee_visibility::<Submission>(state.pool(), user, submission.trainee_id()).await?;
    Ok(submission)
}

#[utoipa::path(
    post,
    path = "/api/v1/submissions/",
    request_body = SubmissionCreate,
    description = "Submits work for an assignment. A rejected submission, or one sent back for changes, is replaced by a new attempt",
    responses(
        (status = 201, description = "Submission stored", body = Submission),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 403, description = "Not actively enrolled in the program", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse),
        (status = 409, description = "A submission is pending review or already approved", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "submissions",
    security(
        ("cookie" = [])
    )
)]
pub async fn submissions_submit_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SubmissionCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_any(&[UserRole::Trainee], Submission::get_resource_type())?;

    let assignment = found(Assignment::find_by_id(state.pool(), user, payload.assignment_id).await)?;
    let program_id = assignment
        .get_owner_id(state.pool(), user)
        .await
        .map_err(db::<Assignment>)?;

    let cohort = Cohort::active_for_trainee(state.pool(), user.user_id(), program_id)
        .await
        .map_err(db::<Cohort>)?;
    if cohort.is_none() {
        return Err(WebError::resource_forbidden(Submission::get_resource_type()));
    }

    let existing = Submission::find_for_trainee(state.pool(), assignment.id(), user.user_id())
        .await
        .map_err(db::<Submission>)?;

    let submission = match existing {
        None => Submission::create(state.pool(), user, payload)
            .await
            .map_err(db::<Submission>)?,
        Some(previous) if previous.status().allows_resubmission() => previous
            .resubmit(state.pool(), user, payload)
            .await
            .map_err(db::<Submission>)?
            .ok_or_else(|| {
                WebError::resource_conflict(
                    Submission::get_resource_type(),
                    "submission was reviewed meanwhile",
                )
            })?,
        Some(previous) => {
            return Err(WebError::resource_conflict(
                Submission::get_resource_type(),
                format!("submission is {:?}", previous.status()),
            ));
        }
    };

    tracing::info!(
        submission_id = %submission.id(),
        attempt = submission.attempt(),
        "submission received"
    );
    Ok((StatusCode::CREATED, Json(submission)))
}

#[utoipa::path(
    get,
    path = "/api/v1/submissions/mine",
    responses(
        (status = 200, description = "Your submissions, newest first", body = Vec<Submission>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "submissions",
    security(
        ("cookie" = [])
    )
)]
pub async fn submissions_mine_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let submissions = Submission::all_by_trainee(state.pool(), user)
        .await
        .map_err(db::<Submission>)?;

    Ok((StatusCode::OK, Json(submissions)))
}

#[utoipa::path(
    get,
    path = "/api/v1/submissions/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the submission")
    ),
    responses(
        (status = 200, description = "Submission found", body = Submission),
        (status = 403, description = "Not your submission or trainee", body = ErrorResponse),
        (status = 404, description = "Submission not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "submissions",
    security(
        ("cookie" = [])
    )
)]
pub async fn submissions_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let submission = visible_submission(&state, user, id).await?;
    Ok((StatusCode::OK, Json(submission)))
}

#[utoipa::path(
    put,
    path = "/api/v1/submissions/{id}/review",
    request_body = ReviewBody,
    description = "Sets the review outcome. A comment is stored as feedback",
    params(
        ("id" = Uuid, Path, description = "ID of the submission")
    ),
    responses(
        (status = 200, description = "Submission reviewed", body = ReviewResponse),
        (status = 400, description = "PENDING is not a review outcome", body = ErrorResponse),
        (status = 403, description = "Not your trainee", body = ErrorResponse),
        (status = 404, description = "Submission not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "submissions",
    security(
        ("cookie" = [])
    )
)]
pub async fn submissions_review_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ReviewBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_staff(Submission::get_resource_type())?;

    if !payload.status.is_review_outcome() {
        return Err(WebError::bad_request("status must be a review outcome"));
    }

    let submission = visible_submission(&state, user, id).await?;
    let (submission, feedback) = submission
        .review(state.pool(), user, payload.status, payload.comment)
        .await
        .map_err(db::<Submission>)?;

    tracing::info!(
        submission_id = %id,
        status = ?submission.status(),
        reviewer = %user.user_id(),
        "submission reviewed"
    );
    Ok((StatusCode::OK, Json(ReviewResponse { submission, feedback })))
}

#[utoipa::path(
    get,
    path = "/api/v1/submissions/{id}/feedback",
    params(
        ("id" = Uuid, Path, description = "ID of the submission")
    ),
    responses(
        (status = 200, description = "Feedback, oldest first", body = Vec<Feedback>),
        (status = 403, description = "Not your submission or trainee", body = ErrorResponse),
        (status = 404, description = "Submission not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "submissions",
    security(
        ("cookie" = [])
    )
)]
pub async fn submissions_feedback_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let submission = visible_submission(&state, user, id).await?;

    let feedback = Feedback::all_by_submission(state.pool(), user, submission.id())
        .await
        .map_err(db::<Feedback>)?;

    Ok((StatusCode::OK, Json(feedback)))
}

#[utoipa::path(
    post,
    path = "/api/v1/submissions/{id}/feedback",
    request_body = FeedbackCreate,
    params(
        ("id" = Uuid, Path, description = "ID of the submission")
    ),
    responses(
        (status = 201, description = "Feedback added", body = Feedback),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 403, description = "Only staff of the trainee may comment", body = ErrorResponse),
        (status = 404, description = "Submission not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "submissions",
    security(
        ("cookie" = [])
    )
)]
pub async fn submissions_feedback_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(mut payload): ValidatedJson<FeedbackCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_staff(Feedback::get_resource_type())?;

    let submission = visible_submission(&state, user, id).await?;
    payload.submission_id = submission.id();

    let feedback = Feedback::create(state.pool(), user, payload)
        .await
        .map_err(db::<Feedback>)?;

    Ok((StatusCode::CREATED, Json(feedback)))
}
