use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::put,
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, check_access,
        entity::{Feedback, FeedbackCreate},
    },
    web::{
        AppState, AuthenticatedUser, ErrorResponse, RequestContext, ValidatedJson, WebResult,
        middlewares,
        routes::{db, found},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route(
            "/{id}",
            put(feedback_update_handler).delete(feedback_delete_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

async fn authored_feedback(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<Feedback> {
    let feedback = found(Feedback::find_by_id(state.pool(), user, id).await)?;
    check_access(state.pool(), user, &feedback, user.user_id())
        .await
        .map_err(db::<Feedback>)?;
    Ok(feedback)
}

#[utoipa::path(
    put,
    path = "/api/v1/feedback/{id}",
    request_body = FeedbackCreate,
    params(
        ("id" = Uuid, Path, description = "ID of the feedback")
    ),
    responses(
        (status = 200, description = "Feedback updated", body = Feedback),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 403, description = "Only the author may edit feedback", body = ErrorResponse),
        (status = 404, description = "Feedback not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "feedback",
    security(
        ("cookie" = [])
    )
)]
pub async fn feedback_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<FeedbackCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let feedback = authored_feedback(&state, user, id).await?;

    let updated = feedback
        .update(state.pool(), user, payload)
        .await
        .map_err(db::<Feedback>)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/feedback/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the feedback")
    ),
    responses(
        (status = 200, description = "Feedback deleted"),
        (status = 403, description = "Only the author may delete feedback", body = ErrorResponse),
        (status = 404, description = "Feedback not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "feedback",
    security(
        ("cookie" = [])
    )
)]
pub async fn feedback_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let feedback = authored_feedback(&state, user, id).await?;

    feedback
        .delete(state.pool(), user)
        .await
        .map_err(db::<Feedback>)?;

    Ok(StatusCode::OK)
}
