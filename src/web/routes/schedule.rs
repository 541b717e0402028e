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
        CrudRepository, ResourceTyped,
        entity::{Cohort, ScheduleStatus, ScheduledEvent, ScheduledEventCreate},
    },
    web::{
        AppState, ErrorResponse, RequestContext, UserRole, ValidatedJson, WebError, WebResult,
        dto::cohorts::DecisionBody,
        middlewares,
        routes::{db, found, require_cohort_staff},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(schedule_request_handler))
        .route("/mine", get(schedule_mine_handler))
        .route("/{id}/decision", put(schedule_decision_handler))
        .route("/{id}/cancel", post(schedule_cancel_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

fn no_longer_pending() -> WebError {
    WebError::resource_conflict(ScheduledEvent::get_resource_type(), "event is no longer pending")
}

#[utoipa::path(
    post,
    path = "/api/v1/schedule/",
    request_body = ScheduledEventCreate,
    description = "Requests an event in one of the caller's cohorts. It stays PENDING until a mentor decides",
    responses(
        (status = 201, description = "Event requested", body = ScheduledEvent),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 403, description = "Not enrolled in the cohort", body = ErrorResponse),
        (status = 404, description = "Cohort not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "schedule",
    security(
        ("cookie" = [])
    )
)]
pub async fn schedule_request_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ScheduledEventCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_any(&[UserRole::Trainee], ScheduledEvent::get_resource_type())?;

    let cohort = found(Cohort::find_by_id(state.pool(), user, payload.cohort_id).await)?;
    let enrolled = cohort
        .has_trainee(state.pool(), user.user_id())
        .await
        .map_err(db::<Cohort>)?;
    if !enrolled {
        return Err(WebError::resource_forbidden(Cohort::get_resource_type()));
    }

    let event = ScheduledEvent::create(state.pool(), user, payload)
        .await
        .map_err(db::<ScheduledEvent>)?;

    Ok((StatusCode::CREATED, Json(event)))
}

#[utoipa::path(
    get,
    path = "/api/v1/schedule/mine",
    responses(
        (status = 200, description = "Your events ordered by start", body = Vec<ScheduledEvent>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "schedule",
    security(
        ("cookie" = [])
    )
)]
pub async fn schedule_mine_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let events = ScheduledEvent::all_by_trainee(state.pool(), user)
        .await
        .map_err(db::<ScheduledEvent>)?;

    Ok((StatusCode::OK, Json(events)))
}

#[utoipa::path(
    put,
    path = "/api/v1/schedule/{id}/decision",
    request_body = DecisionBody,
    params(
        ("id" = Uuid, Path, description = "ID of the event")
    ),
    responses(
        (status = 200, description = "Decision stored", body = ScheduledEvent),
        (status = 400, description = "Status must be APPROVED or REJECTED", body = ErrorResponse),
        (status = 403, description = "Not your cohort", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 409, description = "Event is no longer pending", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "schedule",
    security(
        ("cookie" = [])
    )
)]
pub async fn schedule_decision_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<DecisionBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_staff(ScheduledEvent::get_resource_type())?;

    if !payload.status.is_decision() {
        return Err(WebError::bad_request("status must be APPROVED or REJECTED"));
    }

    let event = found(ScheduledEvent::find_by_id(state.pool(), user, id).await)?;
    let cohort = found(Cohort::find_by_id(state.pool(), user, event.cohort_id()).await)?;
    require_cohort_staff(state.pool(), user, &cohort).await?;

    if !event.status().is_open() {
        return Err(no_longer_pending());
    }

    let decided = event
        .transition(state.pool(), user, payload.status)
        .await
        .map_err(db::<ScheduledEvent>)?
        .ok_or_else(no_longer_pending)?;

    tracing::info!(event_id = %id, status = ?decided.status(), "schedule request decided");
    Ok((StatusCode::OK, Json(decided)))
}

#[utoipa::path(
    post,
    path = "/api/v1/schedule/{id}/cancel",
    params(
        ("id" = Uuid, Path, description = "ID of the event")
    ),
    responses(
        (status = 200, description = "Event cancelled", body = ScheduledEvent),
        (status = 403, description = "Not your event", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 409, description = "Event is no longer pending", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "schedule",
    security(
        ("cookie" = [])
    )
)]
pub async fn schedule_cancel_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let event = found(ScheduledEvent::find_by_id(state.pool(), user, id).await)?;

    // owner only, admins included
    if event.trainee_id() != user.user_id() {
        return Err(WebError::resource_forbidden(ScheduledEvent::get_resource_type()));
    }

    let cancelled = event
        .transition(state.pool(), user, ScheduleStatus::Cancelled)
        .await
        .map_err(db::<ScheduledEvent>)?
        .ok_or_else(no_longer_pending)?;

    Ok((StatusCode::OK, Json(cancelled)))
}
