use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, PaginatableRepository, ResourceTyped, check_access,
        entity::{Call, CallCreate, Cohort},
    },
    web::{
        AppState, AuthenticatedUser, ErrorResponse, RequestContext, ValidatedJson, WebError,
        WebResult, middlewares,
        routes::{PaginationQuery, db, found, require_cohort_staff},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(calls_list_handler).post(calls_create_handler))
        .route("/{id}", put(calls_update_handler).delete(calls_delete_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

async fn owned_call(state: &AppState, user: &AuthenticatedUser, id: Uuid) -> WebResult<Call> {
    let call = found(Call::find_by_id(state.pool(), user, id).await)?;
    check_access(state.pool(), user, &call, user.user_id())
        .await
        .map_err(db::<Call>)?;
    Ok(call)
}

#[utoipa::path(
    get,
    path = "/api/v1/calls/",
    description = "Calls created by the caller",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Requested page", body = crate::model::Page<Call>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "calls",
    security(
        ("cookie" = [])
    )
)]
pub async fn calls_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Query(page): Query<PaginationQuery>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let calls = Call::page(state.pool(), user, page.limit(), page.offset())
        .await
        .map_err(db::<Call>)?;

    Ok((StatusCode::OK, Json(calls)))
}

#[utoipa::path(
    post,
    path = "/api/v1/calls/",
    request_body = CallCreate,
    responses(
        (status = 201, description = "Call scheduled", body = Call),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 403, description = "Not your cohort", body = ErrorResponse),
        (status = 404, description = "Cohort not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "calls",
    security(
        ("cookie" = [])
    )
)]
pub async fn calls_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CallCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_staff(Call::get_resource_type())?;

    let cohort = found(Cohort::find_by_id(state.pool(), user, payload.cohort_id).await)?;
    require_cohort_staff(state.pool(), user, &cohort).await?;

    let call = Call::create(state.pool(), user, payload)
        .await
        .map_err(db::<Call>)?;

    tracing::info!(call_id = %call.id(), cohort_id = %cohort.id(), "call scheduled");
    Ok((StatusCode::CREATED, Json(call)))
}

#[utoipa::path(
    put,
    path = "/api/v1/calls/{id}",
    request_body = CallCreate,
    description = "Reschedules a call. The cohort can't be changed",
    params(
        ("id" = Uuid, Path, description = "ID of the call")
    ),
    responses(
        (status = 200, description = "Call updated", body = Call),
        (status = 400, description = "Invalid fields or cohort changed", body = ErrorResponse),
        (status = 403, description = "Only the creator may edit the call", body = ErrorResponse),
        (status = 404, description = "Call not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "calls",
    security(
        ("cookie" = [])
    )
)]
pub async fn calls_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<CallCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let call = owned_call(&state, user, id).await?;

    if payload.cohort_id != call.cohort_id() {
        return Err(WebError::bad_request("a call can't move to another cohort"));
    }

    let updated = call
        .update(state.pool(), user, payload)
        .await
        .map_err(db::<Call>)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/calls/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the call")
    ),
    responses(
        (status = 200, description = "Call cancelled"),
        (status = 403, description = "Only the creator may cancel the call", body = ErrorResponse),
        (status = 404, description = "Call not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "calls",
    security(
        ("cookie" = [])
    )
)]
pub async fn calls_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let call = owned_call(&state, user, id).await?;

    call.delete(state.pool(), user)
        .await
        .map_err(db::<Call>)?;

    Ok(StatusCode::OK)
}
