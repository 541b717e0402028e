use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    Config,
    learning::RiskPolicy,
    model::{
        CrudRepository, PaginatableRepository, ResourceTyped,
        entity::{
            ActiveEnrollmentRow, Call, Cohort, CohortCreate, Enrollment, Program, ScheduledEvent,
            UserEntity,
        },
    },
    web::{
        AppState, AuthenticatedUser, ErrorResponse, RequestContext, UserRole, ValidatedJson,
        WebError, WebResult,
        dto::cohorts::{AtRiskEntry, EnrollBody, ScheduleStatusQuery, UpcomingQuery},
        middlewares,
        routes::{PaginationQuery, db, found, progress::program_progress, require_cohort_staff},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(cohorts_list_handler).post(cohorts_create_handler))
        .route(
            "/{id}",
            get(cohorts_get_handler)
                .put(cohorts_update_handler)
                .delete(cohorts_delete_handler),
        )
        .route(
            "/{id}/enrollments",
            get(cohorts_enrollments_handler).post(cohorts_enroll_handler),
        )
        .route("/{id}/at-risk", get(cohorts_at_risk_handler))
        .route("/{id}/calls", get(cohorts_calls_handler))
        .route("/{id}/schedule", get(cohorts_schedule_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

/// The referenced user must exist and hold `role`, otherwise the body is rejected.
async fn require_user_with_role(
    state: &AppState,
    actor: &AuthenticatedUser,
    user_id: Uuid,
    role: UserRole,
) -> WebResult<()> {
    let user = UserEntity::find_by_id(state.pool(), actor, user_id)
        .await
        .map_err(db::<UserEntity>)?;

    match user {
        Some(user) if user.role() == role => Ok(()),
        Some(_) => Err(WebError::bad_request(format!("user {user_id} is not a {role}"))),
        None => Err(WebError::bad_request(format!("user {user_id} does not exist"))),
    }
}

/// Admins, the cohort's mentor, or one of its trainees.
async fn visible_cohort(state: &AppState, user: &AuthenticatedUser, id: Uuid) -> WebResult<Cohort> {
    let cohort = found(Cohort::find_by_id(state.pool(), user, id).await)?;

    let visible = match user.user_role() {
        UserRole::Admin => true,
        UserRole::Mentor => cohort.mentor_id() == user.user_id(),
        UserRole::Trainee => cohort
            .has_trainee(state.pool(), user.user_id())
            .await
            .map_err(db::<Cohort>)?,
    };

    if visible {
        Ok(cohort)
    } else {
        Err(WebError::resource_forbidden(Cohort::get_resource_type()))
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/cohorts/",
    description = "Admins get every cohort, mentors the ones they run, trainees the ones they're enrolled in",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Requested page", body = crate::model::Page<Cohort>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "cohorts",
    security(
        ("cookie" = [])
    )
)]
pub async fn cohorts_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Query(page): Query<PaginationQuery>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let cohorts = Cohort::page(state.pool(), user, page.limit(), page.offset())
        .await
        .map_err(db::<Cohort>)?;

    Ok((StatusCode::OK, Json(cohorts)))
}

#[utoipa::path(
    post,
    path = "/api/v1/cohorts/",
    request_body = CohortCreate,
    responses(
        (status = 201, description = "Cohort created", body = Cohort),
        (status = 400, description = "Invalid fields or mentor", body = ErrorResponse),
        (status = 403, description = "Only admins may create cohorts", body = ErrorResponse),
        (status = 404, description = "Program not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "cohorts",
    security(
        ("cookie" = [])
    )
)]
pub async fn cohorts_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CohortCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_admin(Cohort::get_resource_type())?;
    found(Program::find_by_id(state.pool(), user, payload.program_id).await)?;
    require_user_with_role(&state, user, payload.mentor_id, UserRole::Mentor).await?;

    let created = Cohort::create(state.pool(), user, payload)
        .await
        .map_err(db::<Cohort>)?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/cohorts/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the cohort")
    ),
    responses(
        (status = 200, description = "Cohort found", body = Cohort),
        (status = 403, description = "Not your cohort", body = ErrorResponse),
        (status = 404, description = "Cohort not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "cohorts",
    security(
        ("cookie" = [])
    )
)]
pub async fn cohorts_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let cohort = visible_cohort(&state, user, id).await?;
    Ok((StatusCode::OK, Json(cohort)))
}

#[utoipa::path(
    put,
    path = "/api/v1/cohorts/{id}",
    request_body = CohortCreate,
    params(
        ("id" = Uuid, Path, description = "ID of the cohort")
    ),
    responses(
        (status = 200, description = "Cohort updated", body = Cohort),
        (status = 400, description = "Invalid fields or mentor", body = ErrorResponse),
        (status = 403, description = "Only admins may edit cohorts", body = ErrorResponse),
        (status = 404, description = "Cohort or program not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "cohorts",
    security(
        ("cookie" = [])
    )
)]
pub async fn cohorts_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<CohortCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_admin(Cohort::get_resource_type())?;

    let cohort = found(Cohort::find_by_id(state.pool(), user, id).await)?;
    if payload.program_id != cohort.program_id() {
        found(Program::find_by_id(state.pool(), user, payload.program_id).await)?;
    }
    if payload.mentor_id != cohort.mentor_id() {
        require_user_with_role(&state, user, payload.mentor_id, UserRole::Mentor).await?;
    }

    let updated = cohort
        .update(state.pool(), user, payload)
        .await
        .map_err(db::<Cohort>)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/cohorts/{id}",
    description = "Deletes the cohort with its enrollments, calls and scheduled events",
    params(
        ("id" = Uuid, Path, description = "ID of the cohort")
    ),
    responses(
        (status = 200, description = "Cohort deleted"),
        (status = 403, description = "Only admins may delete cohorts", body = ErrorResponse),
        (status = 404, description = "Cohort not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "cohorts",
    security(
        ("cookie" = [])
    )
)]
pub async fn cohorts_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_admin(Cohort::get_resource_type())?;

    let cohort = found(Cohort::find_by_id(state.pool(), user, id).await)?;
    cohort
        .delete(state.pool(), user)
        .await
        .map_err(db::<Cohort>)?;

    tracing::info!(cohort_id = %id, "cohort deleted");
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/cohorts/{id}/enrollments",
    request_body = EnrollBody,
    params(
        ("id" = Uuid, Path, description = "ID of the cohort")
    ),
    responses(
        (status = 201, description = "Trainee enrolled", body = Enrollment),
        (status = 400, description = "User is not a trainee", body = ErrorResponse),
        (status = 403, description = "Only admins may enroll trainees", body = ErrorResponse),
        (status = 404, description = "Cohort not found", body = ErrorResponse),
        (status = 409, description = "Trainee already enrolled", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "cohorts",
    security(
        ("cookie" = [])
    )
)]
pub async fn cohorts_enroll_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<EnrollBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_admin(Enrollment::get_resource_type())?;

    let cohort = found(Cohort::find_by_id(state.pool(), user, id).await)?;
    require_user_with_role(&state, user, payload.trainee_id, UserRole::Trainee).await?;

    let enrollment = Enrollment::create(state.pool(), user, cohort.id(), payload.trainee_id)
        .await
        .map_err(db::<Enrollment>)?;

    tracing::info!(
        cohort_id = %cohort.id(),
        trainee_id = %payload.trainee_id,
        "trainee enrolled"
    );
    Ok((StatusCode::CREATED, Json(enrollment)))
}

#[utoipa::path(
    get,
    path = "/api/v1/cohorts/{id}/enrollments",
    params(
        ("id" = Uuid, Path, description = "ID of the cohort")
    ),
    responses(
        (status = 200, description = "Enrollments of the cohort", body = Vec<Enrollment>),
        (status = 403, description = "Not your cohort", body = ErrorResponse),
        (status = 404, description = "Cohort not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "cohorts",
    security(
        ("cookie" = [])
    )
)]
pub async fn cohorts_enrollments_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let cohort = found(Cohort::find_by_id(state.pool(), user, id).await)?;
    require_cohort_staff(state.pool(), user, &cohort).await?;

    let enrollments = Enrollment::all_by_cohort(state.pool(), user, id)
        .await
        .map_err(db::<Enrollment>)?;

    Ok((StatusCode::OK, Json(enrollments)))
}

#[utoipa::path(
    get,
    path = "/api/v1/cohorts/{id}/at-risk",
    description = "Risk assessment and progress for every active enrollment of the cohort",
    params(
        ("id" = Uuid, Path, description = "ID of the cohort")
    ),
    responses(
        (status = 200, description = "Assessments", body = Vec<AtRiskEntry>),
        (status = 403, description = "Not your cohort", body = ErrorResponse),
        (status = 404, description = "Cohort not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "cohorts",
    security(
        ("cookie" = [])
    )
)]
pub async fn cohorts_at_risk_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let cohort = found(Cohort::find_by_id(state.pool(), user, id).await)?;
    require_cohort_staff(state.pool(), user, &cohort).await?;

    let reminders = Config::get_or_init(false).await.reminders();
    let policy = RiskPolicy::new(reminders.inactivity_days(), reminders.remind_every_hours());
    let now = Utc::now();

    let rows = ActiveEnrollmentRow::fetch_by_cohort(state.pool(), id)
        .await
        .map_err(db::<Enrollment>)?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        let (assessment, progress) = tokio::try_join!(
            row.assess(state.pool(), &policy, now),
            program_progress(state.pool(), row.trainee_id, row.program_id),
        )
        .map_err(db::<Enrollment>)?;

        entries.push(AtRiskEntry {
            enrollment_id: row.id,
            trainee_id: row.trainee_id,
            username: row.username,
            progress,
            assessment,
        });
    }

    Ok((StatusCode::OK, Json(entries)))
}

#[utoipa::path(
    get,
    path = "/api/v1/cohorts/{id}/calls",
    params(
        ("id" = Uuid, Path, description = "ID of the cohort"),
        UpcomingQuery,
    ),
    responses(
        (status = 200, description = "Calls ordered by start", body = Vec<Call>),
        (status = 403, description = "Not your cohort", body = ErrorResponse),
        (status = 404, description = "Cohort not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "cohorts",
    security(
        ("cookie" = [])
    )
)]
pub async fn cohorts_calls_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<UpcomingQuery>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    visible_cohort(&state, user, id).await?;

    let calls = Call::all_by_cohort(state.pool(), user, id, query.upcoming)
        .await
        .map_err(db::<Call>)?;

    Ok((StatusCode::OK, Json(calls)))
}

#[utoipa::path(
    get,
    path = "/api/v1/cohorts/{id}/schedule",
    description = "Trainee event requests of a cohort, optionally filtered by status",
    params(
        ("id" = Uuid, Path, description = "ID of the cohort"),
        ScheduleStatusQuery,
    ),
    responses(
        (status = 200, description = "Events ordered by start", body = Vec<ScheduledEvent>),
        (status = 403, description = "Not your cohort", body = ErrorResponse),
        (status = 404, description = "Cohort not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "cohorts",
    security(
        ("cookie" = [])
    )
)]
pub async fn cohorts_schedule_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ScheduleStatusQuery>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let cohort = found(Cohort::find_by_id(state.pool(), user, id).await)?;
    require_cohort_staff(state.pool(), user, &cohort).await?;

    let events = ScheduledEvent::all_by_cohort(state.pool(), user, id, query.status)
        .await
        .map_err(db::<ScheduledEvent>)?;

    Ok((StatusCode::OK, Json(events)))
}
