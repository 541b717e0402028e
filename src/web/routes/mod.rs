use crate::{
    Config,
    model::{
        DatabaseError, DatabaseResult, ModelManager, ResourceTyped,
        entity::{Cohort, Program},
    },
    web::{AppState, AuthenticatedUser, WebError, WebResult, doc::ApiDoc, dto::uploads::STATIC_PREFIX},
};
use axum::Router;
use serde::Deserialize;
use tower_cookies::CookieManagerLayer;
use tower_http::{cors::CorsLayer, services::ServeDir};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

pub mod assignments;
pub mod calls;
pub mod certificates;
pub mod cohorts;
pub mod courses;
pub mod enrollments;
pub mod feedback;
pub mod lessons;
pub mod modules;
pub mod programs;
pub mod progress;
pub mod schedule;
pub mod submissions;
pub mod uploads;
pub mod user;

const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationQuery {
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
}

fn default_limit() -> i64 {
    20
}

impl PaginationQuery {
    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        self.offset.max(0)
    }
}

pub fn build_app<S: Send + Sync + Clone + 'static>(
    state: AppState,
    config: &'static Config,
) -> Router<S> {
    let mut router = Router::new()
        .nest("/api/v1/account/", user::routes(state.clone()))
        .nest("/api/v1/programs/", programs::routes(state.clone()))
        .nest("/api/v1/courses/", courses::routes(state.clone()))
        .nest("/api/v1/modules/", modules::routes(state.clone()))
        .nest("/api/v1/lessons/", lessons::routes(state.clone()))
        .nest("/api/v1/assignments/", assignments::routes(state.clone()))
        .nest("/api/v1/progress/", progress::routes(state.clone()))
        .nest("/api/v1/cohorts/", cohorts::routes(state.clone()))
        .nest("/api/v1/enrollments/", enrollments::routes(state.clone()))
        .nest("/api/v1/submissions/", submissions::routes(state.clone()))
        .nest("/api/v1/feedback/", feedback::routes(state.clone()))
        .nest("/api/v1/calls/", calls::routes(state.clone()))
        .nest("/api/v1/schedule/", schedule::routes(state.clone()))
        .nest("/api/v1/certificates/", certificates::routes(state.clone()))
        .nest("/api/v1/uploads/", uploads::routes(state.clone(), config))
        .nest_service(STATIC_PREFIX, ServeDir::new(state.uploads_dir()))
        .layer(CookieManagerLayer::default())
        .layer(CorsLayer::very_permissive())
        .with_state(state);

    if config.app().docs() {
        let openapi = ApiDoc::openapi();

        router = router.merge(SwaggerUi::new("/api/v1/docs").url("/api-doc/openapi.json", openapi));
    }

    router
}

// Shared handler helpers

/// Maps a repository failure for resource `T` into a response error.
pub(crate) fn db<T: ResourceTyped>(error: DatabaseError) -> WebError {
    WebError::from_database(T::get_resource_type(), error)
}

/// Unwraps a lookup, turning an absent row into 404.
pub(crate) fn found<T: ResourceTyped>(result: DatabaseResult<Option<T>>) -> WebResult<T> {
    result
        .map_err(db::<T>)?
        .ok_or_else(|| WebError::resource_not_found(T::get_resource_type()))
}

/// Staff pass, trainees must be enrolled in a cohort of the program.
pub(crate) async fn require_program_member(
    mm: &ModelManager,
    user: &AuthenticatedUser,
    program_id: Uuid,
) -> WebResult<()> {
    if user.is_staff() {
        return Ok(());
    }

    let member = Program::is_member(mm, program_id, user.user_id())
        .await
        .map_err(db::<Program>)?;

    if member {
        Ok(())
    } else {
        Err(WebError::resource_forbidden(Program::get_resource_type()))
    }
}

/// Admins and the mentor running the cohort.
pub(crate) async fn require_cohort_staff(
    mm: &ModelManager,
    user: &AuthenticatedUser,
    cohort: &Cohort,
) -> WebResult<()> {
    user.require_staff(Cohort::get_resource_type())?;
    crate::model::check_access(mm, user, cohort, user.user_id())
        .await
        .map_err(db::<Cohort>)
}

/// Admins, the mentor of one of the trainee's cohorts, or the trainee.
pub(crate) async fn require_trainee_visibility<T: ResourceTyped>(
    mm: &ModelManager,
    user: &AuthenticatedUser,
    trainee_id: Uuid,
) -> WebResult<()> {
    if user.is_admin() || user.user_id() == trainee_id {
        return Ok(());
    }

    if user.is_staff() {
        let mentors = Cohort::mentors_trainee(mm, user.user_id(), trainee_id)
            .await
            .map_err(db::<Cohort>)?;
        if mentors {
            return Ok(());
        }
    }

    Err(WebError::resource_forbidden(T::get_resource_type()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn page_size_is_clamped() {
        let q: PaginationQuery = serde_json::from_str(r#"{"limit": 5000, "offset": -3}"#).unwrap();
        assert_eq!(q.limit(), MAX_PAGE_SIZE);
        assert_eq!(q.offset(), 0);

        let q: PaginationQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.limit(), 20);
    }
}
