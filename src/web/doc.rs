use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::web::middlewares::AUTH_TOKEN;

pub struct CookieAuthModifier;

impl Modify for CookieAuthModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(schema) = openapi.components.as_mut() {
            schema.add_security_scheme(
                "cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    AUTH_TOKEN,
                    "JWT token for current user",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "academy", description = "Cohort-based training programs"),
    paths(
        crate::web::routes::assignments::assignments_create_handler,
        crate::web::routes::assignments::assignments_get_handler,
        crate::web::routes::assignments::assignments_update_handler,
        crate::web::routes::assignments::assignments_delete_handler,
        crate::web::routes::assignments::assignments_submissions_handler,
        crate::web::routes::calls::calls_list_handler,
        crate::web::routes::calls::calls_create_handler,
        crate::web::routes::calls::calls_update_handler,
        crate::web::routes::calls::calls_delete_handler,
        crate::web::routes::certificates::certificates_issue_handler,
        crate::web::routes::certificates::certificates_mine_handler,
        crate::web::routes::certificates::certificates_verify_handler,
        crate::web::routes::cohorts::cohorts_list_handler,
        crate::web::routes::cohorts::cohorts_create_handler,
        crate::web::routes::cohorts::cohorts_get_handler,
        crate::web::routes::cohorts::cohorts_update_handler,
        crate::web::routes::cohorts::cohorts_delete_handler,
        crate::web::routes::cohorts::cohorts_enroll_handler,
        crate::web::routes::cohorts::cohorts_enrollments_handler,
        crate::web::routes::cohorts::cohorts_at_risk_handler,
        crate::web::routes::cohorts::cohorts_calls_handler,
        crate::web::routes::cohorts::cohorts_schedule_handler,
        crate::web::routes::courses::courses_create_handler,
        crate::web::routes::courses::courses_get_handler,
        crate::web::routes::courses::courses_update_handler,
        crate::web::routes::courses::courses_delete_handler,
        crate::web::routes::courses::courses_modules_handler,
        crate::web::routes::enrollments::enrollments_status_handler,
        crate::web::routes::enrollments::enrollments_delete_handler,
        crate::web::routes::feedback::feedback_update_handler,
        crate::web::routes::feedback::feedback_delete_handler,
        crate::web::routes::lessons::lessons_create_handler,
        crate::web::routes::lessons::lessons_get_handler,
        crate::web::routes::lessons::lessons_update_handler,
        crate::web::routes::lessons::lessons_delete_handler,
        crate::web::routes::lessons::lessons_mark_done_handler,
        crate::web::routes::modules::modules_create_handler,
        crate::web::routes::modules::modules_get_handler,
        crate::web::routes::modules::modules_update_handler,
        crate::web::routes::modules::modules_delete_handler,
        crate::web::routes::modules::modules_lessons_handler,
        crate::web::routes::modules::modules_assignments_handler,
        crate::web::routes::programs::programs_list_handler,
        crate::web::routes::programs::programs_create_handler,
        crate::web::routes::programs::programs_get_handler,
        crate::web::routes::programs::programs_update_handler,
        crate::web::routes::programs::programs_delete_handler,
        crate::web::routes::programs::programs_outline_handler,
        crate::web::routes::programs::programs_courses_handler,
        crate::web::routes::progress::progress_program_handler,
        crate::web::routes::schedule::schedule_request_handler,
        crate::web::routes::schedule::schedule_mine_handler,
        crate::web::routes::schedule::schedule_decision_handler,
        crate::web::routes::schedule::schedule_cancel_handler,
        crate::web::routes::submissions::submissions_submit_handler,
        crate::web::routes::submissions::submissions_mine_handler,
        crate::web::routes::submissions::submissions_get_handler,
        crate::web::routes::submissions::submissions_review_handler,
        crate::web::routes::submissions::submissions_feedback_list_handler,
        crate::web::routes::submissions::submissions_feedback_create_handler,
        crate::web::routes::uploads::uploads_create_handler,
        crate::web::routes::user::user_signup_handler,
        crate::web::routes::user::user_signin_handler,
        crate::web::routes::user::user_signout_handler,
        crate::web::routes::user::user_me_handler,
        crate::web::routes::user::user_list_handler,
        crate::web::routes::user::user_update_handler,
        crate::web::routes::user::user_role_handler,
        crate::web::routes::user::user_delete_handler,
    ),
    tags(
        (name = "account", description = "Sign-up, sessions and user management"),
        (name = "programs", description = "Programs and their outline"),
        (name = "courses"),
        (name = "modules"),
        (name = "lessons", description = "Lesson content and completion"),
        (name = "assignments"),
        (name = "progress"),
        (name = "cohorts", description = "Cohorts, enrollments and the at-risk board"),
        (name = "enrollments"),
        (name = "submissions", description = "Assignment submissions and review"),
        (name = "feedback"),
        (name = "calls"),
        (name = "schedule", description = "Trainee event requests"),
        (name = "certificates"),
        (name = "uploads"),
    ),
    modifiers(&CookieAuthModifier),
)]
pub struct ApiDoc;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn every_route_group_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/account/signup",
            "/api/v1/programs/{id}/outline",
            "/api/v1/cohorts/{id}/at-risk",
            "/api/v1/submissions/{id}/review",
            "/api/v1/certificates/verify/{code}",
            "/api/v1/uploads/",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("cookie"));
    }
}
