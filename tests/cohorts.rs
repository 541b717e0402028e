use axum::http::StatusCode;
use serde_json::json;

use crate::common::{
    Action, Flow, seed_cohort, setup_server, setup_test_db, signin_admin_action, signup_action,
    stored_id, switch_user_action,
};

mod common;

#[tokio::test]
async fn route_cohort_enrollment_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    seed_cohort(Flow::new())
        .step(
            Action::new("enroll_twice", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/cohorts/{}/enrollments", stored_id(ctx, "cohort")))
                .with_dyn_body(|ctx| json!({ "trainee_id": stored_id(ctx, "trainee") }))
                .with_expect(StatusCode::CONFLICT),
        )
        .step(
            Action::new("enroll_mentor", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/cohorts/{}/enrollments", stored_id(ctx, "cohort")))
                .with_dyn_body(|ctx| json!({ "trainee_id": stored_id(ctx, "mentor") }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("cohort_with_trainee_as_mentor", "POST", "/api/v1/cohorts/")
                .with_dyn_body(|ctx| {
                    json!({
                        "program_id": stored_id(ctx, "program"),
                        "mentor_id": stored_id(ctx, "trainee"),
                        "name": "Autumn 2025",
                        "start_date": "2025-09-01",
                        "end_date": "2025-12-31",
                    })
                })
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("cohort_ends_before_start", "POST", "/api/v1/cohorts/")
                .with_dyn_body(|ctx| {
                    json!({
                        "program_id": stored_id(ctx, "program"),
                        "mentor_id": stored_id(ctx, "mentor"),
                        "name": "Backwards",
                        "start_date": "2025-09-01",
                        "end_date": "2025-08-01",
                    })
                })
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(switch_user_action("mentor1", "mentor1"))
        .step(
            Action::new("mentor_lists_enrollments", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/cohorts/{}/enrollments", stored_id(ctx, "cohort")))
                .assert_body(|body| {
                    let value: serde_json::Value = serde_json::from_str(body).unwrap();
                    assert_eq!(value.as_array().unwrap().len(), 1);
                    assert_eq!(value[0]["status"], "ACTIVE");
                }),
        )
        .step(
            Action::new("mentor_drops_trainee", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/enrollments/{}/status", stored_id(ctx, "enrollment")))
                .with_body(json!({ "status": "DROPPED" }))
                .assert_body(|body| assert!(body.contains("DROPPED"))),
        )
        .step(
            Action::new("mentor_cant_delete_enrollment", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/enrollments/{}", stored_id(ctx, "enrollment")))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(switch_user_action("trainee1", "trainee1"))
        .step(
            Action::new("trainee_sees_own_cohort", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/cohorts/{}", stored_id(ctx, "cohort")))
                .assert_body(|body| assert!(body.contains("Spring 2025"))),
        )
        .step(
            Action::new("trainee_cant_change_status", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/enrollments/{}/status", stored_id(ctx, "enrollment")))
                .with_body(json!({ "status": "ACTIVE" }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(signin_admin_action())
        .step(
            Action::new("admin_deletes_enrollment", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/enrollments/{}", stored_id(ctx, "enrollment"))),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_cohort_visibility_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    seed_cohort(Flow::new())
        .step(
            signup_action("other_mentor", "other_mentor")
                .with_save_cookies(false)
                .with_save_as("other_mentor"),
        )
        .step(
            Action::new("promote_other_mentor", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/account/{}/role", stored_id(ctx, "other_mentor")))
                .with_body(json!({ "role": "mentor" })),
        )
        .step(switch_user_action("other_mentor", "other_mentor"))
        .step(
            Action::new("foreign_mentor_cohort", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/cohorts/{}", stored_id(ctx, "cohort")))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("foreign_mentor_at_risk", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/cohorts/{}/at-risk", stored_id(ctx, "cohort")))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            signup_action("stranger", "stranger").with_clear_cookies(true),
        )
        .step(
            Action::new("stranger_cohort", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/cohorts/{}", stored_id(ctx, "cohort")))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_cohort_at_risk_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    seed_cohort(Flow::new())
        .step(
            // due the day after the cohort started, long gone
            Action::new("create_dated_assignment", "POST", "/api/v1/assignments/")
                .with_dyn_body(|ctx| {
                    json!({
                        "module_id": stored_id(ctx, "module"),
                        "title": "Day one homework",
                        "due_offset_days": 0,
                    })
                })
                .with_expect(StatusCode::CREATED),
        )
        .step(switch_user_action("mentor1", "mentor1"))
        .step(
            Action::new("at_risk_board", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/cohorts/{}/at-risk", stored_id(ctx, "cohort")))
                .assert_body(|body| {
                    let value: serde_json::Value = serde_json::from_str(body).unwrap();
                    let entries = value.as_array().unwrap();
                    assert_eq!(entries.len(), 1);
                    assert_eq!(entries[0]["username"], "trainee1");
                    assert_eq!(entries[0]["at_risk"], true);
                    assert_eq!(entries[0]["reasons"][0]["kind"], "overdue_assignments");
                    assert_eq!(entries[0]["reasons"][0]["count"], 1);
                    assert_eq!(entries[0]["progress"]["total_assignments"], 2);
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_calls_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    seed_cohort(Flow::new())
        .step(switch_user_action("mentor1", "mentor1"))
        .step(
            Action::new("call_too_short", "POST", "/api/v1/calls/")
                .with_dyn_body(|ctx| {
                    json!({
                        "cohort_id": stored_id(ctx, "cohort"),
                        "title": "Standup",
                        "starts_at": "2099-01-01T10:00:00Z",
                        "duration_minutes": 1,
                    })
                })
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("schedule_call", "POST", "/api/v1/calls/")
                .with_dyn_body(|ctx| {
                    json!({
                        "cohort_id": stored_id(ctx, "cohort"),
                        "title": "Weekly sync",
                        "starts_at": "2099-01-01T10:00:00Z",
                        "duration_minutes": 60,
                        "meeting_url": "https://meet.example.com/sync",
                    })
                })
                .with_expect(StatusCode::CREATED)
                .with_save_as("call"),
        )
        .step(
            Action::new("schedule_past_call", "POST", "/api/v1/calls/")
                .with_dyn_body(|ctx| {
                    json!({
                        "cohort_id": stored_id(ctx, "cohort"),
                        "title": "Kickoff",
                        "starts_at": "2025-01-01T10:00:00Z",
                        "duration_minutes": 30,
                    })
                })
                .with_expect(StatusCode::CREATED),
        )
        .step(
            Action::new("reschedule_call", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/calls/{}", stored_id(ctx, "call")))
                .with_dyn_body(|ctx| {
                    json!({
                        "cohort_id": stored_id(ctx, "cohort"),
                        "title": "Weekly sync",
                        "starts_at": "2099-01-02T10:00:00Z",
                        "duration_minutes": 45,
                    })
                })
                .assert_body(|body| assert!(body.contains("2099-01-02"))),
        )
        .step(
            Action::new("move_call_to_other_cohort", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/calls/{}", stored_id(ctx, "call")))
                .with_body(json!({
                    "cohort_id": "00000000-0000-0000-0000-000000000000",
                    "title": "Weekly sync",
                    "starts_at": "2099-01-02T10:00:00Z",
                    "duration_minutes": 45,
                }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("my_calls", "GET", "/api/v1/calls/")
                .assert_body(|body| {
                    assert!(body.contains("Weekly sync"));
                    assert!(body.contains("Kickoff"));
                }),
        )
        .step(switch_user_action("trainee1", "trainee1"))
        .step(
            Action::new("trainee_upcoming_calls", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/cohorts/{}/calls", stored_id(ctx, "cohort")))
                .with_param("upcoming", "true")
                .assert_body(|body| {
                    assert!(body.contains("Weekly sync"));
                    assert!(!body.contains("Kickoff"));
                }),
        )
        .step(
            Action::new("trainee_cant_cancel_call", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/calls/{}", stored_id(ctx, "call")))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(switch_user_action("mentor1", "mentor1"))
        .step(
            Action::new("cancel_call", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/calls/{}", stored_id(ctx, "call"))),
        )
        .run(&mut server, pool)
        .await;
}
