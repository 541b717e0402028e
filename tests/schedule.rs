use axum::http::StatusCode;
use serde_json::json;

use crate::common::{
    Action, Flow, seed_cohort, setup_server, setup_test_db, signup_action, stored_id,
    switch_user_action,
};

mod common;

fn request_action(title: &'static str) -> Action {
    Action::new("request_event", "POST", "/api/v1/schedule/")
        .with_dyn_body(move |ctx| {
            json!({
                "cohort_id": stored_id(ctx, "cohort"),
                "title": title,
                "notes": "need help with lifetimes",
                "starts_at": "2099-03-01T15:00:00Z",
                "ends_at": "2099-03-01T16:00:00Z",
            })
        })
        .with_expect(StatusCode::CREATED)
}

fn decide_action(key: &'static str, status: &'static str) -> Action {
    Action::new("decide_event", "PUT", "dynamic")
        .with_dyn_path(move |ctx| format!("/api/v1/schedule/{}/decision", stored_id(ctx, key)))
        .with_body(json!({ "status": status }))
}

fn cancel_action(key: &'static str) -> Action {
    Action::new("cancel_event", "POST", "dynamic")
        .with_dyn_path(move |ctx| format!("/api/v1/schedule/{}/cancel", stored_id(ctx, key)))
}

#[tokio::test]
async fn route_schedule_decision_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    seed_cohort(Flow::new())
        .step(switch_user_action("trainee1", "trainee1"))
        .step(
            Action::new("request_backwards", "POST", "/api/v1/schedule/")
                .with_dyn_body(|ctx| {
                    json!({
                        "cohort_id": stored_id(ctx, "cohort"),
                        "title": "Pairing",
                        "starts_at": "2099-03-01T16:00:00Z",
                        "ends_at": "2099-03-01T15:00:00Z",
                    })
                })
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| assert!(body.contains("ends_at"))),
        )
        .step(
            request_action("Pairing session")
                .with_save_as("event")
                .assert_body(|body| assert!(body.contains("PENDING"))),
        )
        .step(decide_action("event", "APPROVED").with_expect(StatusCode::FORBIDDEN))
        .step(switch_user_action("mentor1", "mentor1"))
        .step(
            Action::new("pending_requests", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/cohorts/{}/schedule", stored_id(ctx, "cohort")))
                .with_param("status", "PENDING")
                .assert_body(|body| assert!(body.contains("Pairing session"))),
        )
        .step(decide_action("event", "CANCELLED").with_expect(StatusCode::BAD_REQUEST))
        .step(
            decide_action("event", "APPROVED")
                .assert_body(|body| assert!(body.contains("APPROVED"))),
        )
        .step(decide_action("event", "REJECTED").with_expect(StatusCode::CONFLICT))
        .step(
            Action::new("no_pending_left", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/cohorts/{}/schedule", stored_id(ctx, "cohort")))
                .with_param("status", "PENDING")
                .assert_body(|body| assert_eq!(body, "[]")),
        )
        .step(switch_user_action("trainee1", "trainee1"))
        .step(cancel_action("event").with_expect(StatusCode::CONFLICT))
        .step(
            Action::new("my_events", "GET", "/api/v1/schedule/mine")
                .assert_body(|body| assert!(body.contains("APPROVED"))),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_schedule_cancel_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    seed_cohort(Flow::new())
        .step(switch_user_action("trainee1", "trainee1"))
        .step(request_action("Mock interview").with_save_as("event"))
        .step(signup_action("stranger", "stranger").with_clear_cookies(true))
        .step(request_action("Not my cohort").with_expect(StatusCode::FORBIDDEN))
        .step(cancel_action("event").with_expect(StatusCode::FORBIDDEN))
        .step(switch_user_action("trainee1", "trainee1"))
        .step(cancel_action("event").assert_body(|body| assert!(body.contains("CANCELLED"))))
        .step(cancel_action("event").with_expect(StatusCode::CONFLICT))
        .step(switch_user_action("mentor1", "mentor1"))
        .step(decide_action("event", "APPROVED").with_expect(StatusCode::CONFLICT))
        .run(&mut server, pool)
        .await;
}
