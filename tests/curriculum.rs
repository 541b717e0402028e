use axum::http::StatusCode;
use serde_json::json;

use crate::common::{
    Action, Flow, seed_cohort, seed_curriculum, setup_server, setup_test_db, signin_admin_action,
    signup_action, stored_id, switch_user_action,
};

mod common;

#[tokio::test]
async fn route_program_crud_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    let flow = Flow::new().step(signin_admin_action());
    seed_curriculum(flow)
        .step(
            Action::new("create_program_empty_title", "POST", "/api/v1/programs/")
                .with_body(json!({ "title": "", "description": "nothing" }))
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| {
                    let value: serde_json::Value = serde_json::from_str(body).unwrap();
                    assert!(value["fields"]["title"].is_array());
                }),
        )
        .step(
            Action::new("update_program", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/programs/{}", stored_id(ctx, "program")))
                .with_body(json!({ "title": "Backend bootcamp 2", "description": "Rust services" }))
                .assert_body(|body| assert!(body.contains("Backend bootcamp 2"))),
        )
        .step(
            Action::new("list_programs", "GET", "/api/v1/programs/")
                .with_param("limit", "10")
                .assert_body(|body| assert!(body.contains("Backend bootcamp 2"))),
        )
        .step(
            Action::new("program_courses", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/programs/{}/courses", stored_id(ctx, "program")))
                .assert_body(|body| assert!(body.contains("Basics"))),
        )
        .step(
            Action::new("outline_admin", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/programs/{}/outline", stored_id(ctx, "program")))
                .assert_body(|body| {
                    let value: serde_json::Value = serde_json::from_str(body).unwrap();
                    let module = &value["courses"][0]["modules"][0];
                    assert_eq!(module["title"], "Ownership");
                    assert_eq!(module["lessons"].as_array().unwrap().len(), 2);
                    assert_eq!(module["assignments"].as_array().unwrap().len(), 1);
                    // staff see everything unlocked
                    assert_eq!(module["lessons"][1]["unlocked"], true);
                }),
        )
        .step(
            Action::new("create_course_unknown_program", "POST", "/api/v1/courses/")
                .with_body(json!({
                    "program_id": "00000000-0000-0000-0000-000000000000",
                    "title": "Orphan",
                }))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("delete_program", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/programs/{}", stored_id(ctx, "program"))),
        )
        .step(
            Action::new("lesson_gone_with_program", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/lessons/{}", stored_id(ctx, "lesson1")))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_curriculum_requires_admin_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("outsider", "outsider"))
        .step(
            Action::new("create_program_as_trainee", "POST", "/api/v1/programs/")
                .with_body(json!({ "title": "Mine", "description": "" }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_outline_membership_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    seed_cohort(Flow::new())
        .step(
            signup_action("outsider", "outsider")
                .with_clear_cookies(true),
        )
        .step(
            Action::new("outline_outsider", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/programs/{}/outline", stored_id(ctx, "program")))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(switch_user_action("trainee1", "trainee1"))
        .step(
            Action::new("outline_trainee", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/programs/{}/outline", stored_id(ctx, "program")))
                .assert_body(|body| {
                    let value: serde_json::Value = serde_json::from_str(body).unwrap();
                    let module = &value["courses"][0]["modules"][0];
                    assert_eq!(module["unlocked"], true);
                    assert_eq!(module["lessons"][0]["unlocked"], true);
                    assert_eq!(module["lessons"][1]["unlocked"], false);
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_lesson_unlocking_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    seed_cohort(Flow::new())
        .step(switch_user_action("trainee1", "trainee1"))
        .step(
            Action::new("open_first_lesson", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/lessons/{}", stored_id(ctx, "lesson1")))
                .assert_body(|body| {
                    assert!(body.contains("# Moves"));
                    assert!(body.contains("first_opened_at"));
                }),
        )
        .step(
            Action::new("second_lesson_locked", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/lessons/{}", stored_id(ctx, "lesson2")))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("done_locked_lesson", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/lessons/{}/done", stored_id(ctx, "lesson2")))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("finish_first_lesson", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/lessons/{}/done", stored_id(ctx, "lesson1")))
                .assert_body(|body| assert!(body.contains("completed_at"))),
        )
        .step(
            Action::new("finish_first_lesson_again", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/lessons/{}/done", stored_id(ctx, "lesson1"))),
        )
        .step(
            Action::new("second_lesson_open", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/lessons/{}", stored_id(ctx, "lesson2")))
                .assert_body(|body| assert!(body.contains("# Borrows"))),
        )
        .step(
            Action::new("progress", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/progress/programs/{}", stored_id(ctx, "program")))
                .assert_body(|body| {
                    let value: serde_json::Value = serde_json::from_str(body).unwrap();
                    assert_eq!(value["total_lessons"], 2);
                    assert_eq!(value["completed_lessons"], 1);
                    assert_eq!(value["total_assignments"], 1);
                    assert_eq!(value["approved_assignments"], 0);
                    assert_eq!(value["percent"], 33);
                    assert_eq!(value["complete"], false);
                }),
        )
        .step(switch_user_action("mentor1", "mentor1"))
        .step(
            Action::new("mentor_reads_trainee_progress", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/progress/programs/{}?trainee_id={}",
                        stored_id(ctx, "program"),
                        stored_id(ctx, "trainee")
                    )
                })
                .assert_body(|body| assert!(body.contains("\"completed_lessons\":1"))),
        )
        .run(&mut server, pool)
        .await;
}
