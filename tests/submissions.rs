use academy::model::entity::{Submission, SubmissionCreate, SubmissionStatus};
use academy::model::{DbConnection, ModelManager};
use academy::web::AuthenticatedUser;
use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use crate::common::{
    Action, Flow, seed_cohort, setup_server, setup_test_db, signup_action, stored_id,
    switch_user_action,
};

mod common;

fn submit_action(content: &'static str) -> Action {
    Action::new("submit", "POST", "/api/v1/submissions/")
        .with_dyn_body(move |ctx| {
            json!({
                "assignment_id": stored_id(ctx, "assignment"),
                "content": content,
            })
        })
        .with_expect(StatusCode::CREATED)
}

fn review_action(status: &'static str, comment: Option<&'static str>) -> Action {
    Action::new("review", "PUT", "dynamic")
        .with_dyn_path(|ctx| format!("/api/v1/submissions/{}/review", stored_id(ctx, "submission")))
        .with_body(json!({ "status": status, "comment": comment }))
}

#[tokio::test]
async fn route_submission_review_cycle_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    seed_cohort(Flow::new())
        .step(switch_user_action("trainee1", "trainee1"))
        .step(
            Action::new("submit_empty", "POST", "/api/v1/submissions/")
                .with_dyn_body(|ctx| json!({ "assignment_id": stored_id(ctx, "assignment"), "content": "" }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            submit_action("https://git.example.com/list")
                .with_save_as("submission")
                .assert_body(|body| assert!(body.contains("PENDING"))),
        )
        .step(submit_action("second try").with_expect(StatusCode::CONFLICT))
        .step(
            review_action("APPROVED", None).with_expect(StatusCode::FORBIDDEN),
        )
        .step(switch_user_action("mentor1", "mentor1"))
        .step(
            Action::new("assignment_submissions", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/assignments/{}/submissions", stored_id(ctx, "assignment"))
                })
                .assert_body(|body| assert!(body.contains("https://git.example.com/list"))),
        )
        .step(review_action("PENDING", None).with_expect(StatusCode::BAD_REQUEST))
        .step(
            review_action("RESUBMIT_REQUESTED", Some("Handle the empty list"))
                .with_save_as("review")
                .assert_body(|body| {
                    let value: serde_json::Value = serde_json::from_str(body).unwrap();
                    assert_eq!(value["submission"]["status"], "RESUBMIT_REQUESTED");
                    assert_eq!(value["feedback"]["comment"], "Handle the empty list");
                }),
        )
        .step(
            Action::new("edit_feedback", "PUT", "dynamic")
                .with_dyn_path(|ctx| {
                    let id = ctx.get("review")["feedback"]["id"].as_str().unwrap().to_string();
                    format!("/api/v1/feedback/{id}")
                })
                .with_body(json!({ "comment": "Handle the empty list, please" }))
                .assert_body(|body| assert!(body.contains("please"))),
        )
        .step(switch_user_action("trainee1", "trainee1"))
        .step(
            Action::new("read_feedback", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/submissions/{}/feedback", stored_id(ctx, "submission")))
                .assert_body(|body| {
                    let value: serde_json::Value = serde_json::from_str(body).unwrap();
                    assert_eq!(value.as_array().unwrap().len(), 1);
                    assert_eq!(value[0]["comment"], "Handle the empty list, please");
                }),
        )
        .step(
            Action::new("trainee_cant_comment", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/submissions/{}/feedback", stored_id(ctx, "submission")))
                .with_body(json!({ "comment": "I disagree" }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            submit_action("fixed version")
                .assert_body(|body| {
                    assert!(body.contains("PENDING"));
                    assert!(body.contains("fixed version"));
                }),
        )
        .step(switch_user_action("mentor1", "mentor1"))
        .step(review_action("APPROVED", None).assert_body(|body| {
            assert!(body.contains("APPROVED"));
            assert!(!body.contains("feedback"));
        }))
        .step(
            Action::new("add_feedback", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/submissions/{}/feedback", stored_id(ctx, "submission")))
                .with_body(json!({ "comment": "Nice work" }))
                .with_expect(StatusCode::CREATED),
        )
        .step(switch_user_action("trainee1", "trainee1"))
        .step(submit_action("after approval").with_expect(StatusCode::CONFLICT))
        .step(
            Action::new("my_submissions", "GET", "/api/v1/submissions/mine")
                .assert_body(|body| assert!(body.contains("APPROVED"))),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_submission_requires_enrollment_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    seed_cohort(Flow::new())
        .step(signup_action("stranger", "stranger").with_clear_cookies(true))
        .step(submit_action("not enrolled").with_expect(StatusCode::FORBIDDEN))
        .step(switch_user_action("trainee1", "trainee1"))
        .step(submit_action("mine").with_save_as("submission"))
        .step(switch_user_action("stranger", "stranger"))
        .step(
            Action::new("peek_submission", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/submissions/{}", stored_id(ctx, "submission")))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn resubmit_loses_to_concurrent_review_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    let ctx = seed_cohort(Flow::new())
        .step(switch_user_action("trainee1", "trainee1"))
        .step(submit_action("first draft").with_save_as("submission"))
        .step(switch_user_action("mentor1", "mentor1"))
        .step(review_action("REJECTED", None))
        .execute(&mut server)
        .await;

    let mm = ModelManager::new(DbConnection::from_pool(pool.pool().clone()));
    let admin = AuthenticatedUser::admin();
    let id: Uuid = stored_id(&ctx, "submission").parse().unwrap();
    let assignment_id: Uuid = stored_id(&ctx, "assignment").parse().unwrap();

    // The trainee read the submission while it was still REJECTED.
    let stale = Submission::find_by_id(&mm, &admin, id).await.unwrap().unwrap();
    assert_eq!(stale.status(), SubmissionStatus::Rejected);

    // A reviewer approves it before the resubmission lands.
    let (approved, feedback) = stale
        .clone()
        .review(&mm, &admin, SubmissionStatus::Approved, None)
        .await
        .unwrap();
    assert_eq!(approved.status(), SubmissionStatus::Approved);
    assert!(feedback.is_none());

    let resubmitted = stale
        .resubmit(
            &mm,
            &admin,
            SubmissionCreate {
                assignment_id,
                content: "second draft".to_string(),
                attachment_url: None,
            },
        )
        .await
        .unwrap();
    assert!(resubmitted.is_none());

    let current = Submission::find_by_id(&mm, &admin, id).await.unwrap().unwrap();
    assert_eq!(current.status(), SubmissionStatus::Approved);
    assert_eq!(current.attempt(), 1);

    Flow::new()
        .step(switch_user_action("trainee1", "trainee1"))
        .step(submit_action("second draft").with_expect(StatusCode::CONFLICT))
        .run(&mut server, pool)
        .await;
}
