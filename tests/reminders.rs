use academy::Config;
use academy::model::{DbConnection, ModelManager};
use academy::workers::{ReminderWorker, SweepReport};
use axum::http::StatusCode;
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::{Action, Flow, seed_cohort, setup_server, setup_test_db, stored_id};

mod common;

async fn risk_columns(pool: &PgPool, enrollment_id: Uuid) -> (bool, Option<DateTime<Utc>>) {
    sqlx::query_as("SELECT at_risk, reminded_at FROM enrollments WHERE id = $1")
        .bind(enrollment_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn reminder_sweep_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    // Due on the first day of a cohort that started in 2025.
    let ctx = seed_cohort(Flow::new())
        .step(
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
        .execute(&mut server)
        .await;

    let enrollment_id: Uuid = stored_id(&ctx, "enrollment").parse().unwrap();
    assert_eq!(risk_columns(pool.pool(), enrollment_id).await, (false, None));

    let mm = ModelManager::new(DbConnection::from_pool(pool.pool().clone()));
    let worker = ReminderWorker::new(mm, Config::get_or_init(true).await.reminders());

    let now = Utc::now();
    let report = worker.sweep(now).await.unwrap();
    assert_eq!(
        report,
        SweepReport {
            checked: 1,
            at_risk: 1,
            reminded: 1,
        }
    );

    let (at_risk, reminded_at) = risk_columns(pool.pool(), enrollment_id).await;
    assert!(at_risk);
    let reminded_at = reminded_at.expect("reminded_at is stamped");
    assert!((reminded_at - now).num_milliseconds().abs() < 1);

    // Still at risk an hour later, but the last reminder is too recent.
    let report = worker.sweep(now + Duration::hours(1)).await.unwrap();
    assert_eq!(report.at_risk, 1);
    assert_eq!(report.reminded, 0);
    assert_eq!(
        risk_columns(pool.pool(), enrollment_id).await,
        (true, Some(reminded_at))
    );

    // remind_every_hours = 24
    let later = now + Duration::hours(25);
    let report = worker.sweep(later).await.unwrap();
    assert_eq!(report.reminded, 1);
    let (_, reminded_again) = risk_columns(pool.pool(), enrollment_id).await;
    assert!(reminded_again.is_some_and(|at| at > reminded_at));
}

#[tokio::test]
async fn reminder_sweep_skips_dropped_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    let ctx = seed_cohort(Flow::new())
        .step(
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
        .step(
            Action::new("drop_trainee", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/enrollments/{}/status", stored_id(ctx, "enrollment")))
                .with_body(json!({ "status": "DROPPED" })),
        )
        .execute(&mut server)
        .await;

    let enrollment_id: Uuid = stored_id(&ctx, "enrollment").parse().unwrap();
    let mm = ModelManager::new(DbConnection::from_pool(pool.pool().clone()));
    let worker = ReminderWorker::new(mm, Config::get_or_init(true).await.reminders());

    let report = worker.sweep(Utc::now()).await.unwrap();
    assert_eq!(report, SweepReport::default());
    assert_eq!(risk_columns(pool.pool(), enrollment_id).await, (false, None));
}
