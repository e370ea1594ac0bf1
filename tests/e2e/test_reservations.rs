use crate::e2e::helpers;

use helpers::{generation_body, provisioned_user, TestContext, PIPELINE_TOKEN};
use hyper::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use test_context::test_context;
use uuid::Uuid;

async fn submit(ctx: &TestContext, token: &str, usetime: &str) -> String {
    let response = ctx
        .client
        .post_with_auth("/api/generations", &generation_body(usetime), token)
        .await
        .unwrap();
    response.assert_status(StatusCode::ACCEPTED);
    response.str_field("reservation_id")
}

fn settle_path(reservation_id: &str) -> String {
    format!("/internal/reservations/{}/settle", reservation_id)
}

async fn balance(ctx: &TestContext, token: &str) -> i64 {
    ctx.client
        .get_with_auth("/api/points/balance", token)
        .await
        .unwrap()
        .i64_field("balance")
}

async fn transaction_count(ctx: &TestContext, token: &str) -> usize {
    let history = ctx
        .client
        .get_with_auth("/api/points/transactions", token)
        .await
        .unwrap();
    history.body.as_ref().unwrap()["transactions"]
        .as_array()
        .unwrap()
        .len()
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_show_reservation_to_its_owner_only(ctx: &TestContext) {
    let (_, owner) = provisioned_user(ctx).await;
    let (_, stranger) = provisioned_user(ctx).await;
    let reservation_id = submit(ctx, &owner, "Under 5 minutes").await;
    let path = format!("/api/reservations/{}", reservation_id);

    let response = ctx.client.get_with_auth(&path, &owner).await.unwrap();
    response.assert_status(StatusCode::OK);
    assert_eq!(response.str_field("status"), "authorized");
    assert_eq!(response.i64_field("cost"), 20);

    let response = ctx.client.get_with_auth(&path, &stranger).await.unwrap();
    response.assert_status(StatusCode::NOT_FOUND);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_refund_failed_job_on_settlement(ctx: &TestContext) {
    let (_, token) = provisioned_user(ctx).await;
    let reservation_id = submit(ctx, &token, "Under 5 minutes").await;

    let response = ctx
        .client
        .post_with_auth(
            &settle_path(&reservation_id),
            &json!({ "succeeded": false }),
            PIPELINE_TOKEN,
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(response.str_field("status"), "released");
    assert_eq!(response.i64_field("refunded"), 20);
    assert_eq!(response.i64_field("balance"), 100);
    assert_eq!(response.bool_field("already_settled"), false);

    let reservation = ctx
        .client
        .get_with_auth(&format!("/api/reservations/{}", reservation_id), &token)
        .await
        .unwrap();
    assert_eq!(reservation.str_field("status"), "released");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_keep_debit_for_successful_job(ctx: &TestContext) {
    let (_, token) = provisioned_user(ctx).await;
    let reservation_id = submit(ctx, &token, "Under 5 minutes").await;

    let response = ctx
        .client
        .post_with_auth(
            &settle_path(&reservation_id),
            &json!({ "succeeded": true }),
            PIPELINE_TOKEN,
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(response.str_field("status"), "committed");
    assert_eq!(response.i64_field("refunded"), 0);
    assert_eq!(balance(ctx, &token).await, 80);
    assert_eq!(transaction_count(ctx, &token).await, 2);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_require_pipeline_token_to_settle(ctx: &TestContext) {
    let (_, token) = provisioned_user(ctx).await;
    let reservation_id = submit(ctx, &token, "Under 5 minutes").await;
    let body = json!({ "succeeded": false });

    ctx.client
        .post(&settle_path(&reservation_id), &body)
        .await
        .unwrap()
        .assert_status(StatusCode::UNAUTHORIZED);

    // A user's own JWT cannot trigger a refund
    ctx.client
        .post_with_auth(&settle_path(&reservation_id), &body, &token)
        .await
        .unwrap()
        .assert_status(StatusCode::UNAUTHORIZED);

    assert_eq!(balance(ctx, &token).await, 80);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_treat_repeated_settlement_as_no_op(ctx: &TestContext) {
    let (_, token) = provisioned_user(ctx).await;
    let reservation_id = submit(ctx, &token, "Under 5 minutes").await;
    let failed = json!({ "succeeded": false });

    for _ in 0..2 {
        ctx.client
            .post_with_auth(&settle_path(&reservation_id), &failed, PIPELINE_TOKEN)
            .await
            .unwrap()
            .assert_status(StatusCode::OK);
    }

    let conflicting = ctx
        .client
        .post_with_auth(
            &settle_path(&reservation_id),
            &json!({ "succeeded": true }),
            PIPELINE_TOKEN,
        )
        .await
        .unwrap();
    conflicting.assert_status(StatusCode::CONFLICT);

    assert_eq!(balance(ctx, &token).await, 100);
    assert_eq!(transaction_count(ctx, &token).await, 3);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_not_found_for_unknown_reservation(ctx: &TestContext) {
    let response = ctx
        .client
        .post_with_auth(
            &settle_path(&Uuid::new_v4().to_string()),
            &json!({ "succeeded": false }),
            PIPELINE_TOKEN,
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::NOT_FOUND);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_follow_failed_then_successful_generation(ctx: &TestContext) {
    let (_, token) = provisioned_user(ctx).await;
    assert_eq!(balance(ctx, &token).await, 100);
    assert_eq!(transaction_count(ctx, &token).await, 1);

    // 20 points, job fails
    let failed = submit(ctx, &token, "Under 5 minutes").await;
    assert_eq!(balance(ctx, &token).await, 80);
    ctx.client
        .post_with_auth(&settle_path(&failed), &json!({ "succeeded": false }), PIPELINE_TOKEN)
        .await
        .unwrap()
        .assert_status(StatusCode::OK);
    assert_eq!(balance(ctx, &token).await, 100);
    assert_eq!(transaction_count(ctx, &token).await, 3);

    // 40 points, job succeeds
    let succeeded = submit(ctx, &token, "20 minutes").await;
    ctx.client
        .post_with_auth(&settle_path(&succeeded), &json!({ "succeeded": true }), PIPELINE_TOKEN)
        .await
        .unwrap()
        .assert_status(StatusCode::OK);
    assert_eq!(balance(ctx, &token).await, 60);
    assert_eq!(transaction_count(ctx, &token).await, 4);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_bill_job_whose_dispatch_was_unconfirmed(ctx: &TestContext) {
    let (_, token) = provisioned_user(ctx).await;
    ctx.pipeline.drop_acknowledgements(true);

    let response = ctx
        .client
        .post_with_auth("/api/generations", &generation_body("Under 5 minutes"), &token)
        .await
        .unwrap();

    response.assert_status(StatusCode::ACCEPTED);
    assert_eq!(response.str_field("dispatch"), "unconfirmed");
    assert_eq!(ctx.pipeline.dispatched().len(), 1);
    assert_eq!(balance(ctx, &token).await, 80);

    let reservation_id = response.str_field("reservation_id");
    let reservation = ctx
        .client
        .get_with_auth(&format!("/api/reservations/{}", reservation_id), &token)
        .await
        .unwrap();
    assert_eq!(reservation.str_field("status"), "authorized");

    let settled = ctx
        .client
        .post_with_auth(
            &settle_path(&reservation_id),
            &json!({ "succeeded": true }),
            PIPELINE_TOKEN,
        )
        .await
        .unwrap();

    settled.assert_status(StatusCode::OK);
    assert_eq!(settled.str_field("status"), "committed");
    assert_eq!(balance(ctx, &token).await, 80);
    assert_eq!(transaction_count(ctx, &token).await, 2);
}
