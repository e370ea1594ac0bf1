use crate::e2e::helpers;

use futures::future::join_all;
use helpers::{
    generate_test_jwt, generate_test_jwt_expiring_in, new_user, provisioned_user, TestContext,
    JWT_SECRET,
};
use hyper::StatusCode;
use pretty_assertions::assert_eq;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_require_authentication(ctx: &TestContext) {
    let response = ctx.client.get("/api/points/balance").await.unwrap();
    response
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_error_message("Missing authorization header");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_token_signed_with_another_secret(ctx: &TestContext) {
    let token = generate_test_jwt("user-1", "some-other-secret");

    let response = ctx
        .client
        .get_with_auth("/api/points/balance", &token)
        .await
        .unwrap();

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_expired_token(ctx: &TestContext) {
    let token = generate_test_jwt_expiring_in("user-1", JWT_SECRET, chrono::Duration::hours(-2));

    let response = ctx
        .client
        .get_with_auth("/api/points/balance", &token)
        .await
        .unwrap();

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_provision_account_with_signup_bonus(ctx: &TestContext) {
    let (_, token) = new_user();

    let response = ctx
        .client
        .post_empty_with_auth("/api/points/account", &token)
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(response.bool_field("already_existed"), false);
    assert_eq!(response.i64_field("balance"), 100);

    let history = ctx
        .client
        .get_with_auth("/api/points/transactions", &token)
        .await
        .unwrap();
    history.assert_status(StatusCode::OK);

    let transactions = history.body.as_ref().unwrap()["transactions"]
        .as_array()
        .unwrap()
        .clone();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0]["kind"], "initial_bonus");
    assert_eq!(transactions[0]["amount"], 100);
    assert_eq!(transactions[0]["balance_after"], 100);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_not_pay_bonus_twice(ctx: &TestContext) {
    let (_, token) = provisioned_user(ctx).await;

    let response = ctx
        .client
        .post_empty_with_auth("/api/points/account", &token)
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(response.bool_field("already_existed"), true);
    assert_eq!(response.i64_field("balance"), 100);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_pay_one_bonus_for_concurrent_first_logins(ctx: &TestContext) {
    let (_, token) = new_user();

    let calls = (0..10).map(|_| {
        ctx.client
            .post_empty_with_auth("/api/points/account", &token)
    });
    let responses = join_all(calls).await;

    let first_time = responses
        .iter()
        .map(|r| r.as_ref().unwrap())
        .inspect(|r| {
            r.assert_status(StatusCode::OK);
        })
        .filter(|r| !r.bool_field("already_existed"))
        .count();
    assert_eq!(first_time, 1);

    let balance = ctx
        .client
        .get_with_auth("/api/points/balance", &token)
        .await
        .unwrap();
    assert_eq!(balance.i64_field("balance"), 100);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_not_found_balance_before_provisioning(ctx: &TestContext) {
    let (_, token) = new_user();

    let response = ctx
        .client
        .get_with_auth("/api/points/balance", &token)
        .await
        .unwrap();

    response.assert_status(StatusCode::NOT_FOUND);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_validate_history_limit(ctx: &TestContext) {
    let (_, token) = provisioned_user(ctx).await;

    for limit in ["0", "201", "-3"] {
        let response = ctx
            .client
            .get_with_auth(&format!("/api/points/transactions?limit={}", limit), &token)
            .await
            .unwrap();
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    let response = ctx
        .client
        .get_with_auth("/api/points/transactions?limit=200", &token)
        .await
        .unwrap();
    response.assert_status(StatusCode::OK);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_grant_daily_checkin_once(ctx: &TestContext) {
    let (_, token) = provisioned_user(ctx).await;

    let first = ctx
        .client
        .post_empty_with_auth("/api/points/checkin", &token)
        .await
        .unwrap();
    first.assert_status(StatusCode::OK);
    assert_eq!(first.i64_field("awarded"), 10);
    assert_eq!(first.i64_field("balance"), 110);
    assert!(!first.str_field("next_checkin_at").is_empty());

    let second = ctx
        .client
        .post_empty_with_auth("/api/points/checkin", &token)
        .await
        .unwrap();
    second
        .assert_status(StatusCode::CONFLICT)
        .assert_error_message("already claimed");

    let balance = ctx
        .client
        .get_with_auth("/api/points/balance", &token)
        .await
        .unwrap();
    assert_eq!(balance.i64_field("balance"), 110);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_require_account_for_checkin(ctx: &TestContext) {
    let (_, token) = new_user();

    let response = ctx
        .client
        .post_empty_with_auth("/api/points/checkin", &token)
        .await
        .unwrap();

    response.assert_status(StatusCode::NOT_FOUND);
}
