mod common;

use chrono::{Duration as ChronoDuration, Utc};
use parking_payment::error::AppError;
use parking_payment::models::{Caller, Role};
use parking_payment::services::{CreatePromocodeRequest, PromocodeService};
use std::sync::Arc;

fn admin() -> Caller {
    Caller::new(common::new_user_id(), Role::Admin)
}

#[tokio::test]
async fn test_generate_promocode_spends_exact_balance_then_fails() {
    let pool = common::setup_test_db().await;
    let service = PromocodeService::new(pool.clone());

    let user = common::new_user_id();
    common::seed_balance(&pool, &user, 500).await;

    let issued = service
        .generate_promocode(&user, 500)
        .await
        .expect("Failed to generate promocode");

    assert_eq!(issued.amount, 500);
    assert_eq!(issued.max_uses, 1);
    assert_eq!(issued.remaining_uses, 1);
    assert!(issued.expires_at.is_none());
    assert_eq!(issued.code.len(), 16);
    assert!(issued.code.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

    assert_eq!(common::balance_amount(&pool, &user).await, Some(0));
    assert_eq!(common::transaction_count(&pool, &user).await, 1);

    // The balance is drained; a second mint must be rejected.
    let err = service.generate_promocode(&user, 500).await.unwrap_err();
    match err {
        AppError::Validation(msg) => assert_eq!(msg, "insufficient funds"),
        other => panic!("Expected validation failure, got {:?}", other),
    }
    assert_eq!(common::balance_amount(&pool, &user).await, Some(0));
    assert_eq!(common::transaction_count(&pool, &user).await, 1);
}

#[tokio::test]
async fn test_activate_promocode_credits_balance_once() {
    let pool = common::setup_test_db().await;
    let service = PromocodeService::new(pool.clone());

    let issuer = common::new_user_id();
    common::seed_balance(&pool, &issuer, 750).await;
    let issued = service.generate_promocode(&issuer, 750).await.unwrap();

    let redeemer = common::new_user_id();
    let balance = service
        .activate_promocode(&redeemer, &issued.code)
        .await
        .expect("Failed to activate promocode");

    assert_eq!(balance.amount, 750);
    assert_eq!(balance.currency, "USD");
    assert_eq!(common::balance_amount(&pool, &redeemer).await, Some(750));
    assert_eq!(common::promocode_used_count(&pool, &issued.code).await, 1);

    // Single-use code: the second redemption fails on the usage cap.
    let another = common::new_user_id();
    let err = service
        .activate_promocode(&another, &issued.code)
        .await
        .unwrap_err();
    match err {
        AppError::Validation(msg) => assert_eq!(msg, "promocode has reached maximum uses"),
        other => panic!("Expected validation failure, got {:?}", other),
    }
    assert_eq!(common::balance_amount(&pool, &another).await, None);
}

#[tokio::test]
async fn test_activate_unknown_or_malformed_code() {
    let pool = common::setup_test_db().await;
    let service = PromocodeService::new(pool);

    let user = common::new_user_id();

    let err = service
        .activate_promocode(&user, "feedfacedeadbeef")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = service.activate_promocode(&user, "no spaces!").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(err.is_business());
}

#[tokio::test]
async fn test_activate_expired_code_fails_despite_remaining_uses() {
    let pool = common::setup_test_db().await;
    let service = PromocodeService::new(pool.clone());

    let issued = service
        .create_promocode(
            &admin(),
            CreatePromocodeRequest {
                amount: 300,
                max_uses: 5,
                code: None,
                expires_at: Some(Utc::now() - ChronoDuration::hours(1)),
            },
        )
        .await
        .unwrap();

    let user = common::new_user_id();
    let err = service.activate_promocode(&user, &issued.code).await.unwrap_err();
    match err {
        AppError::Validation(msg) => assert_eq!(msg, "promocode has expired"),
        other => panic!("Expected validation failure, got {:?}", other),
    }
    assert_eq!(common::promocode_used_count(&pool, &issued.code).await, 0);

    let info = service.get_promocode(&issued.code).await.unwrap();
    assert_eq!(info.remaining_uses, 5);
    assert!(!info.is_active);
}

#[tokio::test]
async fn test_create_promocode_requires_admin() {
    let pool = common::setup_test_db().await;
    let service = PromocodeService::new(pool);

    let request = CreatePromocodeRequest {
        amount: 100,
        max_uses: 1,
        code: None,
        expires_at: None,
    };

    for role in [Role::Driver, Role::Owner] {
        let caller = Caller::new(common::new_user_id(), role);
        let err = service
            .create_promocode(&caller, request.clone())
            .await
            .unwrap_err();
        match err {
            AppError::Forbidden(msg) => assert_eq!(msg, "admin access required"),
            other => panic!("Expected forbidden, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_create_promocode_validates_bounds() {
    let pool = common::setup_test_db().await;
    let service = PromocodeService::new(pool);
    let caller = admin();

    let err = service
        .create_promocode(
            &caller,
            CreatePromocodeRequest {
                amount: 0,
                max_uses: 1,
                code: None,
                expires_at: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = service
        .create_promocode(
            &caller,
            CreatePromocodeRequest {
                amount: 100,
                max_uses: 1_000_001,
                code: None,
                expires_at: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = service
        .create_promocode(
            &caller,
            CreatePromocodeRequest {
                amount: 100,
                max_uses: 1,
                code: Some("a!".to_string()),
                expires_at: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_create_promocode_custom_code_conflict() {
    let pool = common::setup_test_db().await;
    let service = PromocodeService::new(pool);
    let caller = admin();

    // Random suffix keeps the custom code unique across test runs.
    let custom = format!("WELCOME{}", &common::new_user_id()[..8].replace('-', ""));

    let issued = service
        .create_promocode(
            &caller,
            CreatePromocodeRequest {
                amount: 250,
                max_uses: 10,
                code: Some(custom.clone()),
                expires_at: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(issued.code, custom);
    assert_eq!(issued.remaining_uses, 10);

    let err = service
        .create_promocode(
            &caller,
            CreatePromocodeRequest {
                amount: 100,
                max_uses: 1,
                code: Some(custom),
                expires_at: None,
            },
        )
        .await
        .unwrap_err();
    match err {
        AppError::Conflict(msg) => assert_eq!(msg, "promocode already exists"),
        other => panic!("Expected conflict, got {:?}", other),
    }
}

#[tokio::test]
async fn test_create_get_activate_round_trip() {
    let pool = common::setup_test_db().await;
    let service = PromocodeService::new(pool.clone());

    let issued = service
        .create_promocode(
            &admin(),
            CreatePromocodeRequest {
                amount: 400,
                max_uses: 3,
                code: None,
                expires_at: None,
            },
        )
        .await
        .unwrap();

    let info = service.get_promocode(&issued.code).await.unwrap();
    assert_eq!(info.amount, 400);
    assert_eq!(info.max_uses, 3);
    assert_eq!(info.remaining_uses, 3);
    assert!(info.is_active);
    assert!(info.expires_at.is_none());

    for _ in 0..3 {
        let user = common::new_user_id();
        let balance = service.activate_promocode(&user, &issued.code).await.unwrap();
        assert_eq!(balance.amount, 400);
    }

    let info = service.get_promocode(&issued.code).await.unwrap();
    assert_eq!(info.used_count, 3);
    assert_eq!(info.remaining_uses, 0);
    assert!(!info.is_active);

    let late = common::new_user_id();
    let err = service.activate_promocode(&late, &issued.code).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_concurrent_activation_of_single_use_code() {
    let pool = common::setup_test_db().await;
    let service = Arc::new(PromocodeService::new(pool.clone()));

    let issued = service
        .create_promocode(
            &admin(),
            CreatePromocodeRequest {
                amount: 500,
                max_uses: 1,
                code: None,
                expires_at: None,
            },
        )
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = Arc::clone(&service);
        let code = issued.code.clone();
        let user = common::new_user_id();
        handles.push(tokio::spawn(async move {
            service.activate_promocode(&user, &code).await
        }));
    }

    let mut successes = 0;
    for handle in futures::future::join_all(handles).await {
        match handle.expect("Task panicked") {
            Ok(_) => successes += 1,
            Err(err) => assert!(err.is_business(), "unexpected error: {:?}", err),
        }
    }

    // The row lock serializes redemptions: exactly one wins the single use.
    assert_eq!(successes, 1);
    assert_eq!(common::promocode_used_count(&pool, &issued.code).await, 1);
}

#[tokio::test]
async fn test_get_promocode_unknown_is_not_found() {
    let pool = common::setup_test_db().await;
    let service = PromocodeService::new(pool);

    let err = service.get_promocode("0123456789abcdef").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
