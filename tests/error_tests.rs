// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use skill_tracker::error::AppError;

#[test]
fn test_is_auth_error_matches() {
    assert!(AppError::Unauthorized.is_auth_error());

    let err = AppError::Backend(AppError::SESSION_EXPIRED.to_string());
    assert!(err.is_auth_error());

    let err = AppError::Backend("JWT expired".to_string());
    assert!(err.is_auth_error());

    let err = AppError::Backend("Refresh token has Expired".to_string());
    assert!(err.is_auth_error());
}

#[test]
fn test_is_auth_error_no_match() {
    let err = AppError::Backend(AppError::BACKEND_RATE_LIMIT.to_string());
    assert!(!err.is_auth_error());

    let err = AppError::Backend("HTTP 500: Internal Server Error".to_string());
    assert!(!err.is_auth_error());

    let err = AppError::BadRequest("Bad Request".to_string());
    assert!(!err.is_auth_error());
}

#[test]
fn test_status_codes() {
    let cases = [
        (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
        (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
        (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
        (AppError::PlanLimit("x".into()), StatusCode::FORBIDDEN),
        (AppError::Backend("x".into()), StatusCode::BAD_GATEWAY),
        (AppError::Database("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        (
            AppError::Internal(anyhow::anyhow!("x")),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (err, status) in cases {
        let label = err.to_string();
        assert_eq!(err.into_response().status(), status, "{}", label);
    }
}

#[tokio::test]
async fn test_internal_details_are_not_exposed() {
    let response = AppError::Database("password=hunter2".to_string()).into_response();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["error"], "database_error");
    assert!(body.get("details").is_none());
}
