//! # REST Module
//!
//! HTTP surface over the domain services. Thin by design: handlers parse
//! the request, call one service method, and map the result. Who the caller
//! is arrives explicitly in each request (uid/email) from the auth
//! collaborator fronting this service; no session state lives here.
//!
//! Error mapping: business-rule violations return 422 with the specific
//! message, missing resources 404, infrastructure failures a generic 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use shared::ErrorResponse;
use tracing::error;

use crate::domain::{AuditService, CouponService, LedgerError, PointsService};
use crate::storage::CsvConnection;

pub mod coupon_apis;
pub mod mappers;
pub mod points_apis;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub points_service: PointsService,
    pub coupon_service: CouponService,
    pub audit_service: AuditService,
}

impl AppState {
    pub fn new(connection: CsvConnection) -> Self {
        Self {
            points_service: PointsService::new(connection.clone()),
            coupon_service: CouponService::new(connection.clone()),
            audit_service: AuditService::new(connection),
        }
    }
}

/// Build the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/points/balance", get(points_apis::get_balance))
        .route(
            "/api/points/transactions",
            get(points_apis::list_transactions),
        )
        .route(
            "/api/points/recalculate",
            post(points_apis::recalculate_balance),
        )
        .route("/api/points/audit", get(points_apis::audit_balance))
        .route("/api/coupons", get(coupon_apis::list_available_coupons))
        .route("/api/coupons/purchase", post(coupon_apis::purchase_coupon))
        .route("/api/coupons/mine", get(coupon_apis::list_active_coupons))
        .route(
            "/api/coupons/history",
            get(coupon_apis::list_coupon_history),
        )
        .route("/api/coupons/:id/use", post(coupon_apis::mark_coupon_used))
        .route(
            "/api/coupons/:id/expire",
            post(coupon_apis::mark_coupon_expired),
        )
        .with_state(state)
}

/// Map a domain error to a response. `context` names the failed operation
/// for the server-side log; clients only ever see the generic message for
/// infrastructure failures.
pub(crate) fn error_response(context: &str, err: LedgerError) -> Response {
    let status = match &err {
        LedgerError::CouponNotFound(_) | LedgerError::UserCouponNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        e if e.is_business_rule() => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let body = if err.is_business_rule() {
        ErrorResponse::new(err.to_string())
    } else {
        error!("Error {}: {:?}", context, err);
        ErrorResponse::new("Internal server error")
    };

    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::csv::CouponCatalogRepository;
    use crate::storage::CouponCatalogStorage;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn setup() -> (AppState, CsvConnection, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let connection = CsvConnection::new(temp_dir.path()).expect("Failed to create connection");
        (AppState::new(connection.clone()), connection, temp_dir)
    }

    fn seed_coupon(connection: &CsvConnection, id: &str, points: i64) {
        let now = Utc::now();
        let coupon = crate::domain::models::coupon::Coupon {
            id: id.to_string(),
            name: format!("Coupon {}", id),
            description: format!("CODE-{}", id),
            price: 10.0,
            points,
            image_url: None,
            valid_from: now - Duration::days(1),
            valid_to: now + Duration::days(30),
            is_active: true,
            business_ids: vec![],
        };
        CouponCatalogRepository::new(connection.clone())
            .store_coupon(&coupon)
            .unwrap();
    }

    #[tokio::test]
    async fn test_get_balance_creates_and_returns_default() {
        let (state, _connection, _temp_dir) = setup();
        let app = create_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/points/balance?uid=user-1&email=user@example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_purchase_insufficient_points_returns_422() {
        let (state, connection, _temp_dir) = setup();
        seed_coupon(&connection, "c1", 500);
        let app = create_router(state);

        let body = serde_json::json!({
            "uid": "user-1",
            "email": "user@example.com",
            "coupon_id": "c1",
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/coupons/purchase")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_purchase_unknown_coupon_returns_404() {
        let (state, _connection, _temp_dir) = setup();
        let app = create_router(state);

        let body = serde_json::json!({
            "uid": "user-1",
            "email": "user@example.com",
            "coupon_id": "missing",
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/coupons/purchase")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_catalog_listing_is_public() {
        let (state, connection, _temp_dir) = setup();
        seed_coupon(&connection, "c1", 10);
        let app = create_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/coupons")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_error_response_hides_infrastructure_detail() {
        let err = LedgerError::Storage(anyhow::anyhow!("csv file corrupted at row 7"));
        let response = error_response("testing", err);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
