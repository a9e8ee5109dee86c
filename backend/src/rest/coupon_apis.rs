//! Coupon endpoints: catalog listing, the purchase workflow, the user's
//! active/history listings, and lifecycle transitions.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use shared::{
    AuthUser, CouponListResponse, ExpireCouponRequest, MarkCouponUsedRequest,
    PurchaseCouponRequest, PurchaseCouponResponse, UserCouponListResponse,
};
use tracing::info;

use super::points_apis::IdentityQuery;
use super::{error_response, mappers, AppState};

/// GET /api/coupons
pub async fn list_available_coupons(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/coupons");

    match state.coupon_service.list_available_coupons() {
        Ok(coupons) => {
            let response = CouponListResponse {
                coupons: coupons.into_iter().map(mappers::to_wire_coupon).collect(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response("listing coupons", e),
    }
}

/// POST /api/coupons/purchase
pub async fn purchase_coupon(
    State(state): State<AppState>,
    Json(request): Json<PurchaseCouponRequest>,
) -> impl IntoResponse {
    info!(
        "POST /api/coupons/purchase - uid: {}, coupon: {}",
        request.uid, request.coupon_id
    );

    let user = AuthUser::new(&request.uid, &request.email);
    match state.coupon_service.purchase_coupon(&user, &request.coupon_id) {
        Ok(user_coupon) => {
            let response = PurchaseCouponResponse {
                points_deducted: user_coupon.points_deducted,
                user_coupon: mappers::to_wire_user_coupon(user_coupon),
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => error_response("purchasing coupon", e),
    }
}

/// GET /api/coupons/mine
pub async fn list_active_coupons(
    State(state): State<AppState>,
    Query(query): Query<IdentityQuery>,
) -> impl IntoResponse {
    info!("GET /api/coupons/mine - uid: {}", query.uid);

    let user = AuthUser::new(&query.uid, &query.email);
    match state.coupon_service.list_active_coupons(&user) {
        Ok(user_coupons) => (StatusCode::OK, Json(to_list_response(user_coupons))).into_response(),
        Err(e) => error_response("listing active coupons", e),
    }
}

/// GET /api/coupons/history
pub async fn list_coupon_history(
    State(state): State<AppState>,
    Query(query): Query<IdentityQuery>,
) -> impl IntoResponse {
    info!("GET /api/coupons/history - uid: {}", query.uid);

    let user = AuthUser::new(&query.uid, &query.email);
    match state.coupon_service.list_coupon_history(&user) {
        Ok(user_coupons) => (StatusCode::OK, Json(to_list_response(user_coupons))).into_response(),
        Err(e) => error_response("listing coupon history", e),
    }
}

/// POST /api/coupons/:id/use
pub async fn mark_coupon_used(
    State(state): State<AppState>,
    Path(user_coupon_id): Path<String>,
    Json(request): Json<MarkCouponUsedRequest>,
) -> impl IntoResponse {
    info!(
        "POST /api/coupons/{}/use - uid: {}",
        user_coupon_id, request.uid
    );

    let user = AuthUser::new(&request.uid, &request.email);
    match state
        .coupon_service
        .mark_as_used(&user, &user_coupon_id, request.metadata)
    {
        Ok(user_coupon) => {
            (StatusCode::OK, Json(mappers::to_wire_user_coupon(user_coupon))).into_response()
        }
        Err(e) => error_response("marking coupon used", e),
    }
}

/// POST /api/coupons/:id/expire
pub async fn mark_coupon_expired(
    State(state): State<AppState>,
    Path(user_coupon_id): Path<String>,
    Json(request): Json<ExpireCouponRequest>,
) -> impl IntoResponse {
    info!(
        "POST /api/coupons/{}/expire - uid: {}",
        user_coupon_id, request.uid
    );

    let user = AuthUser::new(&request.uid, &request.email);
    match state.coupon_service.mark_as_expired(&user, &user_coupon_id) {
        Ok(user_coupon) => {
            (StatusCode::OK, Json(mappers::to_wire_user_coupon(user_coupon))).into_response()
        }
        Err(e) => error_response("expiring coupon", e),
    }
}

fn to_list_response(
    user_coupons: Vec<crate::domain::models::coupon::UserCoupon>,
) -> UserCouponListResponse {
    UserCouponListResponse {
        user_coupons: user_coupons
            .into_iter()
            .map(mappers::to_wire_user_coupon)
            .collect(),
    }
}
