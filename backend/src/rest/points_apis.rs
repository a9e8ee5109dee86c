//! Points endpoints: balance reads, the transaction log page, the
//! recalculation repair tool, and the consistency audit.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use shared::{AuthUser, RecalculateBalanceRequest, TransactionListResponse};
use tracing::info;

use super::{error_response, mappers, AppState};

/// Identity query parameters for GET endpoints. Who the caller is comes
/// from the auth collaborator in front of this service; handlers just
/// receive it.
#[derive(Deserialize, Debug)]
pub struct IdentityQuery {
    pub uid: String,
    pub email: String,
}

impl IdentityQuery {
    fn auth_user(&self) -> AuthUser {
        AuthUser::new(&self.uid, &self.email)
    }
}

#[derive(Deserialize, Debug)]
pub struct TransactionListQuery {
    pub uid: String,
    pub email: String,
    pub limit: Option<u32>,
}

/// GET /api/points/balance
pub async fn get_balance(
    State(state): State<AppState>,
    Query(query): Query<IdentityQuery>,
) -> impl IntoResponse {
    info!("GET /api/points/balance - uid: {}", query.uid);

    match state.points_service.get_or_create_balance(&query.auth_user()) {
        Ok(balance) => (StatusCode::OK, Json(mappers::to_wire_balance(balance))).into_response(),
        Err(e) => error_response("getting balance", e),
    }
}

/// GET /api/points/transactions
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionListQuery>,
) -> impl IntoResponse {
    info!(
        "GET /api/points/transactions - uid: {}, limit: {:?}",
        query.uid, query.limit
    );

    let user = AuthUser::new(&query.uid, &query.email);
    match state.points_service.list_transactions(&user, query.limit) {
        Ok(transactions) => {
            let response = TransactionListResponse {
                transactions: transactions
                    .into_iter()
                    .map(mappers::to_wire_transaction)
                    .collect(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response("listing transactions", e),
    }
}

/// POST /api/points/recalculate
pub async fn recalculate_balance(
    State(state): State<AppState>,
    Json(request): Json<RecalculateBalanceRequest>,
) -> impl IntoResponse {
    info!("POST /api/points/recalculate - uid: {}", request.uid);

    let user = AuthUser::new(&request.uid, &request.email);
    match state.points_service.recalculate_balance(&user) {
        Ok(balance) => (StatusCode::OK, Json(mappers::to_wire_balance(balance))).into_response(),
        Err(e) => error_response("recalculating balance", e),
    }
}

/// GET /api/points/audit
pub async fn audit_balance(
    State(state): State<AppState>,
    Query(query): Query<IdentityQuery>,
) -> impl IntoResponse {
    info!("GET /api/points/audit - uid: {}", query.uid);

    match state.audit_service.check_consistency(&query.auth_user()) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => error_response("auditing balance", e),
    }
}
