//! Domain-to-wire conversions.
//!
//! Wire DTOs carry RFC 3339 strings where the domain uses `DateTime<Utc>`,
//! and the two sides keep separate enum types so a storage-format change
//! can never leak into API responses unnoticed.

use crate::domain::models::coupon::{Coupon, CouponSnapshot, UserCoupon, UserCouponStatus};
use crate::domain::models::points::{PointsBalance, PointsTransaction, TransactionKind};

pub fn to_wire_balance(balance: PointsBalance) -> shared::PointsBalance {
    shared::PointsBalance {
        uid: balance.uid,
        email: balance.email,
        breakdown: shared::PointsBreakdown {
            registration: balance.breakdown.registration,
            phone: balance.breakdown.phone,
            pet: balance.breakdown.pet,
            share: balance.breakdown.share,
        },
        total_points: balance.total_points,
        last_updated: balance.last_updated.to_rfc3339(),
    }
}

pub fn to_wire_kind(kind: TransactionKind) -> shared::TransactionKind {
    match kind {
        TransactionKind::Registration => shared::TransactionKind::Registration,
        TransactionKind::PhoneVerification => shared::TransactionKind::PhoneVerification,
        TransactionKind::PetCreation => shared::TransactionKind::PetCreation,
        TransactionKind::AppShare => shared::TransactionKind::AppShare,
        TransactionKind::PetShare => shared::TransactionKind::PetShare,
        TransactionKind::AdminAdjustment => shared::TransactionKind::AdminAdjustment,
        TransactionKind::PrizeClaim => shared::TransactionKind::PrizeClaim,
    }
}

pub fn to_wire_transaction(transaction: PointsTransaction) -> shared::PointsTransaction {
    shared::PointsTransaction {
        id: transaction.id,
        user_id: transaction.user_id,
        kind: to_wire_kind(transaction.kind),
        points: transaction.points,
        description: transaction.description,
        metadata: transaction.metadata,
        created_at: transaction.created_at.to_rfc3339(),
    }
}

pub fn to_wire_coupon(coupon: Coupon) -> shared::Coupon {
    shared::Coupon {
        id: coupon.id,
        name: coupon.name,
        description: coupon.description,
        price: coupon.price,
        points: coupon.points,
        image_url: coupon.image_url,
        valid_from: coupon.valid_from.to_rfc3339(),
        valid_to: coupon.valid_to.to_rfc3339(),
        is_active: coupon.is_active,
        business_ids: coupon.business_ids,
    }
}

pub fn to_wire_snapshot(snapshot: CouponSnapshot) -> shared::CouponSnapshot {
    shared::CouponSnapshot {
        id: snapshot.id,
        name: snapshot.name,
        description: snapshot.description,
        price: snapshot.price,
        points: snapshot.points,
        image_url: snapshot.image_url,
        valid_from: snapshot.valid_from.to_rfc3339(),
        valid_to: snapshot.valid_to.to_rfc3339(),
    }
}

pub fn to_wire_status(status: UserCouponStatus) -> shared::UserCouponStatus {
    match status {
        UserCouponStatus::Active => shared::UserCouponStatus::Active,
        UserCouponStatus::Used => shared::UserCouponStatus::Used,
        UserCouponStatus::Expired => shared::UserCouponStatus::Expired,
    }
}

pub fn to_wire_user_coupon(user_coupon: UserCoupon) -> shared::UserCoupon {
    shared::UserCoupon {
        id: user_coupon.id,
        user_id: user_coupon.user_id,
        coupon_id: user_coupon.coupon_id,
        coupon_code: user_coupon.coupon_code,
        coupon: to_wire_snapshot(user_coupon.coupon),
        purchased_at: user_coupon.purchased_at.to_rfc3339(),
        status: to_wire_status(user_coupon.status),
        points_deducted: user_coupon.points_deducted,
        used_at: user_coupon.used_at.map(|t| t.to_rfc3339()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::points::{JsonMetadata, PointsBreakdown};
    use chrono::Utc;

    #[test]
    fn test_balance_timestamps_become_rfc3339_strings() {
        let now = Utc::now();
        let balance = PointsBalance {
            uid: "user-1".to_string(),
            email: "user@example.com".to_string(),
            breakdown: PointsBreakdown {
                registration: 30,
                phone: 10,
                pet: 0,
                share: 5,
            },
            total_points: 45,
            last_updated: now,
        };

        let wire = to_wire_balance(balance);
        assert_eq!(wire.last_updated, now.to_rfc3339());
        assert_eq!(wire.breakdown.phone, 10);
        assert_eq!(wire.total_points, 45);
    }

    #[test]
    fn test_transaction_kind_round_trips_through_wire_names() {
        let transaction = PointsTransaction {
            id: "ptx-1".to_string(),
            user_id: "user-1".to_string(),
            kind: TransactionKind::PrizeClaim,
            points: -50,
            description: "Coupon purchase".to_string(),
            metadata: JsonMetadata::new(),
            created_at: Utc::now(),
        };

        let wire = to_wire_transaction(transaction);
        assert_eq!(wire.kind, shared::TransactionKind::PrizeClaim);
        assert_eq!(
            serde_json::to_value(wire.kind).unwrap(),
            serde_json::json!("prize_claim")
        );
    }
}
