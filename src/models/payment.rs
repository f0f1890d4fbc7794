use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

/// Durable record of one captured charge. One-to-one with a paid booking;
/// immutable once written except for `is_commission_paid`.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PaymentRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub booking_id: ObjectId,
    pub client_id: ObjectId,
    pub partner_id: Option<ObjectId>,
    /// Centimes, exactly as the amount crossed the payment boundary.
    pub amount_minor: i64,
    pub currency: String,
    pub method: String,
    /// Payment network's reference for the captured charge.
    pub transaction_ref: String,
    pub captured_at: DateTime,
    pub is_commission_paid: bool,
}

/// 10/90 division of one captured payment between the platform and the
/// operating partner. Derived at reporting time, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommissionRecord {
    pub total_minor: i64,
    pub commission_minor: i64,
    pub partner_minor: i64,
}

impl CommissionRecord {
    pub fn total_mad(&self) -> f64 {
        self.total_minor as f64 / 100.0
    }

    pub fn commission_mad(&self) -> f64 {
        self.commission_minor as f64 / 100.0
    }

    pub fn partner_mad(&self) -> f64 {
        self.partner_minor as f64 / 100.0
    }
}

/// One payment's split, as shown on the admin reconciliation report.
#[derive(Debug, Clone, Serialize)]
pub struct CommissionEntry {
    pub payment_id: ObjectId,
    pub booking_id: ObjectId,
    pub partner_id: Option<ObjectId>,
    pub total_minor: i64,
    pub commission_minor: i64,
    pub partner_minor: i64,
    pub total_mad: f64,
    pub commission_mad: f64,
    pub partner_mad: f64,
    pub is_commission_paid: bool,
    pub captured_at: DateTime,
}

/// Aggregate payout position for one partner. `partner_id` None groups the
/// platform-run offerings.
#[derive(Debug, Clone, Serialize)]
pub struct PartnerPayout {
    pub partner_id: Option<ObjectId>,
    pub payments: u32,
    pub total_minor: i64,
    pub commission_minor: i64,
    pub partner_minor: i64,
    /// Partner share of payments not yet marked as paid out.
    pub unpaid_minor: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommissionReport {
    pub entries: Vec<CommissionEntry>,
    pub partners: Vec<PartnerPayout>,
}
