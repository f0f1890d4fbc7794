use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::models::offering::ServiceCategory;
use crate::models::reservation::ReservationParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum BookingStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "confirmed")]
    Confirmed,
    #[serde(rename = "cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum PaymentStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "paid")]
    Paid,
    #[serde(rename = "failed")]
    Failed,
    #[serde(rename = "refunded")]
    Refunded,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

/// Contact details captured at booking time. A later profile edit must not
/// rewrite what the reservation was made under.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ContactSnapshot {
    pub full_name: String,
    pub email: String,
    pub phone: String,
}

/// The durable reservation record. Created `pending/pending`, moved to
/// `confirmed/paid` only once payment capture succeeds, and never deleted:
/// cancellation is a status transition, not an erasure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Booking {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Human-facing confirmation code, e.g. "BK-7Q2M9XKD".
    pub reference: String,
    pub category: ServiceCategory,
    pub offering_id: ObjectId,
    pub client_id: ObjectId,
    /// Operator of the booked offering; None for platform-run offerings.
    pub partner_id: Option<ObjectId>,
    pub contact: ContactSnapshot,
    pub params: ReservationParams,
    pub special_requests: Option<String>,
    /// MAD, computed server-side from the offering at booking time.
    pub total_price: f64,
    pub booking_status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}
