use std::collections::HashMap;
use std::sync::Arc;

use bson::oid::ObjectId;

use crate::db::store::{BookingStore, StoreError};
use crate::models::payment::{CommissionEntry, CommissionRecord, CommissionReport, PartnerPayout};

/// Platform take, as a percentage of the captured total.
pub const COMMISSION_PERCENT: i64 = 10;

pub struct CommissionSplitter;

impl CommissionSplitter {
    /// Split a captured total into platform commission and partner share.
    /// Works entirely in minor units: the commission is rounded half-up to
    /// the centime and the partner receives the remainder, so the two parts
    /// always rebuild the exact total.
    pub fn split(total_minor: i64) -> CommissionRecord {
        let commission_minor = (total_minor * COMMISSION_PERCENT + 50) / 100;
        CommissionRecord {
            total_minor,
            commission_minor,
            partner_minor: total_minor - commission_minor,
        }
    }
}

/// Read side of the settlement ledger: per-payment splits and per-partner
/// payout positions, recomputed from the payment records on every call.
pub struct CommissionService {
    store: Arc<dyn BookingStore>,
}

impl CommissionService {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    pub async fn report(&self) -> Result<CommissionReport, StoreError> {
        let payments = self.store.list_payments().await?;

        let mut entries = Vec::with_capacity(payments.len());
        let mut by_partner: HashMap<Option<ObjectId>, PartnerPayout> = HashMap::new();

        for payment in payments {
            let split = CommissionSplitter::split(payment.amount_minor);
            entries.push(CommissionEntry {
                payment_id: payment.id.unwrap_or_default(),
                booking_id: payment.booking_id,
                partner_id: payment.partner_id,
                total_minor: split.total_minor,
                commission_minor: split.commission_minor,
                partner_minor: split.partner_minor,
                total_mad: split.total_mad(),
                commission_mad: split.commission_mad(),
                partner_mad: split.partner_mad(),
                is_commission_paid: payment.is_commission_paid,
                captured_at: payment.captured_at,
            });

            let payout = by_partner
                .entry(payment.partner_id)
                .or_insert_with(|| PartnerPayout {
                    partner_id: payment.partner_id,
                    payments: 0,
                    total_minor: 0,
                    commission_minor: 0,
                    partner_minor: 0,
                    unpaid_minor: 0,
                });
            payout.payments += 1;
            payout.total_minor += split.total_minor;
            payout.commission_minor += split.commission_minor;
            payout.partner_minor += split.partner_minor;
            if !payment.is_commission_paid {
                payout.unpaid_minor += split.partner_minor;
            }
        }

        entries.sort_by_key(|e| (e.captured_at, e.payment_id));
        let mut partners: Vec<PartnerPayout> = by_partner.into_values().collect();
        partners.sort_by_key(|p| p.partner_id);

        Ok(CommissionReport { entries, partners })
    }

    /// Flag one payment's partner share as settled. Returns false when no
    /// such payment exists.
    pub async fn mark_partner_paid(&self, payment_id: &ObjectId) -> Result<bool, StoreError> {
        self.store.mark_commission_paid(payment_id).await
    }
}
