use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures::TryStreamExt;
use mongodb::{Client, Collection};

use crate::models::booking::{Booking, BookingStatus, PaymentStatus};
use crate::models::offering::{ServiceCategory, ServiceOffering};
use crate::models::payment::PaymentRecord;

#[derive(Debug)]
pub struct StoreError(pub String);

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Store error: {}", self.0)
    }
}

impl std::error::Error for StoreError {}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError(err.to_string())
    }
}

/// Persistence seam for the booking flow. Every write the orchestrator
/// performs goes through here, so tests can swap in the in-memory backend
/// and fault-inject the steps around a capture.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Which backend is serving requests, for the health endpoint.
    fn backend_name(&self) -> &'static str;

    /// Cheap reachability probe.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn find_offering(&self, id: &ObjectId) -> Result<Option<ServiceOffering>, StoreError>;
    async fn list_offerings(
        &self,
        category: Option<ServiceCategory>,
    ) -> Result<Vec<ServiceOffering>, StoreError>;

    async fn insert_booking(&self, booking: &Booking) -> Result<ObjectId, StoreError>;
    async fn find_booking(&self, id: &ObjectId) -> Result<Option<Booking>, StoreError>;
    async fn bookings_for_client(&self, client_id: &ObjectId) -> Result<Vec<Booking>, StoreError>;

    /// Flip both status fields in one write. Errors when the booking no
    /// longer exists, which callers must treat as a reconciliation problem
    /// if money has already moved.
    async fn set_booking_outcome(
        &self,
        id: &ObjectId,
        booking_status: BookingStatus,
        payment_status: PaymentStatus,
    ) -> Result<(), StoreError>;

    async fn insert_payment(&self, payment: &PaymentRecord) -> Result<ObjectId, StoreError>;
    async fn find_payment(&self, id: &ObjectId) -> Result<Option<PaymentRecord>, StoreError>;
    async fn list_payments(&self) -> Result<Vec<PaymentRecord>, StoreError>;

    /// Returns whether a payment record was matched.
    async fn mark_commission_paid(&self, payment_id: &ObjectId) -> Result<bool, StoreError>;
}

pub const DB_NAME: &str = "Marketplace";

pub struct MongoBookingStore {
    client: Arc<Client>,
}

impl MongoBookingStore {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    fn offerings(&self) -> Collection<ServiceOffering> {
        self.client.database(DB_NAME).collection("Offerings")
    }

    fn bookings(&self) -> Collection<Booking> {
        self.client.database(DB_NAME).collection("Bookings")
    }

    fn payments(&self) -> Collection<PaymentRecord> {
        self.client.database(DB_NAME).collection("Payments")
    }
}

#[async_trait]
impl BookingStore for MongoBookingStore {
    fn backend_name(&self) -> &'static str {
        "mongodb"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.client
            .database(DB_NAME)
            .run_command(doc! {"ping": 1})
            .await?;
        Ok(())
    }

    async fn find_offering(&self, id: &ObjectId) -> Result<Option<ServiceOffering>, StoreError> {
        Ok(self.offerings().find_one(doc! {"_id": id}).await?)
    }

    async fn list_offerings(
        &self,
        category: Option<ServiceCategory>,
    ) -> Result<Vec<ServiceOffering>, StoreError> {
        let filter = match category {
            Some(category) => doc! {"category": category.as_str()},
            None => doc! {},
        };
        let cursor = self.offerings().find(filter).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<ObjectId, StoreError> {
        let result = self.bookings().insert_one(booking).await?;
        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| StoreError("Inserted booking came back without an ObjectId".to_string()))
    }

    async fn find_booking(&self, id: &ObjectId) -> Result<Option<Booking>, StoreError> {
        Ok(self.bookings().find_one(doc! {"_id": id}).await?)
    }

    async fn bookings_for_client(&self, client_id: &ObjectId) -> Result<Vec<Booking>, StoreError> {
        let cursor = self.bookings().find(doc! {"client_id": client_id}).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn set_booking_outcome(
        &self,
        id: &ObjectId,
        booking_status: BookingStatus,
        payment_status: PaymentStatus,
    ) -> Result<(), StoreError> {
        let update = doc! {
            "$set": {
                "booking_status": booking_status.as_str(),
                "payment_status": payment_status.as_str(),
                "updated_at": bson::DateTime::now(),
            }
        };
        let result = self.bookings().update_one(doc! {"_id": id}, update).await?;
        if result.matched_count == 0 {
            return Err(StoreError(format!("Booking {} not found for status update", id)));
        }
        Ok(())
    }

    async fn insert_payment(&self, payment: &PaymentRecord) -> Result<ObjectId, StoreError> {
        let result = self.payments().insert_one(payment).await?;
        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| StoreError("Inserted payment came back without an ObjectId".to_string()))
    }

    async fn find_payment(&self, id: &ObjectId) -> Result<Option<PaymentRecord>, StoreError> {
        Ok(self.payments().find_one(doc! {"_id": id}).await?)
    }

    async fn list_payments(&self) -> Result<Vec<PaymentRecord>, StoreError> {
        let cursor = self.payments().find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn mark_commission_paid(&self, payment_id: &ObjectId) -> Result<bool, StoreError> {
        let result = self
            .payments()
            .update_one(
                doc! {"_id": payment_id},
                doc! {"$set": {"is_commission_paid": true}},
            )
            .await?;
        Ok(result.matched_count > 0)
    }
}

/// Hash-map backend used by the local dev server and the integration tests.
/// The two fault switches make the writes around a capture fail on demand.
#[derive(Default)]
pub struct MemoryBookingStore {
    offerings: Mutex<HashMap<ObjectId, ServiceOffering>>,
    bookings: Mutex<HashMap<ObjectId, Booking>>,
    payments: Mutex<HashMap<ObjectId, PaymentRecord>>,
    fail_inserts: AtomicBool,
    fail_outcome_updates: AtomicBool,
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_offering(&self, mut offering: ServiceOffering) -> ObjectId {
        let id = offering.id.unwrap_or_else(ObjectId::new);
        offering.id = Some(id);
        self.offerings.lock().unwrap().insert(id, offering);
        id
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_outcome_updates(&self, fail: bool) {
        self.fail_outcome_updates.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl BookingStore for MemoryBookingStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_offering(&self, id: &ObjectId) -> Result<Option<ServiceOffering>, StoreError> {
        Ok(self.offerings.lock().unwrap().get(id).cloned())
    }

    async fn list_offerings(
        &self,
        category: Option<ServiceCategory>,
    ) -> Result<Vec<ServiceOffering>, StoreError> {
        let offerings = self.offerings.lock().unwrap();
        let mut matched: Vec<ServiceOffering> = offerings
            .values()
            .filter(|o| category.map_or(true, |c| o.category == c))
            .cloned()
            .collect();
        matched.sort_by_key(|o| o.id);
        Ok(matched)
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<ObjectId, StoreError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError("Insert rejected by fault switch".to_string()));
        }
        let id = booking.id.unwrap_or_else(ObjectId::new);
        let mut stored = booking.clone();
        stored.id = Some(id);
        self.bookings.lock().unwrap().insert(id, stored);
        Ok(id)
    }

    async fn find_booking(&self, id: &ObjectId) -> Result<Option<Booking>, StoreError> {
        Ok(self.bookings.lock().unwrap().get(id).cloned())
    }

    async fn bookings_for_client(&self, client_id: &ObjectId) -> Result<Vec<Booking>, StoreError> {
        let bookings = self.bookings.lock().unwrap();
        let mut matched: Vec<Booking> = bookings
            .values()
            .filter(|b| b.client_id == *client_id)
            .cloned()
            .collect();
        matched.sort_by_key(|b| b.id);
        Ok(matched)
    }

    async fn set_booking_outcome(
        &self,
        id: &ObjectId,
        booking_status: BookingStatus,
        payment_status: PaymentStatus,
    ) -> Result<(), StoreError> {
        if self.fail_outcome_updates.load(Ordering::SeqCst) {
            return Err(StoreError("Update rejected by fault switch".to_string()));
        }
        let mut bookings = self.bookings.lock().unwrap();
        match bookings.get_mut(id) {
            Some(booking) => {
                booking.booking_status = booking_status;
                booking.payment_status = payment_status;
                booking.updated_at = Some(bson::DateTime::now());
                Ok(())
            }
            None => Err(StoreError(format!("Booking {} not found for status update", id))),
        }
    }

    async fn insert_payment(&self, payment: &PaymentRecord) -> Result<ObjectId, StoreError> {
        let id = payment.id.unwrap_or_else(ObjectId::new);
        let mut stored = payment.clone();
        stored.id = Some(id);
        self.payments.lock().unwrap().insert(id, stored);
        Ok(id)
    }

    async fn find_payment(&self, id: &ObjectId) -> Result<Option<PaymentRecord>, StoreError> {
        Ok(self.payments.lock().unwrap().get(id).cloned())
    }

    async fn list_payments(&self) -> Result<Vec<PaymentRecord>, StoreError> {
        let payments = self.payments.lock().unwrap();
        let mut all: Vec<PaymentRecord> = payments.values().cloned().collect();
        all.sort_by_key(|p| p.id);
        Ok(all)
    }

    async fn mark_commission_paid(&self, payment_id: &ObjectId) -> Result<bool, StoreError> {
        let mut payments = self.payments.lock().unwrap();
        match payments.get_mut(payment_id) {
            Some(payment) => {
                payment.is_commission_paid = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking::ContactSnapshot;
    use crate::models::reservation::ReservationParams;
    use chrono::NaiveDate;

    fn sample_booking(client_id: ObjectId) -> Booking {
        Booking {
            id: None,
            reference: "BK-TEST0001".to_string(),
            category: ServiceCategory::Hotel,
            offering_id: ObjectId::new(),
            client_id,
            partner_id: None,
            contact: ContactSnapshot {
                full_name: "Amina Benali".to_string(),
                email: "amina@example.com".to_string(),
                phone: "+212600000000".to_string(),
            },
            params: ReservationParams::Stay {
                check_in: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                check_out: NaiveDate::from_ymd_opt(2024, 6, 4).unwrap(),
                guests: 2,
            },
            special_requests: None,
            total_price: 900.0,
            booking_status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            created_at: None,
            updated_at: None,
        }
    }

    #[actix_rt::test]
    async fn outcome_update_rewrites_both_statuses() {
        let store = MemoryBookingStore::new();
        let client_id = ObjectId::new();
        let id = store.insert_booking(&sample_booking(client_id)).await.unwrap();

        store
            .set_booking_outcome(&id, BookingStatus::Confirmed, PaymentStatus::Paid)
            .await
            .unwrap();

        let stored = store.find_booking(&id).await.unwrap().unwrap();
        assert_eq!(stored.booking_status, BookingStatus::Confirmed);
        assert_eq!(stored.payment_status, PaymentStatus::Paid);
    }

    #[actix_rt::test]
    async fn outcome_update_on_missing_booking_errors() {
        let store = MemoryBookingStore::new();
        let missing = ObjectId::new();

        let result = store
            .set_booking_outcome(&missing, BookingStatus::Confirmed, PaymentStatus::Paid)
            .await;
        assert!(result.is_err());
    }

    #[actix_rt::test]
    async fn fault_switches_reject_writes() {
        let store = MemoryBookingStore::new();
        store.fail_inserts(true);
        assert!(store.insert_booking(&sample_booking(ObjectId::new())).await.is_err());

        store.fail_inserts(false);
        let id = store.insert_booking(&sample_booking(ObjectId::new())).await.unwrap();

        store.fail_outcome_updates(true);
        assert!(store
            .set_booking_outcome(&id, BookingStatus::Confirmed, PaymentStatus::Paid)
            .await
            .is_err());
    }

    #[actix_rt::test]
    async fn category_filter_narrows_offering_list() {
        let store = MemoryBookingStore::new();
        store.seed_offering(ServiceOffering {
            id: None,
            partner_id: None,
            category: ServiceCategory::Hotel,
            title: "Riad Yasmine".to_string(),
            city: "Marrakech".to_string(),
            unit_price: 300.0,
            capacity: None,
            duration_days: None,
            description: None,
            images: None,
            created_at: None,
            updated_at: None,
        });
        store.seed_offering(ServiceOffering {
            id: None,
            partner_id: None,
            category: ServiceCategory::Voiture,
            title: "Dacia Duster".to_string(),
            city: "Agadir".to_string(),
            unit_price: 250.0,
            capacity: None,
            duration_days: None,
            description: None,
            images: None,
            created_at: None,
            updated_at: None,
        });

        let all = store.list_offerings(None).await.unwrap();
        assert_eq!(all.len(), 2);

        let cars = store.list_offerings(Some(ServiceCategory::Voiture)).await.unwrap();
        assert_eq!(cars.len(), 1);
        assert_eq!(cars[0].title, "Dacia Duster");
    }
}
