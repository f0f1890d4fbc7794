use std::sync::Arc;

use bson::oid::ObjectId;

use crate::db::store::{BookingStore, StoreError};
use crate::models::booking::{Booking, BookingStatus, PaymentStatus};
use crate::models::offering::ServiceOffering;
use crate::models::payment::PaymentRecord;
use crate::models::reservation::ReservationRequest;
use crate::services::booking_builder::{BookingRequestBuilder, PreparedBooking};
use crate::services::notification_service::NotificationService;
use crate::services::payment::interface::{ChargeRequest, PaymentAuthorizer, PaymentFailure};
use crate::services::pricing_service::{PriceQuote, PricingService};
use crate::services::reservation_validator::Violation;

/// All charges settle in Moroccan dirhams.
pub const BOOKING_CURRENCY: &str = "MAD";

#[derive(Debug)]
pub enum BookingError {
    Validation(Vec<Violation>),
    UnknownOffering(String),
    UnknownBooking(ObjectId),
    Forbidden,
    AlreadyPaid(ObjectId),
    Cancelled(ObjectId),
    Persistence(StoreError),
    Payment {
        booking_id: ObjectId,
        failure: PaymentFailure,
    },
    /// Money was captured but a write after the capture failed. The booking
    /// record no longer matches what the provider settled, so this must be
    /// surfaced for manual reconciliation, never retried blindly.
    Reconciliation {
        booking_id: ObjectId,
        transaction_ref: String,
        source: StoreError,
    },
}

impl std::fmt::Display for BookingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingError::Validation(violations) => {
                write!(f, "Reservation request failed {} validation rule(s)", violations.len())
            }
            BookingError::UnknownOffering(id) => write!(f, "Offering {} not found", id),
            BookingError::UnknownBooking(id) => write!(f, "Booking {} not found", id.to_hex()),
            BookingError::Forbidden => write!(f, "Booking belongs to another client"),
            BookingError::AlreadyPaid(id) => {
                write!(f, "Booking {} is already paid", id.to_hex())
            }
            BookingError::Cancelled(id) => write!(f, "Booking {} is cancelled", id.to_hex()),
            BookingError::Persistence(err) => write!(f, "Persistence failure: {}", err),
            BookingError::Payment { booking_id, failure } => {
                write!(f, "Payment for booking {} failed: {}", booking_id.to_hex(), failure)
            }
            BookingError::Reconciliation {
                booking_id,
                transaction_ref,
                ..
            } => write!(
                f,
                "Captured payment {} could not be recorded on booking {}; manual reconciliation required",
                transaction_ref,
                booking_id.to_hex()
            ),
        }
    }
}

impl std::error::Error for BookingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BookingError::Persistence(err) => Some(err),
            BookingError::Payment { failure, .. } => Some(failure),
            BookingError::Reconciliation { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Checkpoints of the payment flow, in the only order they may happen.
#[derive(Debug, Clone, Copy)]
enum FlowStage {
    Validated,
    Persisted,
    Captured,
    Confirmed,
    Recorded,
    Notified,
}

impl FlowStage {
    fn as_str(&self) -> &'static str {
        match self {
            FlowStage::Validated => "validated",
            FlowStage::Persisted => "persisted",
            FlowStage::Captured => "captured",
            FlowStage::Confirmed => "confirmed",
            FlowStage::Recorded => "recorded",
            FlowStage::Notified => "notified",
        }
    }
}

#[derive(Debug)]
pub struct SubmittedBooking {
    pub booking: Booking,
    pub quote: PriceQuote,
}

#[derive(Debug)]
pub struct PaymentOutcome {
    pub booking: Booking,
    pub payment: PaymentRecord,
}

/// Drives a reservation from raw request to paid booking. Holds no state of
/// its own; every step is a call into the store or the payment provider, in
/// a fixed order, so a crash between steps leaves an explainable record.
pub struct BookingOrchestrator {
    store: Arc<dyn BookingStore>,
    authorizer: Arc<dyn PaymentAuthorizer>,
    notifier: Option<Arc<NotificationService>>,
}

impl BookingOrchestrator {
    pub fn new(
        store: Arc<dyn BookingStore>,
        authorizer: Arc<dyn PaymentAuthorizer>,
        notifier: Option<Arc<NotificationService>>,
    ) -> Self {
        Self {
            store,
            authorizer,
            notifier,
        }
    }

    /// Price a request without persisting anything. Same rules as `submit`,
    /// so a request that quotes cleanly will also submit cleanly.
    pub async fn quote(&self, request: &ReservationRequest) -> Result<PriceQuote, BookingError> {
        let offering = self.fetch_offering(&request.offering_id).await?;
        BookingRequestBuilder::check(&offering, request).map_err(BookingError::Validation)?;
        PricingService::quote(&offering, request)
            .ok_or_else(|| BookingError::Validation(vec![Violation::EmptyDateRange]))
    }

    /// Validate, price and persist a pending booking. No money moves here.
    pub async fn submit(
        &self,
        client_id: ObjectId,
        request: &ReservationRequest,
    ) -> Result<SubmittedBooking, BookingError> {
        let offering = self.fetch_offering(&request.offering_id).await?;
        let PreparedBooking { mut booking, quote } =
            BookingRequestBuilder::build(&offering, client_id, request)
                .map_err(BookingError::Validation)?;
        self.log(&booking.reference, FlowStage::Validated);

        let id = self
            .store
            .insert_booking(&booking)
            .await
            .map_err(BookingError::Persistence)?;
        booking.id = Some(id);
        self.log(&booking.reference, FlowStage::Persisted);

        Ok(SubmittedBooking { booking, quote })
    }

    /// Capture payment for a pending booking and confirm it. The capture is
    /// attempted at most once per call; a failed capture changes nothing, so
    /// the client can retry the same booking with another card.
    pub async fn pay(
        &self,
        booking_id: ObjectId,
        client_id: ObjectId,
        payment_method_id: &str,
    ) -> Result<PaymentOutcome, BookingError> {
        let mut booking = match self.store.find_booking(&booking_id).await {
            Ok(Some(booking)) => booking,
            Ok(None) => return Err(BookingError::UnknownBooking(booking_id)),
            Err(err) => return Err(BookingError::Persistence(err)),
        };

        if booking.client_id != client_id {
            return Err(BookingError::Forbidden);
        }
        if booking.payment_status == PaymentStatus::Paid {
            return Err(BookingError::AlreadyPaid(booking_id));
        }
        if booking.booking_status == BookingStatus::Cancelled {
            return Err(BookingError::Cancelled(booking_id));
        }

        let charge = ChargeRequest {
            amount_minor: PricingService::to_minor_units(booking.total_price),
            currency: BOOKING_CURRENCY.to_string(),
            payment_method_id: payment_method_id.to_string(),
            description: format!("Booking {} ({})", booking.reference, booking.category),
            receipt_email: Some(booking.contact.email.clone()),
        };

        let authorization = match self.authorizer.authorize(&charge).await {
            Ok(authorization) => authorization,
            Err(failure) => {
                eprintln!("[{}] capture failed: {}", booking.reference, failure);
                return Err(BookingError::Payment {
                    booking_id,
                    failure,
                });
            }
        };
        self.log(&booking.reference, FlowStage::Captured);

        if let Err(source) = self
            .store
            .set_booking_outcome(&booking_id, BookingStatus::Confirmed, PaymentStatus::Paid)
            .await
        {
            eprintln!(
                "[{}] WARNING: captured {} but could not confirm the booking: {}",
                booking.reference, authorization.transaction_ref, source
            );
            return Err(BookingError::Reconciliation {
                booking_id,
                transaction_ref: authorization.transaction_ref,
                source,
            });
        }
        booking.booking_status = BookingStatus::Confirmed;
        booking.payment_status = PaymentStatus::Paid;
        self.log(&booking.reference, FlowStage::Confirmed);

        let mut payment = PaymentRecord {
            id: None,
            booking_id,
            client_id,
            partner_id: booking.partner_id,
            amount_minor: authorization.amount_minor,
            currency: authorization.currency.clone(),
            method: self.authorizer.provider_name().to_string(),
            transaction_ref: authorization.transaction_ref.clone(),
            captured_at: bson::DateTime::now(),
            is_commission_paid: false,
        };
        match self.store.insert_payment(&payment).await {
            Ok(payment_id) => payment.id = Some(payment_id),
            Err(source) => {
                eprintln!(
                    "[{}] WARNING: captured {} but could not record the payment: {}",
                    booking.reference, authorization.transaction_ref, source
                );
                return Err(BookingError::Reconciliation {
                    booking_id,
                    transaction_ref: authorization.transaction_ref,
                    source,
                });
            }
        }
        self.log(&booking.reference, FlowStage::Recorded);

        self.notify_confirmed(&booking, &payment).await;

        Ok(PaymentOutcome { booking, payment })
    }

    /// One-shot checkout: submit the request, then immediately pay for it.
    pub async fn execute(
        &self,
        client_id: ObjectId,
        request: &ReservationRequest,
        payment_method_id: &str,
    ) -> Result<PaymentOutcome, BookingError> {
        let submitted = self.submit(client_id, request).await?;
        let booking_id = submitted.booking.id.ok_or_else(|| {
            BookingError::Persistence(StoreError("Submitted booking has no id".to_string()))
        })?;
        self.pay(booking_id, client_id, payment_method_id).await
    }

    async fn fetch_offering(&self, raw_id: &str) -> Result<ServiceOffering, BookingError> {
        let id = ObjectId::parse_str(raw_id)
            .map_err(|_| BookingError::UnknownOffering(raw_id.to_string()))?;
        match self.store.find_offering(&id).await {
            Ok(Some(offering)) => Ok(offering),
            Ok(None) => Err(BookingError::UnknownOffering(raw_id.to_string())),
            Err(err) => Err(BookingError::Persistence(err)),
        }
    }

    /// Confirmation email, best effort. The booking is already paid, so a
    /// delivery failure is logged and swallowed.
    async fn notify_confirmed(&self, booking: &Booking, payment: &PaymentRecord) {
        if let Some(notifier) = &self.notifier {
            let service_title = match self.store.find_offering(&booking.offering_id).await {
                Ok(Some(offering)) => offering.title,
                _ => booking.category.to_string(),
            };
            match notifier
                .notify_booking_confirmed(booking, payment, &service_title)
                .await
            {
                Ok(_) => self.log(&booking.reference, FlowStage::Notified),
                Err(err) => eprintln!(
                    "[{}] confirmation email failed: {}",
                    booking.reference, err
                ),
            }
        }
    }

    fn log(&self, reference: &str, stage: FlowStage) {
        println!("[{}] {}", reference, stage.as_str());
    }
}
