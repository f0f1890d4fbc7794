use actix_web::{web, HttpResponse, Responder};
use bson::oid::ObjectId;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::db::store::BookingStore;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::models::reservation::{ReservationDraft, ReservationRequest};
use crate::services::booking_orchestrator::{BookingError, BookingOrchestrator, BOOKING_CURRENCY};

#[derive(Debug, Deserialize)]
pub struct BookingSubmission {
    #[serde(flatten)]
    pub request: ReservationRequest,
    pub payment_method_id: String,
}

#[derive(Debug, Deserialize)]
pub struct PaymentInput {
    pub payment_method_id: String,
}

/// Price preview for the booking form. Recomputed on every change of the
/// inputs; persists nothing.
pub async fn quote_booking(
    orchestrator: web::Data<Arc<BookingOrchestrator>>,
    input: web::Json<ReservationRequest>,
) -> impl Responder {
    match orchestrator.quote(&input).await {
        Ok(quote) => HttpResponse::Ok().json(json!({
            "quote": quote,
            "currency": BOOKING_CURRENCY,
        })),
        Err(err) => booking_error_response(err),
    }
}

/// Snapshot a form so the client can send the visitor through sign-in and
/// get the exact same request back afterwards.
pub async fn save_draft(input: web::Json<ReservationRequest>) -> impl Responder {
    let draft = ReservationDraft::snapshot(input.into_inner(), Utc::now());
    HttpResponse::Ok().json(draft)
}

pub async fn resume_draft(
    orchestrator: web::Data<Arc<BookingOrchestrator>>,
    input: web::Json<ReservationDraft>,
) -> impl Responder {
    let draft = input.into_inner();
    match draft.resume(Utc::now()) {
        Ok(request) => match orchestrator.quote(&request).await {
            Ok(quote) => HttpResponse::Ok().json(json!({
                "request": request,
                "quote": quote,
                "currency": BOOKING_CURRENCY,
            })),
            Err(err) => booking_error_response(err),
        },
        Err(expired) => HttpResponse::Gone().json(json!({
            "error": expired.to_string(),
        })),
    }
}

/// Full checkout: validate, persist, capture, confirm.
pub async fn create_booking(
    orchestrator: web::Data<Arc<BookingOrchestrator>>,
    user: AuthenticatedUser,
    input: web::Json<BookingSubmission>,
) -> impl Responder {
    let client_id = match user.object_id() {
        Ok(id) => id,
        Err(_) => return HttpResponse::Unauthorized().body("Invalid user id in token"),
    };
    let input = input.into_inner();

    match orchestrator
        .execute(client_id, &input.request, &input.payment_method_id)
        .await
    {
        Ok(outcome) => HttpResponse::Ok().json(json!({
            "booking": outcome.booking,
            "payment": outcome.payment,
        })),
        Err(err) => booking_error_response(err),
    }
}

/// Retry payment on a booking whose earlier capture failed.
pub async fn pay_booking(
    orchestrator: web::Data<Arc<BookingOrchestrator>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    input: web::Json<PaymentInput>,
) -> impl Responder {
    let booking_id = match ObjectId::parse_str(path.as_str()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid booking ID"),
    };
    let client_id = match user.object_id() {
        Ok(id) => id,
        Err(_) => return HttpResponse::Unauthorized().body("Invalid user id in token"),
    };

    match orchestrator
        .pay(booking_id, client_id, &input.payment_method_id)
        .await
    {
        Ok(outcome) => HttpResponse::Ok().json(json!({
            "booking": outcome.booking,
            "payment": outcome.payment,
        })),
        Err(err) => booking_error_response(err),
    }
}

pub async fn get_bookings(
    store: web::Data<Arc<dyn BookingStore>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> impl Responder {
    let user_id = path.into_inner();
    if user_id != user.user_id {
        return HttpResponse::Forbidden().body("Forbidden");
    }
    let client_id = match user.object_id() {
        Ok(id) => id,
        Err(_) => return HttpResponse::Unauthorized().body("Invalid user id in token"),
    };

    match store.bookings_for_client(&client_id).await {
        Ok(bookings) => HttpResponse::Ok().json(bookings),
        Err(err) => {
            eprintln!("Failed to load bookings for {}: {}", client_id, err);
            HttpResponse::InternalServerError().body("Failed to load bookings.")
        }
    }
}

pub async fn get_booking_by_id(
    store: web::Data<Arc<dyn BookingStore>>,
    user: AuthenticatedUser,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (user_id, booking_id) = path.into_inner();
    if user_id != user.user_id {
        return HttpResponse::Forbidden().body("Forbidden");
    }
    let client_id = match user.object_id() {
        Ok(id) => id,
        Err(_) => return HttpResponse::Unauthorized().body("Invalid user id in token"),
    };
    let booking_id = match ObjectId::parse_str(&booking_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid booking ID"),
    };

    match store.find_booking(&booking_id).await {
        Ok(Some(booking)) if booking.client_id == client_id => HttpResponse::Ok().json(booking),
        Ok(_) => HttpResponse::NotFound().body("Booking not found"),
        Err(err) => {
            eprintln!("Failed to load booking {}: {}", booking_id, err);
            HttpResponse::InternalServerError().body("Failed to load booking.")
        }
    }
}

/// One place that decides which status each orchestration failure maps to.
fn booking_error_response(err: BookingError) -> HttpResponse {
    match err {
        BookingError::Validation(violations) => {
            let details: Vec<_> = violations
                .iter()
                .map(|v| json!({"code": v.code(), "message": v.message()}))
                .collect();
            HttpResponse::BadRequest().json(json!({
                "error": "Reservation request is invalid",
                "violations": details,
            }))
        }
        BookingError::UnknownOffering(_) | BookingError::UnknownBooking(_) => {
            HttpResponse::NotFound().json(json!({"error": err.to_string()}))
        }
        BookingError::Forbidden => HttpResponse::Forbidden().body("Forbidden"),
        BookingError::AlreadyPaid(_) | BookingError::Cancelled(_) => {
            HttpResponse::Conflict().json(json!({"error": err.to_string()}))
        }
        BookingError::Persistence(err) => {
            eprintln!("Booking persistence failure: {}", err);
            HttpResponse::ServiceUnavailable().json(json!({
                "error": "Service temporarily unavailable, please try again",
            }))
        }
        BookingError::Payment {
            booking_id,
            failure,
        } => HttpResponse::PaymentRequired().json(json!({
            "error": failure.to_string(),
            "booking_id": booking_id.to_hex(),
        })),
        BookingError::Reconciliation {
            booking_id,
            transaction_ref,
            source,
        } => {
            eprintln!(
                "Reconciliation required for booking {} (transaction {}): {}",
                booking_id.to_hex(),
                transaction_ref,
                source
            );
            HttpResponse::InternalServerError().json(json!({
                "error": "Payment was captured but the booking could not be updated; our team will reconcile it",
                "booking_id": booking_id.to_hex(),
                "transaction_ref": transaction_ref,
            }))
        }
    }
}
