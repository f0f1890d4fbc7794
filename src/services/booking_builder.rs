use bson::oid::ObjectId;
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::models::booking::{Booking, BookingStatus, ContactSnapshot, PaymentStatus};
use crate::models::offering::{ServiceCategory, ServiceOffering};
use crate::models::reservation::{ReservationParams, ReservationRequest};
use crate::services::pricing_service::{PriceQuote, PricingService};
use crate::services::reservation_validator::{ReservationValidator, Violation};

/// A validated, priced booking ready for persistence, paired with the quote
/// line that produced its total.
#[derive(Debug, Clone)]
pub struct PreparedBooking {
    pub booking: Booking,
    pub quote: PriceQuote,
}

pub struct BookingRequestBuilder;

impl BookingRequestBuilder {
    /// Map the free-text category labels the storefront sends (plural forms,
    /// French and English spellings) onto the canonical tags bookings are
    /// stored under.
    pub fn normalize_category(raw: &str) -> Option<ServiceCategory> {
        match raw.trim().to_lowercase().as_str() {
            "hotel" | "hotels" | "hôtel" | "hôtels" => Some(ServiceCategory::Hotel),
            "appartement" | "appartements" | "apartment" | "apartments" => {
                Some(ServiceCategory::Appartement)
            }
            "villa" | "villas" => Some(ServiceCategory::Villa),
            "voiture" | "voitures" | "car" | "cars" | "vehicule" | "véhicule" => {
                Some(ServiceCategory::Voiture)
            }
            "circuit" | "circuits" | "tour" | "tours" => Some(ServiceCategory::Circuit),
            _ => None,
        }
    }

    /// Run every rule a request must pass before it can be priced or
    /// persisted: the category label resolves, it matches the offering, and
    /// the per-category fields are complete.
    pub fn check(
        offering: &ServiceOffering,
        request: &ReservationRequest,
    ) -> Result<ServiceCategory, Vec<Violation>> {
        let category = match Self::normalize_category(&request.category) {
            Some(category) => category,
            None => return Err(vec![Violation::UnknownCategory(request.category.clone())]),
        };
        if category != offering.category {
            return Err(vec![Violation::CategoryMismatch(offering.category)]);
        }

        let violations = ReservationValidator::validate(offering, request);
        if !violations.is_empty() {
            return Err(violations);
        }
        Ok(category)
    }

    /// Validate and assemble a booking record for the given client. Either
    /// every rule passes and a pending booking comes back, or the full list
    /// of violations does. Nothing is persisted here.
    pub fn build(
        offering: &ServiceOffering,
        client_id: ObjectId,
        request: &ReservationRequest,
    ) -> Result<PreparedBooking, Vec<Violation>> {
        let category = Self::check(offering, request)?;

        let quote = match PricingService::quote(offering, request) {
            Some(quote) => quote,
            None => return Err(vec![Violation::EmptyDateRange]),
        };
        let params = match Self::params_for(category, offering, request) {
            Some(params) => params,
            None => return Err(vec![Violation::EmptyDateRange]),
        };

        let now = bson::DateTime::now();
        let booking = Booking {
            id: None,
            reference: Self::reference_code(),
            category,
            offering_id: offering.id.unwrap_or_default(),
            client_id,
            partner_id: offering.partner_id,
            contact: ContactSnapshot {
                full_name: request.full_name.trim().to_string(),
                email: request.email.trim().to_string(),
                phone: request.phone.trim().to_string(),
            },
            params,
            special_requests: request.special_requests.clone(),
            total_price: quote.total,
            booking_status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            created_at: Some(now),
            updated_at: Some(now),
        };

        Ok(PreparedBooking { booking, quote })
    }

    /// Carry the fields the category actually uses onto the booking; the
    /// validator has already confirmed they are present.
    fn params_for(
        category: ServiceCategory,
        offering: &ServiceOffering,
        request: &ReservationRequest,
    ) -> Option<ReservationParams> {
        match category {
            ServiceCategory::Hotel | ServiceCategory::Appartement | ServiceCategory::Villa => {
                Some(ReservationParams::Stay {
                    check_in: request.check_in?,
                    check_out: request.check_out?,
                    guests: request.party_size.unwrap_or(1),
                })
            }
            ServiceCategory::Voiture => Some(ReservationParams::Rental {
                pickup_date: request.pickup_date?,
                return_date: request.return_date?,
                pickup_location: request.pickup_location.clone()?.trim().to_string(),
                dropoff_location: request.dropoff_location.clone()?.trim().to_string(),
            }),
            ServiceCategory::Circuit => Some(ReservationParams::Tour {
                start_date: request.start_date?,
                party_size: request.party_size?,
                duration_days: offering.duration_days.unwrap_or(1),
            }),
        }
    }

    /// Short human-readable reference printed on confirmations, e.g.
    /// `BK-7F3K9A2D`. Uniqueness is not enforced; the booking id is the
    /// real key.
    pub fn reference_code() -> String {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(8)
            .map(char::from)
            .collect::<String>()
            .to_uppercase();
        format!("BK-{}", suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn villa_offering() -> ServiceOffering {
        ServiceOffering {
            id: Some(ObjectId::new()),
            partner_id: Some(ObjectId::new()),
            category: ServiceCategory::Villa,
            title: "Villa des Palmiers".to_string(),
            city: "Marrakech".to_string(),
            unit_price: 1200.0,
            capacity: Some(8),
            duration_days: None,
            description: None,
            images: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn villa_request() -> ReservationRequest {
        ReservationRequest {
            offering_id: "64b0c0ffee0000000000aaaa".to_string(),
            category: "villas".to_string(),
            full_name: "Amina Benali".to_string(),
            email: "amina@example.com".to_string(),
            phone: "+212600000000".to_string(),
            check_in: Some(date(2024, 8, 1)),
            check_out: Some(date(2024, 8, 5)),
            pickup_date: None,
            return_date: None,
            pickup_location: None,
            dropoff_location: None,
            start_date: None,
            party_size: Some(4),
            special_requests: Some("Late arrival".to_string()),
        }
    }

    #[test]
    fn category_synonyms_normalize() {
        assert_eq!(
            BookingRequestBuilder::normalize_category("Hôtels"),
            Some(ServiceCategory::Hotel)
        );
        assert_eq!(
            BookingRequestBuilder::normalize_category(" cars "),
            Some(ServiceCategory::Voiture)
        );
        assert_eq!(
            BookingRequestBuilder::normalize_category("Tours"),
            Some(ServiceCategory::Circuit)
        );
        assert_eq!(BookingRequestBuilder::normalize_category("yacht"), None);
    }

    #[test]
    fn builds_a_pending_priced_booking() {
        let offering = villa_offering();
        let client_id = ObjectId::new();

        let prepared = BookingRequestBuilder::build(&offering, client_id, &villa_request()).unwrap();

        assert_eq!(prepared.quote.quantity, 4);
        assert_eq!(prepared.booking.total_price, 4800.0);
        assert_eq!(prepared.booking.booking_status, BookingStatus::Pending);
        assert_eq!(prepared.booking.payment_status, PaymentStatus::Pending);
        assert_eq!(prepared.booking.client_id, client_id);
        assert_eq!(prepared.booking.partner_id, offering.partner_id);
        assert!(prepared.booking.reference.starts_with("BK-"));
        match prepared.booking.params {
            ReservationParams::Stay { guests, .. } => assert_eq!(guests, 4),
            ref other => panic!("expected stay params, got {:?}", other),
        }
    }

    #[test]
    fn unknown_category_is_a_single_violation() {
        let mut request = villa_request();
        request.category = "yacht".to_string();

        let violations =
            BookingRequestBuilder::build(&villa_offering(), ObjectId::new(), &request).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code(), "category");
    }

    #[test]
    fn mismatched_category_is_rejected() {
        let mut request = villa_request();
        request.category = "voiture".to_string();

        let violations =
            BookingRequestBuilder::build(&villa_offering(), ObjectId::new(), &request).unwrap_err();
        assert_eq!(violations, vec![Violation::CategoryMismatch(ServiceCategory::Villa)]);
    }

    #[test]
    fn invalid_request_reports_without_building() {
        let mut request = villa_request();
        request.email = String::new();
        request.check_out = None;

        let violations =
            BookingRequestBuilder::build(&villa_offering(), ObjectId::new(), &request).unwrap_err();
        let codes: Vec<&str> = violations.iter().map(|v| v.code()).collect();
        assert_eq!(codes, vec!["contact.email", "dates.check_out"]);
    }

    #[test]
    fn reference_codes_have_the_printed_shape() {
        let reference = BookingRequestBuilder::reference_code();
        assert_eq!(reference.len(), 11);
        assert!(reference.starts_with("BK-"));
        assert!(reference[3..].chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
