use chrono::NaiveDate;
use serde::Serialize;

use crate::models::offering::{PricingBasis, ServiceOffering};
use crate::models::reservation::ReservationRequest;

/// A computed price for one reservation request. `quantity` counts nights,
/// rental days or travellers depending on the offering's pricing basis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceQuote {
    pub unit_price: f64,
    pub quantity: u32,
    pub total: f64,
}

pub struct PricingService;

impl PricingService {
    /// Calendar-day difference between check-in and check-out. The booking
    /// forms have always charged on the absolute difference, so a reversed
    /// range still yields a positive night count.
    pub fn stay_nights(check_in: NaiveDate, check_out: NaiveDate) -> i64 {
        (check_out - check_in).num_days().abs()
    }

    /// Calendar-day difference between pickup and return, same policy as
    /// `stay_nights`.
    pub fn rental_days(pickup: NaiveDate, return_date: NaiveDate) -> i64 {
        (return_date - pickup).num_days().abs()
    }

    /// Price a request against an offering. Deterministic for identical
    /// inputs. Returns `None` when the request cannot be priced for the
    /// offering's category: a required parameter is missing, the date range
    /// covers less than one day, or the party size is zero.
    pub fn quote(offering: &ServiceOffering, request: &ReservationRequest) -> Option<PriceQuote> {
        match offering.category.pricing_basis() {
            PricingBasis::PerNight => {
                let nights = Self::stay_nights(request.check_in?, request.check_out?);
                if nights < 1 {
                    return None;
                }
                Some(Self::line(offering.unit_price, nights as u32))
            }
            PricingBasis::PerDay => {
                let days = Self::rental_days(request.pickup_date?, request.return_date?);
                if days < 1 {
                    return None;
                }
                Some(Self::line(offering.unit_price, days as u32))
            }
            PricingBasis::PerPerson => {
                let travellers = request.party_size?;
                if travellers < 1 {
                    return None;
                }
                Some(Self::line(offering.unit_price, travellers))
            }
        }
    }

    fn line(unit_price: f64, quantity: u32) -> PriceQuote {
        PriceQuote {
            unit_price,
            quantity,
            total: unit_price * quantity as f64,
        }
    }

    /// MAD to centimes. Amounts are converted exactly once, at the payment
    /// boundary; everything above it stays in major units.
    pub fn to_minor_units(amount_mad: f64) -> i64 {
        (amount_mad * 100.0).round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::offering::ServiceCategory;

    fn offering(category: ServiceCategory, unit_price: f64) -> ServiceOffering {
        ServiceOffering {
            id: None,
            partner_id: None,
            category,
            title: "Test offering".to_string(),
            city: "Marrakech".to_string(),
            unit_price,
            capacity: None,
            duration_days: None,
            description: None,
            images: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn empty_request(category: &str) -> ReservationRequest {
        ReservationRequest {
            offering_id: "64b0c0ffee0000000000aaaa".to_string(),
            category: category.to_string(),
            full_name: String::new(),
            email: String::new(),
            phone: String::new(),
            check_in: None,
            check_out: None,
            pickup_date: None,
            return_date: None,
            pickup_location: None,
            dropoff_location: None,
            start_date: None,
            party_size: None,
            special_requests: None,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn apartment_three_nights_at_300() {
        let offering = offering(ServiceCategory::Appartement, 300.0);
        let mut request = empty_request("appartement");
        request.check_in = Some(date(2024, 6, 1));
        request.check_out = Some(date(2024, 6, 4));

        let quote = PricingService::quote(&offering, &request).unwrap();
        assert_eq!(quote.quantity, 3);
        assert_eq!(quote.total, 900.0);
    }

    #[test]
    fn vehicle_two_days_at_250() {
        let offering = offering(ServiceCategory::Voiture, 250.0);
        let mut request = empty_request("voiture");
        request.pickup_date = Some(date(2024, 7, 10));
        request.return_date = Some(date(2024, 7, 12));

        let quote = PricingService::quote(&offering, &request).unwrap();
        assert_eq!(quote.quantity, 2);
        assert_eq!(quote.total, 500.0);
    }

    #[test]
    fn circuit_four_people_at_800() {
        let offering = offering(ServiceCategory::Circuit, 800.0);
        let mut request = empty_request("circuit");
        request.party_size = Some(4);

        let quote = PricingService::quote(&offering, &request).unwrap();
        assert_eq!(quote.quantity, 4);
        assert_eq!(quote.total, 3200.0);
    }

    #[test]
    fn reversed_date_range_still_prices_positively() {
        // Long-standing form behavior: the difference is taken absolute, so
        // swapped dates charge the same as the ordered pair.
        let offering = offering(ServiceCategory::Hotel, 300.0);
        let mut request = empty_request("hotel");
        request.check_in = Some(date(2024, 6, 4));
        request.check_out = Some(date(2024, 6, 1));

        let quote = PricingService::quote(&offering, &request).unwrap();
        assert_eq!(quote.quantity, 3);
        assert_eq!(quote.total, 900.0);
    }

    #[test]
    fn same_day_stay_is_unpriceable() {
        let offering = offering(ServiceCategory::Hotel, 300.0);
        let mut request = empty_request("hotel");
        request.check_in = Some(date(2024, 6, 1));
        request.check_out = Some(date(2024, 6, 1));

        assert!(PricingService::quote(&offering, &request).is_none());
    }

    #[test]
    fn zero_party_circuit_is_unpriceable() {
        let offering = offering(ServiceCategory::Circuit, 800.0);
        let mut request = empty_request("circuit");
        request.party_size = Some(0);

        assert!(PricingService::quote(&offering, &request).is_none());
    }

    #[test]
    fn missing_dates_are_unpriceable() {
        let offering = offering(ServiceCategory::Voiture, 250.0);
        let request = empty_request("voiture");

        assert!(PricingService::quote(&offering, &request).is_none());
    }

    #[test]
    fn minor_unit_conversion_rounds_to_the_centime() {
        assert_eq!(PricingService::to_minor_units(900.0), 90000);
        assert_eq!(PricingService::to_minor_units(123.45), 12345);
        assert_eq!(PricingService::to_minor_units(0.005), 1);
    }
}
