use std::sync::OnceLock;

use regex::Regex;

use crate::models::offering::{PricingBasis, ServiceCategory, ServiceOffering};
use crate::models::reservation::ReservationRequest;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap())
}

/// One rule failure on a reservation request. Codes are stable identifiers
/// that clients key on for field-level display; messages are free text and
/// may change.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    UnknownCategory(String),
    CategoryMismatch(ServiceCategory),
    MissingFullName,
    MissingEmail,
    InvalidEmail,
    MissingPhone,
    MissingCheckIn,
    MissingCheckOut,
    MissingPickupDate,
    MissingReturnDate,
    MissingStartDate,
    EmptyDateRange,
    MissingPickupLocation,
    MissingDropoffLocation,
    PartySizeTooSmall,
    PartySizeTooLarge(u32),
}

impl Violation {
    pub fn code(&self) -> &'static str {
        match self {
            Violation::UnknownCategory(_) | Violation::CategoryMismatch(_) => "category",
            Violation::MissingFullName => "contact.full_name",
            Violation::MissingEmail | Violation::InvalidEmail => "contact.email",
            Violation::MissingPhone => "contact.phone",
            Violation::MissingCheckIn => "dates.check_in",
            Violation::MissingCheckOut => "dates.check_out",
            Violation::MissingPickupDate => "dates.pickup",
            Violation::MissingReturnDate => "dates.return",
            Violation::MissingStartDate => "dates.start",
            Violation::EmptyDateRange => "dates.range",
            Violation::MissingPickupLocation => "locations.pickup",
            Violation::MissingDropoffLocation => "locations.dropoff",
            Violation::PartySizeTooSmall => "party_size.min",
            Violation::PartySizeTooLarge(_) => "party_size.max",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Violation::UnknownCategory(raw) => {
                format!("Unknown service category '{}'", raw)
            }
            Violation::CategoryMismatch(expected) => {
                format!("This offering is booked as a {}", expected)
            }
            Violation::MissingFullName => "Full name is required".to_string(),
            Violation::MissingEmail => "Email address is required".to_string(),
            Violation::InvalidEmail => "A valid email address is required".to_string(),
            Violation::MissingPhone => "Phone number is required".to_string(),
            Violation::MissingCheckIn => "Check-in date is required".to_string(),
            Violation::MissingCheckOut => "Check-out date is required".to_string(),
            Violation::MissingPickupDate => "Pickup date is required".to_string(),
            Violation::MissingReturnDate => "Return date is required".to_string(),
            Violation::MissingStartDate => "Start date is required".to_string(),
            Violation::EmptyDateRange => {
                "The selected dates must cover at least one day".to_string()
            }
            Violation::MissingPickupLocation => "Pickup location is required".to_string(),
            Violation::MissingDropoffLocation => "Drop-off location is required".to_string(),
            Violation::PartySizeTooSmall => "At least one traveller is required".to_string(),
            Violation::PartySizeTooLarge(capacity) => {
                format!("This circuit takes at most {} travellers", capacity)
            }
        }
    }
}

pub struct ReservationValidator;

impl ReservationValidator {
    /// Check a request against the offering it targets. Collects every
    /// failure instead of stopping at the first, so the client can show
    /// all field errors in one round trip. An empty vec means the request
    /// is bookable.
    pub fn validate(offering: &ServiceOffering, request: &ReservationRequest) -> Vec<Violation> {
        let mut violations = Vec::new();

        Self::check_contact(request, &mut violations);

        match offering.category.pricing_basis() {
            PricingBasis::PerNight => {
                if request.check_in.is_none() {
                    violations.push(Violation::MissingCheckIn);
                }
                if request.check_out.is_none() {
                    violations.push(Violation::MissingCheckOut);
                }
                if let (Some(check_in), Some(check_out)) = (request.check_in, request.check_out) {
                    if (check_out - check_in).num_days().abs() < 1 {
                        violations.push(Violation::EmptyDateRange);
                    }
                }
            }
            PricingBasis::PerDay => {
                if request.pickup_date.is_none() {
                    violations.push(Violation::MissingPickupDate);
                }
                if request.return_date.is_none() {
                    violations.push(Violation::MissingReturnDate);
                }
                if let (Some(pickup), Some(ret)) = (request.pickup_date, request.return_date) {
                    if (ret - pickup).num_days().abs() < 1 {
                        violations.push(Violation::EmptyDateRange);
                    }
                }
                if Self::blank(request.pickup_location.as_deref()) {
                    violations.push(Violation::MissingPickupLocation);
                }
                if Self::blank(request.dropoff_location.as_deref()) {
                    violations.push(Violation::MissingDropoffLocation);
                }
            }
            PricingBasis::PerPerson => {
                if request.start_date.is_none() {
                    violations.push(Violation::MissingStartDate);
                }
                match request.party_size {
                    None | Some(0) => violations.push(Violation::PartySizeTooSmall),
                    Some(size) => {
                        if let Some(capacity) = offering.capacity {
                            if size > capacity {
                                violations.push(Violation::PartySizeTooLarge(capacity));
                            }
                        }
                    }
                }
            }
        }

        violations
    }

    fn check_contact(request: &ReservationRequest, violations: &mut Vec<Violation>) {
        if request.full_name.trim().is_empty() {
            violations.push(Violation::MissingFullName);
        }
        let email = request.email.trim();
        if email.is_empty() {
            violations.push(Violation::MissingEmail);
        } else if !email_regex().is_match(email) {
            violations.push(Violation::InvalidEmail);
        }
        if request.phone.trim().is_empty() {
            violations.push(Violation::MissingPhone);
        }
    }

    fn blank(value: Option<&str>) -> bool {
        value.map_or(true, |v| v.trim().is_empty())
    }
}
