use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raw booking-form state, exactly as a client submits it. Which fields are
/// required depends on the category; the validator decides. Contact fields
/// default to empty strings so an incomplete form still deserializes and can
/// be reported rule by rule.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReservationRequest {
    pub offering_id: String,
    /// Raw category label. Synonyms are accepted and normalized by the
    /// booking builder.
    pub category: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub pickup_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub pickup_location: Option<String>,
    pub dropoff_location: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub party_size: Option<u32>,
    pub special_requests: Option<String>,
}

/// Validated per-category parameters, denormalized onto the booking record.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "kind")]
pub enum ReservationParams {
    #[serde(rename = "stay")]
    Stay {
        check_in: NaiveDate,
        check_out: NaiveDate,
        guests: u32,
    },
    #[serde(rename = "rental")]
    Rental {
        pickup_date: NaiveDate,
        return_date: NaiveDate,
        pickup_location: String,
        dropoff_location: String,
    },
    #[serde(rename = "tour")]
    Tour {
        start_date: NaiveDate,
        party_size: u32,
        duration_days: u32,
    },
}

impl ReservationParams {
    /// First day of service, as printed on the confirmation email.
    pub fn start_date(&self) -> NaiveDate {
        match self {
            ReservationParams::Stay { check_in, .. } => *check_in,
            ReservationParams::Rental { pickup_date, .. } => *pickup_date,
            ReservationParams::Tour { start_date, .. } => *start_date,
        }
    }

    /// Last day of service. Circuits end `duration_days` after they start.
    pub fn end_date(&self) -> NaiveDate {
        match self {
            ReservationParams::Stay { check_out, .. } => *check_out,
            ReservationParams::Rental { return_date, .. } => *return_date,
            ReservationParams::Tour {
                start_date,
                duration_days,
                ..
            } => *start_date + Duration::days(*duration_days as i64),
        }
    }
}

/// Snapshot of an in-progress reservation, saved before an authentication
/// redirect and resumed afterwards. Drafts expire so a stale form (and its
/// stale price) is never resumed silently.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReservationDraft {
    pub draft_id: Uuid,
    pub request: ReservationRequest,
    pub saved_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct DraftExpired {
    pub draft_id: Uuid,
    pub expired_at: DateTime<Utc>,
}

impl std::fmt::Display for DraftExpired {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Draft {} expired at {}", self.draft_id, self.expired_at)
    }
}

impl std::error::Error for DraftExpired {}

impl ReservationDraft {
    pub const TTL_MINUTES: i64 = 60;

    pub fn snapshot(request: ReservationRequest, now: DateTime<Utc>) -> Self {
        Self {
            draft_id: Uuid::new_v4(),
            request,
            saved_at: now,
            expires_at: now + Duration::minutes(Self::TTL_MINUTES),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Hands the saved request back to the booking flow, re-entering it at
    /// the draft stage.
    pub fn resume(self, now: DateTime<Utc>) -> Result<ReservationRequest, DraftExpired> {
        if self.is_expired(now) {
            return Err(DraftExpired {
                draft_id: self.draft_id,
                expired_at: self.expires_at,
            });
        }
        Ok(self.request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ReservationRequest {
        ReservationRequest {
            offering_id: "64b0c0ffee0000000000aaaa".to_string(),
            category: "hotel".to_string(),
            full_name: "Leila Benani".to_string(),
            email: "leila@example.com".to_string(),
            phone: "+212600000000".to_string(),
            check_in: NaiveDate::from_ymd_opt(2024, 6, 1),
            check_out: NaiveDate::from_ymd_opt(2024, 6, 4),
            pickup_date: None,
            return_date: None,
            pickup_location: None,
            dropoff_location: None,
            start_date: None,
            party_size: Some(2),
            special_requests: None,
        }
    }

    #[test]
    fn draft_resumes_before_expiry() {
        let now = Utc::now();
        let draft = ReservationDraft::snapshot(request(), now);

        let resumed = draft
            .resume(now + Duration::minutes(30))
            .expect("draft should still be valid");
        assert_eq!(resumed.email, "leila@example.com");
    }

    #[test]
    fn draft_refuses_to_resume_after_expiry() {
        let now = Utc::now();
        let draft = ReservationDraft::snapshot(request(), now);
        let expires_at = draft.expires_at;

        let err = draft
            .resume(now + Duration::minutes(ReservationDraft::TTL_MINUTES + 1))
            .expect_err("expired draft must not resume");
        assert_eq!(err.expired_at, expires_at);
    }

    #[test]
    fn tour_end_date_runs_for_the_full_duration() {
        let params = ReservationParams::Tour {
            start_date: NaiveDate::from_ymd_opt(2024, 9, 10).unwrap(),
            party_size: 4,
            duration_days: 3,
        };

        assert_eq!(params.start_date(), NaiveDate::from_ymd_opt(2024, 9, 10).unwrap());
        assert_eq!(params.end_date(), NaiveDate::from_ymd_opt(2024, 9, 13).unwrap());
    }
}
