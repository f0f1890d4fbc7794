use reqwest;
use serde::{Deserialize, Serialize};
use std::env;

use crate::models::booking::Booking;
use crate::models::payment::PaymentRecord;

#[derive(Debug, Serialize, Deserialize)]
pub struct SendGridEmail {
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendGridPersonalization {
    pub to: Vec<SendGridEmail>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendGridContent {
    #[serde(rename = "type")]
    pub content_type: String,
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendGridRequest {
    pub personalizations: Vec<SendGridPersonalization>,
    pub from: SendGridEmail,
    pub subject: String,
    pub content: Vec<SendGridContent>,
}

#[derive(Debug)]
pub enum NotificationError {
    EnvironmentError(String),
    RequestError(String),
    ApiError(String),
}

impl std::fmt::Display for NotificationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationError::EnvironmentError(err) => write!(f, "Environment error: {}", err),
            NotificationError::RequestError(err) => write!(f, "Request error: {}", err),
            NotificationError::ApiError(err) => write!(f, "API error: {}", err),
        }
    }
}

impl std::error::Error for NotificationError {}

pub struct NotificationService {
    api_key: String,
    from_email: String,
    client: reqwest::Client,
}

impl NotificationService {
    pub fn new() -> Result<Self, NotificationError> {
        let api_key = env::var("SENDGRID_API_KEY").map_err(|_| {
            NotificationError::EnvironmentError("SENDGRID_API_KEY not set".to_string())
        })?;
        let from_email = env::var("FROM_EMAIL")
            .unwrap_or_else(|_| "bookings@atlasvoyages.ma".to_string());

        let client = reqwest::Client::new();

        Ok(Self {
            api_key,
            from_email,
            client,
        })
    }

    /// Confirmation sent after a successful capture. Failures here are the
    /// caller's to log; the booking is already confirmed and paid.
    pub async fn notify_booking_confirmed(
        &self,
        booking: &Booking,
        payment: &PaymentRecord,
        service_title: &str,
    ) -> Result<(), NotificationError> {
        let subject = format!("Booking {} confirmed", booking.reference);
        let body = format!(
            "Hello {},\n\n\
             Your booking {} for {} is confirmed.\n\
             From {} to {}.\n\
             Amount charged: {:.2} {} (transaction {}).\n\n\
             We wish you a pleasant trip!",
            booking.contact.full_name,
            booking.reference,
            service_title,
            booking.params.start_date(),
            booking.params.end_date(),
            payment.amount_minor as f64 / 100.0,
            payment.currency,
            payment.transaction_ref,
        );

        self.send_email(&booking.contact.email, &subject, &body).await
    }

    pub async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        content: &str,
    ) -> Result<(), NotificationError> {
        let url = "https://api.sendgrid.com/v3/mail/send";

        let request = SendGridRequest {
            personalizations: vec![SendGridPersonalization {
                to: vec![SendGridEmail {
                    email: to_email.to_string(),
                }],
            }],
            from: SendGridEmail {
                email: self.from_email.clone(),
            },
            subject: subject.to_string(),
            content: vec![SendGridContent {
                content_type: "text/plain".to_string(),
                value: content.to_string(),
            }],
        };

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| NotificationError::RequestError(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(NotificationError::ApiError(format!(
                "Status: {}, Body: {}",
                status, body
            )))
        }
    }
}
