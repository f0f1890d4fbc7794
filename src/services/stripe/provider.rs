use std::str::FromStr;

use async_trait::async_trait;

use crate::services::payment::interface::{
    ChargeRequest, PaymentAuthorization, PaymentAuthorizer, PaymentFailure,
};

pub struct StripeAuthorizer {
    pub client: stripe::Client,
}

impl StripeAuthorizer {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: stripe::Client::new(api_key.into()),
        }
    }

    pub fn from_env() -> Option<Self> {
        std::env::var("STRIPE_SECRET_KEY").ok().map(Self::new)
    }

    fn currency_for(code: &str) -> Result<stripe::Currency, PaymentFailure> {
        match code.to_ascii_uppercase().as_str() {
            "MAD" => Ok(stripe::Currency::MAD),
            "EUR" => Ok(stripe::Currency::EUR),
            "USD" => Ok(stripe::Currency::USD),
            other => Err(PaymentFailure::Rejected {
                reason: format!("Unsupported currency '{}'", other),
            }),
        }
    }

    fn map_stripe_error(err: stripe::StripeError) -> PaymentFailure {
        match err {
            stripe::StripeError::Stripe(request_error) => {
                let reason = request_error
                    .message
                    .clone()
                    .unwrap_or_else(|| "The payment could not be processed".to_string());
                match request_error.error_type {
                    stripe::ErrorType::Card => PaymentFailure::Declined { reason },
                    stripe::ErrorType::InvalidRequest => PaymentFailure::Rejected { reason },
                    _ => PaymentFailure::Provider { reason },
                }
            }
            other => PaymentFailure::Provider {
                reason: format!("{}", other),
            },
        }
    }
}

#[async_trait]
impl PaymentAuthorizer for StripeAuthorizer {
    /// Creates and confirms a payment intent in one call, so the capture
    /// happens exactly once or not at all. Flows that would need a second
    /// customer action are failed instead of left half-open.
    async fn authorize(
        &self,
        charge: &ChargeRequest,
    ) -> Result<PaymentAuthorization, PaymentFailure> {
        let currency = Self::currency_for(&charge.currency)?;
        let payment_method =
            stripe::PaymentMethodId::from_str(&charge.payment_method_id).map_err(|_| {
                PaymentFailure::Rejected {
                    reason: format!("Invalid payment method ID '{}'", charge.payment_method_id),
                }
            })?;

        let mut create_intent = stripe::CreatePaymentIntent::new(charge.amount_minor, currency);
        create_intent.payment_method = Some(payment_method);
        create_intent.confirm = Some(true);
        create_intent.description = Some(&charge.description);
        create_intent.receipt_email = charge.receipt_email.as_deref();
        create_intent.error_on_requires_action = Some(true);

        let intent = stripe::PaymentIntent::create(&self.client, create_intent)
            .await
            .map_err(Self::map_stripe_error)?;

        match intent.status {
            stripe::PaymentIntentStatus::Succeeded => Ok(PaymentAuthorization {
                transaction_ref: intent.id.to_string(),
                amount_minor: intent.amount,
                currency: charge.currency.clone(),
            }),
            status => Err(PaymentFailure::Rejected {
                reason: format!("Payment intent ended in status {:?}", status),
            }),
        }
    }

    fn provider_name(&self) -> &'static str {
        "stripe"
    }
}
