use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use crate::services::payment::interface::{
    ChargeRequest, PaymentAuthorization, PaymentAuthorizer, PaymentFailure,
};

/// In-process authorizer for local runs and tests. Recognizes two magic
/// payment method tokens: `pm_declined` fails like a declined card and
/// `pm_provider_down` fails like a provider outage. Everything else
/// captures instantly.
#[derive(Default)]
pub struct MockPaymentAuthorizer {
    calls: AtomicU32,
}

impl MockPaymentAuthorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many capture attempts reached the provider.
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentAuthorizer for MockPaymentAuthorizer {
    async fn authorize(
        &self,
        charge: &ChargeRequest,
    ) -> Result<PaymentAuthorization, PaymentFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match charge.payment_method_id.as_str() {
            "pm_declined" => Err(PaymentFailure::Declined {
                reason: "Your card was declined".to_string(),
            }),
            "pm_provider_down" => Err(PaymentFailure::Provider {
                reason: "Connection reset by provider".to_string(),
            }),
            _ => Ok(PaymentAuthorization {
                transaction_ref: format!("mock_pi_{}", Uuid::new_v4().simple()),
                amount_minor: charge.amount_minor,
                currency: charge.currency.clone(),
            }),
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
