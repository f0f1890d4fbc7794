use async_trait::async_trait;

/// A capture instruction handed to whichever payment provider is wired in.
/// Amounts are integer minor units; nothing downstream of this struct sees
/// a floating-point dirham.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub amount_minor: i64,
    pub currency: String,
    pub payment_method_id: String,
    pub description: String,
    pub receipt_email: Option<String>,
}

/// Proof that funds were captured: the provider's transaction reference and
/// the exact amount it settled.
#[derive(Debug, Clone)]
pub struct PaymentAuthorization {
    pub transaction_ref: String,
    pub amount_minor: i64,
    pub currency: String,
}

/// Why a capture did not happen. `Declined` and `Rejected` are final for
/// the submitted payment method; `Provider` failures may succeed on retry.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentFailure {
    Declined { reason: String },
    Rejected { reason: String },
    Provider { reason: String },
}

impl std::fmt::Display for PaymentFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentFailure::Declined { reason } => write!(f, "Payment declined: {}", reason),
            PaymentFailure::Rejected { reason } => write!(f, "Payment rejected: {}", reason),
            PaymentFailure::Provider { reason } => {
                write!(f, "Payment provider error: {}", reason)
            }
        }
    }
}

impl std::error::Error for PaymentFailure {}

/// Single-call capture seam. Implementations must either capture the full
/// amount and return an authorization, or capture nothing and return a
/// failure; partial captures are not modelled.
#[async_trait]
pub trait PaymentAuthorizer: Send + Sync {
    async fn authorize(&self, charge: &ChargeRequest) -> Result<PaymentAuthorization, PaymentFailure>;

    fn provider_name(&self) -> &'static str;
}
