use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

/// Canonical service categories. The booking forms and the storage schema
/// historically used diverging labels ("apartment", "appartements", ...);
/// everything is normalized to these tags before anything is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum ServiceCategory {
    #[serde(rename = "hotel")]
    Hotel,
    #[serde(rename = "appartement")]
    Appartement,
    #[serde(rename = "villa")]
    Villa,
    #[serde(rename = "voiture")]
    Voiture,
    #[serde(rename = "circuit")]
    Circuit,
}

/// What one unit of `ServiceOffering::unit_price` buys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricingBasis {
    PerNight,
    PerDay,
    PerPerson,
}

impl ServiceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::Hotel => "hotel",
            ServiceCategory::Appartement => "appartement",
            ServiceCategory::Villa => "villa",
            ServiceCategory::Voiture => "voiture",
            ServiceCategory::Circuit => "circuit",
        }
    }

    pub fn pricing_basis(&self) -> PricingBasis {
        match self {
            ServiceCategory::Hotel | ServiceCategory::Appartement | ServiceCategory::Villa => {
                PricingBasis::PerNight
            }
            ServiceCategory::Voiture => PricingBasis::PerDay,
            ServiceCategory::Circuit => PricingBasis::PerPerson,
        }
    }

    pub fn is_accommodation(&self) -> bool {
        matches!(self.pricing_basis(), PricingBasis::PerNight)
    }
}

impl std::fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A bookable unit listed on the marketplace. Attributes are read at booking
/// time; the price is never locked for the duration of an attempt.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceOffering {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// None means the offering is operated by the platform itself.
    pub partner_id: Option<ObjectId>,
    pub category: ServiceCategory,
    pub title: String,
    pub city: String,
    /// MAD. Per night for accommodation, per day for vehicles, per person
    /// for circuits.
    pub unit_price: f64,
    /// Maximum party size, when the offering declares one.
    pub capacity: Option<u32>,
    /// Default length for circuits, in days.
    pub duration_days: Option<u32>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}
