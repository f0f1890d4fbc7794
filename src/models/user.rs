use serde::{Deserialize, Serialize};

/// Marketplace roles carried in the JWT. Admins pass every role gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum UserRole {
    #[serde(rename = "client")]
    Client,
    #[serde(rename = "partner")]
    Partner,
    #[serde(rename = "admin")]
    Admin,
}

impl UserRole {
    pub fn from_claim(role: Option<&str>) -> Self {
        match role {
            Some("admin") => UserRole::Admin,
            Some("partner") => UserRole::Partner,
            _ => UserRole::Client,
        }
    }
}
