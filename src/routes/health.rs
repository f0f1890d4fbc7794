use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;
use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use crate::db::store::BookingStore;

#[derive(Serialize)]
struct HealthStatus {
    status: String,
    services: HashMap<String, ServiceStatus>,
    environment: String,
    version: String,
}

#[derive(Serialize, Clone)]
struct ServiceStatus {
    status: String,
    details: Option<String>,
}

pub async fn health_check(store: web::Data<Arc<dyn BookingStore>>) -> impl Responder {
    let mut health = HealthStatus {
        status: "ok".to_string(),
        services: HashMap::new(),
        environment: env::var("RUST_ENV").unwrap_or("development".to_string()),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let store_result = check_store(store.get_ref()).await;
    health
        .services
        .insert("store".to_string(), store_result.clone());

    health
        .services
        .insert("payments".to_string(), check_payment_provider());

    health
        .services
        .insert("email".to_string(), check_email_provider());

    // Only an unreachable store degrades the service; the payment and email
    // fallbacks are still able to take bookings.
    if store_result.status != "ok" {
        health.status = "degraded".to_string();
    }

    HttpResponse::Ok().json(health)
}

async fn check_store(store: &Arc<dyn BookingStore>) -> ServiceStatus {
    match store.ping().await {
        Ok(_) => ServiceStatus {
            status: "ok".to_string(),
            details: Some(format!("{} backend reachable", store.backend_name())),
        },
        Err(e) => {
            eprintln!("Store health check failed: {}", e);

            ServiceStatus {
                status: "error".to_string(),
                details: Some(format!("Failed to reach {}: {}", store.backend_name(), e)),
            }
        }
    }
}

fn check_payment_provider() -> ServiceStatus {
    match env::var("STRIPE_SECRET_KEY") {
        Ok(key) => {
            let masked_key = if key.len() > 8 {
                format!("{}***{}", &key[0..4], &key[key.len() - 4..])
            } else {
                "***".to_string()
            };

            ServiceStatus {
                status: "ok".to_string(),
                details: Some(format!("Stripe configured ({})", masked_key)),
            }
        }
        Err(_) => ServiceStatus {
            status: "ok".to_string(),
            details: Some("STRIPE_SECRET_KEY not set, mock authorizer active".to_string()),
        },
    }
}

fn check_email_provider() -> ServiceStatus {
    match env::var("SENDGRID_API_KEY") {
        Ok(_) => ServiceStatus {
            status: "ok".to_string(),
            details: Some("SendGrid configured".to_string()),
        },
        Err(_) => ServiceStatus {
            status: "ok".to_string(),
            details: Some("SENDGRID_API_KEY not set, confirmations disabled".to_string()),
        },
    }
}
