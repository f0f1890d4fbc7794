use actix_web::{web, HttpResponse, Responder};
use bson::oid::ObjectId;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::db::store::BookingStore;
use crate::services::booking_builder::BookingRequestBuilder;

#[derive(Debug, Deserialize)]
pub struct OfferingFilter {
    pub category: Option<String>,
}

pub async fn get_offerings(
    store: web::Data<Arc<dyn BookingStore>>,
    filter: web::Query<OfferingFilter>,
) -> impl Responder {
    let category = match &filter.category {
        Some(raw) => match BookingRequestBuilder::normalize_category(raw) {
            Some(category) => Some(category),
            None => {
                return HttpResponse::BadRequest().json(json!({
                    "error": format!("Unknown service category '{}'", raw)
                }));
            }
        },
        None => None,
    };

    match store.list_offerings(category).await {
        Ok(offerings) => HttpResponse::Ok().json(offerings),
        Err(err) => {
            eprintln!("Failed to list offerings: {}", err);
            HttpResponse::InternalServerError().body("Failed to list offerings.")
        }
    }
}

pub async fn get_offering_by_id(
    store: web::Data<Arc<dyn BookingStore>>,
    path: web::Path<String>,
) -> impl Responder {
    let id = match ObjectId::parse_str(path.as_str()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid offering ID"),
    };

    match store.find_offering(&id).await {
        Ok(Some(offering)) => HttpResponse::Ok().json(offering),
        Ok(None) => HttpResponse::NotFound().body("Offering not found"),
        Err(err) => {
            eprintln!("Failed to load offering {}: {}", id, err);
            HttpResponse::InternalServerError().body("Failed to load offering.")
        }
    }
}
