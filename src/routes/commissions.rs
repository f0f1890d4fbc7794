use actix_web::{web, HttpResponse, Responder};
use bson::oid::ObjectId;
use serde_json::json;
use std::sync::Arc;

use crate::services::commission_service::CommissionService;

pub async fn get_commission_report(
    service: web::Data<Arc<CommissionService>>,
) -> impl Responder {
    match service.report().await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(err) => {
            eprintln!("Failed to build commission report: {}", err);
            HttpResponse::InternalServerError().body("Failed to build commission report.")
        }
    }
}

pub async fn mark_commission_paid(
    service: web::Data<Arc<CommissionService>>,
    path: web::Path<String>,
) -> impl Responder {
    let payment_id = match ObjectId::parse_str(path.as_str()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid payment ID"),
    };

    match service.mark_partner_paid(&payment_id).await {
        Ok(true) => HttpResponse::Ok().json(json!({
            "payment_id": payment_id.to_hex(),
            "is_commission_paid": true,
        })),
        Ok(false) => HttpResponse::NotFound().body("Payment not found"),
        Err(err) => {
            eprintln!("Failed to mark commission paid for {}: {}", payment_id, err);
            HttpResponse::InternalServerError().body("Failed to update payment.")
        }
    }
}
