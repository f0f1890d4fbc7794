use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use atlas_bookings_api::db;
use atlas_bookings_api::db::store::{BookingStore, MemoryBookingStore, MongoBookingStore};
use atlas_bookings_api::middleware::auth::AuthMiddleware;
use atlas_bookings_api::middleware::role_auth::RequireRole;
use atlas_bookings_api::models::user::UserRole;
use atlas_bookings_api::routes;
use atlas_bookings_api::services::booking_orchestrator::BookingOrchestrator;
use atlas_bookings_api::services::commission_service::CommissionService;
use atlas_bookings_api::services::notification_service::NotificationService;
use atlas_bookings_api::services::payment::interface::PaymentAuthorizer;
use atlas_bookings_api::services::payment::mock::MockPaymentAuthorizer;
use atlas_bookings_api::services::stripe::provider::StripeAuthorizer;

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    println!("Application starting...");

    env_logger::init_from_env(Env::default().default_filter_or("info"));
    println!("Logger initialized");

    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    } else {
        println!("Release mode");
    }

    let host = std::env::var("HOST").unwrap_or_else(|_| HOST.to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| PORT.to_string())
        .parse()
        .unwrap_or(PORT);
    println!("Attempting to bind to {}:{}", host, port);

    let store: Arc<dyn BookingStore> = match std::env::var("MONGODB_URI") {
        Ok(uri) => {
            let client = db::mongo::create_mongo_client(&uri).await;
            println!("MongoDB connection established");
            Arc::new(MongoBookingStore::new(client))
        }
        Err(_) => {
            println!("MONGODB_URI not set, using the in-memory store");
            Arc::new(MemoryBookingStore::new())
        }
    };

    let authorizer: Arc<dyn PaymentAuthorizer> = match StripeAuthorizer::from_env() {
        Some(stripe) => {
            println!("Stripe payment provider configured");
            Arc::new(stripe)
        }
        None => {
            println!("STRIPE_SECRET_KEY not set, using the mock payment authorizer");
            Arc::new(MockPaymentAuthorizer::new())
        }
    };

    let notifier = match NotificationService::new() {
        Ok(service) => Some(Arc::new(service)),
        Err(err) => {
            println!("Booking confirmations disabled: {}", err);
            None
        }
    };

    let orchestrator = Arc::new(BookingOrchestrator::new(
        store.clone(),
        authorizer.clone(),
        notifier,
    ));
    let commission_service = Arc::new(CommissionService::new(store.clone()));

    println!("Starting HTTP server...");

    HttpServer::new(move || {
        let cors = match std::env::var("CORS_ALLOWED_ORIGIN") {
            Ok(origin) => Cors::default()
                .allowed_origin(&origin)
                .allowed_methods(vec!["GET", "POST", "PUT"])
                .allow_any_header()
                .max_age(3600),
            Err(_) => Cors::permissive(),
        };

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(orchestrator.clone()))
            .app_data(web::Data::new(commission_service.clone()))
            .route("/health", web::get().to(routes::health::health_check))
            .service(
                web::scope("/api")
                    // Public routes
                    .service(
                        web::scope("/offerings")
                            .route("", web::get().to(routes::offerings::get_offerings))
                            .route(
                                "/{id}",
                                web::get().to(routes::offerings::get_offering_by_id),
                            ),
                    )
                    .service(
                        web::scope("/bookings")
                            .route("/quote", web::post().to(routes::bookings::quote_booking))
                            .route("/draft", web::post().to(routes::bookings::save_draft))
                            .route(
                                "/draft/resume",
                                web::post().to(routes::bookings::resume_draft),
                            )
                            // Protected routes
                            .service(
                                web::scope("")
                                    .wrap(AuthMiddleware)
                                    .route("", web::post().to(routes::bookings::create_booking))
                                    .route(
                                        "/{id}/pay",
                                        web::post().to(routes::bookings::pay_booking),
                                    ),
                            ),
                    )
                    .service(
                        web::scope("/account")
                            .wrap(AuthMiddleware)
                            .route(
                                "/{user_id}/bookings",
                                web::get().to(routes::bookings::get_bookings),
                            )
                            .route(
                                "/{user_id}/bookings/{booking_id}",
                                web::get().to(routes::bookings::get_booking_by_id),
                            ),
                    )
                    .service(
                        web::scope("/admin")
                            .wrap(RequireRole::new(UserRole::Admin))
                            .wrap(AuthMiddleware)
                            .route(
                                "/commissions",
                                web::get().to(routes::commissions::get_commission_report),
                            )
                            .route(
                                "/commissions/{payment_id}/paid",
                                web::put().to(routes::commissions::mark_commission_paid),
                            ),
                    ),
            )
    })
    .bind((host, port))?
    .run()
    .await
}
