use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App, HttpResponse};
use bson::oid::ObjectId;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;

use atlas_bookings_api::db::store::{BookingStore, MemoryBookingStore};
use atlas_bookings_api::middleware::auth::{AuthMiddleware, Claims};
use atlas_bookings_api::middleware::role_auth::RequireRole;
use atlas_bookings_api::models::offering::{ServiceCategory, ServiceOffering};
use atlas_bookings_api::models::user::UserRole;
use atlas_bookings_api::routes;
use atlas_bookings_api::services::booking_orchestrator::BookingOrchestrator;
use atlas_bookings_api::services::commission_service::CommissionService;
use atlas_bookings_api::services::payment::interface::PaymentAuthorizer;
use atlas_bookings_api::services::payment::mock::MockPaymentAuthorizer;

pub const TEST_JWT_SECRET: &str = "test_secret";

/// Full application wired against the in-memory store and the mock payment
/// authorizer. Each test gets its own isolated state; the handles let tests
/// seed offerings, flip fault switches and count captures.
pub struct TestApp {
    pub store: Arc<MemoryBookingStore>,
    pub authorizer: Arc<MockPaymentAuthorizer>,
    pub orchestrator: Arc<BookingOrchestrator>,
    pub commissions: Arc<CommissionService>,
}

impl TestApp {
    pub fn new() -> Self {
        std::env::set_var("JWT_SECRET", TEST_JWT_SECRET);

        let store = Arc::new(MemoryBookingStore::new());
        let authorizer = Arc::new(MockPaymentAuthorizer::new());

        let store_dyn: Arc<dyn BookingStore> = store.clone();
        let authorizer_dyn: Arc<dyn PaymentAuthorizer> = authorizer.clone();

        let orchestrator = Arc::new(BookingOrchestrator::new(
            store_dyn.clone(),
            authorizer_dyn,
            None,
        ));
        let commissions = Arc::new(CommissionService::new(store_dyn));

        Self {
            store,
            authorizer,
            orchestrator,
            commissions,
        }
    }

    pub fn create_app(
        &self,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let store: Arc<dyn BookingStore> = self.store.clone();

        App::new()
            // `init_service` drives the app service directly, skipping the
            // actix-http dispatcher that renders service-level errors
            // (middleware rejections) as HTTP responses; mirror that
            // conversion here so guard tests observe the 401/403 a real
            // server would send. The original request is gone once the
            // inner service errors (and cloning it across the call is
            // forbidden by actix's router), so the rendered response is
            // attached to a placeholder request, which no test inspects.
            .wrap_fn(|req, srv| {
                let fut = srv.call(req);
                async move {
                    Ok(fut.await.unwrap_or_else(|err| {
                        ServiceResponse::new(
                            test::TestRequest::default().to_http_request(),
                            HttpResponse::from_error(err),
                        )
                    }))
                }
            })
            .app_data(web::Data::new(store))
            .app_data(web::Data::new(self.orchestrator.clone()))
            .app_data(web::Data::new(self.commissions.clone()))
            .route("/health", web::get().to(routes::health::health_check))
            .service(
                web::scope("/api")
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
    }

    pub fn seed_hotel(&self, partner_id: Option<ObjectId>) -> ObjectId {
        self.store.seed_offering(offering(
            ServiceCategory::Hotel,
            "Riad Yasmine",
            "Marrakech",
            300.0,
            partner_id,
            None,
            None,
        ))
    }

    pub fn seed_apartment(&self, partner_id: Option<ObjectId>) -> ObjectId {
        self.store.seed_offering(offering(
            ServiceCategory::Appartement,
            "Appartement Gueliz",
            "Marrakech",
            300.0,
            partner_id,
            None,
            None,
        ))
    }

    pub fn seed_car(&self, partner_id: Option<ObjectId>) -> ObjectId {
        self.store.seed_offering(offering(
            ServiceCategory::Voiture,
            "Dacia Duster",
            "Agadir",
            250.0,
            partner_id,
            None,
            None,
        ))
    }

    pub fn seed_circuit(&self, partner_id: Option<ObjectId>, capacity: u32) -> ObjectId {
        self.store.seed_offering(offering(
            ServiceCategory::Circuit,
            "Circuit du Sud",
            "Ouarzazate",
            800.0,
            partner_id,
            Some(capacity),
            Some(3),
        ))
    }
}

fn offering(
    category: ServiceCategory,
    title: &str,
    city: &str,
    unit_price: f64,
    partner_id: Option<ObjectId>,
    capacity: Option<u32>,
    duration_days: Option<u32>,
) -> ServiceOffering {
    ServiceOffering {
        id: None,
        partner_id,
        category,
        title: title.to_string(),
        city: city.to_string(),
        unit_price,
        capacity,
        duration_days,
        description: None,
        images: None,
        created_at: None,
        updated_at: None,
    }
}

pub fn auth_token(user_id: &ObjectId, role: &str) -> String {
    std::env::set_var("JWT_SECRET", TEST_JWT_SECRET);
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: "client@example.com".to_string(),
        exp: now + 3600,
        iat: now,
        user_id: user_id.to_hex(),
        role: Some(role.to_string()),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {}", token)
}

pub fn hotel_request(offering_id: &ObjectId) -> Value {
    json!({
        "offering_id": offering_id.to_hex(),
        "category": "hotel",
        "full_name": "Amina Benali",
        "email": "amina@example.com",
        "phone": "+212600000000",
        "check_in": "2024-06-01",
        "check_out": "2024-06-04",
    })
}

pub fn apartment_request(offering_id: &ObjectId) -> Value {
    json!({
        "offering_id": offering_id.to_hex(),
        "category": "appartement",
        "full_name": "Amina Benali",
        "email": "amina@example.com",
        "phone": "+212600000000",
        "check_in": "2024-06-01",
        "check_out": "2024-06-04",
    })
}

pub fn car_request(offering_id: &ObjectId) -> Value {
    json!({
        "offering_id": offering_id.to_hex(),
        "category": "voiture",
        "full_name": "Amina Benali",
        "email": "amina@example.com",
        "phone": "+212600000000",
        "pickup_date": "2024-07-10",
        "return_date": "2024-07-12",
        "pickup_location": "Aéroport Agadir",
        "dropoff_location": "Centre-ville Agadir",
    })
}

pub fn circuit_request(offering_id: &ObjectId) -> Value {
    json!({
        "offering_id": offering_id.to_hex(),
        "category": "circuit",
        "full_name": "Amina Benali",
        "email": "amina@example.com",
        "phone": "+212600000000",
        "start_date": "2024-09-15",
        "party_size": 4,
    })
}
