pub mod booking_builder;
pub mod booking_orchestrator;
pub mod commission_service;
pub mod notification_service;
pub mod payment;
pub mod pricing_service;
pub mod reservation_validator;
pub mod stripe;
