pub mod bookings;
pub mod commissions;
pub mod health;
pub mod offerings;
