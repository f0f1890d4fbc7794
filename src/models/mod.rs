pub mod booking;
pub mod offering;
pub mod payment;
pub mod reservation;
pub mod user;
