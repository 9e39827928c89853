pub mod appointment;
pub mod auth;
pub mod clinic;
pub mod doctor;
pub mod error;
pub mod payment;
pub mod record;
pub mod schedule;
pub mod user;
