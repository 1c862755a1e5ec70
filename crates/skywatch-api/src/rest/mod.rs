// Ground-station REST endpoints
//
// Hand-written client for the Flask backend under `/api`: auth, telemetry,
// sensors, fire reports, user profile, servo actuation and camera frames.

pub mod auth;
pub mod client;
pub mod models;
pub mod reports;
pub mod servo;
pub mod telemetry;
pub mod user;
pub mod video;

pub use client::ApiClient;
