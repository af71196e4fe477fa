//! Mailhook — webhook that renders a templated email and sends it via Resend.

pub mod config;
pub mod error;
pub mod provider;
pub mod request;
pub mod routes;
pub mod templates;
