pub mod axum_http;
pub mod pesapal;
pub mod postgres;
