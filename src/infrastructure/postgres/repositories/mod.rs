pub mod ipn_logs;
pub mod orders;
pub mod plans;
pub mod subscriptions;
