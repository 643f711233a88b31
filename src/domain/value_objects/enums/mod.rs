pub mod order_statuses;
