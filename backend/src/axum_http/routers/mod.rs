pub mod credits;
pub mod payment_webhook;
pub mod videos;
