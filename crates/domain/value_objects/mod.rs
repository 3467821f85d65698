pub mod credits;
pub mod enums;
pub mod errors;
pub mod generation_tasks;
pub mod jobs;
pub mod languages;
pub mod payment_events;
pub mod plans;
pub mod storage;
pub mod subscriptions;
