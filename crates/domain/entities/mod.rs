pub mod credit_transactions;
pub mod generation_tasks;
pub mod jobs;
pub mod redeem_codes;
pub mod subscriptions;
pub mod users;
