pub mod credit_ledger;
pub mod generation_tasks;
pub mod jobs;
pub mod subscriptions;
