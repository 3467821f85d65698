pub mod content;
pub mod credit_ledger;
pub mod generation_tasks;
pub mod generative;
pub mod jobs;
pub mod media;
pub mod notify;
pub mod payments;
pub mod storage;
pub mod subscriptions;
