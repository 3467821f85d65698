pub mod input_kinds;
pub mod job_statuses;
pub mod subscription_periods;
pub mod subscription_statuses;
pub mod subscription_types;
pub mod task_statuses;
pub mod transaction_types;
