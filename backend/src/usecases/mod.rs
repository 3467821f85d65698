pub mod credits;
pub mod subscriptions;
pub mod video_tasks;
