use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::subscriptions::SubscriptionEntity;

/// Delivery channel for renewal reminders. The sweep only decides *who* gets
/// reminded; delivery lives behind this seam.
#[async_trait]
#[automock]
pub trait RenewalNotifier {
    async fn notify_renewal_due(
        &self,
        subscription: &SubscriptionEntity,
        days_left: i64,
    ) -> Result<()>;
}
