use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::subscriptions::{InsertSubscriptionEntity, SubscriptionEntity};

#[async_trait]
#[automock]
pub trait SubscriptionRepository {
    async fn insert(&self, insert_entity: InsertSubscriptionEntity) -> Result<SubscriptionEntity>;
    async fn find_by_id(&self, subscription_id: Uuid) -> Result<Option<SubscriptionEntity>>;
    /// The user's current active subscription, if its end date is still ahead.
    async fn find_active_by_user(&self, user_id: Uuid) -> Result<Option<SubscriptionEntity>>;
    async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SubscriptionEntity>>;

    async fn activate(
        &self,
        subscription_id: Uuid,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Result<SubscriptionEntity>;
    async fn cancel(
        &self,
        subscription_id: Uuid,
        cancelled_at: DateTime<Utc>,
    ) -> Result<SubscriptionEntity>;
    /// Renewal: forces status back to active and moves the billing window.
    async fn renew(
        &self,
        subscription_id: Uuid,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Result<SubscriptionEntity>;

    // Sweep queries. Rows are processed independently by the caller so one
    // failure cannot abort a whole sweep.
    async fn list_active(&self) -> Result<Vec<SubscriptionEntity>>;
    async fn list_active_ended_before(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<SubscriptionEntity>>;
    async fn list_active_ending_between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<SubscriptionEntity>>;
    async fn list_pending_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<SubscriptionEntity>>;
    async fn mark_expired(&self, subscription_id: Uuid) -> Result<()>;
    async fn mark_deleted(&self, subscription_id: Uuid, cancelled_at: DateTime<Utc>)
        -> Result<()>;
}
