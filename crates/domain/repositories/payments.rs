use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::{
    entities::subscriptions::SubscriptionEntity, value_objects::payment_events::PaymentWebhookEvent,
};

/// The payment provider: hosted checkout creation plus webhook signature
/// verification.
#[async_trait]
#[automock]
pub trait PaymentClient {
    /// Creates a hosted checkout for the pending subscription and returns its
    /// URL. The subscription id travels as the request id and in metadata so
    /// the webhook can bind the payment back to the row.
    async fn create_checkout(
        &self,
        subscription: &SubscriptionEntity,
        customer_email: &str,
    ) -> Result<String>;

    /// Verifies HMAC-SHA256 over `timestamp + "." + payload` and parses the
    /// event. Invalid signatures fail.
    fn verify_webhook(
        &self,
        payload: &[u8],
        timestamp: &str,
        signature: &str,
    ) -> Result<PaymentWebhookEvent>;
}
