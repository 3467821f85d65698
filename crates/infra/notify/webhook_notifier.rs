use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use url::Url;

use crate::domain::{
    entities::subscriptions::SubscriptionEntity, repositories::notify::RenewalNotifier,
};

/// Renewal reminders delivered as chat-webhook messages.
pub struct WebhookRenewalNotifier {
    webhook_url: Url,
    client: Client,
}

impl WebhookRenewalNotifier {
    pub fn new(webhook_url: Url) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(3))
            .build()?;

        Ok(Self {
            webhook_url,
            client,
        })
    }
}

#[async_trait]
impl RenewalNotifier for WebhookRenewalNotifier {
    async fn notify_renewal_due(
        &self,
        subscription: &SubscriptionEntity,
        days_left: i64,
    ) -> Result<()> {
        let content = format!(
            "subscription `{}` ({} / {}) for user `{}` expires in {} day(s)",
            subscription.id,
            subscription.subscription_type,
            subscription.subscription_period,
            subscription.user_id,
            days_left,
        );

        let response = self
            .client
            .post(self.webhook_url.clone())
            .json(&json!({ "content": content }))
            .send()
            .await
            .map_err(sanitize_reqwest_error)?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(anyhow!(
            "renewal webhook returned non-success status: {}",
            response.status()
        ))
    }
}

// Webhook URLs carry secrets; errors must not echo them.
fn sanitize_reqwest_error(error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!("renewal webhook request timed out");
    }
    if error.is_connect() {
        return anyhow!("renewal webhook connection failed");
    }
    anyhow!("renewal webhook request failed")
}
