use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;
use tracing::error;

use crate::domain::{
    entities::subscriptions::SubscriptionEntity,
    repositories::payments::PaymentClient,
    value_objects::payment_events::PaymentWebhookEvent,
};

type HmacSha256 = Hmac<Sha256>;

/// Hosted-checkout payment provider client built on reqwest.
pub struct CheckoutClient {
    http: reqwest::Client,
    api_base_url: String,
    api_key: String,
    webhook_secret: String,
    success_url: String,
}

impl CheckoutClient {
    pub fn new(
        api_base_url: String,
        api_key: String,
        webhook_secret: String,
        success_url: String,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            api_key,
            webhook_secret,
            success_url,
        }
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        error!(
            status = %status,
            response_body = %body,
            context = %context,
            "payment api request failed"
        );

        bail!(
            "payment provider request failed: {} (status {})",
            context,
            status
        );
    }
}

#[async_trait]
impl PaymentClient for CheckoutClient {
    async fn create_checkout(
        &self,
        subscription: &SubscriptionEntity,
        customer_email: &str,
    ) -> Result<String> {
        // The subscription id rides along as request_id and metadata so the
        // webhook can bind the payment back to the pending row.
        let body = json!({
            "request_id": subscription.id.to_string(),
            "units": "1",
            "customer": { "email": customer_email },
            "success_url": self.success_url,
            "metadata": {
                "subscription_id": subscription.id.to_string(),
                "subscription_type": subscription.subscription_type,
                "subscription_period": subscription.subscription_period,
                "user_id": subscription.user_id.to_string(),
            }
        });

        let resp = self
            .http
            .post(format!("{}/checkouts", self.api_base_url))
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create checkout").await?;

        #[derive(Deserialize)]
        struct CheckoutResp {
            checkout_url: Option<String>,
        }

        let parsed: CheckoutResp = resp.json().await?;
        parsed
            .checkout_url
            .ok_or_else(|| anyhow::anyhow!("checkout URL is missing from provider response"))
    }

    fn verify_webhook(
        &self,
        payload: &[u8],
        timestamp: &str,
        signature: &str,
    ) -> Result<PaymentWebhookEvent> {
        // The provider signs `timestamp + "." + payload` with the shared
        // webhook secret.
        let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())?;
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        let expected = mac.finalize().into_bytes();
        let provided = hex::decode(signature).context("signature is not valid hex")?;

        if expected[..] != provided[..] {
            bail!("invalid webhook signature");
        }

        let event: PaymentWebhookEvent = serde_json::from_slice(payload)?;
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmac::Mac;

    fn client(secret: &str) -> CheckoutClient {
        CheckoutClient::new(
            "https://pay.example.com/api".to_string(),
            "sk_test".to_string(),
            secret.to_string(),
            "https://app.example.com/".to_string(),
        )
    }

    fn sign(secret: &str, timestamp: &str, payload: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn accepts_a_correctly_signed_payload() {
        let secret = "whsec_test_secret";
        let payload = br#"{"event_type":"subscription.paid","object":{"request_id":null}}"#;
        let timestamp = "1717000000";
        let signature = sign(secret, timestamp, payload);

        let event = client(secret)
            .verify_webhook(payload, timestamp, &signature)
            .expect("valid signature should verify");
        assert_eq!(event.event_type, "subscription.paid");
    }

    #[test]
    fn rejects_a_tampered_payload() {
        let secret = "whsec_test_secret";
        let payload = br#"{"event_type":"subscription.paid"}"#;
        let timestamp = "1717000000";
        let signature = sign(secret, timestamp, payload);

        let tampered = br#"{"event_type":"subscription.canceled"}"#;
        let result = client(secret).verify_webhook(tampered, timestamp, &signature);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_a_wrong_secret() {
        let payload = br#"{"event_type":"subscription.paid"}"#;
        let timestamp = "1717000000";
        let signature = sign("other_secret", timestamp, payload);

        let result = client("whsec_test_secret").verify_webhook(payload, timestamp, &signature);
        assert!(result.is_err());
    }
}
