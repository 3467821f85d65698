use serde::Deserialize;
use uuid::Uuid;

/// Event kinds delivered by the payment provider. Anything else is
/// acknowledged and ignored.
pub const EVENT_SUBSCRIPTION_PAID: &str = "subscription.paid";
pub const EVENT_SUBSCRIPTION_CANCELED: &str = "subscription.canceled";

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentWebhookEvent {
    pub event_type: String,
    pub object: Option<PaymentWebhookObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentWebhookObject {
    /// Echo of the request id we passed at checkout creation; this is the
    /// subscription id.
    pub request_id: Option<String>,
    #[serde(default)]
    pub metadata: PaymentWebhookMetadata,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct PaymentWebhookMetadata {
    pub user_id: Option<String>,
    pub subscription_id: Option<String>,
    pub subscription_type: Option<String>,
    pub subscription_period: Option<String>,
}

impl PaymentWebhookObject {
    /// The subscription this event is bound to: metadata wins, the checkout
    /// request id is the fallback.
    pub fn subscription_id(&self) -> Option<Uuid> {
        self.metadata
            .subscription_id
            .as_deref()
            .or(self.request_id.as_deref())
            .and_then(|raw| Uuid::parse_str(raw).ok())
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.metadata
            .user_id
            .as_deref()
            .and_then(|raw| Uuid::parse_str(raw).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_id_falls_back_to_request_id() {
        let id = Uuid::new_v4();
        let object = PaymentWebhookObject {
            request_id: Some(id.to_string()),
            metadata: PaymentWebhookMetadata::default(),
        };
        assert_eq!(object.subscription_id(), Some(id));
    }

    #[test]
    fn metadata_subscription_id_takes_precedence() {
        let meta_id = Uuid::new_v4();
        let object = PaymentWebhookObject {
            request_id: Some(Uuid::new_v4().to_string()),
            metadata: PaymentWebhookMetadata {
                subscription_id: Some(meta_id.to_string()),
                ..Default::default()
            },
        };
        assert_eq!(object.subscription_id(), Some(meta_id));
    }
}
