use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    entities::subscriptions::InsertSubscriptionEntity,
    value_objects::{
        enums::{
            subscription_periods::SubscriptionPeriod, subscription_statuses::SubscriptionStatus,
            subscription_types::SubscriptionType,
        },
        plans::subscription_plan,
    },
};
use uuid::Uuid;

/// Pending checkouts older than this are swept away as abandoned.
pub const PENDING_CHECKOUT_TTL_HOURS: i64 = 24;

/// Renewal reminders fire for subscriptions ending within this window.
pub const RENEWAL_REMINDER_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateSubscriptionModel {
    pub user_id: Uuid,
    pub subscription_type: SubscriptionType,
    pub subscription_period: SubscriptionPeriod,
    pub payment_method: Option<String>,
}

impl CreateSubscriptionModel {
    pub fn to_entity(&self) -> InsertSubscriptionEntity {
        let plan = subscription_plan(self.subscription_type, self.subscription_period);
        let now = Utc::now();
        InsertSubscriptionEntity {
            user_id: self.user_id,
            subscription_type: self.subscription_type.to_string(),
            subscription_period: self.subscription_period.to_string(),
            status: SubscriptionStatus::Pending.to_string(),
            price_minor: plan.price_minor,
            billing_amount_minor: plan.billing_amount_minor,
            monthly_credits: plan.monthly_credits,
            payment_method: self.payment_method.clone(),
            external_subscription_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// New (start, end) window for an activation: the clock starts now.
pub fn activation_window(
    now: DateTime<Utc>,
    period: SubscriptionPeriod,
) -> (DateTime<Utc>, DateTime<Utc>) {
    (now, now + Duration::days(period.duration_days()))
}

/// New (start, end) window for a renewal. A subscription renewed past its end
/// date restarts from now; one renewed while still current keeps its start and
/// extends from the old end date.
pub fn renewal_window(
    now: DateTime<Utc>,
    current_start: Option<DateTime<Utc>>,
    current_end: Option<DateTime<Utc>>,
    period: SubscriptionPeriod,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let length = Duration::days(period.duration_days());
    match current_end {
        Some(end) if end >= now => (current_start.unwrap_or(now), end + length),
        _ => (now, now + length),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn renewal_extends_from_end_date_while_current() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let start = Utc.with_ymd_and_hms(2025, 5, 10, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 6, 9, 0, 0, 0).unwrap();

        let (new_start, new_end) =
            renewal_window(now, Some(start), Some(end), SubscriptionPeriod::Monthly);
        assert_eq!(new_start, start);
        assert_eq!(new_end, end + Duration::days(30));
    }

    #[test]
    fn renewal_restarts_from_now_when_expired() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 5, 20, 0, 0, 0).unwrap();

        let (new_start, new_end) =
            renewal_window(now, Some(end - Duration::days(30)), Some(end), SubscriptionPeriod::Yearly);
        assert_eq!(new_start, now);
        assert_eq!(new_end, now + Duration::days(365));
    }

    #[test]
    fn activation_runs_for_the_period_length() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let (start, end) = activation_window(now, SubscriptionPeriod::Monthly);
        assert_eq!(start, now);
        assert_eq!(end - start, Duration::days(30));
    }
}
