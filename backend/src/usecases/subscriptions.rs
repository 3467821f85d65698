use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use crates::domain::{
    entities::subscriptions::SubscriptionEntity,
    repositories::{
        credit_ledger::CreditLedgerRepository, payments::PaymentClient,
        subscriptions::SubscriptionRepository,
    },
    value_objects::{
        enums::{
            subscription_periods::SubscriptionPeriod, subscription_statuses::SubscriptionStatus,
            subscription_types::SubscriptionType,
        },
        plans::{SubscriptionPlan, subscription_plan},
        subscriptions::{CreateSubscriptionModel, activation_window, renewal_window},
    },
};

use crate::axum_http::error_responses::AppError;

#[derive(Debug, Serialize)]
pub struct PlanOptionDto {
    pub subscription_type: SubscriptionType,
    pub subscription_period: SubscriptionPeriod,
    #[serde(flatten)]
    pub plan: SubscriptionPlan,
}

#[derive(Debug, Serialize)]
pub struct CheckoutDto {
    pub subscription_id: Uuid,
    pub checkout_url: String,
}

pub struct SubscriptionsUseCase {
    subscription_repo: Arc<dyn SubscriptionRepository + Send + Sync>,
    ledger: Arc<dyn CreditLedgerRepository + Send + Sync>,
    payment_client: Arc<dyn PaymentClient + Send + Sync>,
}

impl SubscriptionsUseCase {
    pub fn new(
        subscription_repo: Arc<dyn SubscriptionRepository + Send + Sync>,
        ledger: Arc<dyn CreditLedgerRepository + Send + Sync>,
        payment_client: Arc<dyn PaymentClient + Send + Sync>,
    ) -> Self {
        Self {
            subscription_repo,
            ledger,
            payment_client,
        }
    }

    pub fn plans(&self) -> Vec<PlanOptionDto> {
        let mut options = Vec::new();
        for subscription_type in [SubscriptionType::Basic, SubscriptionType::Pro] {
            for period in [SubscriptionPeriod::Monthly, SubscriptionPeriod::Yearly] {
                options.push(PlanOptionDto {
                    subscription_type,
                    subscription_period: period,
                    plan: subscription_plan(subscription_type, period),
                });
            }
        }
        options
    }

    /// Checkout initiation: a pending row plus the provider's hosted URL.
    /// Conflicts if the user already has an active subscription.
    pub async fn create_checkout(
        &self,
        user_id: Uuid,
        customer_email: &str,
        subscription_type: SubscriptionType,
        subscription_period: SubscriptionPeriod,
    ) -> Result<CheckoutDto, AppError> {
        let existing = self
            .subscription_repo
            .find_active_by_user(user_id)
            .await
            .map_err(AppError::from)?;
        if existing.is_some() {
            return Err(AppError::Conflict(
                "user already has an active subscription".to_string(),
            ));
        }

        let model = CreateSubscriptionModel {
            user_id,
            subscription_type,
            subscription_period,
            payment_method: Some("hosted_checkout".to_string()),
        };
        let subscription = self
            .subscription_repo
            .insert(model.to_entity())
            .await
            .map_err(AppError::from)?;

        info!(
            %user_id,
            subscription_id = %subscription.id,
            %subscription_type,
            %subscription_period,
            "created pending subscription"
        );

        let checkout_url = self
            .payment_client
            .create_checkout(&subscription, customer_email)
            .await
            .map_err(AppError::from)?;

        Ok(CheckoutDto {
            subscription_id: subscription.id,
            checkout_url,
        })
    }

    /// Payment confirmation. A pending subscription activates; an active or
    /// expired one renews. Both paths end with the monthly credit grant.
    pub async fn handle_paid(
        &self,
        subscription_id: Uuid,
        user_id: Uuid,
    ) -> Result<SubscriptionEntity, AppError> {
        let subscription = self.find_owned(subscription_id, user_id).await?;

        let status = SubscriptionStatus::from_str(&subscription.status)
            .map_err(AppError::from)?;
        let period = SubscriptionPeriod::from_str(&subscription.subscription_period)
            .map_err(AppError::from)?;
        let now = Utc::now();

        let updated = match status {
            SubscriptionStatus::Pending => {
                let (start, end) = activation_window(now, period);
                let updated = self
                    .subscription_repo
                    .activate(subscription_id, start, end)
                    .await
                    .map_err(AppError::from)?;
                info!(%subscription_id, "subscription activated");
                updated
            }
            SubscriptionStatus::Active | SubscriptionStatus::Expired => {
                let (start, end) = renewal_window(
                    now,
                    subscription.start_date,
                    subscription.end_date,
                    period,
                );
                let updated = self
                    .subscription_repo
                    .renew(subscription_id, start, end)
                    .await
                    .map_err(AppError::from)?;
                info!(%subscription_id, "subscription renewed");
                updated
            }
            SubscriptionStatus::Cancelled | SubscriptionStatus::Deleted => {
                return Err(AppError::BadRequest(format!(
                    "subscription {} cannot accept payment in status {}",
                    subscription_id, subscription.status
                )));
            }
        };

        // First grant of the new period. A failure here is surfaced: the
        // webhook returns non-2xx and the provider retries the event.
        self.ledger
            .grant_monthly_subscription_credit(&updated)
            .await
            .map_err(AppError::from)?;

        Ok(updated)
    }

    pub async fn cancel(
        &self,
        user_id: Uuid,
        subscription_id: Uuid,
    ) -> Result<SubscriptionEntity, AppError> {
        let subscription = self.find_owned(subscription_id, user_id).await?;

        let cancelled = self
            .subscription_repo
            .cancel(subscription.id, Utc::now())
            .await
            .map_err(AppError::from)?;

        info!(%user_id, %subscription_id, "subscription cancelled");
        Ok(cancelled)
    }

    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SubscriptionEntity>, AppError> {
        self.subscription_repo
            .list_by_user(user_id, limit.clamp(1, 100), offset.max(0))
            .await
            .map_err(AppError::from)
    }

    async fn find_owned(
        &self,
        subscription_id: Uuid,
        user_id: Uuid,
    ) -> Result<SubscriptionEntity, AppError> {
        let subscription = self
            .subscription_repo
            .find_by_id(subscription_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound("subscription not found".to_string()))?;

        if subscription.user_id != user_id {
            error!(%subscription_id, %user_id, "subscription ownership mismatch");
            return Err(AppError::Forbidden(
                "not authorized to operate this subscription".to_string(),
            ));
        }

        Ok(subscription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crates::domain::repositories::{
        credit_ledger::MockCreditLedgerRepository, payments::MockPaymentClient,
        subscriptions::MockSubscriptionRepository,
    };

    fn sample_subscription(
        user_id: Uuid,
        status: SubscriptionStatus,
        period: SubscriptionPeriod,
    ) -> SubscriptionEntity {
        let now = Utc::now();
        SubscriptionEntity {
            id: Uuid::new_v4(),
            user_id,
            subscription_type: SubscriptionType::Basic.to_string(),
            subscription_period: period.to_string(),
            status: status.to_string(),
            price_minor: 1200,
            billing_amount_minor: 1200,
            start_date: None,
            end_date: None,
            next_billing_date: None,
            monthly_credits: 1000,
            last_credit_grant_date: None,
            payment_method: Some("hosted_checkout".to_string()),
            external_subscription_id: None,
            created_at: now,
            updated_at: now,
            cancelled_at: None,
        }
    }

    #[tokio::test]
    async fn checkout_conflicts_when_an_active_subscription_exists() {
        let user_id = Uuid::new_v4();
        let mut subscription_repo = MockSubscriptionRepository::new();
        let ledger = MockCreditLedgerRepository::new();
        let payment_client = MockPaymentClient::new();

        let mut active = sample_subscription(
            user_id,
            SubscriptionStatus::Active,
            SubscriptionPeriod::Monthly,
        );
        active.end_date = Some(Utc::now() + Duration::days(10));
        subscription_repo
            .expect_find_active_by_user()
            .returning(move |_| {
                let active = active.clone();
                Box::pin(async move { Ok(Some(active)) })
            });
        subscription_repo.expect_insert().times(0);

        let usecase = SubscriptionsUseCase::new(
            Arc::new(subscription_repo),
            Arc::new(ledger),
            Arc::new(payment_client),
        );

        let result = usecase
            .create_checkout(
                user_id,
                "user@example.com",
                SubscriptionType::Pro,
                SubscriptionPeriod::Monthly,
            )
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn paid_event_activates_a_pending_subscription_and_grants_credits() {
        let user_id = Uuid::new_v4();
        let pending = sample_subscription(
            user_id,
            SubscriptionStatus::Pending,
            SubscriptionPeriod::Monthly,
        );
        let subscription_id = pending.id;

        let mut subscription_repo = MockSubscriptionRepository::new();
        let mut ledger = MockCreditLedgerRepository::new();
        let payment_client = MockPaymentClient::new();

        let found = pending.clone();
        subscription_repo
            .expect_find_by_id()
            .returning(move |_| {
                let found = found.clone();
                Box::pin(async move { Ok(Some(found)) })
            });
        subscription_repo
            .expect_activate()
            .withf(move |id, start, end| {
                *id == subscription_id && (*end - *start) == Duration::days(30)
            })
            .returning(move |id, start, end| {
                let mut activated = pending.clone();
                activated.id = id;
                activated.status = SubscriptionStatus::Active.to_string();
                activated.start_date = Some(start);
                activated.end_date = Some(end);
                Box::pin(async move { Ok(activated) })
            });
        ledger
            .expect_grant_monthly_subscription_credit()
            .times(1)
            .returning(|_| Box::pin(async { Ok(None) }));

        let usecase = SubscriptionsUseCase::new(
            Arc::new(subscription_repo),
            Arc::new(ledger),
            Arc::new(payment_client),
        );

        let updated = usecase.handle_paid(subscription_id, user_id).await.unwrap();
        assert_eq!(updated.status, SubscriptionStatus::Active.to_string());
    }

    #[tokio::test]
    async fn paid_event_renews_an_expired_subscription_from_now() {
        let user_id = Uuid::new_v4();
        let mut expired = sample_subscription(
            user_id,
            SubscriptionStatus::Expired,
            SubscriptionPeriod::Monthly,
        );
        expired.start_date = Some(Utc::now() - Duration::days(70));
        expired.end_date = Some(Utc::now() - Duration::days(40));
        let subscription_id = expired.id;

        let mut subscription_repo = MockSubscriptionRepository::new();
        let mut ledger = MockCreditLedgerRepository::new();
        let payment_client = MockPaymentClient::new();

        let found = expired.clone();
        subscription_repo
            .expect_find_by_id()
            .returning(move |_| {
                let found = found.clone();
                Box::pin(async move { Ok(Some(found)) })
            });
        subscription_repo
            .expect_renew()
            .withf(|_, start, end| {
                // Restarts from now, not from the stale end date.
                let now = Utc::now();
                (*start - now).num_seconds().abs() < 5 && (*end - *start) == Duration::days(30)
            })
            .returning(move |id, start, end| {
                let mut renewed = expired.clone();
                renewed.id = id;
                renewed.status = SubscriptionStatus::Active.to_string();
                renewed.start_date = Some(start);
                renewed.end_date = Some(end);
                Box::pin(async move { Ok(renewed) })
            });
        ledger
            .expect_grant_monthly_subscription_credit()
            .times(1)
            .returning(|_| Box::pin(async { Ok(None) }));

        let usecase = SubscriptionsUseCase::new(
            Arc::new(subscription_repo),
            Arc::new(ledger),
            Arc::new(payment_client),
        );

        let updated = usecase.handle_paid(subscription_id, user_id).await.unwrap();
        assert_eq!(updated.status, SubscriptionStatus::Active.to_string());
    }

    #[tokio::test]
    async fn cancel_rejects_foreign_subscriptions() {
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let subscription = sample_subscription(
            owner,
            SubscriptionStatus::Active,
            SubscriptionPeriod::Monthly,
        );
        let subscription_id = subscription.id;

        let mut subscription_repo = MockSubscriptionRepository::new();
        let ledger = MockCreditLedgerRepository::new();
        let payment_client = MockPaymentClient::new();

        subscription_repo
            .expect_find_by_id()
            .returning(move |_| {
                let found = subscription.clone();
                Box::pin(async move { Ok(Some(found)) })
            });
        subscription_repo.expect_cancel().times(0);

        let usecase = SubscriptionsUseCase::new(
            Arc::new(subscription_repo),
            Arc::new(ledger),
            Arc::new(payment_client),
        );

        let result = usecase.cancel(intruder, subscription_id).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
