use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Utc};
use tracing::{error, info};

use crates::domain::{
    repositories::{
        credit_ledger::CreditLedgerRepository, notify::RenewalNotifier,
        subscriptions::SubscriptionRepository,
    },
    value_objects::subscriptions::{PENDING_CHECKOUT_TTL_HOURS, RENEWAL_REMINDER_DAYS},
};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct GrantSweepSummary {
    pub granted: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// The scheduled sweeps. Every sweep processes rows independently: a failure
/// on one subscription is logged and never aborts the rest, and re-running
/// any sweep is safe.
pub struct SubscriptionMaintenanceUseCase {
    subscription_repo: Arc<dyn SubscriptionRepository + Send + Sync>,
    ledger: Arc<dyn CreditLedgerRepository + Send + Sync>,
    notifier: Option<Arc<dyn RenewalNotifier + Send + Sync>>,
}

impl SubscriptionMaintenanceUseCase {
    pub fn new(
        subscription_repo: Arc<dyn SubscriptionRepository + Send + Sync>,
        ledger: Arc<dyn CreditLedgerRepository + Send + Sync>,
        notifier: Option<Arc<dyn RenewalNotifier + Send + Sync>>,
    ) -> Self {
        Self {
            subscription_repo,
            ledger,
            notifier,
        }
    }

    /// Daily: monthly credit grant for every active subscription. The ledger
    /// makes the grant idempotent per calendar month.
    pub async fn grant_monthly_credits(&self) -> Result<GrantSweepSummary> {
        info!("starting monthly credits grant sweep");
        let subscriptions = self.subscription_repo.list_active().await?;

        let mut summary = GrantSweepSummary::default();
        for subscription in subscriptions {
            match self
                .ledger
                .grant_monthly_subscription_credit(&subscription)
                .await
            {
                Ok(Some(transaction)) => {
                    summary.granted += 1;
                    info!(
                        subscription_id = %subscription.id,
                        user_id = %subscription.user_id,
                        amount = transaction.amount,
                        "monthly credits granted"
                    );
                }
                Ok(None) => summary.skipped += 1,
                Err(err) => {
                    summary.failed += 1;
                    error!(
                        subscription_id = %subscription.id,
                        error = ?err,
                        "failed to grant monthly credits"
                    );
                }
            }
        }

        info!(
            granted = summary.granted,
            skipped = summary.skipped,
            failed = summary.failed,
            "monthly credits grant sweep completed"
        );
        Ok(summary)
    }

    /// Daily: any active subscription past its end date becomes expired.
    pub async fn expire_overdue(&self) -> Result<usize> {
        info!("starting expired subscriptions sweep");
        let now = Utc::now();
        let overdue = self.subscription_repo.list_active_ended_before(now).await?;

        let mut count = 0;
        for subscription in overdue {
            match self.subscription_repo.mark_expired(subscription.id).await {
                Ok(()) => {
                    count += 1;
                    info!(subscription_id = %subscription.id, "subscription expired");
                }
                Err(err) => {
                    error!(
                        subscription_id = %subscription.id,
                        error = ?err,
                        "failed to expire subscription"
                    );
                }
            }
        }

        info!(expired = count, "expired subscriptions sweep completed");
        Ok(count)
    }

    /// Daily, read-only: remind users whose subscription ends within the
    /// reminder window. Delivery goes through the external notifier.
    pub async fn send_renewal_reminders(&self) -> Result<usize> {
        info!("starting renewal reminder sweep");
        let now = Utc::now();
        let window_end = now + Duration::days(RENEWAL_REMINDER_DAYS);
        let expiring = self
            .subscription_repo
            .list_active_ending_between(now, window_end)
            .await?;

        let mut count = 0;
        for subscription in expiring {
            let days_left = subscription
                .end_date
                .map(|end| (end - now).num_days())
                .unwrap_or(0);
            info!(
                subscription_id = %subscription.id,
                user_id = %subscription.user_id,
                days_left,
                "subscription expiring soon"
            );

            if let Some(notifier) = &self.notifier {
                if let Err(err) = notifier.notify_renewal_due(&subscription, days_left).await {
                    error!(
                        subscription_id = %subscription.id,
                        error = ?err,
                        "failed to deliver renewal reminder"
                    );
                    continue;
                }
            }
            count += 1;
        }

        info!(reminded = count, "renewal reminder sweep completed");
        Ok(count)
    }

    /// Hourly: pending checkouts abandoned for longer than the TTL are
    /// deleted with their cancellation timestamp set.
    pub async fn cleanup_stale_pending(&self) -> Result<usize> {
        info!("starting stale pending subscriptions sweep");
        let now = Utc::now();
        let cutoff = now - Duration::hours(PENDING_CHECKOUT_TTL_HOURS);
        let stale = self
            .subscription_repo
            .list_pending_created_before(cutoff)
            .await?;

        let mut count = 0;
        for subscription in stale {
            match self
                .subscription_repo
                .mark_deleted(subscription.id, now)
                .await
            {
                Ok(()) => {
                    count += 1;
                    info!(
                        subscription_id = %subscription.id,
                        "deleted abandoned pending subscription"
                    );
                }
                Err(err) => {
                    error!(
                        subscription_id = %subscription.id,
                        error = ?err,
                        "failed to delete pending subscription"
                    );
                }
            }
        }

        info!(deleted = count, "stale pending subscriptions sweep completed");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crates::domain::{
        entities::{
            credit_transactions::CreditTransactionEntity, subscriptions::SubscriptionEntity,
        },
        repositories::{
            credit_ledger::MockCreditLedgerRepository, notify::MockRenewalNotifier,
            subscriptions::MockSubscriptionRepository,
        },
        value_objects::enums::subscription_statuses::SubscriptionStatus,
    };
    use mockall::predicate::eq;
    use uuid::Uuid;

    fn sample_subscription(status: SubscriptionStatus) -> SubscriptionEntity {
        let now = Utc::now();
        SubscriptionEntity {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            subscription_type: "basic".to_string(),
            subscription_period: "monthly".to_string(),
            status: status.to_string(),
            price_minor: 1200,
            billing_amount_minor: 1200,
            start_date: Some(now - Duration::days(40)),
            end_date: Some(now - Duration::days(1)),
            next_billing_date: None,
            monthly_credits: 1000,
            last_credit_grant_date: None,
            payment_method: None,
            external_subscription_id: None,
            created_at: now - Duration::days(40),
            updated_at: now,
            cancelled_at: None,
        }
    }

    fn grant_entry(subscription: &SubscriptionEntity) -> CreditTransactionEntity {
        CreditTransactionEntity {
            id: Uuid::new_v4(),
            user_id: subscription.user_id,
            task_id: None,
            subscription_id: Some(subscription.id),
            transaction_type: "monthly_grant".to_string(),
            amount: subscription.monthly_credits,
            balance_after: subscription.monthly_credits,
            description: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn expiry_sweep_is_idempotent_across_runs() {
        let overdue = sample_subscription(SubscriptionStatus::Active);
        let overdue_id = overdue.id;

        let mut subscription_repo = MockSubscriptionRepository::new();
        let ledger = MockCreditLedgerRepository::new();

        // First run finds the overdue row; the rerun finds nothing.
        subscription_repo
            .expect_list_active_ended_before()
            .times(1)
            .returning(move |_| {
                let overdue = overdue.clone();
                Box::pin(async move { Ok(vec![overdue]) })
            });
        subscription_repo
            .expect_mark_expired()
            .with(eq(overdue_id))
            .times(1)
            .returning(|_| Box::pin(async { Ok(()) }));
        subscription_repo
            .expect_list_active_ended_before()
            .times(1)
            .returning(|_| Box::pin(async { Ok(Vec::new()) }));

        let usecase = SubscriptionMaintenanceUseCase::new(
            Arc::new(subscription_repo),
            Arc::new(ledger),
            None,
        );

        assert_eq!(usecase.expire_overdue().await.unwrap(), 1);
        assert_eq!(usecase.expire_overdue().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn grant_sweep_counts_granted_skipped_and_failed() {
        let first = sample_subscription(SubscriptionStatus::Active);
        let second = sample_subscription(SubscriptionStatus::Active);
        let third = sample_subscription(SubscriptionStatus::Active);
        let granted_entry = grant_entry(&first);
        let first_id = first.id;
        let second_id = second.id;

        let mut subscription_repo = MockSubscriptionRepository::new();
        let mut ledger = MockCreditLedgerRepository::new();

        subscription_repo.expect_list_active().returning(move || {
            let rows = vec![first.clone(), second.clone(), third.clone()];
            Box::pin(async move { Ok(rows) })
        });
        ledger
            .expect_grant_monthly_subscription_credit()
            .returning(move |subscription| {
                let outcome = if subscription.id == first_id {
                    Ok(Some(granted_entry.clone()))
                } else if subscription.id == second_id {
                    // Already granted this month.
                    Ok(None)
                } else {
                    Err(anyhow::anyhow!("ledger unavailable"))
                };
                Box::pin(async move { outcome })
            });

        let usecase = SubscriptionMaintenanceUseCase::new(
            Arc::new(subscription_repo),
            Arc::new(ledger),
            None,
        );

        let summary = usecase.grant_monthly_credits().await.unwrap();
        assert_eq!(
            summary,
            GrantSweepSummary {
                granted: 1,
                skipped: 1,
                failed: 1,
            }
        );
    }

    #[tokio::test]
    async fn reminder_sweep_notifies_with_days_left() {
        let mut expiring = sample_subscription(SubscriptionStatus::Active);
        expiring.end_date = Some(Utc::now() + Duration::days(3));

        let mut subscription_repo = MockSubscriptionRepository::new();
        let ledger = MockCreditLedgerRepository::new();
        let mut notifier = MockRenewalNotifier::new();

        subscription_repo
            .expect_list_active_ending_between()
            .returning(move |_, _| {
                let expiring = expiring.clone();
                Box::pin(async move { Ok(vec![expiring]) })
            });
        notifier
            .expect_notify_renewal_due()
            .withf(|_, days_left| (0..=3).contains(days_left))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let usecase = SubscriptionMaintenanceUseCase::new(
            Arc::new(subscription_repo),
            Arc::new(ledger),
            Some(Arc::new(notifier)),
        );

        assert_eq!(usecase.send_renewal_reminders().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn stale_pending_rows_are_deleted() {
        let mut stale = sample_subscription(SubscriptionStatus::Pending);
        stale.created_at = Utc::now() - Duration::hours(30);
        let stale_id = stale.id;

        let mut subscription_repo = MockSubscriptionRepository::new();
        let ledger = MockCreditLedgerRepository::new();

        subscription_repo
            .expect_list_pending_created_before()
            .returning(move |_| {
                let stale = stale.clone();
                Box::pin(async move { Ok(vec![stale]) })
            });
        subscription_repo
            .expect_mark_deleted()
            .withf(move |id, _| *id == stale_id)
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let usecase = SubscriptionMaintenanceUseCase::new(
            Arc::new(subscription_repo),
            Arc::new(ledger),
            None,
        );

        assert_eq!(usecase.cleanup_stale_pending().await.unwrap(), 1);
    }
}
