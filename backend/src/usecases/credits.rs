use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crates::domain::{
    entities::credit_transactions::CreditTransactionEntity,
    repositories::{
        credit_ledger::CreditLedgerRepository, subscriptions::SubscriptionRepository,
    },
};

use crate::axum_http::error_responses::AppError;

#[derive(Debug, Serialize)]
pub struct BalanceSummaryDto {
    pub user_id: Uuid,
    pub credit_balance: i32,
    pub has_active_subscription: bool,
    pub subscription_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TransactionListDto {
    pub total: usize,
    pub transactions: Vec<CreditTransactionEntity>,
    pub current_balance: i32,
}

#[derive(Debug, Serialize)]
pub struct RedeemResultDto {
    pub transaction_id: Uuid,
    pub credit_amount: i32,
    pub balance_after: i32,
    pub code: String,
}

pub struct CreditsUseCase {
    ledger: Arc<dyn CreditLedgerRepository + Send + Sync>,
    subscription_repo: Arc<dyn SubscriptionRepository + Send + Sync>,
}

impl CreditsUseCase {
    pub fn new(
        ledger: Arc<dyn CreditLedgerRepository + Send + Sync>,
        subscription_repo: Arc<dyn SubscriptionRepository + Send + Sync>,
    ) -> Self {
        Self {
            ledger,
            subscription_repo,
        }
    }

    pub async fn balance_summary(&self, user_id: Uuid) -> Result<BalanceSummaryDto, AppError> {
        let credit_balance = self.ledger.balance(user_id).await.map_err(AppError::from)?;
        let subscription = self
            .subscription_repo
            .find_active_by_user(user_id)
            .await
            .map_err(AppError::from)?;

        Ok(BalanceSummaryDto {
            user_id,
            credit_balance,
            has_active_subscription: subscription.is_some(),
            subscription_type: subscription.map(|s| s.subscription_type),
        })
    }

    pub async fn list_transactions(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<TransactionListDto, AppError> {
        let limit = limit.clamp(1, 100);
        let offset = offset.max(0);

        let transactions = self
            .ledger
            .list_transactions(user_id, limit, offset)
            .await
            .map_err(AppError::from)?;
        let current_balance = self.ledger.balance(user_id).await.map_err(AppError::from)?;

        Ok(TransactionListDto {
            total: transactions.len(),
            transactions,
            current_balance,
        })
    }

    pub async fn redeem(&self, user_id: Uuid, code: &str) -> Result<RedeemResultDto, AppError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AppError::BadRequest("code must not be empty".to_string()));
        }

        let transaction = self
            .ledger
            .redeem(user_id, code.to_string())
            .await
            .map_err(AppError::from)?;

        info!(%user_id, code, amount = transaction.amount, "redeem code accepted");
        Ok(RedeemResultDto {
            transaction_id: transaction.id,
            credit_amount: transaction.amount,
            balance_after: transaction.balance_after,
            code: code.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crates::domain::repositories::{
        credit_ledger::MockCreditLedgerRepository, subscriptions::MockSubscriptionRepository,
    };
    use crates::domain::value_objects::errors::LedgerError;
    use mockall::predicate::eq;

    fn sample_transaction(user_id: Uuid, amount: i32, balance_after: i32) -> CreditTransactionEntity {
        CreditTransactionEntity {
            id: Uuid::new_v4(),
            user_id,
            task_id: None,
            subscription_id: None,
            transaction_type: "redeem_code".to_string(),
            amount,
            balance_after,
            description: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn balance_summary_reports_subscription_state() {
        let user_id = Uuid::new_v4();
        let mut ledger = MockCreditLedgerRepository::new();
        let mut subscriptions = MockSubscriptionRepository::new();

        ledger
            .expect_balance()
            .with(eq(user_id))
            .returning(|_| Box::pin(async { Ok(320) }));
        subscriptions
            .expect_find_active_by_user()
            .returning(|_| Box::pin(async { Ok(None) }));

        let usecase = CreditsUseCase::new(Arc::new(ledger), Arc::new(subscriptions));
        let summary = usecase.balance_summary(user_id).await.unwrap();

        assert_eq!(summary.credit_balance, 320);
        assert!(!summary.has_active_subscription);
        assert_eq!(summary.subscription_type, None);
    }

    #[tokio::test]
    async fn redeem_surfaces_ledger_rejections() {
        let user_id = Uuid::new_v4();
        let mut ledger = MockCreditLedgerRepository::new();
        let subscriptions = MockSubscriptionRepository::new();

        ledger.expect_redeem().returning(|_, _| {
            Box::pin(async { Err(anyhow::Error::new(LedgerError::CodeAlreadyUsed)) })
        });

        let usecase = CreditsUseCase::new(Arc::new(ledger), Arc::new(subscriptions));
        let result = usecase.redeem(user_id, "WELCOME-1000").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn redeem_returns_the_ledger_entry() {
        let user_id = Uuid::new_v4();
        let mut ledger = MockCreditLedgerRepository::new();
        let subscriptions = MockSubscriptionRepository::new();

        let expected = sample_transaction(user_id, 1000, 1100);
        let returned = expected.clone();
        ledger
            .expect_redeem()
            .with(eq(user_id), eq("CODE-1".to_string()))
            .returning(move |_, _| {
                let transaction = returned.clone();
                Box::pin(async move { Ok(transaction) })
            });

        let usecase = CreditsUseCase::new(Arc::new(ledger), Arc::new(subscriptions));
        let result = usecase.redeem(user_id, " CODE-1 ").await.unwrap();
        assert_eq!(result.credit_amount, 1000);
        assert_eq!(result.balance_after, 1100);
    }
}
