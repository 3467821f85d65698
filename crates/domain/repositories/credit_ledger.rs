use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::{credit_transactions::CreditTransactionEntity, subscriptions::SubscriptionEntity},
    value_objects::enums::transaction_types::TransactionType,
};

/// The credit ledger. Every mutation runs as one database transaction over
/// the locked user row and the appended transaction row, so concurrent
/// mutations serialize and `balance_after` snapshots stay replayable.
#[async_trait]
#[automock]
pub trait CreditLedgerRepository {
    async fn balance(&self, user_id: Uuid) -> Result<i32>;
    async fn is_sufficient(&self, user_id: Uuid, required_credit: i32) -> Result<bool>;

    /// Debit that enforces sufficiency: fails with
    /// `LedgerError::InsufficientCredit` before touching the balance.
    async fn consume(
        &self,
        user_id: Uuid,
        amount: i32,
        task_id: Option<Uuid>,
        description: Option<String>,
    ) -> Result<CreditTransactionEntity>;

    /// Debit for post-completion settlement. No sufficiency check: cost is
    /// only known after generation, so the balance may go negative here.
    async fn settle(
        &self,
        user_id: Uuid,
        amount: i32,
        task_id: Uuid,
        description: Option<String>,
    ) -> Result<CreditTransactionEntity>;

    async fn grant(
        &self,
        user_id: Uuid,
        amount: i32,
        transaction_type: TransactionType,
        subscription_id: Option<Uuid>,
        description: Option<String>,
    ) -> Result<CreditTransactionEntity>;

    async fn refund(
        &self,
        user_id: Uuid,
        amount: i32,
        task_id: Option<Uuid>,
    ) -> Result<CreditTransactionEntity>;

    async fn redeem(&self, user_id: Uuid, code: String) -> Result<CreditTransactionEntity>;

    /// Monthly grant with reclaim of the prior month's unspent grant.
    /// Idempotent per calendar month; returns `None` when skipped.
    async fn grant_monthly_subscription_credit(
        &self,
        subscription: &SubscriptionEntity,
    ) -> Result<Option<CreditTransactionEntity>>;

    async fn list_transactions(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CreditTransactionEntity>>;
}
