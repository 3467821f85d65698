use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{
    domain::{
        entities::{
            credit_transactions::{CreditTransactionEntity, InsertCreditTransactionEntity},
            redeem_codes::RedeemCodeEntity,
            subscriptions::SubscriptionEntity,
            users::UserEntity,
        },
        repositories::credit_ledger::CreditLedgerRepository,
        value_objects::{
            credits::{granted_this_month, monthly_reclaim_amount},
            enums::{
                subscription_statuses::SubscriptionStatus, transaction_types::TransactionType,
            },
            errors::{LedgerError, check_consumable, check_redeemable},
        },
    },
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{credit_transactions, redeem_codes, subscriptions, users},
    },
};

pub struct CreditLedgerPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl CreditLedgerPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }

    /// Locks the user row for the remainder of the enclosing transaction so
    /// concurrent ledger mutations for the same user serialize.
    fn lock_user(conn: &mut PgConnection, user_id: Uuid) -> Result<UserEntity> {
        let user = users::table
            .find(user_id)
            .select(UserEntity::as_select())
            .for_update()
            .first::<UserEntity>(conn)
            .optional()?
            .ok_or_else(|| anyhow::Error::new(LedgerError::UserNotFound))?;
        Ok(user)
    }

    /// Applies a signed amount to the locked user's balance and appends the
    /// matching ledger entry. Must be called inside a transaction.
    #[allow(clippy::too_many_arguments)]
    fn apply_entry(
        conn: &mut PgConnection,
        user: &UserEntity,
        amount: i32,
        transaction_type: TransactionType,
        task_id: Option<Uuid>,
        subscription_id: Option<Uuid>,
        description: Option<String>,
    ) -> Result<CreditTransactionEntity> {
        let balance_after = user.credit_balance + amount;

        diesel::update(users::table.find(user.id))
            .set((
                users::credit_balance.eq(balance_after),
                users::updated_at.eq(Utc::now()),
            ))
            .execute(conn)?;

        let entry = InsertCreditTransactionEntity {
            user_id: user.id,
            task_id,
            subscription_id,
            transaction_type: transaction_type.to_string(),
            amount,
            balance_after,
            description,
            created_at: Utc::now(),
        };

        let transaction = diesel::insert_into(credit_transactions::table)
            .values(&entry)
            .returning(CreditTransactionEntity::as_returning())
            .get_result::<CreditTransactionEntity>(conn)?;

        Ok(transaction)
    }
}

#[async_trait]
impl CreditLedgerRepository for CreditLedgerPostgres {
    async fn balance(&self, user_id: Uuid) -> Result<i32> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let balance = users::table
            .find(user_id)
            .select(users::credit_balance)
            .first::<i32>(&mut conn)
            .optional()?
            .ok_or_else(|| anyhow::Error::new(LedgerError::UserNotFound))?;

        Ok(balance)
    }

    async fn is_sufficient(&self, user_id: Uuid, required_credit: i32) -> Result<bool> {
        let balance = self.balance(user_id).await?;
        Ok(balance >= required_credit)
    }

    async fn consume(
        &self,
        user_id: Uuid,
        amount: i32,
        task_id: Option<Uuid>,
        description: Option<String>,
    ) -> Result<CreditTransactionEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let transaction = conn.transaction::<CreditTransactionEntity, anyhow::Error, _>(|conn| {
            let user = Self::lock_user(conn, user_id)?;
            check_consumable(user.credit_balance, amount).map_err(anyhow::Error::new)?;

            Self::apply_entry(
                conn,
                &user,
                -amount,
                TransactionType::TaskConsume,
                task_id,
                None,
                description.or_else(|| Some(format!("task consume {} credits", amount))),
            )
        })?;

        info!(
            %user_id,
            amount,
            balance_after = transaction.balance_after,
            "ledger: consumed credits"
        );
        Ok(transaction)
    }

    async fn settle(
        &self,
        user_id: Uuid,
        amount: i32,
        task_id: Uuid,
        description: Option<String>,
    ) -> Result<CreditTransactionEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // Settlement is the one debit path without a sufficiency check: the
        // exact cost exists only after generation, so the balance may dip
        // below zero here.
        let transaction = conn.transaction::<CreditTransactionEntity, anyhow::Error, _>(|conn| {
            let user = Self::lock_user(conn, user_id)?;
            Self::apply_entry(
                conn,
                &user,
                -amount,
                TransactionType::TaskConsume,
                Some(task_id),
                None,
                description,
            )
        })?;

        if transaction.balance_after < 0 {
            tracing::warn!(
                %user_id,
                balance_after = transaction.balance_after,
                "ledger: balance went negative on settlement"
            );
        }
        Ok(transaction)
    }

    async fn grant(
        &self,
        user_id: Uuid,
        amount: i32,
        transaction_type: TransactionType,
        subscription_id: Option<Uuid>,
        description: Option<String>,
    ) -> Result<CreditTransactionEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let transaction = conn.transaction::<CreditTransactionEntity, anyhow::Error, _>(|conn| {
            let user = Self::lock_user(conn, user_id)?;
            Self::apply_entry(
                conn,
                &user,
                amount,
                transaction_type,
                None,
                subscription_id,
                description.or_else(|| Some(format!("grant {} credits", amount))),
            )
        })?;

        info!(
            %user_id,
            amount,
            balance_after = transaction.balance_after,
            "ledger: granted credits"
        );
        Ok(transaction)
    }

    async fn refund(
        &self,
        user_id: Uuid,
        amount: i32,
        task_id: Option<Uuid>,
    ) -> Result<CreditTransactionEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let transaction = conn.transaction::<CreditTransactionEntity, anyhow::Error, _>(|conn| {
            let user = Self::lock_user(conn, user_id)?;
            Self::apply_entry(
                conn,
                &user,
                amount,
                TransactionType::Refund,
                task_id,
                None,
                Some(format!("task refund {} credits", amount)),
            )
        })?;

        Ok(transaction)
    }

    async fn redeem(&self, user_id: Uuid, code: String) -> Result<CreditTransactionEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let transaction = conn.transaction::<CreditTransactionEntity, anyhow::Error, _>(|conn| {
            let redeem_code = redeem_codes::table
                .filter(redeem_codes::code.eq(&code))
                .select(RedeemCodeEntity::as_select())
                .for_update()
                .first::<RedeemCodeEntity>(conn)
                .optional()?
                .ok_or_else(|| anyhow::Error::new(LedgerError::CodeNotFound))?;

            // The 1000-credit tier is once per user, judged by transaction
            // history rather than a dedicated flag.
            let has_redeemed_thousand = diesel::select(diesel::dsl::exists(
                credit_transactions::table
                    .filter(credit_transactions::user_id.eq(user_id))
                    .filter(
                        credit_transactions::transaction_type
                            .eq(TransactionType::RedeemCode.to_string()),
                    )
                    .filter(credit_transactions::amount.eq(1000)),
            ))
            .get_result::<bool>(conn)?;

            check_redeemable(
                redeem_code.is_used,
                redeem_code.credit_amount,
                has_redeemed_thousand,
            )
            .map_err(anyhow::Error::new)?;

            let user = Self::lock_user(conn, user_id)?;

            diesel::update(redeem_codes::table.find(redeem_code.id))
                .set((
                    redeem_codes::is_used.eq(true),
                    redeem_codes::used_by.eq(Some(user_id)),
                    redeem_codes::used_at.eq(Some(Utc::now())),
                    redeem_codes::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;

            Self::apply_entry(
                conn,
                &user,
                redeem_code.credit_amount,
                TransactionType::RedeemCode,
                None,
                None,
                Some(format!(
                    "redeem code {} for {} credits",
                    code, redeem_code.credit_amount
                )),
            )
        })?;

        info!(%user_id, amount = transaction.amount, "ledger: redeemed code");
        Ok(transaction)
    }

    async fn grant_monthly_subscription_credit(
        &self,
        subscription: &SubscriptionEntity,
    ) -> Result<Option<CreditTransactionEntity>> {
        let now = Utc::now();

        // Idempotent per calendar month.
        if granted_this_month(subscription.last_credit_grant_date, now) {
            info!(
                subscription_id = %subscription.id,
                "ledger: monthly credits already granted this month"
            );
            return Ok(None);
        }

        if subscription.status != SubscriptionStatus::Active.to_string() {
            tracing::warn!(
                subscription_id = %subscription.id,
                status = %subscription.status,
                "ledger: subscription not active, skipping monthly grant"
            );
            return Ok(None);
        }

        let mut conn = Arc::clone(&self.db_pool).get()?;
        let subscription_id = subscription.id;
        let user_id = subscription.user_id;
        let monthly_credits = subscription.monthly_credits;
        let had_prior_grant = subscription.last_credit_grant_date.is_some();

        let transaction = conn.transaction::<CreditTransactionEntity, anyhow::Error, _>(|conn| {
            let mut user = Self::lock_user(conn, user_id)?;

            // Reclaim whatever is left of the previous month's grant before
            // issuing the new one.
            if had_prior_grant {
                let last_grant = credit_transactions::table
                    .filter(credit_transactions::subscription_id.eq(subscription_id))
                    .filter(credit_transactions::user_id.eq(user_id))
                    .filter(
                        credit_transactions::transaction_type
                            .eq(TransactionType::MonthlyGrant.to_string()),
                    )
                    .order(credit_transactions::created_at.desc())
                    .select(CreditTransactionEntity::as_select())
                    .first::<CreditTransactionEntity>(conn)
                    .optional()?;

                if let Some(last_grant) = last_grant {
                    let reclaim = monthly_reclaim_amount(last_grant.amount, user.credit_balance);
                    if reclaim > 0 {
                        let reclaim_entry = Self::apply_entry(
                            conn,
                            &user,
                            -reclaim,
                            TransactionType::MonthlyReclaim,
                            None,
                            Some(subscription_id),
                            Some(format!("reclaim {} unspent credits from last month", reclaim)),
                        )?;
                        user.credit_balance = reclaim_entry.balance_after;
                    }
                }
            }

            let grant_entry = Self::apply_entry(
                conn,
                &user,
                monthly_credits,
                TransactionType::MonthlyGrant,
                None,
                Some(subscription_id),
                Some(format!("monthly grant {} credits", monthly_credits)),
            )?;

            diesel::update(subscriptions::table.find(subscription_id))
                .set((
                    subscriptions::last_credit_grant_date.eq(Some(now)),
                    subscriptions::updated_at.eq(now),
                ))
                .execute(conn)?;

            Ok(grant_entry)
        })?;

        info!(
            %user_id,
            %subscription_id,
            amount = transaction.amount,
            "ledger: monthly credits granted"
        );
        Ok(Some(transaction))
    }

    async fn list_transactions(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CreditTransactionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let transactions = credit_transactions::table
            .filter(credit_transactions::user_id.eq(user_id))
            .order(credit_transactions::created_at.desc())
            .limit(limit)
            .offset(offset)
            .select(CreditTransactionEntity::as_select())
            .load::<CreditTransactionEntity>(&mut conn)?;

        Ok(transactions)
    }
}
