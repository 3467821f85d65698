use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::infra::db::postgres::schema::credit_transactions;

/// Append-only ledger entry. Never mutated or deleted; replaying `amount` in
/// creation order from zero must reproduce every `balance_after` snapshot.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable, Serialize)]
#[diesel(table_name = credit_transactions)]
pub struct CreditTransactionEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub task_id: Option<Uuid>,
    pub subscription_id: Option<Uuid>,
    pub transaction_type: String,
    pub amount: i32,
    pub balance_after: i32,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = credit_transactions)]
pub struct InsertCreditTransactionEntity {
    pub user_id: Uuid,
    pub task_id: Option<Uuid>,
    pub subscription_id: Option<Uuid>,
    pub transaction_type: String,
    pub amount: i32,
    pub balance_after: i32,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(user_id: Uuid, amount: i32, balance_after: i32) -> CreditTransactionEntity {
        CreditTransactionEntity {
            id: Uuid::new_v4(),
            user_id,
            task_id: None,
            subscription_id: None,
            transaction_type: if amount < 0 { "task_consume" } else { "monthly_grant" }
                .to_string(),
            amount,
            balance_after,
            description: None,
            created_at: Utc::now(),
        }
    }

    /// Replaying `amount` in creation order from zero must reproduce every
    /// `balance_after` snapshot.
    #[test]
    fn replaying_amounts_reproduces_every_snapshot() {
        let user_id = Uuid::new_v4();
        let history = vec![
            entry(user_id, 1000, 1000),  // monthly grant
            entry(user_id, -115, 885),   // task settlement
            entry(user_id, 1000, 1885),  // redeem
            entry(user_id, -885, 1000),  // monthly reclaim
            entry(user_id, -1030, -30),  // settlement into the credit line
        ];

        let mut running = 0;
        for transaction in &history {
            running += transaction.amount;
            assert_eq!(running, transaction.balance_after);
        }
    }

    #[test]
    fn a_broken_snapshot_fails_replay() {
        let user_id = Uuid::new_v4();
        let history = vec![entry(user_id, 1000, 1000), entry(user_id, -115, 900)];

        let mut running = 0;
        let consistent = history.iter().all(|transaction| {
            running += transaction.amount;
            running == transaction.balance_after
        });
        assert!(!consistent);
    }
}
