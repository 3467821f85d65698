use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    MonthlyGrant,
    MonthlyReclaim,
    TaskConsume,
    Refund,
    AdminAdjust,
    Purchase,
    RedeemCode,
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let transaction_type = match self {
            TransactionType::MonthlyGrant => "monthly_grant",
            TransactionType::MonthlyReclaim => "monthly_reclaim",
            TransactionType::TaskConsume => "task_consume",
            TransactionType::Refund => "refund",
            TransactionType::AdminAdjust => "admin_adjust",
            TransactionType::Purchase => "purchase",
            TransactionType::RedeemCode => "redeem_code",
        };
        write!(f, "{}", transaction_type)
    }
}

impl FromStr for TransactionType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly_grant" => Ok(TransactionType::MonthlyGrant),
            "monthly_reclaim" => Ok(TransactionType::MonthlyReclaim),
            "task_consume" => Ok(TransactionType::TaskConsume),
            "refund" => Ok(TransactionType::Refund),
            "admin_adjust" => Ok(TransactionType::AdminAdjust),
            "purchase" => Ok(TransactionType::Purchase),
            "redeem_code" => Ok(TransactionType::RedeemCode),
            other => Err(anyhow::anyhow!("unknown transaction type: {}", other)),
        }
    }
}
