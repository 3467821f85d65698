use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPeriod {
    Monthly,
    Yearly,
}

impl SubscriptionPeriod {
    /// Days granted per paid period.
    pub fn duration_days(&self) -> i64 {
        match self {
            SubscriptionPeriod::Monthly => 30,
            SubscriptionPeriod::Yearly => 365,
        }
    }
}

impl Display for SubscriptionPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let period = match self {
            SubscriptionPeriod::Monthly => "monthly",
            SubscriptionPeriod::Yearly => "yearly",
        };
        write!(f, "{}", period)
    }
}

impl FromStr for SubscriptionPeriod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(SubscriptionPeriod::Monthly),
            "yearly" => Ok(SubscriptionPeriod::Yearly),
            other => Err(anyhow::anyhow!("unknown subscription period: {}", other)),
        }
    }
}
