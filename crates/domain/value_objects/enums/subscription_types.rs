use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionType {
    Basic,
    Pro,
}

impl Display for SubscriptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let subscription_type = match self {
            SubscriptionType::Basic => "basic",
            SubscriptionType::Pro => "pro",
        };
        write!(f, "{}", subscription_type)
    }
}

impl FromStr for SubscriptionType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(SubscriptionType::Basic),
            "pro" => Ok(SubscriptionType::Pro),
            other => Err(anyhow::anyhow!("unknown subscription type: {}", other)),
        }
    }
}
