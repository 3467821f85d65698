use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    #[default]
    Pending,
    Active,
    Cancelled,
    Expired,
    Deleted,
}

impl SubscriptionStatus {
    /// The full transition table. `Active -> Active` is a renewal,
    /// `Expired -> Active` is a late renewal.
    pub fn can_transition_to(&self, next: SubscriptionStatus) -> bool {
        use SubscriptionStatus::*;
        matches!(
            (self, next),
            (Pending, Active)
                | (Pending, Deleted)
                | (Active, Active)
                | (Active, Cancelled)
                | (Active, Expired)
                | (Expired, Active)
        )
    }
}

impl Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Deleted => "deleted",
        };
        write!(f, "{}", status)
    }
}

impl FromStr for SubscriptionStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SubscriptionStatus::Pending),
            "active" => Ok(SubscriptionStatus::Active),
            "cancelled" => Ok(SubscriptionStatus::Cancelled),
            "expired" => Ok(SubscriptionStatus::Expired),
            "deleted" => Ok(SubscriptionStatus::Deleted),
            other => Err(anyhow::anyhow!("unknown subscription status: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table_is_exhaustive() {
        use SubscriptionStatus::*;
        let all = [Pending, Active, Cancelled, Expired, Deleted];

        for from in all {
            for to in all {
                let allowed = from.can_transition_to(to);
                let expected = matches!(
                    (from, to),
                    (Pending, Active)
                        | (Pending, Deleted)
                        | (Active, Active)
                        | (Active, Cancelled)
                        | (Active, Expired)
                        | (Expired, Active)
                );
                assert_eq!(allowed, expected, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn terminal_states_have_no_exits() {
        use SubscriptionStatus::*;
        for from in [Cancelled, Deleted] {
            for to in [Pending, Active, Cancelled, Expired, Deleted] {
                assert!(!from.can_transition_to(to));
            }
        }
    }
}
