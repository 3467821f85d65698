use serde::Serialize;

use crate::domain::value_objects::enums::{
    subscription_periods::SubscriptionPeriod, subscription_types::SubscriptionType,
};

/// Resolved plan terms for one (type, period) combination. Prices are in
/// minor units of the single supported currency.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubscriptionPlan {
    pub name: &'static str,
    pub description: &'static str,
    pub monthly_credits: i32,
    /// Average monthly price.
    pub price_minor: i32,
    /// Amount charged per billing cycle (monthly price or annual total).
    pub billing_amount_minor: i32,
    pub billing_cycle_months: i32,
}

/// The fixed plan catalog.
pub fn subscription_plan(
    subscription_type: SubscriptionType,
    period: SubscriptionPeriod,
) -> SubscriptionPlan {
    match (subscription_type, period) {
        (SubscriptionType::Basic, SubscriptionPeriod::Monthly) => SubscriptionPlan {
            name: "Basic Plan",
            description: "basic plan, monthly 1000 credits",
            monthly_credits: 1000,
            price_minor: 1200,
            billing_amount_minor: 1200,
            billing_cycle_months: 1,
        },
        (SubscriptionType::Basic, SubscriptionPeriod::Yearly) => SubscriptionPlan {
            name: "Basic Plan",
            description: "basic plan, monthly 1000 credits",
            monthly_credits: 1000,
            price_minor: 900,
            billing_amount_minor: 10800,
            billing_cycle_months: 12,
        },
        (SubscriptionType::Pro, SubscriptionPeriod::Monthly) => SubscriptionPlan {
            name: "Pro Plan",
            description: "pro plan, monthly 2200 credits",
            monthly_credits: 2200,
            price_minor: 2400,
            billing_amount_minor: 2400,
            billing_cycle_months: 1,
        },
        (SubscriptionType::Pro, SubscriptionPeriod::Yearly) => SubscriptionPlan {
            name: "Pro Plan",
            description: "pro plan, monthly 2200 credits",
            monthly_credits: 2200,
            price_minor: 1900,
            billing_amount_minor: 22800,
            billing_cycle_months: 12,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yearly_billing_amount_is_the_annual_total() {
        let basic = subscription_plan(SubscriptionType::Basic, SubscriptionPeriod::Yearly);
        assert_eq!(basic.billing_amount_minor, basic.price_minor * 12);
        assert_eq!(basic.billing_cycle_months, 12);

        let pro = subscription_plan(SubscriptionType::Pro, SubscriptionPeriod::Monthly);
        assert_eq!(pro.monthly_credits, 2200);
        assert_eq!(pro.billing_amount_minor, pro.price_minor);
    }
}
