use thiserror::Error;

/// Typed failures raised by credit-ledger operations. Carried inside
/// `anyhow::Error` and recovered by downcast at the HTTP boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient credit. current balance: {balance}, required: {required}")]
    InsufficientCredit { balance: i32, required: i32 },

    #[error("user not found")]
    UserNotFound,

    #[error("code not found")]
    CodeNotFound,

    #[error("code already used")]
    CodeAlreadyUsed,

    #[error("a 1000 credit redeem code can only be used once per user")]
    RedeemLimitReached,
}

/// Terminal content-size violation. Never retried: the input has to shrink
/// before another attempt can succeed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("input contains {token_count} tokens, which exceeds the maximum of {max_tokens}")]
pub struct TokenLimitExceeded {
    pub token_count: u64,
    pub max_tokens: u64,
}

pub fn is_token_limit_exceeded(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| cause.downcast_ref::<TokenLimitExceeded>().is_some())
}

/// Guard for `consume`: the sufficiency-enforcing debit path.
pub fn check_consumable(balance: i32, amount: i32) -> Result<(), LedgerError> {
    if balance < amount {
        return Err(LedgerError::InsufficientCredit {
            balance,
            required: amount,
        });
    }
    Ok(())
}

/// Guard for `redeem`: single-use codes, and the 1000-credit tier is limited
/// to one redemption per user across their whole transaction history.
pub fn check_redeemable(
    is_used: bool,
    credit_amount: i32,
    user_has_redeemed_thousand: bool,
) -> Result<(), LedgerError> {
    if is_used {
        return Err(LedgerError::CodeAlreadyUsed);
    }
    if credit_amount == 1000 && user_has_redeemed_thousand {
        return Err(LedgerError::RedeemLimitReached);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_requires_full_balance() {
        assert!(check_consumable(30, 30).is_ok());
        assert_eq!(
            check_consumable(25, 30),
            Err(LedgerError::InsufficientCredit {
                balance: 25,
                required: 30
            })
        );
    }

    #[test]
    fn used_codes_are_rejected() {
        assert_eq!(
            check_redeemable(true, 500, false),
            Err(LedgerError::CodeAlreadyUsed)
        );
    }

    #[test]
    fn thousand_credit_tier_is_once_per_user() {
        assert!(check_redeemable(false, 1000, false).is_ok());
        assert_eq!(
            check_redeemable(false, 1000, true),
            Err(LedgerError::RedeemLimitReached)
        );
        // Other amounts are not subject to the per-user limit.
        assert!(check_redeemable(false, 500, true).is_ok());
    }

    #[test]
    fn token_limit_is_detected_through_context_chains() {
        let err = anyhow::Error::new(TokenLimitExceeded {
            token_count: 40_000,
            max_tokens: 32_000,
        })
        .context("speech synthesis failed");
        assert!(is_token_limit_exceeded(&err));

        let plain = anyhow::anyhow!("connection reset");
        assert!(!is_token_limit_exceeded(&plain));
    }
}
