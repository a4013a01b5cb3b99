//! Pure balance state transitions.
//!
//! Every balance-changing operation is expressed as a pure function from a
//! current [`CreditBalance`] to an [`AppliedOperation`]: the signed deltas,
//! the resulting balance, and (for deductions) the tier split consumed.
//! The database layer applies these transitions inside one transaction and
//! appends exactly one ledger entry per applied operation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use scriva_shared::types::CreditBalance;

use super::error::CreditError;

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Adds credit to the account (deltas >= 0).
    Credit,
    /// Removes credit from the account (deltas <= 0).
    Debit,
}

/// Result of applying a balance operation.
///
/// Invariants, enforced by the constructors in this module:
/// - `balance_after.promo >= 0` and `balance_after.purchased >= 0`
/// - credit operations produce non-negative deltas, debit operations
///   non-positive deltas
/// - `balance_after == balance_before + (promo_delta, purchased_delta)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedOperation {
    /// Entry direction.
    pub kind: EntryKind,
    /// Signed change to the promo tier.
    pub promo_delta: i64,
    /// Signed change to the purchased tier.
    pub purchased_delta: i64,
    /// Balance after the operation.
    pub balance_after: CreditBalance,
    /// Promo credit consumed (deductions only).
    pub promo_used: Option<i64>,
    /// Purchased credit consumed (deductions only).
    pub purchased_used: Option<i64>,
}

impl AppliedOperation {
    /// A zero-delta debit used as an audit marker.
    ///
    /// Written when a settlement shortfall left nothing collectable so the
    /// shortfall is still traceable in the log.
    #[must_use]
    pub const fn zero_debit(balance: CreditBalance) -> Self {
        Self {
            kind: EntryKind::Debit,
            promo_delta: 0,
            purchased_delta: 0,
            balance_after: balance,
            promo_used: Some(0),
            purchased_used: Some(0),
        }
    }
}

/// Public result of a committed balance operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationReceipt {
    /// Ledger entry id written for this operation.
    pub transaction_id: Uuid,
    /// Promo balance after the operation.
    pub promo_balance_after: i64,
    /// Purchased balance after the operation.
    pub purchased_balance_after: i64,
    /// Promo credit consumed (deductions only).
    pub promo_used: Option<i64>,
    /// Purchased credit consumed (deductions only).
    pub purchased_used: Option<i64>,
}

fn checked_credit(balance: CreditBalance, promo: i64, purchased: i64) -> Result<CreditBalance, CreditError> {
    let new_promo = balance
        .promo
        .checked_add(promo)
        .ok_or_else(|| CreditError::InvalidAmount("promo balance overflow".to_string()))?;
    let new_purchased = balance
        .purchased
        .checked_add(purchased)
        .ok_or_else(|| CreditError::InvalidAmount("purchased balance overflow".to_string()))?;
    new_promo
        .checked_add(new_purchased)
        .ok_or_else(|| CreditError::InvalidAmount("total balance overflow".to_string()))?;
    Ok(CreditBalance::new(new_promo, new_purchased))
}

fn validate_credit_amounts(promo: i64, purchased: i64) -> Result<(), CreditError> {
    if promo < 0 || purchased < 0 {
        return Err(CreditError::InvalidAmount(
            "amounts must be non-negative".to_string(),
        ));
    }
    if promo == 0 && purchased == 0 {
        return Err(CreditError::InvalidAmount(
            "at least one amount must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Adds credit to both tiers.
///
/// The engine enforces no upper bound; acquisition caps (e.g. the daily
/// check-in ceiling) are pre-computed by the caller.
///
/// # Errors
///
/// Returns [`CreditError::InvalidAmount`] if either amount is negative or
/// both are zero.
pub fn apply_grant(
    balance: CreditBalance,
    promo_amount: i64,
    purchased_amount: i64,
) -> Result<AppliedOperation, CreditError> {
    validate_credit_amounts(promo_amount, purchased_amount)?;
    let balance_after = checked_credit(balance, promo_amount, purchased_amount)?;

    Ok(AppliedOperation {
        kind: EntryKind::Credit,
        promo_delta: promo_amount,
        purchased_delta: purchased_amount,
        balance_after,
        promo_used: None,
        purchased_used: None,
    })
}

/// Removes a combined amount, consuming promo credit before purchased credit.
///
/// The promo-first ordering is a fixed policy, not configurable. Returns the
/// split actually consumed so callers can later refund exactly what was taken.
///
/// # Errors
///
/// Returns [`CreditError::InvalidAmount`] if `amount <= 0`, and
/// [`CreditError::InsufficientBalance`] if the combined balance does not
/// cover `amount`.
pub fn apply_deduct(balance: CreditBalance, amount: i64) -> Result<AppliedOperation, CreditError> {
    if amount <= 0 {
        return Err(CreditError::InvalidAmount(
            "deduction amount must be positive".to_string(),
        ));
    }

    let available = balance.total();
    if available < amount {
        return Err(CreditError::InsufficientBalance {
            available,
            required: amount,
        });
    }

    let promo_used = balance.promo.min(amount);
    let purchased_used = amount - promo_used;

    Ok(AppliedOperation {
        kind: EntryKind::Debit,
        promo_delta: -promo_used,
        purchased_delta: -purchased_used,
        balance_after: CreditBalance::new(
            balance.promo - promo_used,
            balance.purchased - purchased_used,
        ),
        promo_used: Some(promo_used),
        purchased_used: Some(purchased_used),
    })
}

/// Adds back specific amounts to each tier independently.
///
/// Used to reverse a prior deduction exactly; intentionally bypasses
/// acquisition caps since it restores previously-held credit.
///
/// # Errors
///
/// Returns [`CreditError::InvalidAmount`] if either amount is negative or
/// both are zero.
pub fn apply_refund(
    balance: CreditBalance,
    promo_amount: i64,
    purchased_amount: i64,
) -> Result<AppliedOperation, CreditError> {
    validate_credit_amounts(promo_amount, purchased_amount)?;
    let balance_after = checked_credit(balance, promo_amount, purchased_amount)?;

    Ok(AppliedOperation {
        kind: EntryKind::Credit,
        promo_delta: promo_amount,
        purchased_delta: purchased_amount,
        balance_after,
        promo_used: None,
        purchased_used: None,
    })
}

/// Administrator-initiated debit of each tier independently.
///
/// Fails per-tier: an operator can reclaim exactly the purchased portion of
/// a refund without touching promo credit, but never drive either tier
/// negative.
///
/// # Errors
///
/// Returns [`CreditError::InvalidAmount`] if either amount is negative or
/// both are zero, and [`CreditError::InsufficientBalance`] if either
/// requested deduction exceeds that tier's balance.
pub fn apply_admin_adjust(
    balance: CreditBalance,
    promo_deduct: i64,
    purchased_deduct: i64,
) -> Result<AppliedOperation, CreditError> {
    validate_credit_amounts(promo_deduct, purchased_deduct)?;

    if promo_deduct > balance.promo {
        return Err(CreditError::InsufficientBalance {
            available: balance.promo,
            required: promo_deduct,
        });
    }
    if purchased_deduct > balance.purchased {
        return Err(CreditError::InsufficientBalance {
            available: balance.purchased,
            required: purchased_deduct,
        });
    }

    Ok(AppliedOperation {
        kind: EntryKind::Debit,
        promo_delta: -promo_deduct,
        purchased_delta: -purchased_deduct,
        balance_after: CreditBalance::new(
            balance.promo - promo_deduct,
            balance.purchased - purchased_deduct,
        ),
        promo_used: Some(promo_deduct),
        purchased_used: Some(purchased_deduct),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_adds_both_tiers() {
        let applied = apply_grant(CreditBalance::new(100, 50), 30, 20).unwrap();
        assert_eq!(applied.kind, EntryKind::Credit);
        assert_eq!(applied.promo_delta, 30);
        assert_eq!(applied.purchased_delta, 20);
        assert_eq!(applied.balance_after, CreditBalance::new(130, 70));
        assert!(applied.promo_used.is_none());
    }

    #[test]
    fn test_grant_rejects_zero_and_negative() {
        assert!(matches!(
            apply_grant(CreditBalance::zero(), 0, 0),
            Err(CreditError::InvalidAmount(_))
        ));
        assert!(matches!(
            apply_grant(CreditBalance::zero(), -1, 10),
            Err(CreditError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_grant_rejects_overflow() {
        assert!(matches!(
            apply_grant(CreditBalance::new(i64::MAX, 0), 1, 0),
            Err(CreditError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_deduct_consumes_promo_first() {
        let applied = apply_deduct(CreditBalance::new(300, 500), 400).unwrap();
        assert_eq!(applied.kind, EntryKind::Debit);
        assert_eq!(applied.promo_used, Some(300));
        assert_eq!(applied.purchased_used, Some(100));
        assert_eq!(applied.promo_delta, -300);
        assert_eq!(applied.purchased_delta, -100);
        assert_eq!(applied.balance_after, CreditBalance::new(0, 400));
    }

    #[test]
    fn test_deduct_within_promo_leaves_purchased_untouched() {
        let applied = apply_deduct(CreditBalance::new(1000, 0), 600).unwrap();
        assert_eq!(applied.promo_used, Some(600));
        assert_eq!(applied.purchased_used, Some(0));
        assert_eq!(applied.balance_after, CreditBalance::new(400, 0));
    }

    #[test]
    fn test_deduct_insufficient_carries_available() {
        let err = apply_deduct(CreditBalance::new(100, 50), 200).unwrap_err();
        match err {
            CreditError::InsufficientBalance {
                available,
                required,
            } => {
                assert_eq!(available, 150);
                assert_eq!(required, 200);
            }
            other => panic!("expected InsufficientBalance, got {other:?}"),
        }
    }

    #[test]
    fn test_deduct_rejects_non_positive() {
        assert!(matches!(
            apply_deduct(CreditBalance::new(100, 0), 0),
            Err(CreditError::InvalidAmount(_))
        ));
        assert!(matches!(
            apply_deduct(CreditBalance::new(100, 0), -5),
            Err(CreditError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_deduct_exact_balance_empties_account() {
        let applied = apply_deduct(CreditBalance::new(300, 500), 800).unwrap();
        assert!(applied.balance_after.is_zero());
    }

    #[test]
    fn test_refund_restores_specific_tiers() {
        let applied = apply_refund(CreditBalance::new(0, 400), 300, 100).unwrap();
        assert_eq!(applied.kind, EntryKind::Credit);
        assert_eq!(applied.balance_after, CreditBalance::new(300, 500));
    }

    #[test]
    fn test_refund_reverses_deduct_exactly() {
        let start = CreditBalance::new(300, 500);
        let deducted = apply_deduct(start, 400).unwrap();
        let refunded = apply_refund(
            deducted.balance_after,
            deducted.promo_used.unwrap(),
            deducted.purchased_used.unwrap(),
        )
        .unwrap();
        assert_eq!(refunded.balance_after, start);
    }

    #[test]
    fn test_admin_adjust_per_tier() {
        let applied = apply_admin_adjust(CreditBalance::new(100, 500), 0, 200).unwrap();
        assert_eq!(applied.balance_after, CreditBalance::new(100, 300));
        assert_eq!(applied.purchased_used, Some(200));
    }

    #[test]
    fn test_admin_adjust_fails_per_tier() {
        // Enough total, but not enough promo: the per-tier check must fail.
        let err = apply_admin_adjust(CreditBalance::new(100, 500), 200, 0).unwrap_err();
        match err {
            CreditError::InsufficientBalance {
                available,
                required,
            } => {
                assert_eq!(available, 100);
                assert_eq!(required, 200);
            }
            other => panic!("expected InsufficientBalance, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_debit_preserves_balance() {
        let balance = CreditBalance::new(0, 0);
        let applied = AppliedOperation::zero_debit(balance);
        assert_eq!(applied.kind, EntryKind::Debit);
        assert_eq!(applied.promo_delta, 0);
        assert_eq!(applied.purchased_delta, 0);
        assert_eq!(applied.balance_after, balance);
    }
}
