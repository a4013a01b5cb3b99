//! Property tests for balance state transitions.

use proptest::prelude::*;

use scriva_shared::types::CreditBalance;

use super::ops::{EntryKind, apply_admin_adjust, apply_deduct, apply_grant, apply_refund};

fn balance_strategy() -> impl Strategy<Value = CreditBalance> {
    (0i64..1_000_000, 0i64..1_000_000).prop_map(|(promo, purchased)| CreditBalance::new(promo, purchased))
}

fn amount_strategy() -> impl Strategy<Value = i64> {
    1i64..1_000_000
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The resulting balance always equals the starting balance plus the
    /// signed deltas, for every operation.
    #[test]
    fn prop_deltas_conserve_balance(
        balance in balance_strategy(),
        amount in amount_strategy(),
    ) {
        if let Ok(applied) = apply_deduct(balance, amount) {
            prop_assert_eq!(applied.balance_after.promo, balance.promo + applied.promo_delta);
            prop_assert_eq!(
                applied.balance_after.purchased,
                balance.purchased + applied.purchased_delta
            );
        }
    }

    /// No operation ever produces a negative tier.
    #[test]
    fn prop_balances_stay_non_negative(
        balance in balance_strategy(),
        amount in amount_strategy(),
        promo in 0i64..1_000_000,
        purchased in 0i64..1_000_000,
    ) {
        if let Ok(applied) = apply_deduct(balance, amount) {
            prop_assert!(applied.balance_after.promo >= 0);
            prop_assert!(applied.balance_after.purchased >= 0);
        }
        if let Ok(applied) = apply_grant(balance, promo, purchased) {
            prop_assert!(applied.balance_after.promo >= 0);
            prop_assert!(applied.balance_after.purchased >= 0);
        }
        if let Ok(applied) = apply_admin_adjust(balance, promo, purchased) {
            prop_assert!(applied.balance_after.promo >= 0);
            prop_assert!(applied.balance_after.purchased >= 0);
        }
    }

    /// Deduct never touches purchased credit while promo credit remains.
    #[test]
    fn prop_deduct_is_promo_first(
        balance in balance_strategy(),
        amount in amount_strategy(),
    ) {
        if let Ok(applied) = apply_deduct(balance, amount) {
            let promo_used = applied.promo_used.unwrap();
            let purchased_used = applied.purchased_used.unwrap();

            prop_assert_eq!(promo_used + purchased_used, amount);
            // Purchased credit is consumed only once promo is exhausted.
            if purchased_used > 0 {
                prop_assert_eq!(applied.balance_after.promo, 0);
            }
            prop_assert_eq!(promo_used, balance.promo.min(amount));
        }
    }

    /// Deduct succeeds exactly when the combined balance covers the amount.
    #[test]
    fn prop_deduct_succeeds_iff_covered(
        balance in balance_strategy(),
        amount in amount_strategy(),
    ) {
        let result = apply_deduct(balance, amount);
        if balance.total() >= amount {
            prop_assert!(result.is_ok());
        } else {
            let insufficient = matches!(
                result,
                Err(super::error::CreditError::InsufficientBalance { .. })
            );
            prop_assert!(insufficient, "expected InsufficientBalance, got {:?}", result);
        }
    }

    /// Refunding the consumed split of a deduct restores the exact balance.
    #[test]
    fn prop_refund_reverses_deduct(
        balance in balance_strategy(),
        amount in amount_strategy(),
    ) {
        if let Ok(deducted) = apply_deduct(balance, amount) {
            let refunded = apply_refund(
                deducted.balance_after,
                deducted.promo_used.unwrap(),
                deducted.purchased_used.unwrap(),
            )
            .unwrap();
            prop_assert_eq!(refunded.balance_after, balance);
        }
    }

    /// Delta signs always match the entry kind.
    #[test]
    fn prop_delta_signs_match_kind(
        balance in balance_strategy(),
        amount in amount_strategy(),
        promo in 0i64..1_000_000,
        purchased in 0i64..1_000_000,
    ) {
        if let Ok(applied) = apply_grant(balance, promo, purchased) {
            prop_assert_eq!(applied.kind, EntryKind::Credit);
            prop_assert!(applied.promo_delta >= 0);
            prop_assert!(applied.purchased_delta >= 0);
        }
        if let Ok(applied) = apply_deduct(balance, amount) {
            prop_assert_eq!(applied.kind, EntryKind::Debit);
            prop_assert!(applied.promo_delta <= 0);
            prop_assert!(applied.purchased_delta <= 0);
        }
    }
}
