//! Ledger replay summation for integrity checks.
//!
//! The auditor streams an account's ledger entries in batches, folds the
//! signed deltas through [`LedgerSum`], and compares the result to the
//! stored balances. Mismatches are reported, never auto-corrected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use scriva_shared::types::CreditBalance;

/// Running sums over a ledger entry stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerSum {
    /// Sum of promo deltas seen so far.
    pub promo: i64,
    /// Sum of purchased deltas seen so far.
    pub purchased: i64,
    /// Number of entries folded.
    pub entry_count: u64,
}

impl LedgerSum {
    /// Folds one entry's deltas into the sums.
    pub fn add(&mut self, promo_delta: i64, purchased_delta: i64) {
        self.promo += promo_delta;
        self.purchased += purchased_delta;
        self.entry_count += 1;
    }

    /// The balance implied by the replayed history.
    #[must_use]
    pub const fn as_balance(&self) -> CreditBalance {
        CreditBalance::new(self.promo, self.purchased)
    }
}

/// Result of comparing stored balances against the replayed history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IntegrityReport {
    /// The audited account.
    pub account_id: Uuid,
    /// True when stored and calculated balances agree.
    pub is_valid: bool,
    /// Balances currently stored on the account row.
    pub stored: CreditBalance,
    /// Balances calculated by replaying the ledger.
    pub calculated: CreditBalance,
    /// Entries replayed.
    pub entry_count: u64,
}

impl IntegrityReport {
    /// Builds the report from the stored balance and a completed fold.
    #[must_use]
    pub fn compare(account_id: Uuid, stored: CreditBalance, sum: &LedgerSum) -> Self {
        let calculated = sum.as_balance();
        Self {
            account_id,
            is_valid: stored == calculated,
            stored,
            calculated,
            entry_count: sum.entry_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sum_folds_signed_deltas() {
        let mut sum = LedgerSum::default();
        sum.add(1000, 0);
        sum.add(-600, 0);
        sum.add(0, 500);
        sum.add(0, -100);

        assert_eq!(sum.as_balance(), CreditBalance::new(400, 400));
        assert_eq!(sum.entry_count, 4);
    }

    #[test]
    fn test_matching_balances_are_valid() {
        let mut sum = LedgerSum::default();
        sum.add(1000, 0);
        sum.add(-600, 0);

        let report =
            IntegrityReport::compare(Uuid::nil(), CreditBalance::new(400, 0), &sum);
        assert!(report.is_valid);
        assert_eq!(report.entry_count, 2);
    }

    #[test]
    fn test_mismatch_is_reported() {
        let mut sum = LedgerSum::default();
        sum.add(1000, 0);

        let report =
            IntegrityReport::compare(Uuid::nil(), CreditBalance::new(900, 0), &sum);
        assert!(!report.is_valid);
        assert_eq!(report.stored, CreditBalance::new(900, 0));
        assert_eq!(report.calculated, CreditBalance::new(1000, 0));
    }

    #[test]
    fn test_empty_history_matches_zero_balance() {
        let sum = LedgerSum::default();
        let report = IntegrityReport::compare(Uuid::nil(), CreditBalance::zero(), &sum);
        assert!(report.is_valid);
        assert_eq!(report.entry_count, 0);
    }

    proptest! {
        /// Folding deltas in any batch split yields the same sums as one pass.
        #[test]
        fn prop_fold_is_batch_independent(
            deltas in prop::collection::vec((-10_000i64..10_000, -10_000i64..10_000), 0..50),
            split in 0usize..50,
        ) {
            let split = split.min(deltas.len());

            let mut whole = LedgerSum::default();
            for (p, e) in &deltas {
                whole.add(*p, *e);
            }

            let mut batched = LedgerSum::default();
            for (p, e) in &deltas[..split] {
                batched.add(*p, *e);
            }
            for (p, e) in &deltas[split..] {
                batched.add(*p, *e);
            }

            prop_assert_eq!(whole, batched);
        }
    }
}
