//! Two-tier credit balance type.
//!
//! Credits are integral and never fractional. Every account carries two
//! tiers: promotional credit granted by the platform and purchased credit
//! paid for through the payment provider.

use serde::{Deserialize, Serialize};

/// A two-tier credit balance.
///
/// Invariants, enforced by the balance operations that produce values of
/// this type:
/// - both tiers are non-negative,
/// - the sum of both tiers fits in `i64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CreditBalance {
    /// Promotional credit (granted by the platform).
    pub promo: i64,
    /// Purchased credit (paid for by the user).
    pub purchased: i64,
}

impl CreditBalance {
    /// Creates a balance from both tiers.
    #[must_use]
    pub const fn new(promo: i64, purchased: i64) -> Self {
        Self { promo, purchased }
    }

    /// An empty balance.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            promo: 0,
            purchased: 0,
        }
    }

    /// Total spendable credit across both tiers.
    #[must_use]
    pub const fn total(&self) -> i64 {
        self.promo + self.purchased
    }

    /// Returns true if both tiers are empty.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.promo == 0 && self.purchased == 0
    }
}

impl std::fmt::Display for CreditBalance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} promo / {} purchased", self.promo, self.purchased)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_sums_both_tiers() {
        let balance = CreditBalance::new(300, 500);
        assert_eq!(balance.total(), 800);
    }

    #[test]
    fn test_zero_balance() {
        let balance = CreditBalance::zero();
        assert!(balance.is_zero());
        assert_eq!(balance.total(), 0);
    }

    #[test]
    fn test_display() {
        let balance = CreditBalance::new(100, 250);
        assert_eq!(balance.to_string(), "100 promo / 250 purchased");
    }
}
