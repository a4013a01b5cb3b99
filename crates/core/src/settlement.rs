//! Settlement planning for pre-charged jobs.
//!
//! A chargeable job is billed an estimate up front (the pre-charge) and
//! reconciled once against its actual cost when it reaches a terminal state.
//! `plan_settlement` is the pure decision: given the pre-charge, the job
//! outcome, and the balance currently available, it produces the single
//! ledger action the executor must take.

use serde::{Deserialize, Serialize};

use scriva_shared::types::CreditBalance;

/// The amounts held from an account when a job was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreCharge {
    /// Total credits pre-charged.
    pub total: i64,
    /// Promo portion of the pre-charge.
    pub promo: i64,
    /// Purchased portion of the pre-charge.
    pub purchased: i64,
}

/// Terminal outcome reported for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// The job delivered a result at the given actual cost.
    Succeeded {
        /// Credits the job actually consumed.
        actual_cost: i64,
    },
    /// The job failed; the user owes nothing.
    Failed,
}

/// The single ledger action a settlement requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementPlan {
    /// Failure: return the full pre-charge split exactly as it was taken.
    RefundPreCharge {
        /// Promo credit to restore.
        promo: i64,
        /// Purchased credit to restore.
        purchased: i64,
    },
    /// Actual cost matched the estimate; no ledger entry needed.
    NoAdjustment,
    /// The job cost more than pre-charged: collect what the balance covers.
    ///
    /// `amount` may be zero when the account is empty; the executor still
    /// writes a zero-amount audit entry so the shortfall is traceable.
    CollectExtra {
        /// Credits collectable now (`min(diff, available)`).
        amount: i64,
        /// Uncollected remainder accepted as revenue loss.
        shortfall: i64,
    },
    /// The job cost less than pre-charged: return the difference.
    ///
    /// Drawn purchased-first, the deliberate inverse of deduction order,
    /// since it returns money the user already paid for.
    RefundDifference {
        /// Promo credit to restore.
        promo: i64,
        /// Purchased credit to restore.
        purchased: i64,
    },
}

/// Decides the settlement action for a finished job.
///
/// `available` is the account balance at settlement time, read under the
/// same lock the executor holds while applying the plan.
#[must_use]
pub fn plan_settlement(
    pre_charge: PreCharge,
    outcome: JobOutcome,
    available: CreditBalance,
) -> SettlementPlan {
    match outcome {
        JobOutcome::Failed => SettlementPlan::RefundPreCharge {
            promo: pre_charge.promo,
            purchased: pre_charge.purchased,
        },
        JobOutcome::Succeeded { actual_cost } => {
            let diff = actual_cost - pre_charge.total;
            if diff == 0 {
                SettlementPlan::NoAdjustment
            } else if diff > 0 {
                let amount = diff.min(available.total());
                SettlementPlan::CollectExtra {
                    amount,
                    shortfall: diff - amount,
                }
            } else {
                let refund = -diff;
                let purchased = pre_charge.purchased.min(refund);
                SettlementPlan::RefundDifference {
                    promo: refund - purchased,
                    purchased,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_failed_job_refunds_full_precharge() {
        // promo=1000 account pre-charged 600, all from promo.
        let pre = PreCharge {
            total: 600,
            promo: 600,
            purchased: 0,
        };
        let plan = plan_settlement(pre, JobOutcome::Failed, CreditBalance::new(400, 0));
        assert_eq!(
            plan,
            SettlementPlan::RefundPreCharge {
                promo: 600,
                purchased: 0,
            }
        );
    }

    #[test]
    fn test_exact_cost_needs_no_adjustment() {
        let pre = PreCharge {
            total: 400,
            promo: 300,
            purchased: 100,
        };
        let plan = plan_settlement(
            pre,
            JobOutcome::Succeeded { actual_cost: 400 },
            CreditBalance::new(0, 400),
        );
        assert_eq!(plan, SettlementPlan::NoAdjustment);
    }

    // Start 300/500, pre-charge 400 -> available 0/400. The overrun is
    // collected up to the available balance; the rest is a shortfall.
    #[rstest]
    #[case::covered(700, 300, 0)]
    #[case::beyond_balance(1200, 400, 400)]
    fn test_overrun_collects_what_the_balance_covers(
        #[case] actual_cost: i64,
        #[case] amount: i64,
        #[case] shortfall: i64,
    ) {
        let pre = PreCharge {
            total: 400,
            promo: 300,
            purchased: 100,
        };
        let plan = plan_settlement(
            pre,
            JobOutcome::Succeeded { actual_cost },
            CreditBalance::new(0, 400),
        );
        assert_eq!(plan, SettlementPlan::CollectExtra { amount, shortfall });
    }

    #[test]
    fn test_overrun_on_empty_account_collects_zero() {
        let pre = PreCharge {
            total: 400,
            promo: 400,
            purchased: 0,
        };
        let plan = plan_settlement(
            pre,
            JobOutcome::Succeeded { actual_cost: 500 },
            CreditBalance::zero(),
        );
        assert_eq!(
            plan,
            SettlementPlan::CollectExtra {
                amount: 0,
                shortfall: 100,
            }
        );
    }

    #[test]
    fn test_underrun_refunds_purchased_first() {
        // Pre-charged 400 (300 promo / 100 purchased), actual 150: refund 250
        // purchased-first, so all 100 purchased comes back before promo.
        let pre = PreCharge {
            total: 400,
            promo: 300,
            purchased: 100,
        };
        let plan = plan_settlement(
            pre,
            JobOutcome::Succeeded { actual_cost: 150 },
            CreditBalance::new(0, 400),
        );
        assert_eq!(
            plan,
            SettlementPlan::RefundDifference {
                promo: 150,
                purchased: 100,
            }
        );
    }

    #[test]
    fn test_underrun_smaller_than_purchased_portion() {
        let pre = PreCharge {
            total: 400,
            promo: 100,
            purchased: 300,
        };
        let plan = plan_settlement(
            pre,
            JobOutcome::Succeeded { actual_cost: 350 },
            CreditBalance::zero(),
        );
        assert_eq!(
            plan,
            SettlementPlan::RefundDifference {
                promo: 0,
                purchased: 50,
            }
        );
    }

    #[test]
    fn test_free_job_refunds_everything() {
        let pre = PreCharge {
            total: 400,
            promo: 300,
            purchased: 100,
        };
        let plan = plan_settlement(
            pre,
            JobOutcome::Succeeded { actual_cost: 0 },
            CreditBalance::zero(),
        );
        assert_eq!(
            plan,
            SettlementPlan::RefundDifference {
                promo: 300,
                purchased: 100,
            }
        );
    }
}
