//! Credit balance operations.
//!
//! This module implements the two-tier credit engine:
//! - Pure state transitions for grant, deduct, refund, and admin adjust
//! - Error types with stable machine-readable codes
//! - Credit pricing configuration and its TTL cache

pub mod error;
pub mod ops;
pub mod pricing;

#[cfg(test)]
mod ops_props;

pub use error::CreditError;
pub use ops::{
    AppliedOperation, EntryKind, OperationReceipt, apply_admin_adjust, apply_deduct, apply_grant,
    apply_refund,
};
pub use pricing::{CreditPricing, PricingCache};
