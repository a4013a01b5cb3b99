//! Core business logic for the Scriva credit ledger.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, state transitions, and validation rules live here.
//!
//! # Modules
//!
//! - `credit` - Balance operations (grant/deduct/refund/adjust) and pricing
//! - `settlement` - Pre-charge settlement planning for chargeable jobs
//! - `webhook` - Payment webhook signature verification and event parsing
//! - `audit` - Ledger replay summation for integrity checks

pub mod audit;
pub mod credit;
pub mod settlement;
pub mod webhook;
