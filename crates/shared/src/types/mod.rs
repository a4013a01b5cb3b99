//! Common types used across the application.

pub mod credits;
pub mod pagination;

pub use credits::CreditBalance;
pub use pagination::{PageRequest, PageResponse};
