//! Credit pricing configuration and its TTL cache.
//!
//! Pricing lives in a platform settings row and changes rarely, so readers
//! go through an explicit `{value, expires_at}` cache slot. The cache is
//! constructor-injected into whatever component needs pricing; there are no
//! module-level singletons.

use std::sync::RwLock;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Credit costs and grant sizes, in whole credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditPricing {
    /// Pre-charge estimate for a text generation job.
    pub text_generation_cost: i64,
    /// Pre-charge estimate for an image generation job.
    pub image_generation_cost: i64,
    /// Promo credit granted at signup.
    pub signup_grant: i64,
    /// Promo credit granted per daily check-in.
    pub daily_checkin_reward: i64,
    /// Maximum promo credit grantable through check-ins per UTC day.
    pub daily_checkin_cap: i64,
}

impl Default for CreditPricing {
    fn default() -> Self {
        Self {
            text_generation_cost: 50,
            image_generation_cost: 200,
            signup_grant: 1000,
            daily_checkin_reward: 50,
            daily_checkin_cap: 150,
        }
    }
}

struct CachedPricing {
    value: CreditPricing,
    expires_at: Instant,
}

/// TTL cache slot for [`CreditPricing`].
///
/// `get` returns `None` once the slot expires; the caller reloads from the
/// settings store and calls `store`. A poisoned lock is treated as a miss.
pub struct PricingCache {
    ttl: Duration,
    slot: RwLock<Option<CachedPricing>>,
}

impl PricingCache {
    /// Creates an empty cache with the given TTL.
    #[must_use]
    pub const fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    /// Returns the cached pricing if present and not expired.
    #[must_use]
    pub fn get(&self) -> Option<CreditPricing> {
        let guard = self.slot.read().ok()?;
        guard
            .as_ref()
            .filter(|cached| cached.expires_at > Instant::now())
            .map(|cached| cached.value)
    }

    /// Stores a freshly loaded value, resetting the expiry.
    pub fn store(&self, value: CreditPricing) {
        if let Ok(mut guard) = self.slot.write() {
            *guard = Some(CachedPricing {
                value,
                expires_at: Instant::now() + self.ttl,
            });
        }
    }

    /// Drops the cached value so the next read reloads.
    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.slot.write() {
            *guard = None;
        }
    }
}

impl std::fmt::Debug for PricingCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PricingCache")
            .field("ttl", &self.ttl)
            .field("cached", &self.get().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_cache_misses() {
        let cache = PricingCache::new(Duration::from_secs(60));
        assert!(cache.get().is_none());
    }

    #[test]
    fn test_store_then_get() {
        let cache = PricingCache::new(Duration::from_secs(60));
        let pricing = CreditPricing {
            text_generation_cost: 75,
            ..CreditPricing::default()
        };
        cache.store(pricing);
        assert_eq!(cache.get(), Some(pricing));
    }

    #[test]
    fn test_expired_value_misses() {
        let cache = PricingCache::new(Duration::ZERO);
        cache.store(CreditPricing::default());
        assert!(cache.get().is_none());
    }

    #[test]
    fn test_invalidate_clears_slot() {
        let cache = PricingCache::new(Duration::from_secs(60));
        cache.store(CreditPricing::default());
        cache.invalidate();
        assert!(cache.get().is_none());
    }
}
