// ABOUTME: Provider resilience primitives for the orchestration core
// ABOUTME: Circuit breaker and token-bucket rate limiting, keyed per provider

//! Per-provider failure and quota protection used by the tool dispatch and
//! connection layer: a [`CircuitBreaker`] per provider trips after repeated
//! failures or slow calls, and a [`rate_limiter::RateLimiter`] enforces
//! provider-side request quotas via a token bucket.
//!
//! ## Example
//!
//! ```rust,no_run
//! use orch_hooks::{CircuitBreaker, RateLimiter, TokenBucketConfig};
//! use std::time::Duration;
//!
//! let breaker = CircuitBreaker::new("anthropic".to_string());
//! if breaker.can_execute() {
//!     // call the provider, then record the outcome
//!     breaker.record_success(Duration::from_millis(120));
//! }
//!
//! let limiter = RateLimiter::new(TokenBucketConfig::default());
//! let (allowed, _remaining) = limiter.try_acquire("anthropic", 1.0);
//! assert!(allowed || !allowed);
//! ```

pub mod circuit_breaker;
pub mod rate_limiter;

pub use circuit_breaker::{
    BreakerConfig, BreakerState, CircuitBreaker, CircuitBreakerManager, CircuitBreakerStats,
};
pub use rate_limiter::{
    token_bucket::TokenBucket, BucketState, RateLimiter, RateLimiterConfig, TokenBucketConfig,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{BreakerState, CircuitBreaker, CircuitBreakerManager, RateLimiter};
}
