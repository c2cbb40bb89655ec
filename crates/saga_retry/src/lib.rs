//! Bounded retry with exponential backoff, and a circuit breaker.
//!
//! Retry is a policy value owned by the caller; nothing here holds global
//! state.

mod breaker;
mod policy;

pub use breaker::{CircuitBreaker, CircuitState};
pub use policy::{RetryPolicy, retry_with_backoff};
