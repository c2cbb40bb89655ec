//! Circuit breaker for short-circuiting calls to a failing provider.

use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls flow normally.
    Closed,
    /// Calls are rejected until the cooldown elapses.
    Open,
    /// Probing whether the provider recovered.
    HalfOpen,
}

/// Opens after `failure_threshold` consecutive failures and stays open for
/// `cooldown`, then lets probe calls through. `success_threshold` probe
/// successes close it again; a probe failure reopens it.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    state: CircuitState,
    failure_threshold: usize,
    failure_count: usize,
    success_threshold: usize,
    success_count: usize,
    cooldown: Duration,
    opened_at: Option<Instant>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(5, 1, Duration::from_secs(30))
    }
}

impl CircuitBreaker {
    /// Creates a closed circuit breaker.
    pub fn new(failure_threshold: usize, success_threshold: usize, cooldown: Duration) -> Self {
        Self {
            state: CircuitState::Closed,
            failure_threshold: failure_threshold.max(1),
            failure_count: 0,
            success_threshold: success_threshold.max(1),
            success_count: 0,
            cooldown,
            opened_at: None,
        }
    }

    /// Whether a call may proceed now. Moves an open breaker to half-open
    /// once the cooldown has elapsed.
    #[instrument(skip(self), fields(state = ?self.state))]
    pub fn allow_request(&mut self) -> bool {
        if self.state == CircuitState::Open {
            let cooled = self
                .opened_at
                .is_none_or(|opened| opened.elapsed() >= self.cooldown);
            if cooled {
                debug!("Circuit breaker entering half-open state");
                self.state = CircuitState::HalfOpen;
                self.success_count = 0;
            }
        }
        self.state != CircuitState::Open
    }

    /// Records a successful call.
    #[instrument(skip(self))]
    pub fn record_success(&mut self) {
        match self.state {
            CircuitState::Closed => {
                self.failure_count = 0;
            }
            CircuitState::HalfOpen => {
                self.success_count += 1;
                if self.success_count >= self.success_threshold {
                    debug!("Circuit breaker closing after successful recovery");
                    self.close();
                }
            }
            CircuitState::Open => self.close(),
        }
    }

    /// Records a failed call.
    #[instrument(skip(self))]
    pub fn record_failure(&mut self) {
        match self.state {
            CircuitState::Closed => {
                self.failure_count += 1;
                if self.failure_count >= self.failure_threshold {
                    warn!(failures = self.failure_count, "Circuit breaker opening");
                    self.open();
                }
            }
            CircuitState::HalfOpen => {
                warn!("Circuit breaker reopening after failure in half-open state");
                self.open();
            }
            CircuitState::Open => {}
        }
    }

    /// Current state.
    pub fn state(&self) -> CircuitState {
        self.state
    }

    fn open(&mut self) {
        self.state = CircuitState::Open;
        self.opened_at = Some(Instant::now());
        self.success_count = 0;
    }

    fn close(&mut self) {
        self.state = CircuitState::Closed;
        self.failure_count = 0;
        self.success_count = 0;
        self.opened_at = None;
    }
}
