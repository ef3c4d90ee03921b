use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::info;
use typed_builder::TypedBuilder;

/// The state of a [`CircuitBreaker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls pass through; consecutive failures are counted.
    Closed,
    /// Calls fail fast without reaching the dependency.
    Open,
    /// A bounded number of probe calls is admitted to test recovery.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => f.write_str("closed"),
            CircuitState::Open => f.write_str("open"),
            CircuitState::HalfOpen => f.write_str("half-open"),
        }
    }
}

/// Hook invoked on every state transition with `(name, from, to)`.
pub type StateChangeHook = Arc<dyn Fn(&str, CircuitState, CircuitState) + Send + Sync>;

/// Configuration for a [`CircuitBreaker`].
#[derive(TypedBuilder)]
pub struct CircuitBreakerConfig {
    /// Name used in logs and state-change notifications.
    #[builder(default = "breaker".to_string(), setter(into))]
    pub name: String,
    /// Probe budget while half-open; also the number of consecutive
    /// probe successes required to close the breaker again.
    #[builder(default = 1)]
    pub max_requests: u32,
    /// How often the closed-state counters are reset, so isolated
    /// spikes do not accumulate indefinitely. Zero disables the reset.
    #[builder(default = Duration::from_secs(60))]
    pub interval: Duration,
    /// How long the breaker stays open before admitting probes.
    #[builder(default = Duration::from_secs(30))]
    pub timeout: Duration,
    /// Number of consecutive failures that trips the breaker.
    #[builder(default = 5)]
    pub consecutive_failures: u32,
    /// Optional observer notified of every state transition.
    #[builder(default, setter(strip_option))]
    pub on_state_change: Option<StateChangeHook>,
}

/// Error returned by [`CircuitBreaker::call`].
#[derive(Debug, Clone, Error)]
pub enum BreakerError<E> {
    /// The call was not attempted because the breaker is open.
    #[error("circuit breaker is open")]
    Open,
    /// The call was attempted and the dependency failed.
    #[error(transparent)]
    Inner(E),
}

#[derive(Debug, Default, Clone, Copy)]
struct Counts {
    requests: u32,
    consecutive_successes: u32,
    consecutive_failures: u32,
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    generation: u64,
    counts: Counts,
    /// Closed: when the counters reset. Open: when probes are admitted.
    expiry: Option<Instant>,
}

/// A three-state circuit breaker for one dependency.
///
/// Two breakers never share state; create one instance per dependency.
/// The internal state machine is guarded by a mutex and never held
/// across an await, so transitions are linearizable with respect to the
/// breaker's own methods.
///
/// Results that arrive after a state transition (stale probes) are
/// discarded via a generation counter, matching the behavior of the
/// usual gobreaker-style implementations.
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        let expiry = interval_expiry(config.interval, Instant::now());
        Self {
            config,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                generation: 0,
                counts: Counts::default(),
                expiry,
            }),
        }
    }

    /// The breaker's current state, advancing Open → HalfOpen if the
    /// cooldown has elapsed.
    pub fn state(&self) -> CircuitState {
        let mut inner = self.inner.lock().expect("circuit breaker lock poisoned");
        self.refresh(&mut inner, Instant::now());
        inner.state
    }

    /// Runs `op` through the breaker.
    ///
    /// Returns [`BreakerError::Open`] without polling `op` when the
    /// breaker rejects the call. An `Err` from `op` counts as a failure;
    /// every `Ok` counts as a success — a cache miss is an `Ok(None)`
    /// and is therefore never a failure.
    pub async fn call<T, E, Fut>(&self, op: Fut) -> Result<T, BreakerError<E>>
    where
        Fut: Future<Output = Result<T, E>>,
    {
        let generation = self.acquire().ok_or(BreakerError::Open)?;
        match op.await {
            Ok(value) => {
                self.on_success(generation);
                Ok(value)
            }
            Err(error) => {
                self.on_failure(generation);
                Err(BreakerError::Inner(error))
            }
        }
    }

    /// Admits or rejects a call, returning the generation to report the
    /// result against.
    fn acquire(&self) -> Option<u64> {
        let mut inner = self.inner.lock().expect("circuit breaker lock poisoned");
        let now = Instant::now();
        self.refresh(&mut inner, now);

        match inner.state {
            CircuitState::Closed => {
                inner.counts.requests += 1;
                Some(inner.generation)
            }
            CircuitState::Open => None,
            CircuitState::HalfOpen => {
                if inner.counts.requests >= self.config.max_requests {
                    return None;
                }
                inner.counts.requests += 1;
                Some(inner.generation)
            }
        }
    }

    fn on_success(&self, generation: u64) {
        let mut inner = self.inner.lock().expect("circuit breaker lock poisoned");
        let now = Instant::now();
        self.refresh(&mut inner, now);
        if inner.generation != generation {
            return;
        }

        inner.counts.consecutive_successes += 1;
        inner.counts.consecutive_failures = 0;
        if inner.state == CircuitState::HalfOpen
            && inner.counts.consecutive_successes >= self.config.max_requests
        {
            self.transition(&mut inner, CircuitState::Closed, now);
        }
    }

    fn on_failure(&self, generation: u64) {
        let mut inner = self.inner.lock().expect("circuit breaker lock poisoned");
        let now = Instant::now();
        self.refresh(&mut inner, now);
        if inner.generation != generation {
            return;
        }

        match inner.state {
            CircuitState::Closed => {
                inner.counts.consecutive_failures += 1;
                inner.counts.consecutive_successes = 0;
                if inner.counts.consecutive_failures >= self.config.consecutive_failures {
                    self.transition(&mut inner, CircuitState::Open, now);
                }
            }
            CircuitState::HalfOpen => {
                self.transition(&mut inner, CircuitState::Open, now);
            }
            CircuitState::Open => {}
        }
    }

    /// Applies time-based transitions: counter resets while closed and
    /// the Open → HalfOpen cooldown.
    fn refresh(&self, inner: &mut Inner, now: Instant) {
        match inner.state {
            CircuitState::Closed => {
                if let Some(expiry) = inner.expiry {
                    if now >= expiry {
                        new_generation(inner);
                        inner.expiry = interval_expiry(self.config.interval, now);
                    }
                }
            }
            CircuitState::Open => {
                if matches!(inner.expiry, Some(expiry) if now >= expiry) {
                    self.transition(inner, CircuitState::HalfOpen, now);
                }
            }
            CircuitState::HalfOpen => {}
        }
    }

    fn transition(&self, inner: &mut Inner, to: CircuitState, now: Instant) {
        let from = inner.state;
        if from == to {
            return;
        }
        inner.state = to;
        new_generation(inner);
        inner.expiry = match to {
            CircuitState::Closed => interval_expiry(self.config.interval, now),
            CircuitState::Open => Some(now + self.config.timeout),
            CircuitState::HalfOpen => None,
        };

        info!(breaker = %self.config.name, %from, %to, "circuit breaker state change");
        if let Some(hook) = &self.config.on_state_change {
            hook(&self.config.name, from, to);
        }
    }
}

fn new_generation(inner: &mut Inner) {
    inner.generation += 1;
    inner.counts = Counts::default();
}

fn interval_expiry(interval: Duration, now: Instant) -> Option<Instant> {
    if interval.is_zero() {
        None
    } else {
        Some(now + interval)
    }
}
