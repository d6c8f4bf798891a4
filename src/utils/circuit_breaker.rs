//! Circuit breaker for outbound provider calls
//!
//! Closed -> Open after `failure_threshold` consecutive failures; Open ->
//! HalfOpen once `reset_timeout` has elapsed; HalfOpen -> Closed after
//! `success_threshold` consecutive successes. Every call is bounded by the
//! operation timeout.

use serde::Serialize;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config;
use crate::errors::AppResult;

/// Result of a guarded call together with breaker state after it
#[derive(Debug)]
pub struct CircuitBreakerResult<T, E> {
    pub result: Result<T, CircuitBreakerError<E>>,
    pub state: CircuitBreakerState,
    pub execution_time: Duration,
}

#[derive(Debug)]
pub enum CircuitBreakerError<E> {
    /// Circuit breaker is open, operation blocked
    CircuitOpen,
    /// Operation failed due to underlying service error
    ServiceError(E),
    /// Operation timed out
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CircuitBreakerState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Serialize)]
pub struct CircuitBreakerStats {
    pub total_calls: u64,
    pub successful_calls: u64,
    pub failed_calls: u64,
    pub rejected_calls: u64,
    pub state: CircuitBreakerState,
    pub failure_rate: f64,
}

/// Resolved thresholds and timeouts
#[derive(Debug, Clone)]
pub struct CircuitBreakerSettings {
    pub failure_threshold: u32,
    pub timeout: Duration,
    pub reset_timeout: Duration,
    pub success_threshold: u32,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            timeout: Duration::from_secs(10),
            reset_timeout: Duration::from_secs(60),
            success_threshold: 2,
        }
    }
}

impl CircuitBreakerSettings {
    pub fn from_config(config: &config::CircuitBreakerConfig) -> AppResult<Self> {
        Ok(Self {
            failure_threshold: config.failure_threshold,
            timeout: config.operation_timeout()?,
            reset_timeout: config.reset_timeout()?,
            success_threshold: config.success_threshold,
        })
    }
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitBreakerState,
    /// Number of consecutive failures
    failure_count: u32,
    /// Number of consecutive successes (used in half-open state)
    success_count: u32,
    last_opened: Option<Instant>,
    total_calls: u64,
    successful_calls: u64,
    failed_calls: u64,
    rejected_calls: u64,
}

impl Default for BreakerState {
    fn default() -> Self {
        Self {
            state: CircuitBreakerState::Closed,
            failure_count: 0,
            success_count: 0,
            last_opened: None,
            total_calls: 0,
            successful_calls: 0,
            failed_calls: 0,
            rejected_calls: 0,
        }
    }
}

#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    settings: CircuitBreakerSettings,
    state: RwLock<BreakerState>,
}

impl CircuitBreaker {
    pub fn new<S: Into<String>>(name: S, settings: CircuitBreakerSettings) -> Self {
        let name = name.into();
        debug!("Creating circuit breaker '{}' with {:?}", name, settings);
        Self {
            name,
            settings,
            state: RwLock::new(BreakerState::default()),
        }
    }

    /// Run `operation` unless the circuit is open, bounded by the timeout
    pub async fn execute<T, E, F, Fut>(&self, operation: F) -> CircuitBreakerResult<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let start_time = Instant::now();

        if !self.should_allow_request().await {
            return CircuitBreakerResult {
                result: Err(CircuitBreakerError::CircuitOpen),
                state: self.state().await,
                execution_time: start_time.elapsed(),
            };
        }

        let result = match tokio::time::timeout(self.settings.timeout, operation()).await {
            Ok(Ok(value)) => {
                self.record_result(true).await;
                Ok(value)
            }
            Ok(Err(error)) => {
                self.record_result(false).await;
                Err(CircuitBreakerError::ServiceError(error))
            }
            Err(_) => {
                self.record_result(false).await;
                Err(CircuitBreakerError::Timeout)
            }
        };

        CircuitBreakerResult {
            result,
            state: self.state().await,
            execution_time: start_time.elapsed(),
        }
    }

    pub async fn state(&self) -> CircuitBreakerState {
        self.state.read().await.state
    }

    pub async fn stats(&self) -> CircuitBreakerStats {
        let state = self.state.read().await;
        let failure_rate = if state.total_calls > 0 {
            state.failed_calls as f64 / state.total_calls as f64
        } else {
            0.0
        };

        CircuitBreakerStats {
            total_calls: state.total_calls,
            successful_calls: state.successful_calls,
            failed_calls: state.failed_calls,
            rejected_calls: state.rejected_calls,
            state: state.state,
            failure_rate,
        }
    }

    async fn should_allow_request(&self) -> bool {
        let mut state = self.state.write().await;

        match state.state {
            CircuitBreakerState::Closed | CircuitBreakerState::HalfOpen => true,
            CircuitBreakerState::Open => {
                let ready = state
                    .last_opened
                    .is_some_and(|opened| opened.elapsed() >= self.settings.reset_timeout);
                if ready {
                    info!("Circuit breaker '{}' transitioning from Open to HalfOpen", self.name);
                    state.state = CircuitBreakerState::HalfOpen;
                    state.success_count = 0;
                } else {
                    debug!("Circuit breaker '{}' still open, blocking request", self.name);
                    state.rejected_calls += 1;
                }
                ready
            }
        }
    }

    async fn record_result(&self, success: bool) {
        let mut state = self.state.write().await;

        state.total_calls += 1;

        if success {
            state.successful_calls += 1;
            state.failure_count = 0;
            state.success_count += 1;

            if state.state == CircuitBreakerState::HalfOpen
                && state.success_count >= self.settings.success_threshold
            {
                info!("Circuit breaker '{}' transitioning from HalfOpen to Closed", self.name);
                state.state = CircuitBreakerState::Closed;
                state.success_count = 0;
            }
        } else {
            state.failed_calls += 1;
            state.success_count = 0;
            state.failure_count += 1;

            // A single failure while probing reopens the circuit
            let trip = state.state == CircuitBreakerState::HalfOpen
                || state.failure_count >= self.settings.failure_threshold;
            if trip {
                if state.state != CircuitBreakerState::Open {
                    warn!(
                        "Circuit breaker '{}' opening after {} consecutive failures",
                        self.name, state.failure_count
                    );
                }
                state.state = CircuitBreakerState::Open;
                state.last_opened = Some(Instant::now());
            }
        }
    }
}
