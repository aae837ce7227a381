use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use crate::reasoning::{
    error::{ProviderError, ProviderErrorKind},
    types::ReliabilityConfig,
};

const MAX_OPEN: Duration = Duration::from_secs(24 * 60 * 60);

/// Retry budget, backoff schedule and circuit breaker for one provider.
///
/// After `breaker_failure_threshold` consecutive transient failures the
/// circuit stays open for `breaker_open_ms`. Once that cooldown passes a
/// single trial call is let through; its outcome closes or re-opens it.
#[derive(Clone)]
pub struct ReliabilityLayer {
    config: ReliabilityConfig,
    circuit: Arc<Mutex<Circuit>>,
}

#[derive(Debug, Default)]
struct Circuit {
    consecutive_failures: u32,
    cooldown_until: Option<Instant>,
    probing: bool,
}

/// Admission for one provider attempt, returned by
/// [`ReliabilityLayer::ensure_allowed`].
///
/// Report the outcome with [`succeeded`](Self::succeeded) or
/// [`failed`](Self::failed). A permit dropped without an outcome (the
/// caller timed out or went away) hands the trial slot back, so the next
/// call may try again.
#[must_use = "report the attempt outcome on the permit"]
pub struct CallPermit<'a> {
    layer: &'a ReliabilityLayer,
    holds_trial: bool,
}

impl CallPermit<'_> {
    pub fn is_trial(&self) -> bool {
        self.holds_trial
    }

    pub fn succeeded(mut self) {
        self.holds_trial = false;
        *self.layer.circuit() = Circuit::default();
    }

    pub fn failed(mut self, err: &ProviderError) {
        self.holds_trial = false;
        self.layer.note_failure(err);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if self.holds_trial {
            self.layer.circuit().probing = false;
            tracing::debug!(target: "reasoning", "circuit_trial_abandoned");
        }
    }
}

impl ReliabilityLayer {
    pub fn new(config: ReliabilityConfig) -> Self {
        Self {
            config,
            circuit: Arc::new(Mutex::new(Circuit::default())),
        }
    }

    pub fn config(&self) -> &ReliabilityConfig {
        &self.config
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.config.request_timeout_ms.max(1))
    }

    pub fn ensure_allowed(&self) -> Result<CallPermit<'_>, ProviderError> {
        let mut circuit = self.circuit();
        let Some(cooldown_until) = circuit.cooldown_until else {
            return Ok(CallPermit {
                layer: self,
                holds_trial: false,
            });
        };

        let reason = if Instant::now() < cooldown_until {
            "reasoning provider circuit is open"
        } else if circuit.probing {
            "reasoning provider circuit is waiting on its trial call"
        } else {
            circuit.probing = true;
            return Ok(CallPermit {
                layer: self,
                holds_trial: true,
            });
        };

        Err(ProviderError::new(ProviderErrorKind::CircuitOpen, reason).with_retryable(false))
    }

    fn note_failure(&self, err: &ProviderError) {
        let mut circuit = self.circuit();
        circuit.probing = false;
        if !Self::counts_toward_breaker(err) {
            return;
        }

        circuit.consecutive_failures = circuit.consecutive_failures.saturating_add(1);
        if circuit.consecutive_failures < self.config.breaker_failure_threshold.max(1) {
            return;
        }

        let open_for = Duration::from_millis(self.config.breaker_open_ms.max(1)).min(MAX_OPEN);
        circuit.cooldown_until = Some(Instant::now() + open_for);
        tracing::warn!(
            target: "reasoning",
            consecutive_failures = circuit.consecutive_failures,
            open_ms = self.config.breaker_open_ms,
            "circuit_opened"
        );
    }

    /// Exponential in `attempt`, capped at `backoff_max_ms`, with a small
    /// deterministic spread so parallel callers do not retry in lockstep.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let base_ms = self.config.backoff_base_ms.max(1);
        let cap_ms = self.config.backoff_max_ms.max(1);
        let grown_ms = base_ms.saturating_mul(1_u64 << attempt.min(20)).min(cap_ms);
        let spread_pct = 90 + u64::from(attempt % 3) * 5;
        Duration::from_millis(grown_ms * spread_pct / 100)
    }

    pub fn can_retry(&self, err: &ProviderError, attempt: u32) -> bool {
        err.retryable && attempt < self.config.max_retries
    }

    /// Only transient transport-level failures trip the breaker.
    pub fn counts_toward_breaker(err: &ProviderError) -> bool {
        err.retryable
            && matches!(
                err.kind,
                ProviderErrorKind::Timeout | ProviderErrorKind::Transport | ProviderErrorKind::HttpStatus
            )
    }

    // Never held across an await point.
    fn circuit(&self) -> MutexGuard<'_, Circuit> {
        self.circuit.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
