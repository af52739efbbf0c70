use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Health reporting for an orchestrated pod.
///
/// A container orchestrator asks two different questions, and conflating
/// them is full of foot-guns:
///   - liveness: should this process be restarted?
///   - readiness: should this process receive traffic?
///
/// The pod holds a single [`HealthIndicator`] answering both. The indicator
/// starts out `READY` and is only ever moved by an explicit set call, so a
/// test harness (or an operator poking the pod) can force any state before
/// probing. A `ZOMBIE` pod fails its liveness probe and gets restarted; an
/// `ALIVE` pod passes liveness but is held out of traffic until it is
/// `READY` again.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HealthState {
    Zombie = 0,
    Alive = 1,
    Ready = 2,
}

impl HealthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Zombie => "ZOMBIE",
            HealthState::Alive => "ALIVE",
            HealthState::Ready => "READY",
        }
    }

    /// A pod is live unless it declared itself a zombie; an unready pod
    /// should be drained, not restarted.
    pub fn is_live(&self) -> bool {
        !matches!(self, HealthState::Zombie)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, HealthState::Ready)
    }

    fn from_repr(raw: u8) -> HealthState {
        match raw {
            0 => HealthState::Zombie,
            1 => HealthState::Alive,
            _ => HealthState::Ready,
        }
    }
}

impl std::fmt::Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown health state: {0:?}")]
pub struct InvalidStateName(pub String);

impl FromStr for HealthState {
    type Err = InvalidStateName;

    /// Case-sensitive: probes are driven by automation, a lower-case
    /// "ready" is a caller bug we want surfaced, not papered over.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ZOMBIE" => Ok(HealthState::Zombie),
            "ALIVE" => Ok(HealthState::Alive),
            "READY" => Ok(HealthState::Ready),
            other => Err(InvalidStateName(other.to_owned())),
        }
    }
}

/// The process-wide health flag. Cheaply cloneable; clones share the same
/// underlying state. Construct one at startup and inject it wherever the
/// probes are served from.
#[derive(Clone)]
pub struct HealthIndicator {
    state: Arc<AtomicU8>,
}

impl Default for HealthIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthIndicator {
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(HealthState::Ready as u8)),
        }
    }

    pub fn get(&self) -> HealthState {
        HealthState::from_repr(self.state.load(Ordering::SeqCst))
    }

    /// Replaces the current state and returns the value it replaced.
    ///
    /// Read-and-replace is a single atomic swap: under concurrent set calls
    /// every caller is handed the exact value its own write displaced.
    pub fn set(&self, next: HealthState) -> HealthState {
        HealthState::from_repr(self.state.swap(next as u8, Ordering::SeqCst))
    }

    /// Liveness probe: fails only for `ZOMBIE`. A live pod always reports
    /// `ALIVE`, readiness notwithstanding.
    pub fn liveness(&self) -> ProbeStatus {
        let current = self.get();
        match current.is_live() {
            true => ProbeStatus::passing(HealthState::Alive),
            false => ProbeStatus::failing(current),
        }
    }

    /// Readiness probe: passes only for `READY`; otherwise reports the
    /// state that is keeping the pod out of rotation.
    pub fn readiness(&self) -> ProbeStatus {
        let current = self.get();
        match current.is_ready() {
            true => ProbeStatus::passing(HealthState::Ready),
            false => ProbeStatus::failing(current),
        }
    }
}

/// Outcome of a single probe read. Implements [`IntoResponse`] so probe
/// handlers can return it directly: 200 with the reported state name when
/// passing, 500 with the offending state name when failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeStatus {
    pub passing: bool,
    pub reported: HealthState,
}

impl ProbeStatus {
    fn passing(reported: HealthState) -> Self {
        Self {
            passing: true,
            reported,
        }
    }

    fn failing(reported: HealthState) -> Self {
        Self {
            passing: false,
            reported,
        }
    }
}

impl IntoResponse for ProbeStatus {
    fn into_response(self) -> Response {
        match self.passing {
            true => (StatusCode::OK, self.reported.as_str()),
            false => (StatusCode::INTERNAL_SERVER_ERROR, self.reported.as_str()),
        }
        .into_response()
    }
}

/// One-shot shutdown trigger, released by the orchestrator's pre-stop hook.
///
/// Releasing is idempotent: downstream waiters resolve exactly once no
/// matter how many times the hook fires. Waiting on an already-released
/// latch resolves immediately.
#[derive(Clone, Default)]
pub struct ShutdownLatch {
    token: CancellationToken,
}

impl ShutdownLatch {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    pub fn release(&self) {
        self.token.cancel();
    }

    pub fn is_released(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn released(&self) {
        self.token.cancelled().await
    }
}
