//! Service lifecycle state reported by the health endpoint.
//!
//! The console tracks one [`ServiceHandle`] per backing service (record
//! storage, the Orbit verifier, the GitHub VDR). Handlers flip the state as
//! calls succeed or fail, and `/health` reports the latest values.
//!
//! ```rust
//! use cornerstone_core::service::{ServiceHandle, ServiceState};
//!
//! let orbit = ServiceHandle::new("orbit");
//! orbit.set_state(ServiceState::Degraded("credentials not configured".into()));
//! assert!(orbit.state().is_available());
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Serialize, Serializer};
use tokio::sync::watch;

/// State of a backing service.
#[derive(Clone, Debug, PartialEq)]
pub enum ServiceState {
    /// Not yet initialized.
    Starting,
    /// Operational.
    Ready,
    /// Usable, but the last call failed or configuration is incomplete.
    Degraded(String),
    /// Unusable.
    Failed(String),
}

impl ServiceState {
    /// Returns `true` if the service is fully ready.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Returns `true` if requests can still be attempted (Ready or Degraded).
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Ready | Self::Degraded(_))
    }

    /// Short label without the reason.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::Degraded(_) => "degraded",
            Self::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Degraded(reason) | Self::Failed(reason) => {
                write!(f, "{}: {reason}", self.label())
            }
            _ => f.write_str(self.label()),
        }
    }
}

impl Serialize for ServiceState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Shared handle for observing and updating a service's state.
///
/// Clones share the same underlying state.
#[derive(Clone)]
pub struct ServiceHandle {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    tx: watch::Sender<ServiceState>,
    created_at: Instant,
}

impl ServiceHandle {
    /// Create a handle in the [`ServiceState::Starting`] state.
    pub fn new(name: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(ServiceState::Starting);
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                tx,
                created_at: Instant::now(),
            }),
        }
    }

    /// The service name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The current state.
    pub fn state(&self) -> ServiceState {
        self.inner.tx.borrow().clone()
    }

    /// Update the state, logging only actual transitions.
    pub fn set_state(&self, state: ServiceState) {
        let changed = self.inner.tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state.clone();
                true
            }
        });
        if changed {
            log::info!("Service '{}' -> {state}", self.inner.name);
        }
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<ServiceState> {
        self.inner.tx.subscribe()
    }

    /// Time since the handle was created.
    pub fn uptime(&self) -> Duration {
        self.inner.created_at.elapsed()
    }
}

impl fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceHandle")
            .field("name", &self.inner.name)
            .field("state", &self.state())
            .finish()
    }
}
