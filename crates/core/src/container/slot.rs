//! Per-binding instance slot with single-flight construction
//!
//! A slot is `Vacant` until the first resolution. The first caller becomes the
//! leader: it marks the slot `InFlight`, runs the constructor without holding
//! any lock, and publishes the outcome. Callers arriving while a flight is
//! running wait on that flight and receive the leader's outcome, success or
//! failure. Only a success moves the slot to `Resolved`; a failure puts it
//! back to `Vacant` so a later call constructs again.

use crate::errors::{BoxError, ContainerError};
use parking_lot::{Condvar, Mutex};
use std::any::Any;
use std::sync::Arc;

/// Resolved service, stored as `Arc<T>` behind `Any`
pub(crate) type Instance = Arc<dyn Any + Send + Sync>;

type Outcome = Result<Instance, ContainerError>;

enum SlotState {
    Vacant,
    InFlight(Arc<Flight>),
    Resolved(Instance),
}

struct Flight {
    outcome: Mutex<Option<Outcome>>,
    done: Condvar,
}

impl Flight {
    fn new() -> Self {
        Self {
            outcome: Mutex::new(None),
            done: Condvar::new(),
        }
    }

    fn wait(&self) -> Outcome {
        let mut outcome = self.outcome.lock();
        loop {
            if let Some(result) = outcome.as_ref() {
                return result.clone();
            }
            self.done.wait(&mut outcome);
        }
    }

    fn complete(&self, result: Outcome) {
        *self.outcome.lock() = Some(result);
        self.done.notify_all();
    }
}

enum Role {
    Leader(Arc<Flight>),
    Follower(Arc<Flight>),
}

pub(crate) struct InstanceSlot {
    state: Mutex<SlotState>,
}

impl InstanceSlot {
    pub(crate) fn vacant() -> Self {
        Self {
            state: Mutex::new(SlotState::Vacant),
        }
    }

    pub(crate) fn resolved(instance: Instance) -> Self {
        Self {
            state: Mutex::new(SlotState::Resolved(instance)),
        }
    }

    pub(crate) fn is_resolved(&self) -> bool {
        matches!(*self.state.lock(), SlotState::Resolved(_))
    }

    /// Return the cached instance, or construct it at most once across threads
    pub(crate) fn get_or_construct<F>(&self, key: &'static str, construct: F) -> Outcome
    where
        F: FnOnce() -> Result<Instance, BoxError>,
    {
        let role = {
            let mut state = self.state.lock();
            match &*state {
                SlotState::Resolved(instance) => return Ok(instance.clone()),
                SlotState::InFlight(flight) => Role::Follower(flight.clone()),
                SlotState::Vacant => {
                    let flight = Arc::new(Flight::new());
                    *state = SlotState::InFlight(flight.clone());
                    Role::Leader(flight)
                }
            }
        };

        match role {
            Role::Follower(flight) => {
                tracing::trace!("Waiting for in-flight construction of '{}'", key);
                flight.wait()
            }
            Role::Leader(flight) => {
                let mut guard = LeaderGuard {
                    slot: self,
                    flight,
                    key,
                    finished: false,
                };
                let outcome = construct().map_err(|e| ContainerError::factory(key, e));
                guard.finish(outcome.clone());
                outcome
            }
        }
    }
}

/// Publishes the leader's outcome, including when the constructor panics
struct LeaderGuard<'a> {
    slot: &'a InstanceSlot,
    flight: Arc<Flight>,
    key: &'static str,
    finished: bool,
}

impl LeaderGuard<'_> {
    fn finish(&mut self, outcome: Outcome) {
        {
            let mut state = self.slot.state.lock();
            *state = match &outcome {
                Ok(instance) => SlotState::Resolved(instance.clone()),
                Err(_) => SlotState::Vacant,
            };
        }
        self.flight.complete(outcome);
        self.finished = true;
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            *self.slot.state.lock() = SlotState::Vacant;
            self.flight.complete(Err(ContainerError::factory(
                self.key,
                "constructor panicked".into(),
            )));
        }
    }
}
