//! Reconciliation state machine for network-function operators.
//!
//! This library is the decision core of the operator: a pure function that
//! maps the current state, a triggering event and the freshly observed
//! workload state to the next state, the ordered actions to perform and
//! whether the event must be redelivered later. Key concepts:
//!
//! - **Observed state**: What the workload actually looks like, recomputed
//!   on every pass and never cached.
//! - **Actions**: Side effects the driver performs through injected
//!   adapters; the core itself does no I/O.
//! - **Redelivery**: A deferred event is re-enqueued for a later dispatch
//!   cycle; the current pass returns immediately.
//!
//! # Invariants
//!
//! - Decisions are deterministic given the same inputs.
//! - No action touching the workload is emitted while the workload
//!   container is unreachable.
//! - Endpoint publication is only emitted for the leader, and only once the
//!   service is running and listening; partial data is never published.
//! - The machine is re-entrant: a config change from [`State::Ready`]
//!   re-enters configuration.

use serde::{Deserialize, Serialize};

use nf_relation::RelationHandle;

/// Reconciler state.
///
/// `ConfiguringWorkload` and `SupervisingWorkload` are the phases the driver
/// passes through while executing a pass's actions; a pass that fails
/// mid-sequence stays in its phase and is retried from the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum State {
    /// No event has been processed yet.
    Uninitialized,

    /// The workload container is not reachable; waiting for redelivery.
    WaitingForConnectivity,

    /// Pushing the rendered configuration into the container.
    ConfiguringWorkload,

    /// Applying the supervision layer and restarting the service.
    SupervisingWorkload,

    /// The workload is configured and supervised.
    Ready,
}

impl State {
    /// Whether the workload has been fully reconciled.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// A triggering event delivered by the external runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// The operator configuration changed.
    ConfigChanged,

    /// The container supervisor became reachable.
    WorkloadReady,

    /// A consumer application joined a relation.
    RelationJoined(RelationHandle),
}

/// A side effect for the driver to perform through its adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Render the configuration and push it into the container.
    PushConfig,

    /// Apply the process-supervision layer.
    ApplyLayer,

    /// Restart the supervised service.
    RestartService,

    /// Publish the endpoint record to one relation.
    PublishEndpoint(RelationHandle),
}

impl Action {
    /// The state the machine is in while this action executes.
    pub fn phase(&self) -> Option<State> {
        match self {
            Self::PushConfig => Some(State::ConfiguringWorkload),
            Self::ApplyLayer | Self::RestartService => Some(State::SupervisingWorkload),
            // Publication is a parallel concern and does not move the
            // workload machine.
            Self::PublishEndpoint(_) => None,
        }
    }
}

/// Coarse status reported back to the external runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitStatus {
    /// Fully reconciled.
    Active,

    /// A retryable condition is pending; the event was deferred.
    Waiting(String),

    /// A fatal condition that will not resolve by retrying.
    Blocked(String),
}

/// Workload state as observed through the supervisor adapter, recomputed on
/// every reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorkloadObservedState {
    /// The container supervisor is reachable.
    pub can_connect: bool,

    /// The supervised service reports running.
    pub service_running: bool,

    /// The configuration file exists in the container.
    pub config_pushed: bool,

    /// The readiness probe reports the workload listening.
    pub listening: bool,
}

/// Per-pass capabilities injected by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileContext {
    /// Whether this unit is the elected leader. Election itself is external;
    /// only the outcome is visible here.
    pub is_leader: bool,
}

/// The outcome of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// State entered once all actions have succeeded.
    pub next: State,

    /// Ordered side effects for the driver to perform.
    pub actions: Vec<Action>,

    /// Whether the triggering event must be re-enqueued for a later
    /// dispatch cycle.
    pub redeliver: bool,

    /// Status to report, if this pass changes it.
    pub status: Option<UnitStatus>,
}

impl Step {
    fn noop(state: State) -> Self {
        Self {
            next: state,
            actions: Vec::new(),
            redeliver: false,
            status: None,
        }
    }

    fn defer(state: State, status: Option<UnitStatus>) -> Self {
        Self {
            next: state,
            actions: Vec::new(),
            redeliver: true,
            status,
        }
    }
}

/// Decide one reconciliation pass.
///
/// Pure and total: every input maps to a [`Step`]; all I/O happens in the
/// driver executing the returned actions. Configuration application and
/// endpoint publication are independently retryable paths, so a workload
/// that is slow to listen never blocks a config push, and vice versa.
pub fn reconcile(
    state: State,
    event: &Event,
    observed: &WorkloadObservedState,
    ctx: &ReconcileContext,
) -> Step {
    match event {
        Event::ConfigChanged | Event::WorkloadReady => {
            if !observed.can_connect {
                return Step::defer(
                    State::WaitingForConnectivity,
                    Some(UnitStatus::Waiting(
                        "waiting for workload container".to_string(),
                    )),
                );
            }
            Step {
                next: State::Ready,
                actions: vec![Action::PushConfig, Action::ApplyLayer, Action::RestartService],
                redeliver: false,
                status: Some(UnitStatus::Active),
            }
        }
        Event::RelationJoined(handle) => {
            // Single-writer invariant: followers never publish.
            if !ctx.is_leader {
                return Step::noop(state);
            }
            if !observed.service_running || !observed.listening {
                // Publishing now would expose partial or incorrect data;
                // wait for the workload instead.
                return Step::defer(state, None);
            }
            Step {
                next: state,
                actions: vec![Action::PublishEndpoint(*handle)],
                redeliver: false,
                status: None,
            }
        }
    }
}
