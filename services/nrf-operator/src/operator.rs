//! Event dispatch driver for the NRF operator.
//!
//! The driver:
//! - Receives typed events from the external runtime over a channel
//! - Observes workload state fresh on every pass and asks the pure
//!   reconciler what to do
//! - Executes the decided actions through the injected adapters
//! - Re-enqueues deferred events and replays them on a redelivery tick
//!
//! One event is fully processed (run to completion or explicitly deferred)
//! before the next is dispatched; there is no parallel reconciliation.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use nf_reconcile::{
    reconcile, Action, Event, ReconcileContext, State, UnitStatus, WorkloadObservedState,
};
use nf_relation::{EndpointPublisher, EndpointRecord, RelationError, RelationStore};

use crate::config::{Config, ConfigError};
use crate::expose::{service_ports, ServiceExposure};
use crate::layer::nrf_layer;
use crate::probe::ReadinessProbe;
use crate::render::render;
use crate::workload::{SupervisorError, WorkloadSupervisor};

/// Address published to consumers. The NRF sits behind the cluster service,
/// so consumers resolve the FQDN; the literal address mirrors what the
/// workload binds locally.
const ENDPOINT_IPV4: &str = "127.0.0.1";

/// Failures while executing a pass's actions.
#[derive(Debug, Error)]
pub enum OperatorError {
    /// The configuration violates its invariants. Fatal to the pass.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Supervisor I/O failed. Retryable via redelivery.
    #[error(transparent)]
    Supervisor(#[from] SupervisorError),

    /// Relation bus access failed.
    #[error(transparent)]
    Relation(#[from] RelationError),
}

/// The operator: reconciler state plus the adapters it drives.
pub struct Operator {
    config: Config,
    supervisor: Arc<dyn WorkloadSupervisor>,
    probe: Arc<dyn ReadinessProbe>,
    exposure: Arc<dyn ServiceExposure>,
    publisher: EndpointPublisher,
    state: State,
    deferred: VecDeque<Event>,
    status_tx: watch::Sender<UnitStatus>,
}

impl Operator {
    /// Wire an operator to its collaborators.
    ///
    /// `is_leader` is the pre-computed leadership capability; the election
    /// itself happens in the external runtime. Returns the operator and a
    /// watch channel carrying the reported unit status.
    pub fn new(
        config: Config,
        supervisor: Arc<dyn WorkloadSupervisor>,
        probe: Arc<dyn ReadinessProbe>,
        exposure: Arc<dyn ServiceExposure>,
        store: Arc<dyn RelationStore>,
        is_leader: bool,
    ) -> (Self, watch::Receiver<UnitStatus>) {
        let (status_tx, status_rx) =
            watch::channel(UnitStatus::Waiting("no event processed yet".to_string()));
        let publisher = EndpointPublisher::new(store, is_leader);
        let operator = Self {
            config,
            supervisor,
            probe,
            exposure,
            publisher,
            state: State::Uninitialized,
            deferred: VecDeque::new(),
            status_tx,
        };
        (operator, status_rx)
    }

    /// Current reconciler state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Number of events currently awaiting redelivery.
    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    /// The endpoint record this unit publishes.
    pub fn endpoint_record(&self) -> EndpointRecord {
        EndpointRecord {
            ipv4_address: ENDPOINT_IPV4.to_string(),
            fqdn: self.config.fqdn(),
            port: self.config.service.sbi_port.to_string(),
            api_version: self.config.service.api_version.clone(),
        }
    }

    /// Run the event loop until shutdown or the event source closes.
    pub async fn run(&mut self, mut events: mpsc::Receiver<Event>, mut shutdown: watch::Receiver<bool>) {
        info!(
            service = %self.config.service_name,
            redeliver_interval_secs = self.config.redeliver_interval_secs,
            leader = self.publisher.is_leader(),
            "Starting operator event loop"
        );

        if let Err(e) = self.exposure.declare_ports(&service_ports(&self.config.service)) {
            // Exposure is advertisement only; reconciliation proceeds.
            warn!(error = %e, "Failed to declare service ports");
        }

        let mut redeliver = tokio::time::interval(Duration::from_secs(
            self.config.redeliver_interval_secs.max(1),
        ));

        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Some(event) => self.dispatch(event).await,
                        None => {
                            info!("Event source closed, stopping");
                            break;
                        }
                    }
                }
                _ = redeliver.tick() => {
                    self.redeliver_deferred().await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Operator shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Process one event to completion or deferral.
    pub async fn dispatch(&mut self, event: Event) {
        let observed = self.observe().await;
        let ctx = ReconcileContext {
            is_leader: self.publisher.is_leader(),
        };
        debug!(?event, state = ?self.state, ?observed, "Dispatching event");

        let step = reconcile(self.state, &event, &observed, &ctx);

        if step.redeliver {
            self.state = step.next;
            if let Some(status) = step.status {
                self.set_status(status);
            }
            info!(?event, "Deferring event for redelivery");
            self.deferred.push_back(event);
            return;
        }

        for action in &step.actions {
            if let Some(phase) = action.phase() {
                self.state = phase;
            }
            match self.apply(action).await {
                Ok(()) => {}
                Err(OperatorError::Config(e)) => {
                    error!(error = %e, ?action, "Invalid configuration");
                    self.set_status(UnitStatus::Blocked(e.to_string()));
                    return;
                }
                Err(OperatorError::Relation(
                    e @ (RelationError::NotEstablished(_) | RelationError::NotLeader),
                )) => {
                    // Unreachable given the runtime's delivery guarantees
                    // and the reconciler's leader gating.
                    error!(error = %e, ?action, "Relation contract violation");
                    return;
                }
                Err(e) => {
                    warn!(error = %e, ?action, "Action failed, deferring event");
                    self.set_status(UnitStatus::Waiting(e.to_string()));
                    self.deferred.push_back(event);
                    return;
                }
            }
        }

        self.state = step.next;
        if let Some(status) = step.status {
            self.set_status(status);
        }
    }

    /// Replay currently deferred events, oldest first.
    ///
    /// An event that defers again goes to the back of the queue and waits
    /// for the next tick; nothing is replayed twice within one call.
    pub async fn redeliver_deferred(&mut self) {
        let pending = self.deferred.len();
        if pending == 0 {
            return;
        }
        debug!(count = pending, "Redelivering deferred events");
        for _ in 0..pending {
            let Some(event) = self.deferred.pop_front() else {
                break;
            };
            self.dispatch(event).await;
        }
    }

    /// Observe workload state through the adapters. Recomputed on every
    /// pass, never cached.
    async fn observe(&self) -> WorkloadObservedState {
        if !self.supervisor.can_connect().await {
            return WorkloadObservedState::default();
        }
        WorkloadObservedState {
            can_connect: true,
            service_running: self
                .supervisor
                .is_service_running(&self.config.service_name)
                .await,
            config_pushed: self.supervisor.config_exists(&self.config.config_path).await,
            listening: self.probe.is_listening().await,
        }
    }

    async fn apply(&self, action: &Action) -> Result<(), OperatorError> {
        match action {
            Action::PushConfig => {
                let doc = render(&self.config.service)?;
                self.supervisor
                    .push_config(&self.config.config_path, doc.text())
                    .await?;
                info!(
                    path = %self.config.config_path,
                    digest = %doc.digest(),
                    "Pushed workload configuration"
                );
            }
            Action::ApplyLayer => {
                let layer = nrf_layer(
                    &self.config.service_name,
                    &self.config.service,
                    &self.config.config_path,
                );
                self.supervisor.apply_layer(&layer).await?;
                debug!(service = %self.config.service_name, "Applied supervision layer");
            }
            Action::RestartService => {
                self.supervisor
                    .restart_service(&self.config.service_name)
                    .await?;
                info!(service = %self.config.service_name, "Restarted service");
            }
            Action::PublishEndpoint(handle) => {
                let record = self.endpoint_record();
                self.publisher.publish(*handle, &record)?;
            }
        }
        Ok(())
    }

    fn set_status(&self, status: UnitStatus) {
        let changed = self.status_tx.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status.clone();
            true
        });
        if changed {
            info!(?status, "Unit status changed");
        }
    }
}
