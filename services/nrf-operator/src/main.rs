//! NRF Operator
//!
//! Manages the lifecycle of a single OAI 5G Core NRF workload: renders its
//! configuration, supervises the process, and publishes the NRF endpoint to
//! consumer applications once it is ready.
//!
//! The production event source and relation bus live in the external
//! runtime; this entry point wires the operator against the mock supervisor
//! and the in-memory bus for local runs.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use nf_reconcile::Event;
use nf_relation::InMemoryRelationStore;
use nrf_operator::config::{Config, ProbeKind};
use nrf_operator::expose::LoggingExposure;
use nrf_operator::operator::Operator;
use nrf_operator::probe::{AlwaysListening, ReadinessProbe, TcpProbe};
use nrf_operator::workload::MockSupervisor;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting NRF operator");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        service = %config.service_name,
        fqdn = %config.fqdn(),
        interface = %config.service.interface_name,
        sbi_port = config.service.sbi_port,
        "Configuration loaded"
    );

    // Create shutdown channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let probe: Arc<dyn ReadinessProbe> = match config.probe {
        ProbeKind::Stub => Arc::new(AlwaysListening),
        ProbeKind::Tcp => Arc::new(TcpProbe::new("127.0.0.1", config.service.sbi_port)),
    };

    // Mock collaborators for local runs; the real supervisor and bus are
    // provided by the external runtime.
    let supervisor = Arc::new(MockSupervisor::new());
    let store = Arc::new(InMemoryRelationStore::new());

    let (mut operator, mut status_rx) = Operator::new(
        config,
        supervisor,
        probe,
        Arc::new(LoggingExposure),
        store,
        true,
    );

    // Deliver the initial configuration event.
    let (event_tx, event_rx) = mpsc::channel(16);
    event_tx.send(Event::ConfigChanged).await?;

    let operator_handle = tokio::spawn({
        let shutdown_rx = shutdown_rx.clone();
        async move {
            operator.run(event_rx, shutdown_rx).await;
        }
    });

    // Surface status transitions while running.
    let status_handle = tokio::spawn(async move {
        while status_rx.changed().await.is_ok() {
            let status = status_rx.borrow().clone();
            info!(?status, "Unit status");
        }
    });

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
        _ = operator_handle => {
            info!("Operator exited");
        }
    }

    // Signal shutdown to workers
    let _ = shutdown_tx.send(true);
    status_handle.abort();

    info!("NRF operator shutdown complete");
    Ok(())
}
