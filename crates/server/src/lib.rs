// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The trustl server: refresh scheduling, snapshot publication and the
//! HTTP decision surface.
//!
//! [`serve`] wires the pieces together: one synchronous pipeline run, then
//! the listener and the background [`Scheduler`](scheduler::Scheduler)
//! refreshing the [`SnapshotPublisher`](snapshot::SnapshotPublisher) that
//! every request handler reads.

// LIBRARY WARNINGS
#![warn(
    clippy::default_trait_access,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::unimplemented,
    clippy::use_self,
    missing_copy_implementations,
    non_snake_case,
    non_upper_case_globals,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod api;
pub mod config;
mod error;
pub mod evaluate;
mod limit;
pub mod scheduler;
pub mod snapshot;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use trustl_pipeline::Pipeline;

pub use config::{SecurityConfig, ServerConfig, Settings};
pub use error::Error;

use crate::api::AppState;
use crate::scheduler::Scheduler;
use crate::snapshot::SnapshotPublisher;

/// Runs the server until a shutdown signal arrives.
///
/// One pipeline run is performed before the socket is bound, so the first
/// readable snapshot is already in place when requests arrive. A failed
/// startup run is logged, not fatal: the service comes up not-ready and
/// the scheduler keeps retrying at the configured cadence. A bind failure
/// is fatal.
pub async fn serve(pipeline: Arc<Pipeline>, settings: Settings) -> Result<(), Error> {
    let publisher = Arc::new(SnapshotPublisher::new());
    let scheduler = Scheduler::new(
        Arc::clone(&pipeline),
        Arc::clone(&publisher),
        settings.server.frequency,
    );

    if let Err(e) = scheduler.run_once().await {
        error!(error = %e, "startup pipeline run failed; serving without a snapshot");
    }

    let state = AppState::new(Arc::clone(&publisher), &settings.security);
    let app = api::router(state);

    let addr = settings.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, frequency = ?settings.server.frequency, "trustl listening");

    let shutdown = CancellationToken::new();
    let refresher = tokio::spawn({
        let scheduler = scheduler.clone();
        let shutdown = shutdown.clone();
        async move { scheduler.run(shutdown).await }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    refresher
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))?;
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    tokio::select! {
        outcome = tokio::signal::ctrl_c() => {
            if let Err(e) = outcome {
                error!(error = %e, "cannot listen for shutdown signal");
            }
        }
        _ = shutdown.cancelled() => {}
    }
    info!("shutdown requested");
    shutdown.cancel();
}

/// returns a version as specified in Cargo.toml
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
