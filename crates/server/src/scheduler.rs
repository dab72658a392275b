// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The background refresh scheduler.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use trustl_pipeline::{Context, Pipeline};

use crate::error::Error;
use crate::snapshot::{Snapshot, SnapshotPublisher};

/// Re-runs the pipeline into a fresh context at a fixed cadence and
/// publishes each successful run.
///
/// Runs are strictly serialized; each carries a deadline of twice the
/// refresh frequency. A failed or timed-out run is logged and the prior
/// snapshot stays authoritative.
#[derive(Clone)]
pub struct Scheduler {
    pipeline: Arc<Pipeline>,
    publisher: Arc<SnapshotPublisher>,
    frequency: Duration,
}

impl Scheduler {
    /// Creates a scheduler over the given pipeline and publisher.
    pub fn new(
        pipeline: Arc<Pipeline>,
        publisher: Arc<SnapshotPublisher>,
        frequency: Duration,
    ) -> Self {
        Self {
            pipeline,
            publisher,
            frequency,
        }
    }

    /// Runs the pipeline once and publishes the result on success.
    pub async fn run_once(&self) -> Result<(), Error> {
        let deadline = self.frequency.saturating_mul(2);
        let cancel = CancellationToken::new();
        let context = Context::with_cancellation(cancel.clone());

        let outcome = tokio::time::timeout(deadline, self.pipeline.run(context)).await;
        match outcome {
            Ok(Ok(context)) => {
                info!(
                    tsl_count = context.tsl_count(),
                    pool_size = context.pool().len(),
                    "pipeline run complete"
                );
                self.publisher.publish(Snapshot::new(context));
                Ok(())
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => {
                cancel.cancel();
                Err(Error::Pipeline(trustl_pipeline::Error::Cancelled))
            }
        }
    }

    /// Ticks until `shutdown` is cancelled. An in-flight run is allowed to
    /// finish (bounded by its own deadline) before the loop exits.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.frequency);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the interval fires immediately; the caller already ran startup
        interval.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("refresh scheduler stopping");
                    return;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.run_once().await {
                        error!(error = %e, "pipeline refresh failed; retaining prior snapshot");
                    }
                }
            }
        }
    }
}
