// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The process-wide step table.
//!
//! Step registration is an init-time affair: the built-in steps are
//! installed when the global registry is first touched, callers may add
//! their own before the first pipeline run, and the registry seals itself
//! when a run starts. Registration after sealing is an error rather than a
//! silent race.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::context::Context;
use crate::error::Error;
use crate::runner::Pipeline;
use crate::steps;

/// One pipeline processing step.
///
/// Steps are pure values: they receive the pipeline they run under, take
/// the context by value and return the (possibly replaced) context.
#[async_trait]
pub trait Step: Send + Sync {
    /// Executes the step.
    async fn run(
        &self,
        pipeline: &Pipeline,
        context: Context,
        args: &[String],
    ) -> Result<Context, Error>;
}

struct Entry {
    step: Arc<dyn Step>,
    overridden: bool,
}

/// A name → step table guarded by a read/write lock.
///
/// The process-wide instance is [`global`]; separate instances exist only
/// for tests.
#[derive(Default)]
pub struct StepRegistry {
    entries: RwLock<HashMap<String, Entry>>,
    sealed: AtomicBool,
}

impl StepRegistry {
    /// Creates an empty, unsealed registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a step under `name`.
    ///
    /// A second registration with the same name replaces the first; the
    /// runner logs a warning when an overridden name is later executed.
    /// Registration is rejected once the registry is sealed by the first
    /// pipeline run.
    pub fn register(&self, name: impl Into<String>, step: Arc<dyn Step>) -> Result<(), Error> {
        let name = name.into();
        if self.sealed.load(Ordering::Acquire) {
            return Err(Error::Config(format!(
                "cannot register step {name:?}: registry is sealed after the first pipeline run"
            )));
        }
        let mut entries = self.entries.write();
        let overridden = entries.contains_key(&name);
        entries.insert(name, Entry { step, overridden });
        Ok(())
    }

    /// Looks up a step, returning it together with its override flag.
    pub fn lookup(&self, name: &str) -> Option<(Arc<dyn Step>, bool)> {
        let entries = self.entries.read();
        entries
            .get(name)
            .map(|entry| (Arc::clone(&entry.step), entry.overridden))
    }

    /// Whether a step with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    /// Seals the registry. Called by the runner when a pipeline starts.
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }

    /// Whether the registry has been sealed.
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }
}

static GLOBAL: Lazy<StepRegistry> = Lazy::new(|| {
    let registry = StepRegistry::new();
    steps::install_builtins(&registry);
    registry
});

/// The process-wide registry, with the built-in steps installed.
pub fn global() -> &'static StepRegistry {
    &GLOBAL
}
