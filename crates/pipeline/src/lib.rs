// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The YAML-driven processing pipeline.
//!
//! A [`Pipeline`] is parsed from a YAML document listing named steps with
//! string arguments. Steps are looked up in a process-wide
//! [`StepRegistry`], executed strictly in order, and thread one mutable
//! [`Context`] through the run: load steps install TSL trees, the select
//! step derives the trusted certificate pool, and the remaining steps
//! construct, serialize or transform status lists.

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

mod context;
mod error;
pub mod registry;
pub mod runner;
pub mod signer;
pub mod steps;

pub use context::Context;
pub use error::Error;
pub use registry::{Step, StepRegistry};
pub use runner::{LoggingConfig, Pipeline, StepEntry};
pub use signer::{Signer, Transformer};

/// returns a version as specified in Cargo.toml
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
