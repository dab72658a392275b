// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Fetching and recursive dereferencing of Trust Status Lists.
//!
//! The [`Fetcher`] retrieves a single TSL from a `file://` or HTTP(S) URI
//! and never follows references. The [`resolve`] entry point drives the
//! fetcher breadth-first over the reference graph, bounded by the fetch
//! options' dereference depth, de-duplicating by source URI and applying
//! the configured [`Filter`]s to every referenced list before it is
//! attached to the tree. Per-reference failures are demoted to
//! [`Diagnostic`]s; only a root fetch failure is fatal.

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

mod error;
pub mod fetch;
pub mod filter;
pub mod options;
pub mod resolve;

pub use error::Error;
pub use fetch::Fetcher;
pub use filter::{Filter, FilterKind, FilterSet};
pub use options::FetchOptions;
pub use resolve::{resolve, Diagnostic, Resolution};

/// returns a version as specified in Cargo.toml
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
