// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! ETSI TS 119612 Trust Status List primitives.
//!
//! A [`StatusList`](model::StatusList) is the in-memory form of one TSL
//! document: scheme metadata, an ordered list of trust service providers,
//! the origin the document was loaded from and the locations of any TSLs it
//! references. Status lists are immutable once loaded; the reference
//! resolver assembles them into a [`TslTree`](tree::TslTree), and the select
//! step derives a [`CertificatePool`](pool::CertificatePool) from the tree.
//!
//! The XML codec in [`xml`] covers the subset of the 119612 schema this
//! engine consumes. Decoding is tolerant of elements it does not know;
//! encoding produces a canonical document that decodes back to an equal
//! status list.

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
pub mod model;
pub mod pool;
pub mod tree;
pub mod xml;

pub use error::Error;
pub use model::{
    CertificateDer, DigitalIdentity, SchemeInformation, Source, StatusList, TrustServiceProvider,
    TspService,
};
pub use pool::{CertificatePool, VerifyError};
pub use tree::{TslNode, TslTree};

/// returns a version as specified in Cargo.toml
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
