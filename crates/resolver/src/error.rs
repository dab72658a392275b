// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use thiserror::Error;

/// Errors raised while fetching or resolving TSLs.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// HTTP transport failure, timeout or non-2xx response.
    #[error("network error fetching {uri}: {reason}")]
    Network {
        /// The URI being fetched.
        uri: String,
        /// Transport-level detail.
        reason: String,
    },

    /// The fetched document is not a readable TSL.
    #[error("parsing {uri}: {source}")]
    Parse {
        /// The URI the document came from.
        uri: String,
        /// The codec failure.
        #[source]
        source: trustl_tsl::Error,
    },

    /// A filter expression could not be parsed.
    #[error("invalid filter expression {expression:?}: {reason}")]
    Filter {
        /// The expression as given.
        expression: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A fetch option key or value was rejected.
    #[error("invalid fetch option {option:?}: {reason}")]
    Options {
        /// The option as given.
        option: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The URI scheme is not one the fetcher supports.
    #[error("unsupported scheme {scheme:?} in {uri}")]
    Scheme {
        /// The URI being fetched.
        uri: String,
        /// Its scheme.
        scheme: String,
    },

    /// Filesystem failure while reading a file TSL.
    #[error("reading {uri}: {source}")]
    Io {
        /// The file URI.
        uri: String,
        /// The underlying failure.
        #[source]
        source: std::io::Error,
    },

    /// The resolution was cancelled by its run deadline.
    #[error("resolution cancelled")]
    Cancelled,
}
