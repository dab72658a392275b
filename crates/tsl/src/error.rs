// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use thiserror::Error;

/// Errors raised while decoding or encoding a TSL document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The document is not a TSL this engine can read.
    #[error("malformed TSL document: {0}")]
    Parse(String),

    /// An embedded X.509 certificate is not valid base64.
    #[error("malformed certificate in digital identity: {0}")]
    Certificate(String),

    /// A referenced TSL location is not a valid URI.
    #[error("invalid TSL reference location {location:?}: {reason}")]
    Reference {
        /// The offending `TSLLocation` content.
        location: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Underlying I/O failure while reading or writing a document.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
