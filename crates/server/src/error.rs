// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use thiserror::Error;

/// Errors raised by the server layer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The `config.server` or `config.security` section is malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// A pipeline run failed.
    #[error(transparent)]
    Pipeline(#[from] trustl_pipeline::Error),

    /// Socket or filesystem failure; a bind failure is fatal at startup.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
