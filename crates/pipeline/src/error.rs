// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use thiserror::Error;

/// Errors raised while parsing or running a pipeline.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Bad pipeline YAML, unknown step name or bad step argument.
    #[error("configuration error: {0}")]
    Config(String),

    /// A step failed; carries the step's position and name.
    #[error("step {index} ({name}): {source}")]
    Step {
        /// Zero-based position in the pipeline.
        index: usize,
        /// The step name as written in the pipeline.
        name: String,
        /// The underlying failure.
        #[source]
        source: Box<Error>,
    },

    /// Fetch or dereference failure surfaced by a load step.
    #[error(transparent)]
    Resolve(#[from] trustl_resolver::Error),

    /// TSL codec failure surfaced by generate, publish or transform.
    #[error(transparent)]
    Tsl(#[from] trustl_tsl::Error),

    /// A select step ran with no TSLs loaded.
    #[error("no TSLs loaded")]
    NoTslsLoaded,

    /// The configured signer failed to produce output.
    #[error("signer failed: {0}")]
    Sign(String),

    /// The configured transformer failed, or its output is not a TSL.
    #[error("transform failed: {0}")]
    Transform(String),

    /// Disk read/write failure in a step.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The run exceeded its deadline and was cancelled.
    #[error("pipeline run cancelled")]
    Cancelled,
}
