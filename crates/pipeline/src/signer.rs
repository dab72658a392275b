// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Seams for the external signing and transformation collaborators.
//!
//! The engine's contract is narrow: when a signer is configured on the
//! pipeline, serialized TSL bytes pass through it before the publish step
//! writes them; when a transformer is configured, the transform step feeds
//! documents through it. File-key and hardware-token signers, and the XSLT
//! processor, live outside this repository and are injected through these
//! traits.

use std::path::Path;

use crate::error::Error;

/// Signs a serialized TSL document.
pub trait Signer: Send + Sync {
    /// Returns the signed form of `xml`, or [`Error::Sign`].
    fn sign(&self, xml: &[u8]) -> Result<Vec<u8>, Error>;
}

/// Applies a stylesheet to a serialized TSL document.
pub trait Transformer: Send + Sync {
    /// Returns the transformed document, or [`Error::Transform`].
    fn transform(&self, stylesheet: &Path, xml: &[u8]) -> Result<Vec<u8>, Error>;
}
