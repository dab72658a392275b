// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The trusted certificate pool and anchor-style verification.
//!
//! The pool is the output of a select step: the X.509 certificates of every
//! service that passed the step's predicates. It is treated as a set of
//! trust anchors; [`CertificatePool::verify`] accepts a presented leaf that
//! either is itself an anchor or is directly issued by one. There is no
//! intermediate-chain building and no revocation checking.

use std::collections::HashSet;

use thiserror::Error;
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer;

use crate::model::CertificateDer;

/// Why a presented certificate was not accepted.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VerifyError {
    /// The presented bytes do not parse as an X.509 certificate.
    #[error("malformed certificate: {0}")]
    Malformed(String),

    /// No trusted service certifies the presented certificate's issuer.
    #[error("issuer {issuer:?} matches no trusted service certificate")]
    UntrustedIssuer {
        /// The distinguished name of the unmatched issuer.
        issuer: String,
    },

    /// An issuer candidate was found but the signature did not check out.
    #[error("signature verification failed: {0}")]
    Signature(String),

    /// The certificate, or its anchor, is outside its validity window.
    #[error("certificate outside validity period: {0}")]
    Validity(String),
}

/// An insert-ordered, byte-deduplicated set of trusted certificates.
#[derive(Clone, Debug, Default)]
pub struct CertificatePool {
    certs: Vec<CertificateDer>,
    seen: HashSet<CertificateDer>,
}

impl CertificatePool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a certificate, ignoring byte-equal duplicates. Returns whether
    /// the certificate was newly inserted.
    pub fn add(&mut self, cert: CertificateDer) -> bool {
        if self.seen.contains(&cert) {
            return false;
        }
        self.seen.insert(cert.clone());
        self.certs.push(cert);
        true
    }

    /// Whether a byte-equal certificate is in the pool.
    pub fn contains(&self, cert: &CertificateDer) -> bool {
        self.seen.contains(cert)
    }

    /// Number of distinct certificates.
    pub fn len(&self) -> usize {
        self.certs.len()
    }

    /// True when no certificate has been added.
    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }

    /// Iterates certificates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &CertificateDer> {
        self.certs.iter()
    }

    /// Verifies a presented DER certificate against the pool as anchors.
    ///
    /// The leaf is accepted when it is byte-equal to a pool member, or when
    /// some member's subject matches the leaf's issuer, that member's key
    /// verifies the leaf's signature, and both certificates are within
    /// their validity windows.
    pub fn verify(&self, leaf_der: &[u8]) -> Result<(), VerifyError> {
        let (_, leaf) = X509Certificate::from_der(leaf_der)
            .map_err(|e| VerifyError::Malformed(e.to_string()))?;

        if self.seen.contains(&CertificateDer::new(leaf_der.to_vec())) {
            return check_validity(&leaf);
        }

        let issuer_raw = leaf.issuer().as_raw();
        let mut last_err = None;
        for anchor_der in &self.certs {
            let Ok((_, anchor)) = X509Certificate::from_der(anchor_der.as_bytes()) else {
                // A non-parsing pool entry cannot anchor anything.
                continue;
            };
            if anchor.subject().as_raw() != issuer_raw {
                continue;
            }
            match leaf.verify_signature(Some(anchor.public_key())) {
                Ok(()) => {
                    check_validity(&anchor)?;
                    return check_validity(&leaf);
                }
                Err(e) => last_err = Some(VerifyError::Signature(e.to_string())),
            }
        }

        Err(last_err.unwrap_or_else(|| VerifyError::UntrustedIssuer {
            issuer: leaf.issuer().to_string(),
        }))
    }
}

fn check_validity(cert: &X509Certificate<'_>) -> Result<(), VerifyError> {
    if cert.validity().is_valid() {
        Ok(())
    } else {
        Err(VerifyError::Validity(cert.subject().to_string()))
    }
}
