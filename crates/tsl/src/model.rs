// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! In-memory model of one Trust Status List document.

use core::fmt;

use time::OffsetDateTime;
use url::Url;

/// Origin of a status list: the URI it was fetched from.
///
/// Sources are opaque to the engine apart from equality; within one resolved
/// tree every status list carries a unique, non-empty source.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Source(String);

impl Source {
    /// Creates a source from the given URI string.
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// The source URI as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for sources constructed from an empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&Url> for Source {
    fn from(url: &Url) -> Self {
        Self(url.as_str().to_string())
    }
}

/// An X.509 certificate in DER form.
///
/// Byte equality is the identity used for pool de-duplication.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CertificateDer(Vec<u8>);

impl CertificateDer {
    /// Wraps the given DER bytes.
    pub fn new(der: Vec<u8>) -> Self {
        Self(der)
    }

    /// The raw DER bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length of the DER encoding in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the encoding is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for CertificateDer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CertificateDer({} bytes)", self.0.len())
    }
}

impl From<Vec<u8>> for CertificateDer {
    fn from(der: Vec<u8>) -> Self {
        Self(der)
    }
}

/// One entry of a service's digital identity set.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum DigitalIdentity {
    /// An X.509 certificate identifying the service.
    X509(CertificateDer),
    /// An identity expressed as a subject name only.
    SubjectName(String),
}

impl DigitalIdentity {
    /// The certificate, if this identity carries one.
    pub fn certificate(&self) -> Option<&CertificateDer> {
        match self {
            Self::X509(der) => Some(der),
            Self::SubjectName(_) => None,
        }
    }
}

/// A trust service offered by a provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TspService {
    type_uri: String,
    status: String,
    names: Vec<String>,
    identities: Vec<DigitalIdentity>,
}

impl TspService {
    /// Creates a service with the given type and status URIs.
    pub fn new(
        type_uri: impl Into<String>,
        status: impl Into<String>,
        names: Vec<String>,
        identities: Vec<DigitalIdentity>,
    ) -> Self {
        Self {
            type_uri: type_uri.into(),
            status: status.into(),
            names,
            identities,
        }
    }

    /// The service-type URI, e.g. `http://uri.etsi.org/TrstSvc/Svctype/CA/QC`.
    pub fn type_uri(&self) -> &str {
        &self.type_uri
    }

    /// The current status URI of the service.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// The service names, in document order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The digital identities, in document order.
    pub fn identities(&self) -> &[DigitalIdentity] {
        &self.identities
    }

    /// Iterates the X.509 certificates among the identities.
    pub fn certificates(&self) -> impl Iterator<Item = &CertificateDer> {
        self.identities.iter().filter_map(DigitalIdentity::certificate)
    }
}

/// A trust service provider and its ordered services.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrustServiceProvider {
    names: Vec<String>,
    services: Vec<TspService>,
}

impl TrustServiceProvider {
    /// Creates a provider.
    pub fn new(names: Vec<String>, services: Vec<TspService>) -> Self {
        Self { names, services }
    }

    /// The provider names, in document order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The first provider name, or an empty string.
    pub fn name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or("")
    }

    /// The provider's services, in document order.
    pub fn services(&self) -> &[TspService] {
        &self.services
    }
}

/// Scheme metadata of a status list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemeInformation {
    territory: String,
    type_uri: String,
    sequence_number: u64,
    issue_date: Option<OffsetDateTime>,
    next_update: Option<OffsetDateTime>,
    operator_names: Vec<String>,
}

impl SchemeInformation {
    /// Creates scheme metadata.
    pub fn new(
        territory: impl Into<String>,
        type_uri: impl Into<String>,
        sequence_number: u64,
        issue_date: Option<OffsetDateTime>,
        next_update: Option<OffsetDateTime>,
        operator_names: Vec<String>,
    ) -> Self {
        Self {
            territory: territory.into(),
            type_uri: type_uri.into(),
            sequence_number,
            issue_date,
            next_update,
            operator_names,
        }
    }

    /// The scheme territory, e.g. `SE`.
    pub fn territory(&self) -> &str {
        &self.territory
    }

    /// The TSL type URI.
    pub fn type_uri(&self) -> &str {
        &self.type_uri
    }

    /// The sequence number of this issue of the list.
    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    /// When this issue of the list was published.
    pub fn issue_date(&self) -> Option<OffsetDateTime> {
        self.issue_date
    }

    /// The latest date by which the next issue is due.
    pub fn next_update(&self) -> Option<OffsetDateTime> {
        self.next_update
    }

    /// The scheme operator names, in document order.
    pub fn operator_names(&self) -> &[String] {
        &self.operator_names
    }
}

/// One Trust Status List document.
///
/// Immutable once produced by the fetcher; the resolver attaches it to a
/// tree behind an `Arc` and nothing mutates it afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusList {
    scheme: SchemeInformation,
    providers: Vec<TrustServiceProvider>,
    source: Source,
    references: Vec<Url>,
}

impl StatusList {
    /// Creates a status list from its parts.
    pub fn new(
        scheme: SchemeInformation,
        providers: Vec<TrustServiceProvider>,
        source: Source,
        references: Vec<Url>,
    ) -> Self {
        Self {
            scheme,
            providers,
            source,
            references,
        }
    }

    /// The scheme metadata.
    pub fn scheme(&self) -> &SchemeInformation {
        &self.scheme
    }

    /// The trust service providers, in document order.
    pub fn providers(&self) -> &[TrustServiceProvider] {
        &self.providers
    }

    /// The origin this list was loaded from.
    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Replaces the origin. Used by the fetcher only.
    pub fn set_source(&mut self, source: Source) {
        self.source = source;
    }

    /// Locations of TSLs referenced by this list, in document order.
    pub fn references(&self) -> &[Url] {
        &self.references
    }

    /// Number of providers in the list.
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Number of services over all providers.
    pub fn service_count(&self) -> usize {
        self.providers.iter().map(|p| p.services().len()).sum()
    }

    /// Iterates every service in the list, provider order then service order.
    pub fn services(&self) -> impl Iterator<Item = (&TrustServiceProvider, &TspService)> {
        self.providers
            .iter()
            .flat_map(|p| p.services().iter().map(move |s| (p, s)))
    }
}
