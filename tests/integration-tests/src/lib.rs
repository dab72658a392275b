// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Shared fixtures for the end-to-end tests: generated CAs, TSL files on
//! disk and AuthZEN request bodies.

use std::path::Path;
use std::sync::Once;

use data_encoding::BASE64;
use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair};
use serde_json::{json, Value};
use trustl_tsl::{
    xml, CertificateDer, DigitalIdentity, SchemeInformation, Source, StatusList,
    TrustServiceProvider, TspService,
};
use url::Url;

/// The qualified-CA service type used throughout the fixtures.
pub const CA_QC: &str = "http://uri.etsi.org/TrstSvc/Svctype/CA/QC";
/// The granted service status.
pub const GRANTED: &str = "http://uri.etsi.org/TrstSvc/TrustedList/Svcstatus/granted";
/// A non-granted status for filter scenarios.
pub const WITHDRAWN: &str = "http://uri.etsi.org/TrstSvc/TrustedList/Svcstatus/withdrawn";

/// Installs a test log subscriber once per process.
pub fn subscribe() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// A generated certificate authority that can issue client leaves.
pub struct TestCa {
    certificate: rcgen::Certificate,
    key: KeyPair,
}

impl TestCa {
    /// Generates a fresh CA with the given common name.
    pub fn new(common_name: &str) -> Self {
        let key = KeyPair::generate().expect("generate CA key");
        let mut params = CertificateParams::new(Vec::new()).expect("CA params");
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.distinguished_name.push(DnType::CommonName, common_name);
        let certificate = params.self_signed(&key).expect("self-sign CA");
        Self { certificate, key }
    }

    /// The CA certificate in DER form.
    pub fn der(&self) -> Vec<u8> {
        self.certificate.der().to_vec()
    }

    /// Issues a leaf certificate for the given subject name.
    pub fn issue_leaf(&self, common_name: &str) -> Vec<u8> {
        let key = KeyPair::generate().expect("generate leaf key");
        let mut params =
            CertificateParams::new(vec![common_name.to_string()]).expect("leaf params");
        params.distinguished_name.push(DnType::CommonName, common_name);
        params
            .signed_by(&key, &self.certificate, &self.key)
            .expect("sign leaf")
            .der()
            .to_vec()
    }
}

/// Describes one service row of a fixture TSL.
pub struct FixtureService {
    /// Service type URI.
    pub type_uri: String,
    /// Service status URI.
    pub status: String,
    /// DER certificate carried by the service.
    pub certificate: Vec<u8>,
}

impl FixtureService {
    /// A granted CA/QC service around the given certificate.
    pub fn granted_ca(certificate: Vec<u8>) -> Self {
        Self {
            type_uri: CA_QC.to_string(),
            status: GRANTED.to_string(),
            certificate,
        }
    }
}

/// Builds a status list value for fixtures.
pub fn status_list(
    territory: &str,
    sequence: u64,
    services: Vec<FixtureService>,
    references: &[Url],
) -> StatusList {
    let services = services
        .into_iter()
        .enumerate()
        .map(|(index, service)| {
            TspService::new(
                service.type_uri,
                service.status,
                vec![format!("service-{index}")],
                vec![DigitalIdentity::X509(CertificateDer::new(service.certificate))],
            )
        })
        .collect();
    StatusList::new(
        SchemeInformation::new(
            territory,
            "http://uri.etsi.org/TrstSvc/TrustedList/TSLType/EUgeneric",
            sequence,
            None,
            None,
            vec![format!("{territory} operator")],
        ),
        vec![TrustServiceProvider::new(
            vec![format!("{territory} provider")],
            services,
        )],
        Source::new(""),
        references.to_vec(),
    )
}

/// Writes a fixture TSL to `dir/name` and returns its file URL.
pub fn write_tsl(
    dir: &Path,
    name: &str,
    territory: &str,
    sequence: u64,
    services: Vec<FixtureService>,
    references: &[Url],
) -> Url {
    let list = status_list(territory, sequence, services, references);
    let path = dir.join(name);
    std::fs::write(&path, xml::encode(&list).expect("encode fixture TSL"))
        .expect("write fixture TSL");
    Url::from_file_path(&path).expect("fixture path is absolute")
}

/// An AuthZEN evaluation body presenting one DER certificate on the
/// subject.
pub fn x5c_request(der: &[u8]) -> Value {
    json!({
        "subject": {
            "type": "client",
            "id": "client.example",
            "properties": {"x5c": [BASE64.encode(der)]}
        },
        "resource": {"type": "endpoint", "id": "/"},
        "action": {"type": "access", "id": "connect"},
        "context": {}
    })
}
