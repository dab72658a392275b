// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! XML codec for the consumed subset of ETSI TS 119612.
//!
//! Decoding is tolerant: elements the engine does not use are skipped, and
//! unparsable dates are dropped with a debug log rather than failing the
//! document. Encoding is canonical in the sense of the round-trip law: an
//! encoded document decodes back to an equal [`StatusList`].

use data_encoding::BASE64;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::model::{
    CertificateDer, DigitalIdentity, SchemeInformation, Source, StatusList, TrustServiceProvider,
    TspService,
};

const TSL_VERSION_IDENTIFIER: u32 = 5;

/// Decodes one TSL document, attaching the given source.
pub fn decode(xml: &str, source: Source) -> Result<StatusList, Error> {
    let wire: XmlStatusList =
        quick_xml::de::from_str(xml).map_err(|e| Error::Parse(e.to_string()))?;
    wire.into_model(source)
}

/// Decodes one TSL document from raw bytes, attaching the given source.
pub fn decode_bytes(xml: &[u8], source: Source) -> Result<StatusList, Error> {
    let text = std::str::from_utf8(xml).map_err(|e| Error::Parse(e.to_string()))?;
    decode(text, source)
}

/// Encodes a status list as a standalone XML document.
pub fn encode(list: &StatusList) -> Result<String, Error> {
    let wire = XmlStatusList::from_model(list);
    let body = quick_xml::se::to_string(&wire).map_err(|e| Error::Parse(e.to_string()))?;
    Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{body}"))
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "TrustServiceStatusList")]
struct XmlStatusList {
    #[serde(rename = "SchemeInformation")]
    scheme: XmlSchemeInformation,
    #[serde(
        rename = "TrustServiceProviderList",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    providers: Option<XmlProviderList>,
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlSchemeInformation {
    #[serde(rename = "TSLVersionIdentifier", default = "default_version")]
    version: u32,
    #[serde(rename = "TSLSequenceNumber", default)]
    sequence_number: u64,
    #[serde(rename = "TSLType", default, skip_serializing_if = "Option::is_none")]
    type_uri: Option<String>,
    #[serde(
        rename = "SchemeOperatorName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    operator_names: Option<XmlNameList>,
    #[serde(
        rename = "SchemeTerritory",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    territory: Option<String>,
    #[serde(
        rename = "ListIssueDateTime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    issue_date: Option<String>,
    #[serde(rename = "NextUpdate", default, skip_serializing_if = "Option::is_none")]
    next_update: Option<XmlNextUpdate>,
    #[serde(
        rename = "PointersToOtherTSL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pointers: Option<XmlPointerList>,
}

fn default_version() -> u32 {
    TSL_VERSION_IDENTIFIER
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlNextUpdate {
    #[serde(rename = "dateTime", default, skip_serializing_if = "Option::is_none")]
    date_time: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlNameList {
    #[serde(rename = "Name", default)]
    names: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlPointerList {
    #[serde(rename = "OtherTSLPointer", default)]
    pointers: Vec<XmlPointer>,
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlPointer {
    #[serde(rename = "TSLLocation")]
    location: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlProviderList {
    #[serde(rename = "TrustServiceProvider", default)]
    providers: Vec<XmlProvider>,
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlProvider {
    #[serde(rename = "TSPInformation")]
    information: XmlTspInformation,
    #[serde(rename = "TSPServices", default, skip_serializing_if = "Option::is_none")]
    services: Option<XmlServiceList>,
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlTspInformation {
    #[serde(rename = "TSPName", default, skip_serializing_if = "Option::is_none")]
    name: Option<XmlNameList>,
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlServiceList {
    #[serde(rename = "TSPService", default)]
    services: Vec<XmlService>,
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlService {
    #[serde(rename = "ServiceInformation")]
    information: XmlServiceInformation,
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlServiceInformation {
    #[serde(rename = "ServiceTypeIdentifier", default)]
    type_uri: String,
    #[serde(rename = "ServiceName", default, skip_serializing_if = "Option::is_none")]
    name: Option<XmlNameList>,
    #[serde(
        rename = "ServiceDigitalIdentity",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    identity: Option<XmlDigitalIdentityList>,
    #[serde(rename = "ServiceStatus", default)]
    status: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlDigitalIdentityList {
    #[serde(rename = "DigitalId", default)]
    ids: Vec<XmlDigitalId>,
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlDigitalId {
    #[serde(
        rename = "X509Certificate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    certificate: Option<String>,
    #[serde(
        rename = "X509SubjectName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    subject_name: Option<String>,
}

impl XmlStatusList {
    fn into_model(self, source: Source) -> Result<StatusList, Error> {
        let scheme = self.scheme;

        let mut references = Vec::new();
        for pointer in scheme.pointers.map(|p| p.pointers).unwrap_or_default() {
            let url = Url::parse(&pointer.location).map_err(|e| Error::Reference {
                location: pointer.location.clone(),
                reason: e.to_string(),
            })?;
            references.push(url);
        }

        let mut providers = Vec::new();
        for provider in self.providers.map(|p| p.providers).unwrap_or_default() {
            let mut services = Vec::new();
            for service in provider.services.map(|s| s.services).unwrap_or_default() {
                let info = service.information;
                let mut identities = Vec::new();
                for id in info.identity.map(|i| i.ids).unwrap_or_default() {
                    if let Some(encoded) = id.certificate {
                        identities.push(DigitalIdentity::X509(decode_certificate(&encoded)?));
                    } else if let Some(subject) = id.subject_name {
                        identities.push(DigitalIdentity::SubjectName(subject));
                    }
                }
                services.push(TspService::new(
                    info.type_uri,
                    info.status,
                    info.name.map(|n| n.names).unwrap_or_default(),
                    identities,
                ));
            }
            providers.push(TrustServiceProvider::new(
                provider.information.name.map(|n| n.names).unwrap_or_default(),
                services,
            ));
        }

        let scheme = SchemeInformation::new(
            scheme.territory.unwrap_or_default(),
            scheme.type_uri.unwrap_or_default(),
            scheme.sequence_number,
            scheme.issue_date.as_deref().and_then(parse_date),
            scheme
                .next_update
                .and_then(|n| n.date_time)
                .as_deref()
                .and_then(parse_date),
            scheme.operator_names.map(|n| n.names).unwrap_or_default(),
        );

        Ok(StatusList::new(scheme, providers, source, references))
    }

    fn from_model(list: &StatusList) -> Self {
        let scheme = list.scheme();
        Self {
            scheme: XmlSchemeInformation {
                version: TSL_VERSION_IDENTIFIER,
                sequence_number: scheme.sequence_number(),
                type_uri: non_empty(scheme.type_uri()),
                operator_names: name_list(scheme.operator_names()),
                territory: non_empty(scheme.territory()),
                issue_date: scheme.issue_date().map(format_date),
                next_update: scheme.next_update().map(|d| XmlNextUpdate {
                    date_time: Some(format_date(d)),
                }),
                pointers: if list.references().is_empty() {
                    None
                } else {
                    Some(XmlPointerList {
                        pointers: list
                            .references()
                            .iter()
                            .map(|url| XmlPointer {
                                location: url.as_str().to_string(),
                            })
                            .collect(),
                    })
                },
            },
            providers: if list.providers().is_empty() {
                None
            } else {
                Some(XmlProviderList {
                    providers: list.providers().iter().map(provider_to_wire).collect(),
                })
            },
        }
    }
}

fn provider_to_wire(provider: &TrustServiceProvider) -> XmlProvider {
    XmlProvider {
        information: XmlTspInformation {
            name: name_list(provider.names()),
        },
        services: if provider.services().is_empty() {
            None
        } else {
            Some(XmlServiceList {
                services: provider
                    .services()
                    .iter()
                    .map(|service| XmlService {
                        information: XmlServiceInformation {
                            type_uri: service.type_uri().to_string(),
                            name: name_list(service.names()),
                            identity: if service.identities().is_empty() {
                                None
                            } else {
                                Some(XmlDigitalIdentityList {
                                    ids: service.identities().iter().map(identity_to_wire).collect(),
                                })
                            },
                            status: service.status().to_string(),
                        },
                    })
                    .collect(),
            })
        },
    }
}

fn identity_to_wire(identity: &DigitalIdentity) -> XmlDigitalId {
    match identity {
        DigitalIdentity::X509(der) => XmlDigitalId {
            certificate: Some(BASE64.encode(der.as_bytes())),
            subject_name: None,
        },
        DigitalIdentity::SubjectName(subject) => XmlDigitalId {
            certificate: None,
            subject_name: Some(subject.clone()),
        },
    }
}

fn decode_certificate(encoded: &str) -> Result<CertificateDer, Error> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let der = BASE64
        .decode(compact.as_bytes())
        .map_err(|e| Error::Certificate(e.to_string()))?;
    Ok(CertificateDer::new(der))
}

fn parse_date(value: &str) -> Option<OffsetDateTime> {
    match OffsetDateTime::parse(value, &Rfc3339) {
        Ok(date) => Some(date),
        Err(e) => {
            debug!(value, error = %e, "dropping unparsable TSL date");
            None
        }
    }
}

fn format_date(date: OffsetDateTime) -> String {
    date.format(&Rfc3339).unwrap_or_default()
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn name_list(names: &[String]) -> Option<XmlNameList> {
    if names.is_empty() {
        None
    } else {
        Some(XmlNameList {
            names: names.to_vec(),
        })
    }
}
