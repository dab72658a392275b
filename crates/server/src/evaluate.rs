// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The decision evaluator behind `POST /evaluate`.
//!
//! Requests follow the AuthZEN shape: four entities (subject, resource,
//! action, context), each with a free-form property map. Certificates
//! arrive as `x5c` properties, arrays of standard-base64 DER, subject
//! first. The first presented certificate is verified against the current
//! snapshot's pool. Every failure is a `decision: false` answer, never an
//! HTTP error; operator detail goes to `reason_admin`, the sanitized
//! message to `reason_user`.

use data_encoding::BASE64;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer;

use crate::snapshot::Snapshot;

/// An AuthZEN evaluation request.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct EvaluationRequest {
    /// The entity presenting the certificate chain.
    #[serde(default)]
    pub subject: Entity,
    /// The entity access is requested to.
    #[serde(default)]
    pub resource: Entity,
    /// The action being authorized.
    #[serde(default)]
    pub action: Entity,
    /// Ambient request context.
    #[serde(default)]
    pub context: Entity,
}

/// One request entity: a type, an id and arbitrary properties.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Entity {
    /// The entity type label.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// The entity identifier.
    #[serde(default)]
    pub id: String,
    /// Arbitrary properties; `x5c` is the one this engine consumes.
    #[serde(default)]
    pub properties: serde_json::Map<String, Value>,
}

/// The evaluation answer.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct EvaluationResponse {
    /// Permit or deny.
    pub decision: bool,
    /// Reasons, present on deny.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ResponseContext>,
}

/// Reason detail attached to a response.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct ResponseContext {
    /// Correlation id, unused by this engine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Operator-facing detail; may name internals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_admin: Option<String>,
    /// Caller-facing reason; never carries internal paths or keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_user: Option<String>,
}

impl EvaluationResponse {
    /// A permit with no further context.
    pub fn permit() -> Self {
        Self {
            decision: true,
            context: None,
        }
    }

    /// A deny carrying a sanitized user reason and operator detail.
    pub fn deny(reason_user: impl Into<String>, reason_admin: impl Into<String>) -> Self {
        Self {
            decision: false,
            context: Some(ResponseContext {
                id: None,
                reason_admin: Some(reason_admin.into()),
                reason_user: Some(reason_user.into()),
            }),
        }
    }
}

/// Evaluates one request against the current snapshot.
pub fn decide(snapshot: Option<&Snapshot>, request: &EvaluationRequest) -> EvaluationResponse {
    let chain = match extract_chain(request) {
        Ok(chain) => chain,
        Err(detail) => {
            return EvaluationResponse::deny("invalid certificate material", detail);
        }
    };
    if chain.is_empty() {
        return EvaluationResponse::deny(
            "no certificates presented",
            "no x5c property on subject, resource, action or context",
        );
    }

    let pool = match snapshot {
        Some(snapshot) if !snapshot.context().pool().is_empty() => snapshot.context().pool(),
        _ => {
            return EvaluationResponse::deny("pool not initialized", "pool not initialized");
        }
    };

    match pool.verify(&chain[0]) {
        Ok(()) => EvaluationResponse::permit(),
        Err(e) => EvaluationResponse::deny(
            "certificate is not issued by a trusted service",
            e.to_string(),
        ),
    }
}

/// Pulls every `x5c` certificate out of the request, subject first.
fn extract_chain(request: &EvaluationRequest) -> Result<Vec<Vec<u8>>, String> {
    let entities = [
        ("subject", &request.subject),
        ("resource", &request.resource),
        ("action", &request.action),
        ("context", &request.context),
    ];

    let mut chain = Vec::new();
    for (name, entity) in entities {
        let Some(value) = entity.properties.get("x5c") else {
            continue;
        };
        let Value::Array(items) = value else {
            return Err(format!("{name}.properties.x5c must be an array"));
        };
        for (index, item) in items.iter().enumerate() {
            let Value::String(encoded) = item else {
                return Err(format!("{name}.properties.x5c[{index}] must be a string"));
            };
            let der = BASE64
                .decode(encoded.as_bytes())
                .map_err(|e| format!("{name}.properties.x5c[{index}]: invalid base64: {e}"))?;
            X509Certificate::from_der(&der).map_err(|e| {
                format!("{name}.properties.x5c[{index}]: not an X.509 certificate: {e}")
            })?;
            chain.push(der);
        }
    }
    Ok(chain)
}
