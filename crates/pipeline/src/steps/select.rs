// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The `select` step: derive the trusted certificate pool.

use async_trait::async_trait;
use tracing::info;
use trustl_tsl::{CertificatePool, TspService};

use crate::context::Context;
use crate::error::Error;
use crate::registry::Step;
use crate::runner::Pipeline;

/// Walks every loaded tree to the requested depth and collects the X.509
/// certificates of all services passing the predicates into a fresh pool.
///
/// Arguments, order-independent:
/// - `reference-depth:N`: include TSLs at depth <= N (default 0, root only)
/// - `include-referenced`: unbounded depth
/// - `service-type:<URI>`: repeatable, services must match one of them
/// - `status:<URI>`: repeatable, services must match one of them
/// - `status-logic:and`: a service must match *every* given status URI;
///   with two or more distinct status URIs this matches nothing, since a
///   service carries exactly one status
pub(crate) struct SelectStep;

#[async_trait]
impl Step for SelectStep {
    async fn run(
        &self,
        _pipeline: &Pipeline,
        mut context: Context,
        args: &[String],
    ) -> Result<Context, Error> {
        let predicate = SelectArgs::parse(args)?;

        if context.trees().is_empty() {
            return Err(Error::NoTslsLoaded);
        }

        let mut pool = CertificatePool::new();
        let mut matched_services = 0;
        for tree in context.trees() {
            tree.traverse_depth(predicate.depth, |node, _| {
                for (_, service) in node.tsl().services() {
                    if !predicate.matches(service) {
                        continue;
                    }
                    matched_services += 1;
                    for certificate in service.certificates() {
                        pool.add(certificate.clone());
                    }
                }
            });
        }

        info!(
            pool_size = pool.len(),
            matched_services,
            trees = context.trees().len(),
            "certificate pool selected"
        );
        context.set_pool(pool);
        Ok(context)
    }
}

struct SelectArgs {
    depth: usize,
    service_types: Vec<String>,
    statuses: Vec<String>,
    require_all_statuses: bool,
}

impl SelectArgs {
    fn parse(args: &[String]) -> Result<Self, Error> {
        let mut parsed = Self {
            depth: 0,
            service_types: Vec::new(),
            statuses: Vec::new(),
            require_all_statuses: false,
        };
        for arg in args {
            if arg == "include-referenced" {
                parsed.depth = usize::MAX;
            } else if let Some(value) = arg.strip_prefix("reference-depth:") {
                parsed.depth = value
                    .parse()
                    .map_err(|e| Error::Config(format!("bad reference-depth {value:?}: {e}")))?;
            } else if let Some(value) = arg.strip_prefix("service-type:") {
                parsed.service_types.push(value.to_string());
            } else if let Some(value) = arg.strip_prefix("status:") {
                parsed.statuses.push(value.to_string());
            } else if arg == "status-logic:and" {
                parsed.require_all_statuses = true;
            } else {
                return Err(Error::Config(format!("unknown select argument {arg:?}")));
            }
        }
        Ok(parsed)
    }

    fn matches(&self, service: &TspService) -> bool {
        if !self.service_types.is_empty()
            && !self.service_types.iter().any(|t| t == service.type_uri())
        {
            return false;
        }
        if self.statuses.is_empty() {
            return true;
        }
        if self.require_all_statuses {
            self.statuses.iter().all(|s| s == service.status())
        } else {
            self.statuses.iter().any(|s| s == service.status())
        }
    }
}
