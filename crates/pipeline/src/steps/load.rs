// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The `load` step: fetch a TSL and dereference it into a tree.

use async_trait::async_trait;
use tracing::{info, warn};
use url::Url;

use crate::context::Context;
use crate::error::Error;
use crate::registry::Step;
use crate::runner::Pipeline;

/// Fetches the TSL at the given URI (or path), resolves its references
/// under the context's fetch options and filters, and pushes the resulting
/// tree onto the context.
///
/// A second argument is reserved for a per-load filter expression; it is
/// currently parsed but ignored.
pub(crate) struct LoadStep;

#[async_trait]
impl Step for LoadStep {
    async fn run(
        &self,
        _pipeline: &Pipeline,
        mut context: Context,
        args: &[String],
    ) -> Result<Context, Error> {
        let location = args
            .first()
            .ok_or_else(|| Error::Config("load requires a URI or path argument".to_string()))?;
        if let Some(expression) = args.get(1) {
            if !expression.is_empty() {
                warn!(
                    expression = expression.as_str(),
                    "per-load filter expressions are not implemented; ignoring"
                );
            }
        }

        let url = to_url(location)?;
        let options = context.ensure_fetch_options().clone();
        let cancel = context.cancellation().clone();

        let resolution = trustl_resolver::resolve(&url, &options, &cancel)
            .await
            .map_err(|e| match e {
                trustl_resolver::Error::Cancelled => Error::Cancelled,
                other => Error::Resolve(other),
            })?;

        for diagnostic in resolution.diagnostics() {
            warn!(
                uri = diagnostic.uri(),
                detail = diagnostic.detail(),
                "reference omitted during load"
            );
        }

        let tree = resolution.into_tree();
        let mut total_providers = 0;
        let mut total_services = 0;
        tree.traverse(|node, depth| {
            let tsl = node.tsl();
            total_providers += tsl.provider_count();
            total_services += tsl.service_count();
            info!(
                source = %tsl.source(),
                provider_count = tsl.provider_count(),
                service_count = tsl.service_count(),
                referenced = depth > 0,
                "loaded TSL"
            );
        });
        info!(
            tree_depth = tree.depth(),
            total_count = tree.size(),
            total_providers,
            total_services,
            territory = tree.root().tsl().scheme().territory(),
            "TSL load complete"
        );

        context.add_tree(tree);
        Ok(context)
    }
}

/// Interprets the location as a URL, prefixing bare paths with `file://`.
fn to_url(location: &str) -> Result<Url, Error> {
    if let Ok(url) = Url::parse(location) {
        return Ok(url);
    }
    let path = std::path::Path::new(location);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Url::from_file_path(&absolute)
        .map_err(|()| Error::Config(format!("cannot express {location:?} as a file URI")))
}
