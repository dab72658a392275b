// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The `publish` step: serialize loaded TSLs to XML files.

use std::collections::HashSet;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;
use trustl_tsl::{xml, StatusList};

use crate::context::Context;
use crate::error::Error;
use crate::registry::Step;
use crate::runner::Pipeline;

/// Writes every status list of every loaded tree to the given directory.
/// When the pipeline carries a signer, serialized bytes pass through it
/// before being written.
pub(crate) struct PublishStep;

#[async_trait]
impl Step for PublishStep {
    async fn run(
        &self,
        pipeline: &Pipeline,
        context: Context,
        args: &[String],
    ) -> Result<Context, Error> {
        let dir = args
            .first()
            .map(PathBuf::from)
            .ok_or_else(|| Error::Config("publish requires a directory argument".to_string()))?;
        tokio::fs::create_dir_all(&dir).await?;

        let mut written = HashSet::new();
        let mut count = 0;
        for tree in context.trees() {
            for list in tree.flatten() {
                let document = xml::encode(&list)?;
                let bytes = match pipeline.signer() {
                    Some(signer) => signer.sign(document.as_bytes())?,
                    None => document.into_bytes(),
                };

                let name = unique_name(&list, &mut written);
                let path = dir.join(&name);
                tokio::fs::write(&path, bytes).await?;
                info!(source = %list.source(), file = %path.display(), "published TSL");
                count += 1;
            }
        }
        info!(count, dir = %dir.display(), "publish complete");
        Ok(context)
    }
}

fn unique_name(list: &StatusList, written: &mut HashSet<String>) -> String {
    let territory = list.scheme().territory();
    let stem = if territory.is_empty() {
        format!("tsl-{}", list.scheme().sequence_number())
    } else {
        format!("{}-{}", territory.to_lowercase(), list.scheme().sequence_number())
    };

    let mut name = format!("{stem}.xml");
    let mut counter = 1;
    while !written.insert(name.clone()) {
        name = format!("{stem}-{counter}.xml");
        counter += 1;
    }
    name
}
