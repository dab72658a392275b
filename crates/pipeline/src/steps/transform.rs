// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The `transform` step: feed documents through the configured transformer.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use trustl_tsl::{xml, StatusList, TslNode, TslTree};

use crate::context::Context;
use crate::error::Error;
use crate::registry::Step;
use crate::runner::Pipeline;
use crate::signer::Transformer;

/// Applies the pipeline's transformer to every loaded status list.
///
/// First argument: the stylesheet path handed to the transformer. Second
/// argument: `replace` to decode the transformed documents back into the
/// context's trees, or a directory to write transformed artifacts into.
pub(crate) struct TransformStep;

#[async_trait]
impl Step for TransformStep {
    async fn run(
        &self,
        pipeline: &Pipeline,
        mut context: Context,
        args: &[String],
    ) -> Result<Context, Error> {
        let stylesheet = args
            .first()
            .map(PathBuf::from)
            .ok_or_else(|| Error::Config("transform requires a stylesheet argument".to_string()))?;
        let mode = args.get(1).map(String::as_str).unwrap_or("replace");

        let transformer = pipeline
            .transformer()
            .ok_or_else(|| Error::Config("transform step requires a configured transformer".to_string()))?;

        if mode == "replace" {
            let trees = std::mem::take(context.ensure_trees());
            let mut replaced = Vec::with_capacity(trees.len());
            for tree in &trees {
                replaced.push(TslTree::new(transform_node(
                    tree.root(),
                    transformer.as_ref(),
                    &stylesheet,
                )?));
            }
            *context.ensure_trees() = replaced;
            info!(trees = context.trees().len(), "transformed TSLs in place");
        } else {
            let dir = PathBuf::from(mode);
            tokio::fs::create_dir_all(&dir).await?;
            let mut count = 0;
            for tree in context.trees() {
                for list in tree.flatten() {
                    let transformed =
                        apply(transformer.as_ref(), &stylesheet, &list)?;
                    let name = format!("{count:03}.xml");
                    tokio::fs::write(dir.join(name), transformed).await?;
                    count += 1;
                }
            }
            info!(count, dir = %dir.display(), "wrote transformed artifacts");
        }
        Ok(context)
    }
}

fn apply(
    transformer: &dyn Transformer,
    stylesheet: &Path,
    list: &StatusList,
) -> Result<Vec<u8>, Error> {
    let document = xml::encode(list)?;
    transformer.transform(stylesheet, document.as_bytes())
}

fn transform_node(
    node: &TslNode,
    transformer: &dyn Transformer,
    stylesheet: &Path,
) -> Result<TslNode, Error> {
    let transformed = apply(transformer, stylesheet, node.tsl())?;
    let list = xml::decode_bytes(&transformed, node.tsl().source().clone())
        .map_err(|e| Error::Transform(format!("transformed output is not a TSL: {e}")))?;

    let children = node
        .children()
        .iter()
        .map(|child| transform_node(child, transformer, stylesheet))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TslNode::with_children(Arc::new(list), children))
}

#[cfg(test)]
mod tests {
    use trustl_tsl::{SchemeInformation, Source, TrustServiceProvider, TspService};

    use super::*;

    fn tree() -> TslTree {
        TslTree::singleton(Arc::new(StatusList::new(
            SchemeInformation::new("SE", "http://scheme/test", 1, None, None, vec![]),
            vec![TrustServiceProvider::new(
                vec!["p".to_string()],
                vec![TspService::new("t", "granted", vec![], vec![])],
            )],
            Source::new("mem://transform"),
            vec![],
        )))
    }

    struct Identity;

    impl Transformer for Identity {
        fn transform(&self, _stylesheet: &Path, xml: &[u8]) -> Result<Vec<u8>, Error> {
            Ok(xml.to_vec())
        }
    }

    struct Garbage;

    impl Transformer for Garbage {
        fn transform(&self, _stylesheet: &Path, _xml: &[u8]) -> Result<Vec<u8>, Error> {
            Ok(b"<html>not a TSL</html>".to_vec())
        }
    }

    #[tokio::test]
    async fn replace_mode_round_trips_through_the_transformer() {
        let mut context = Context::new();
        context.add_tree(tree());
        let before = context.trees()[0].root().tsl().clone();

        let pipeline = Pipeline::from_yaml("[]")
            .unwrap()
            .with_transformer(Arc::new(Identity));
        let context = TransformStep
            .run(
                &pipeline,
                context,
                &["style.xsl".to_string(), "replace".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(context.trees().len(), 1);
        assert_eq!(context.trees()[0].root().tsl().as_ref(), before.as_ref());
    }

    #[tokio::test]
    async fn directory_mode_writes_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let mut context = Context::new();
        context.add_tree(tree());

        let pipeline = Pipeline::from_yaml("[]")
            .unwrap()
            .with_transformer(Arc::new(Identity));
        TransformStep
            .run(
                &pipeline,
                context,
                &["style.xsl".to_string(), dir.path().display().to_string()],
            )
            .await
            .unwrap();

        assert!(dir.path().join("000.xml").exists());
    }

    #[tokio::test]
    async fn unparsable_transformer_output_fails_replace() {
        let mut context = Context::new();
        context.add_tree(tree());

        let pipeline = Pipeline::from_yaml("[]")
            .unwrap()
            .with_transformer(Arc::new(Garbage));
        let err = TransformStep
            .run(
                &pipeline,
                context,
                &["style.xsl".to_string(), "replace".to_string()],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transform(_)), "{err}");
    }

    #[tokio::test]
    async fn missing_transformer_is_a_config_error() {
        let pipeline = Pipeline::from_yaml("[]").unwrap();
        let err = TransformStep
            .run(&pipeline, Context::new(), &["style.xsl".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)), "{err}");
    }
}
