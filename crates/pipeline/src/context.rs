// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The shared state threaded through one pipeline run.

use std::collections::HashMap;

use tokio_util::sync::CancellationToken;
use trustl_resolver::FetchOptions;
use trustl_tsl::{CertificatePool, TslTree};

/// The unit of state passed through the pipeline.
///
/// A context is constructed fresh at the start of each run and mutated only
/// by the step currently executing; steps run strictly in sequence. Once a
/// run completes, the context is frozen inside a snapshot and never touched
/// again.
#[derive(Clone, Debug, Default)]
pub struct Context {
    trees: Vec<TslTree>,
    pool: CertificatePool,
    fetch_options: Option<FetchOptions>,
    data: HashMap<String, String>,
    cancel: CancellationToken,
}

impl Context {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty context carrying the given run cancellation token.
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            ..Self::default()
        }
    }

    /// The loaded trees, oldest first; the most recently loaded is last.
    pub fn trees(&self) -> &[TslTree] {
        &self.trees
    }

    /// Mutable access to the tree stack, for steps that restructure it.
    pub fn ensure_trees(&mut self) -> &mut Vec<TslTree> {
        &mut self.trees
    }

    /// Pushes a tree on top of the stack.
    pub fn add_tree(&mut self, tree: TslTree) {
        self.trees.push(tree);
    }

    /// The fetch options, if any step installed them.
    pub fn fetch_options(&self) -> Option<&FetchOptions> {
        self.fetch_options.as_ref()
    }

    /// The fetch options, installing defaults first if absent.
    pub fn ensure_fetch_options(&mut self) -> &mut FetchOptions {
        self.fetch_options.get_or_insert_with(FetchOptions::default)
    }

    /// The trusted certificate pool.
    pub fn pool(&self) -> &CertificatePool {
        &self.pool
    }

    /// Resets the pool to empty and returns it for building.
    pub fn init_pool(&mut self) -> &mut CertificatePool {
        self.pool = CertificatePool::new();
        &mut self.pool
    }

    /// Replaces the pool wholesale. Select installs its finished build here
    /// so partial builds are never observable.
    pub fn set_pool(&mut self, pool: CertificatePool) {
        self.pool = pool;
    }

    /// The free-form key/value hints shared between steps.
    pub fn data(&self) -> &HashMap<String, String> {
        &self.data
    }

    /// Mutable access to the hint map.
    pub fn data_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.data
    }

    /// The cancellation token bounding this run.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Total number of status lists over all trees.
    pub fn tsl_count(&self) -> usize {
        self.trees.iter().map(TslTree::size).sum()
    }

    /// A deep copy: trees and fetch options are duplicated, the hint map is
    /// cloned, and the pool is re-created empty (a select step in the
    /// copy's pipeline rebuilds it).
    pub fn copy(&self) -> Self {
        Self {
            trees: self.trees.clone(),
            pool: CertificatePool::new(),
            fetch_options: self.fetch_options.clone(),
            data: self.data.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use trustl_resolver::Filter;
    use trustl_tsl::{CertificateDer, SchemeInformation, Source, StatusList};

    use super::*;

    fn tree(source: &str) -> TslTree {
        TslTree::singleton(Arc::new(StatusList::new(
            SchemeInformation::new("SE", "t", 1, None, None, vec![]),
            vec![],
            Source::new(source),
            vec![],
        )))
    }

    #[test]
    fn ensure_fetch_options_installs_defaults_once() {
        let mut context = Context::new();
        assert!(context.fetch_options().is_none());

        context.ensure_fetch_options().apply("max-depth:3").unwrap();
        assert_eq!(context.fetch_options().unwrap().max_depth(), 3);

        // a second ensure keeps the installed options
        assert_eq!(context.ensure_fetch_options().max_depth(), 3);
    }

    #[test]
    fn copy_is_deep() {
        let mut original = Context::new();
        original.add_tree(tree("mem://one"));
        original.ensure_fetch_options().apply("max-depth:2").unwrap();
        original
            .data_mut()
            .insert("who".to_string(), "original".to_string());
        original
            .init_pool()
            .add(CertificateDer::new(vec![1, 2, 3]));

        let mut copy = original.copy();
        copy.add_tree(tree("mem://two"));
        copy.ensure_fetch_options().apply("max-depth:5").unwrap();
        copy.ensure_fetch_options()
            .add_filter(Filter::parse("territory=SE").unwrap());
        copy.data_mut().insert("who".to_string(), "copy".to_string());

        assert_eq!(original.trees().len(), 1);
        assert_eq!(original.fetch_options().unwrap().max_depth(), 2);
        assert!(original.fetch_options().unwrap().filters().is_empty());
        assert_eq!(original.data()["who"], "original");

        // the pool is never carried into a copy
        assert_eq!(original.pool().len(), 1);
        assert!(copy.pool().is_empty());
    }

    #[test]
    fn tsl_count_sums_trees() {
        let mut context = Context::new();
        assert_eq!(context.tsl_count(), 0);
        context.add_tree(tree("mem://a"));
        context.add_tree(tree("mem://b"));
        assert_eq!(context.tsl_count(), 2);
    }
}
