// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Breadth-first dereferencing of TSL references into a tree.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use trustl_tsl::{StatusList, TslNode, TslTree};
use url::Url;

use crate::error::Error;
use crate::fetch::Fetcher;
use crate::options::FetchOptions;

/// A reference that was not followed, with the reason.
///
/// Diagnostics never abort a resolution; they cover per-reference fetch
/// failures and cross-edges to already-resolved sources.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    uri: String,
    detail: String,
}

impl Diagnostic {
    fn new(uri: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            detail: detail.into(),
        }
    }

    /// The reference location.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Why the reference was omitted.
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

/// The outcome of one resolution: the assembled tree plus diagnostics for
/// every reference that was omitted.
#[derive(Clone, Debug)]
pub struct Resolution {
    tree: TslTree,
    diagnostics: Vec<Diagnostic>,
}

impl Resolution {
    /// The assembled tree.
    pub fn tree(&self) -> &TslTree {
        &self.tree
    }

    /// Consumes the resolution, returning the tree.
    pub fn into_tree(self) -> TslTree {
        self.tree
    }

    /// References omitted during resolution.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

struct Slot {
    tsl: Arc<StatusList>,
    children: Vec<usize>,
}

/// Resolves the TSL at `root` and its references into a tree.
///
/// References are followed breadth-first up to `options.max_depth()` edges;
/// each frontier is fetched through a bounded worker pool of
/// [`FetchOptions::worker_count`] concurrent fetches. Sources are resolved
/// at most once per call: a repeated reference becomes a cross-edge
/// diagnostic, so the tree stays acyclic by construction. Siblings are
/// attached in lexicographic source order.
///
/// Only a root fetch failure, or cancellation, is fatal.
pub async fn resolve(
    root: &Url,
    options: &FetchOptions,
    cancel: &CancellationToken,
) -> Result<Resolution, Error> {
    let fetcher = Fetcher::new(options)?;

    let root_list = tokio::select! {
        _ = cancel.cancelled() => return Err(Error::Cancelled),
        fetched = fetcher.fetch(root) => fetched?,
    };

    let mut visited: HashSet<String> =
        HashSet::from([root_list.source().as_str().to_string()]);
    let mut diagnostics = Vec::new();
    let mut arena = vec![Slot {
        tsl: Arc::new(root_list),
        children: Vec::new(),
    }];
    let mut frontier = vec![0usize];

    for depth in 0..options.max_depth() {
        if frontier.is_empty() {
            break;
        }

        let mut pending: Vec<(usize, Url)> = Vec::new();
        for &parent in &frontier {
            for reference in arena[parent].tsl.references().to_vec() {
                if !visited.insert(reference.as_str().to_string()) {
                    diagnostics.push(Diagnostic::new(
                        reference.as_str(),
                        "cross-edge to already-resolved source",
                    ));
                    continue;
                }
                pending.push((parent, reference));
            }
        }
        if pending.is_empty() {
            break;
        }

        debug!(depth, references = pending.len(), "resolving reference frontier");
        let fetches = stream::iter(pending.into_iter().map(|(parent, url)| {
            let fetcher = fetcher.clone();
            async move {
                let fetched = fetcher.fetch(&url).await;
                (parent, url, fetched)
            }
        }))
        .buffer_unordered(options.worker_count())
        .collect::<Vec<_>>();

        let results = tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            results = fetches => results,
        };

        let mut retained: HashMap<usize, Vec<StatusList>> = HashMap::new();
        for (parent, url, fetched) in results {
            match fetched {
                Ok(list) => {
                    if options.filters().retains(&list) {
                        retained.entry(parent).or_default().push(list);
                    } else {
                        debug!(uri = %url, "referenced TSL dropped by filter");
                    }
                }
                Err(e) => {
                    warn!(uri = %url, error = %e, "omitting failed TSL reference");
                    diagnostics.push(Diagnostic::new(url.as_str(), e.to_string()));
                }
            }
        }

        let mut parents: Vec<usize> = retained.keys().copied().collect();
        parents.sort_unstable();

        let mut next = Vec::new();
        for parent in parents {
            let mut lists = retained.remove(&parent).unwrap_or_default();
            lists.sort_by(|a, b| a.source().as_str().cmp(b.source().as_str()));
            for list in lists {
                let index = arena.len();
                arena.push(Slot {
                    tsl: Arc::new(list),
                    children: Vec::new(),
                });
                arena[parent].children.push(index);
                next.push(index);
            }
        }
        frontier = next;
    }

    Ok(Resolution {
        tree: TslTree::new(build_node(&arena, 0)),
        diagnostics,
    })
}

fn build_node(arena: &[Slot], index: usize) -> TslNode {
    let children = arena[index]
        .children
        .iter()
        .map(|&child| build_node(arena, child))
        .collect();
    TslNode::with_children(Arc::clone(&arena[index].tsl), children)
}
