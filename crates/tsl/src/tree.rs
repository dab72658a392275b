// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Hierarchical tree of resolved status lists.
//!
//! The root is the TSL a load step fetched directly; edges are the reference
//! relationship after filter application. The tree is the authoritative
//! representation of a load; the linear view older pipelines relied on is
//! synthesized by [`TslTree::flatten`] rather than stored.

use std::sync::Arc;

use crate::model::{Source, StatusList};

/// One node of a TSL tree: a status list and the referenced lists resolved
/// beneath it.
#[derive(Clone, Debug)]
pub struct TslNode {
    tsl: Arc<StatusList>,
    children: Vec<TslNode>,
}

impl TslNode {
    /// Creates a leaf node.
    pub fn leaf(tsl: Arc<StatusList>) -> Self {
        Self {
            tsl,
            children: Vec::new(),
        }
    }

    /// Creates a node with resolved children.
    pub fn with_children(tsl: Arc<StatusList>, children: Vec<TslNode>) -> Self {
        Self { tsl, children }
    }

    /// The status list at this node.
    pub fn tsl(&self) -> &Arc<StatusList> {
        &self.tsl
    }

    /// The resolved children, in stable source order.
    pub fn children(&self) -> &[TslNode] {
        &self.children
    }

    fn visit<'a, F: FnMut(&'a TslNode, usize)>(&'a self, depth: usize, visit: &mut F) {
        visit(self, depth);
        for child in &self.children {
            child.visit(depth + 1, visit);
        }
    }

    fn visit_depth<'a, F: FnMut(&'a TslNode, usize)>(
        &'a self,
        depth: usize,
        max_depth: usize,
        visit: &mut F,
    ) {
        visit(self, depth);
        if depth == max_depth {
            return;
        }
        for child in &self.children {
            child.visit_depth(depth + 1, max_depth, visit);
        }
    }
}

/// A tree of status lists rooted at the directly loaded TSL.
#[derive(Clone, Debug)]
pub struct TslTree {
    root: TslNode,
}

impl TslTree {
    /// Creates a tree from its root node.
    pub fn new(root: TslNode) -> Self {
        Self { root }
    }

    /// Creates a single-node tree.
    pub fn singleton(tsl: Arc<StatusList>) -> Self {
        Self {
            root: TslNode::leaf(tsl),
        }
    }

    /// The root node.
    pub fn root(&self) -> &TslNode {
        &self.root
    }

    /// Visits every node pre-order. The visitor receives the node depth,
    /// with the root at depth 0.
    pub fn traverse<'a, F: FnMut(&'a TslNode, usize)>(&'a self, mut visit: F) {
        self.root.visit(0, &mut visit);
    }

    /// Visits nodes pre-order down to `max_depth` edges from the root.
    /// `max_depth` 0 visits the root only.
    pub fn traverse_depth<'a, F: FnMut(&'a TslNode, usize)>(
        &'a self,
        max_depth: usize,
        mut visit: F,
    ) {
        self.root.visit_depth(0, max_depth, &mut visit);
    }

    /// The status list whose source equals `uri`, if present.
    pub fn find_by_source(&self, uri: &str) -> Option<&Arc<StatusList>> {
        let mut found = None;
        self.traverse(|node, _| {
            if found.is_none() && node.tsl().source().as_str() == uri {
                found = Some(node.tsl());
            }
        });
        found
    }

    /// Total number of status lists in the tree.
    pub fn size(&self) -> usize {
        let mut n = 0;
        self.traverse(|_, _| n += 1);
        n
    }

    /// Length in edges of the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        let mut max = 0;
        self.traverse(|_, depth| max = max.max(depth));
        max
    }

    /// The synthesized linear view: all status lists, root first, pre-order.
    pub fn flatten(&self) -> Vec<Arc<StatusList>> {
        let mut out = Vec::with_capacity(self.size());
        self.traverse(|node, _| out.push(Arc::clone(node.tsl())));
        out
    }

    /// The source of the root status list.
    pub fn source(&self) -> &Source {
        self.root.tsl().source()
    }
}
