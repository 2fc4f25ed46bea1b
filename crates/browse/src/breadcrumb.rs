//! Breadcrumb trail.

use serde::Serialize;

use crate::error::{BrowseError, Result};
use crate::path;

/// One position in the trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreadcrumbNode {
    /// Text shown in the trail
    pub label: String,
    /// Path sent to the provider; `None` for the root
    pub request_path: Option<String>,
    /// A file whose chunks are listed, rather than a directory
    pub is_leaf: bool,
}

impl BreadcrumbNode {
    /// The synthetic root.
    pub fn root(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            request_path: None,
            is_leaf: false,
        }
    }

    /// Whether this is the synthetic root.
    pub fn is_root(&self) -> bool {
        self.request_path.is_none()
    }

    /// Path for display; never empty.
    pub fn display_path(&self) -> String {
        path::display_path(self.request_path.as_deref(), &self.label)
    }
}

/// Non-empty stack of nodes; index 0 is always the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumbs {
    nodes: Vec<BreadcrumbNode>,
}

impl Breadcrumbs {
    /// Trail holding only the root.
    pub fn new(root_label: impl Into<String>) -> Self {
        Self {
            nodes: vec![BreadcrumbNode::root(root_label)],
        }
    }

    /// Current position.
    pub fn tip(&self) -> &BreadcrumbNode {
        // never empty
        &self.nodes[self.nodes.len() - 1]
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// All nodes, root first.
    pub fn nodes(&self) -> &[BreadcrumbNode] {
        &self.nodes
    }

    /// Labels, root first.
    pub fn labels(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.label.as_str()).collect()
    }

    /// Push a node below the tip.
    pub fn push(&mut self, node: BreadcrumbNode) {
        self.nodes.push(node);
    }

    /// Keep nodes `0..=index`.
    pub fn truncate_to(&mut self, index: usize) -> Result<()> {
        if index >= self.nodes.len() {
            return Err(BrowseError::IndexOutOfRange {
                index,
                len: self.nodes.len(),
            });
        }
        self.nodes.truncate(index + 1);
        Ok(())
    }
}
