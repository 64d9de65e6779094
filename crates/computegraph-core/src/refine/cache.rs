use crate::graph::NodeId;
use std::collections::HashMap;

/// Memo of refined nodes for one top-level refine call.
///
/// Keyed by node handle, so every visit to the same node during a refine
/// pass sees the same refined node.
#[derive(Debug, Default)]
pub struct RefineCache {
    refined: HashMap<NodeId, NodeId>,
    hits: usize,
}

impl RefineCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, node: NodeId) -> Option<NodeId> {
        let found = self.refined.get(&node).copied();
        if found.is_some() {
            self.hits += 1;
        }
        found
    }

    pub fn insert(&mut self, node: NodeId, refined: NodeId) {
        self.refined.insert(node, refined);
    }

    pub fn len(&self) -> usize {
        self.refined.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refined.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }
}
