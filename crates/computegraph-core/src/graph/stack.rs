//! Lexical scopes for variable resolution

use super::NodeId;
use indexmap::IndexMap;
use std::sync::Arc;

/// One scope's bindings.
pub type Frame = IndexMap<String, NodeId>;

/// Ordered frames, outermost first. Pushing returns a new stack; frames are
/// shared between a stack and the stacks derived from it.
#[derive(Debug, Clone, Default)]
pub struct Stack {
    frames: Vec<Arc<Frame>>,
}

/// A resolved variable: the bound node plus the stack in effect where the
/// binding was made.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub node: NodeId,
    pub closure: Stack,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_frames(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            frames: frames.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Enter a new innermost scope.
    pub fn push(&self, frame: Frame) -> Stack {
        let mut frames = self.frames.clone();
        frames.push(Arc::new(frame));
        Stack { frames }
    }

    /// Find the innermost binding for `name`.
    pub fn resolve(&self, name: &str) -> Option<Resolved> {
        self.frames.iter().enumerate().rev().find_map(|(depth, frame)| {
            frame.get(name).map(|node| Resolved {
                node: *node,
                closure: Stack {
                    frames: self.frames[..depth].to_vec(),
                },
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(bindings: &[(&str, u32)]) -> Frame {
        bindings.iter().map(|(k, v)| (k.to_string(), NodeId::from_raw(*v))).collect()
    }

    #[test]
    fn test_innermost_binding_wins() {
        let stack = Stack::new().push(frame(&[("x", 1), ("y", 2)])).push(frame(&[("x", 3)]));
        let x = stack.resolve("x").unwrap();
        assert_eq!(x.node, NodeId::from_raw(3));
        assert_eq!(x.closure.depth(), 1);

        let y = stack.resolve("y").unwrap();
        assert_eq!(y.node, NodeId::from_raw(2));
        assert!(y.closure.is_empty());
    }

    #[test]
    fn test_unbound_name() {
        assert!(Stack::new().resolve("x").is_none());
    }
}
