//! The registered command hierarchy and its matching walk.
//!
//! Nodes live in an arena owned by [`CommandTree`]; [`NodeRef`] handles
//! replace parent/child/sibling pointers, so registration is plain tail
//! appends and matching is an `O(children)` scan per level. The tree is
//! built once during startup and only read afterwards; there is no
//! deletion.

use std::borrow::Cow;

use thiserror::Error;
use tracing::{debug, trace};

use crate::context::Callback;
use crate::tokenizer::Token;

/// Copyable handle to a node inside a [`CommandTree`].
///
/// Handles are only meaningful for the tree that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef(usize);

/// Where [`CommandTree::register`] places a new node relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Append to the anchor's children list.
    ChildOf,
    /// Append to the sibling list the anchor itself belongs to, i.e. at the
    /// same tree depth as the anchor.
    SiblingOf,
}

/// Failures of [`CommandTree::register`].
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegisterError {
    /// The anchor handle does not belong to this tree.
    #[error("anchor node {0} does not exist in this tree")]
    InvalidAnchor(usize),

    /// `SiblingOf` the root was requested; the root has no sibling list.
    #[error("the root node has no sibling list")]
    SiblingOfRoot,
}

/// One named node of the command hierarchy.
struct CommandNode {
    long_name: Cow<'static, str>,
    short_name: Cow<'static, str>,
    parent: Option<NodeRef>,
    children: Vec<NodeRef>,
    callback: Option<Callback>,
}

impl CommandNode {
    /// Byte-for-byte, case-sensitive match against either name form.
    fn matches(&self, text: &[u8]) -> bool {
        text == self.long_name.as_bytes() || text == self.short_name.as_bytes()
    }
}

/// A rooted, ordered tree of named command nodes.
///
/// The root carries no names and no callback; every other node is reachable
/// by a unique path of header-token matches. Sibling lists keep insertion
/// order and matching returns the first structural match, so ambiguous
/// sibling names resolve to whichever was registered first.
pub struct CommandTree {
    nodes: Vec<CommandNode>,
}

impl Default for CommandTree {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandTree {
    /// Creates a tree holding only the nameless root.
    pub fn new() -> Self {
        Self {
            nodes: vec![CommandNode {
                long_name: Cow::Borrowed(""),
                short_name: Cow::Borrowed(""),
                parent: None,
                children: Vec::new(),
                callback: None,
            }],
        }
    }

    /// Returns the handle of the root node.
    pub fn root(&self) -> NodeRef {
        NodeRef(0)
    }

    /// Returns the number of nodes, the root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Adds a command node relative to `anchor` and returns its handle.
    ///
    /// Both placements append at the tail of the target list, preserving
    /// insertion order for match-order determinism. `callback` may be
    /// `None` for a pure namespace node such as a group header.
    pub fn register(
        &mut self,
        anchor: NodeRef,
        placement: Placement,
        long_name: impl Into<Cow<'static, str>>,
        short_name: impl Into<Cow<'static, str>>,
        callback: Option<Callback>,
    ) -> Result<NodeRef, RegisterError> {
        if anchor.0 >= self.nodes.len() {
            return Err(RegisterError::InvalidAnchor(anchor.0));
        }

        let parent = match placement {
            Placement::ChildOf => anchor,
            Placement::SiblingOf => {
                self.nodes[anchor.0].parent.ok_or(RegisterError::SiblingOfRoot)?
            }
        };

        let long_name = long_name.into();
        let short_name = short_name.into();
        debug!(long = %long_name, short = %short_name, "registered command");

        let node = NodeRef(self.nodes.len());
        self.nodes.push(CommandNode {
            long_name,
            short_name,
            parent: Some(parent),
            children: Vec::new(),
            callback,
        });
        self.nodes[parent.0].children.push(node);

        Ok(node)
    }

    /// Walks a token sequence down the tree.
    ///
    /// Starts at the root's children and the first token. Each header token
    /// is compared against the current sibling list in registration order;
    /// on a match the walk either descends (next token is another header)
    /// or stops and returns the matched node together with the number of
    /// tokens consumed. A sibling list without a match fails the whole
    /// walk, as does a leading token that is absent or not a header.
    pub fn find(&self, tokens: &[Token<'_>]) -> Option<(NodeRef, usize)> {
        let mut siblings: &[NodeRef] = &self.nodes[0].children;
        let mut consumed = 0usize;

        loop {
            let token = match tokens.get(consumed) {
                Some(token) if token.is_header() => token,
                _ => return None,
            };

            let matched = siblings
                .iter()
                .copied()
                .find(|node| self.nodes[node.0].matches(token.text()))?;
            trace!(name = %self.nodes[matched.0].long_name, "matched header token");
            consumed += 1;

            match tokens.get(consumed) {
                Some(next) if next.is_header() => {
                    siblings = &self.nodes[matched.0].children;
                }
                _ => return Some((matched, consumed)),
            }
        }
    }

    /// Returns the long name of a node (empty for the root).
    pub fn long_name(&self, node: NodeRef) -> &str {
        &self.nodes[node.0].long_name
    }

    /// Returns the short name of a node (empty for the root).
    pub fn short_name(&self, node: NodeRef) -> &str {
        &self.nodes[node.0].short_name
    }

    /// Returns the children of a node in registration order.
    pub fn children(&self, node: NodeRef) -> &[NodeRef] {
        &self.nodes[node.0].children
    }

    /// Returns `true` when the node has a bound handler.
    pub fn has_callback(&self, node: NodeRef) -> bool {
        self.nodes[node.0].callback.is_some()
    }

    pub(crate) fn callback_mut(&mut self, node: NodeRef) -> Option<&mut Callback> {
        self.nodes[node.0].callback.as_mut()
    }
}

#[cfg(test)]
mod tree_tests {
    use super::*;
    use crate::context::Reply;
    use crate::tokenizer::tokenize;

    fn namespace(tree: &mut CommandTree, anchor: NodeRef, long: &'static str, short: &'static str) -> NodeRef {
        tree.register(anchor, Placement::ChildOf, long, short, None).unwrap()
    }

    fn leaf(tree: &mut CommandTree, anchor: NodeRef, long: &'static str, short: &'static str) -> NodeRef {
        tree.register(
            anchor,
            Placement::ChildOf,
            long,
            short,
            Some(Box::new(|_, _| Ok(Reply::none()))),
        )
        .unwrap()
    }

    // ==================== REGISTRATION TESTS ====================

    #[test]
    fn test_root_is_nameless_and_callbackless() {
        let tree = CommandTree::new();
        let root = tree.root();
        assert_eq!(tree.long_name(root), "");
        assert_eq!(tree.short_name(root), "");
        assert!(!tree.has_callback(root));
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_sibling_of_appends_to_anchor_level() {
        let mut tree = CommandTree::new();
        let root = tree.root();
        let source = namespace(&mut tree, root, "SOURCE", "SOUR");
        let output = tree
            .register(source, Placement::SiblingOf, "OUTPUT", "OUTP", None)
            .unwrap();

        assert_eq!(tree.children(root), &[source, output]);
    }

    #[test]
    fn test_sibling_of_root_is_rejected() {
        let mut tree = CommandTree::new();
        let root = tree.root();
        let err = tree
            .register(root, Placement::SiblingOf, "X", "X", None)
            .unwrap_err();
        assert_eq!(err, RegisterError::SiblingOfRoot);
    }

    #[test]
    fn test_invalid_anchor_is_rejected() {
        let mut tree = CommandTree::new();
        let err = tree
            .register(NodeRef(99), Placement::ChildOf, "X", "X", None)
            .unwrap_err();
        assert_eq!(err, RegisterError::InvalidAnchor(99));
    }

    // ==================== MATCHING TESTS ====================

    #[test]
    fn test_long_and_short_names_find_the_same_node() {
        let mut tree = CommandTree::new();
        let root = tree.root();
        let measure = namespace(&mut tree, root, "MEASURE", "MEAS");
        let voltage = leaf(&mut tree, measure, "VOLTAGE?", "VOLT?");

        for line in [
            &b"MEASURE:VOLTAGE?"[..],
            b"MEAS:VOLTAGE?",
            b"MEASURE:VOLT?",
            b"MEAS:VOLT?",
        ] {
            let tokens = tokenize(line);
            let (node, consumed) = tree.find(&tokens).unwrap();
            assert_eq!(node, voltage);
            assert_eq!(consumed, 2);
        }
    }

    #[test]
    fn test_matching_stops_at_first_data_token() {
        let mut tree = CommandTree::new();
        let root = tree.root();
        let source = namespace(&mut tree, root, "SOURCE", "SOUR");
        let volt = leaf(&mut tree, source, "VOLTAGE", "VOLT");

        let tokens = tokenize(b"SOURCE:VOLTAGE 1.5,2.5");
        let (node, consumed) = tree.find(&tokens).unwrap();
        assert_eq!(node, volt);
        // The data suffix stays attached for the callback.
        assert_eq!(tokens[consumed..].len(), 2);
        assert!(tokens[consumed..].iter().all(|t| t.is_data()));
    }

    #[test]
    fn test_group_node_match_without_descent() {
        let mut tree = CommandTree::new();
        let root = tree.root();
        let source = namespace(&mut tree, root, "SOURCE", "SOUR");
        namespace(&mut tree, source, "VOLTAGE", "VOLT");

        let tokens = tokenize(b"SOURCE");
        let (node, consumed) = tree.find(&tokens).unwrap();
        assert_eq!(node, source);
        assert_eq!(consumed, 1);
    }

    #[test]
    fn test_unmatched_path_fails() {
        let mut tree = CommandTree::new();
        let root = tree.root();
        let measure = namespace(&mut tree, root, "MEASURE", "MEAS");
        leaf(&mut tree, measure, "VOLTAGE?", "VOLT?");

        assert!(tree.find(&tokenize(b"MEASURE:CURRENT?")).is_none());
        assert!(tree.find(&tokenize(b"SOURCE:VOLTAGE?")).is_none());
        assert!(tree.find(&tokenize(b"")).is_none());
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let mut tree = CommandTree::new();
        let root = tree.root();
        leaf(&mut tree, root, "OUTPUT", "OUTP");

        assert!(tree.find(&tokenize(b"OUTPUT")).is_some());
        assert!(tree.find(&tokenize(b"output")).is_none());
    }

    #[test]
    fn test_first_registered_sibling_wins_on_ambiguous_names() {
        let mut tree = CommandTree::new();
        let root = tree.root();
        // Two siblings sharing the abbreviation "VOLT".
        let first = leaf(&mut tree, root, "VOLTAGE", "VOLT");
        let second = leaf(&mut tree, root, "VOLT", "VOLT");

        let tokens = tokenize(b"VOLT");
        let (node, _) = tree.find(&tokens).unwrap();
        assert_eq!(node, first);

        // The later sibling is still reachable through its unambiguous form.
        let tokens = tokenize(b"VOLTAGE");
        let (node, _) = tree.find(&tokens).unwrap();
        assert_eq!(node, first);
        assert_ne!(first, second);
    }
}
