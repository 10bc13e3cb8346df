//! The parser context: one command tree plus one error queue, and the
//! `execute` entry point that ties tokenizing, matching and dispatch
//! together.
//!
//! Execution is synchronous and run-to-completion; a command line is fully
//! tokenized, matched and handled before `execute` returns. The context
//! performs no I/O of its own: callbacks hand back a [`Reply`] and the
//! surrounding transport adapter decides how to ship it.

use std::borrow::Cow;

use thiserror::Error;
use tracing::debug;

use crate::errqueue::{ErrorEntry, ErrorQueue, ErrorSink};
use crate::tokenizer::{self, Token};
use crate::tree::{CommandTree, NodeRef, Placement, RegisterError};

/// Handler bound to a command node.
///
/// A callback receives the context's error sink and the token suffix left
/// over after matching (any still-unconsumed header tokens plus all data
/// tokens). It returns a [`Reply`] on success or a [`DispatchError`] of its
/// own making; the core never interprets the tokens on its behalf.
pub type Callback =
    Box<dyn FnMut(&mut dyn ErrorSink, &[Token<'_>]) -> Result<Reply, DispatchError>>;

/// Response text produced by a command handler, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    text: String,
}

impl Reply {
    /// A reply carrying no text, for set-style commands.
    pub fn none() -> Self {
        Self::default()
    }

    /// A reply carrying the given text.
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Returns the reply text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns `true` when there is nothing to send back.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl std::fmt::Display for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Self { text }
    }
}

/// Failures of [`ScpiContext::execute`].
///
/// The first two variants are produced by the dispatcher itself; `Command`
/// is the callback-defined escape hatch. None of them touch the error
/// queue: translating a failure into an instrument error code and queueing
/// it is the transport adapter's policy, not the core's.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No tree path matches the header tokens.
    #[error("command not found")]
    CommandNotFound,

    /// A node matched but has no bound handler.
    #[error("command has no callback")]
    NoCallback,

    /// A callback-defined failure with an instrument-style error code.
    #[error("{message} ({code})")]
    Command {
        /// Instrument error code, e.g. `-222`.
        code: i16,
        /// Human-readable error text.
        message: Cow<'static, str>,
    },
}

impl DispatchError {
    /// Shorthand for a callback-defined failure.
    pub fn command(code: i16, message: impl Into<Cow<'static, str>>) -> Self {
        Self::Command {
            code,
            message: message.into(),
        }
    }
}

/// Process-wide parser state: the command tree and the error queue.
///
/// Created once by the firmware bootstrap; registration completes before
/// the first `execute`, and the tree is read-only afterwards. The context
/// assumes a single logical thread of control; wrap it in external mutual
/// exclusion if several callers share it.
pub struct ScpiContext {
    tree: CommandTree,
    errors: Box<dyn ErrorSink>,
}

impl Default for ScpiContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Built-in handler behind `SYSTEM:ERROR?` and `SYSTEM:ERROR:NEXT?`.
fn report_oldest_error(
    errors: &mut dyn ErrorSink,
    _tokens: &[Token<'_>],
) -> Result<Reply, DispatchError> {
    Ok(Reply::text(errors.pop().response()))
}

impl ScpiContext {
    /// Creates a context with the default unbounded [`ErrorQueue`] and the
    /// built-in `SYSTEM:ERROR?` / `SYSTEM:ERROR:NEXT?` commands seeded.
    pub fn new() -> Self {
        Self::with_error_sink(Box::new(ErrorQueue::new()))
    }

    /// Creates a context around a caller-supplied error sink, e.g. a
    /// [`BoundedErrorQueue`](crate::errqueue::BoundedErrorQueue) for
    /// long-running firmware.
    pub fn with_error_sink(errors: Box<dyn ErrorSink>) -> Self {
        let mut tree = CommandTree::new();
        let root = tree.root();

        // The built-in registrations use valid anchors and child placement
        // only; they cannot fail.
        let system = tree
            .register(root, Placement::ChildOf, "SYSTEM", "SYST", None)
            .expect("built-in registration");
        let error = tree
            .register(system, Placement::ChildOf, "ERROR", "ERR", None)
            .expect("built-in registration");
        tree.register(
            system,
            Placement::ChildOf,
            "ERROR?",
            "ERR?",
            Some(Box::new(report_oldest_error)),
        )
        .expect("built-in registration");
        tree.register(
            error,
            Placement::ChildOf,
            "NEXT?",
            "NEXT?",
            Some(Box::new(report_oldest_error)),
        )
        .expect("built-in registration");

        Self { tree, errors }
    }

    /// Returns the handle of the tree root, the anchor for top-level
    /// registrations.
    pub fn root(&self) -> NodeRef {
        self.tree.root()
    }

    /// Read access to the command tree, for introspection.
    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    /// Registers a command node; see [`CommandTree::register`].
    pub fn register(
        &mut self,
        anchor: NodeRef,
        placement: Placement,
        long_name: impl Into<Cow<'static, str>>,
        short_name: impl Into<Cow<'static, str>>,
        callback: Option<Callback>,
    ) -> Result<NodeRef, RegisterError> {
        self.tree
            .register(anchor, placement, long_name, short_name, callback)
    }

    /// Tokenizes, matches and dispatches one command line.
    ///
    /// Returns [`DispatchError::CommandNotFound`] without side effects when
    /// no path matches, [`DispatchError::NoCallback`] when the matched node
    /// is a pure namespace, and otherwise whatever the callback returns.
    /// The callback receives the token suffix from wherever matching
    /// stopped.
    pub fn execute(&mut self, line: &[u8]) -> Result<Reply, DispatchError> {
        let tokens = tokenizer::tokenize(line);

        let Some((node, consumed)) = self.tree.find(&tokens) else {
            debug!(line = %String::from_utf8_lossy(line), "command not found");
            return Err(DispatchError::CommandNotFound);
        };

        match self.tree.callback_mut(node) {
            Some(callback) => callback(self.errors.as_mut(), &tokens[consumed..]),
            None => Err(DispatchError::NoCallback),
        }
    }

    /// Appends a diagnostic entry to the error queue.
    pub fn push_error(&mut self, code: i16, message: impl Into<Cow<'static, str>>) {
        self.errors.push(ErrorEntry::new(code, message));
    }

    /// Removes and returns the oldest diagnostic entry, or the synthetic
    /// `0,"No error"` entry when the queue is empty.
    pub fn pop_error(&mut self) -> ErrorEntry {
        self.errors.pop()
    }

    /// Mutable access to the error sink, as handed to callbacks.
    pub fn errors_mut(&mut self) -> &mut dyn ErrorSink {
        self.errors.as_mut()
    }
}
