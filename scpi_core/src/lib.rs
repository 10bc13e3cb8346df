//! # scpi_core
//!
//! A compact lexical-analysis and command-dispatch engine for SCPI
//! (Standard Commands for Programmable Instruments) text, meant to run
//! inside firmware that exposes a textual instrument-control interface.
//!
//! The pipeline: a raw command line is split into typed tokens
//! ([`tokenizer`]), the header tokens are walked down a registered command
//! hierarchy ([`tree`]), and the matched node's handler is invoked with the
//! remaining tokens ([`context`]). Handlers can parse decimal numeric
//! arguments with SI prefixes, units and `MIN`/`MAX`/`DEFAULT` keywords
//! ([`numeric`]) and report diagnostics through a FIFO queue ([`errqueue`])
//! that the built-in `SYSTEM:ERROR?` / `SYSTEM:ERROR:NEXT?` commands drain.
//!
//! The core performs no I/O and defines no transport: callbacks return
//! structured replies and the surrounding adapter (serial, console, test
//! harness) ships them. See the `demo_siggen` binary for a complete
//! simulated instrument.

pub mod context;
pub mod errqueue;
pub mod numeric;
pub mod tokenizer;
pub mod tree;

pub use context::{Callback, DispatchError, Reply, ScpiContext};
pub use errqueue::{BoundedErrorQueue, ErrorEntry, ErrorQueue, ErrorSink};
pub use numeric::{ScpiNumeric, parse_numeric};
pub use tokenizer::{OwnedToken, Token, TokenKind, detach, tokenize};
pub use tree::{CommandTree, NodeRef, Placement, RegisterError};
