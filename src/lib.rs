// Copyright (c) 2021 Fabian Schuiki

//! A table-driven LL(1) parsing pipeline.
//!
//! This crate compiles a context-free grammar into a deterministic parsing
//! table with a single token of lookahead, and uses that table to drive a
//! concurrent four-stage pipeline turning a character stream into an abstract
//! syntax tree: scanner, parser, tree reconstructor, and AST compiler, each on
//! its own thread and connected through bounded buffers.
//!
//! The table is built from a *rewritten* grammar — left recursion eliminated,
//! common prefixes factored — but the rewriting is invertible: every synthetic
//! rule carries its provenance, the tree reconstructor and the AST compiler
//! replay that provenance, and consumers observe the derivation of the grammar
//! as originally written, including left-associative structure.
//!
//! Grammars that are not LL(1) even after rewriting are rejected when the
//! table is built, not at parse time.

#[macro_use]
extern crate log;

// Re-export everything from the common crate.
pub extern crate strom_common as common;

pub mod compiler;
pub mod grammar;
pub mod parser;
pub mod pipeline;
pub mod scanner;
pub mod token;
pub mod tree;

pub use crate::common::buffer;
pub use crate::common::errors::{Diagnostic, MessageLog, Severity};
pub use crate::common::source::Location;
pub use crate::compiler::{Build, Compiler, StackItem};
pub use crate::grammar::{
    generate_table, ParsingTable, Rule, RuleKind, RuleSet, Symbol, TableConflict,
};
pub use crate::parser::{Event, Parser};
pub use crate::pipeline::Pipeline;
pub use crate::scanner::{CharReader, Scanned, Scanner, SubScanner};
pub use crate::token::{Token, TokenKey};
pub use crate::tree::ParseTree;
