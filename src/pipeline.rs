// Copyright (c) 2021 Fabian Schuiki

//! The four-stage concurrent pipeline.
//!
//! Scanner, parser, tree reconstructor, and AST compiler each run on their own
//! thread, connected by bounded buffers. There is no shared mutable state
//! between the stages apart from those buffers (and the message log), so a
//! slow consumer simply throttles its producer through backpressure, bounding
//! memory use regardless of input size.
//!
//! Shutdown is cooperative and double-backed: the end-of-input token travels
//! the stream as a sentinel, and every stage closes its buffer halves when it
//! returns, so a stage that aborts early (a parse error, a vanished consumer)
//! unblocks its neighbors without relying on the sentinel alone. All four
//! threads are joined before [`Pipeline::run`] returns.

use crate::compiler::Compiler;
use crate::grammar::{ParsingTable, RuleSet};
use crate::parser::Parser;
use crate::scanner::Scanner;
use crate::tree::ParseTree;
use std::thread;
use strom_common::buffer::bounded;
use strom_common::errors::MessageLog;

/// The default capacity of the buffers between the stages.
pub const DEFAULT_CAPACITY: usize = 32;

/// A configured pipeline, ready to run once.
pub struct Pipeline<'a, E> {
    scanner: Scanner<'a>,
    rules: &'a RuleSet<E>,
    table: &'a ParsingTable,
    capacity: usize,
}

impl<'a, E: Send> Pipeline<'a, E> {
    pub fn new(scanner: Scanner<'a>, rules: &'a RuleSet<E>, table: &'a ParsingTable) -> Self {
        Pipeline {
            scanner,
            rules,
            table,
            capacity: DEFAULT_CAPACITY,
        }
    }

    /// Override the capacity of the inter-stage buffers.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Run the pipeline to completion. Returns the compiled root element, or
    /// `None` if parsing failed; failures are recorded in `log`.
    pub fn run(self, log: &MessageLog) -> Option<E> {
        let Pipeline {
            scanner,
            rules,
            table,
            capacity,
        } = self;
        info!("Running pipeline with buffer capacity {}", capacity);

        thread::scope(|s| {
            let (tok_tx, tok_rx) = bounded(capacity);
            let (ev_tx, ev_rx) = bounded(capacity);
            let (re_tx, re_rx) = bounded(capacity);

            s.spawn(move || scanner.run(&tok_tx));
            s.spawn(move || {
                Parser::new(table, rules.start(), log).run(&tok_rx, &ev_tx);
            });
            s.spawn(move || ParseTree::new().run(&ev_rx, &re_tx));
            let compiler = s.spawn(move || Compiler::new(rules).run(&re_rx));

            // An invariant violation in the compiler stage is re-raised here;
            // the remaining stages are joined when the scope closes.
            compiler
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
        })
    }
}
