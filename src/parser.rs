// Copyright (c) 2021 Fabian Schuiki

//! The table-driven LL(1) parser.
//!
//! The parser keeps an explicit stack of pending symbols, initialized to the
//! start nonterminal. Terminals on top must match the lookahead token and are
//! forwarded downstream; nonterminals are expanded through the parsing table,
//! emitting the predicted rule and pushing its right-hand side in reverse.
//!
//! The driver operates against the *rewritten* grammar, so the rule stream it
//! emits consists of chain rules and provenance-carrying synthetic rules, not
//! the caller's original rules; undoing that is the job of the downstream
//! stages. Failures are recorded in the message log with their position and
//! abort the parse cleanly; nothing is thrown across stage boundaries.

use crate::grammar::{ParsingTable, Rule, Symbol};
use crate::scanner::Scanned;
use crate::token::Token;
use itertools::Itertools;
use std::sync::Arc;
use strom_common::buffer::{Receiver, Sender};
use strom_common::errors::{Diagnostic, MessageLog};

/// An event in the stream between the parser and the downstream stages:
/// either a matched input token or an applied rule.
#[derive(Clone, Debug)]
pub enum Event {
    Token(Scanned),
    Rule(Arc<Rule>),
}

/// The LL(1) driver.
pub struct Parser<'a> {
    table: &'a ParsingTable,
    start: &'a str,
    log: &'a MessageLog,
}

impl<'a> Parser<'a> {
    pub fn new(table: &'a ParsingTable, start: &'a str, log: &'a MessageLog) -> Parser<'a> {
        Parser { table, start, log }
    }

    /// Parse the token stream `input` to completion, emitting events into
    /// `out`. Returns whether the parse succeeded. On failure a diagnostic
    /// has been logged and the output is simply closed, which shuts down the
    /// downstream stages.
    pub fn run(&self, input: &Receiver<Scanned>, out: &Sender<Event>) -> bool {
        let mut stack = vec![Symbol::Nonterm(self.start.to_string())];
        let mut cur = match input.recv() {
            Some(scanned) => scanned,
            None => {
                self.log
                    .add(Diagnostic::error("token stream ended without end of input"));
                return false;
            }
        };

        loop {
            // An input failure travels as a token; report it and shut down.
            if let Token::Error(ref msg) = cur.token {
                self.log.add(Diagnostic::error(msg.clone()).at(cur.loc));
                return false;
            }

            let top = match stack.pop() {
                Some(top) => top,
                None => {
                    // The start symbol is fully expanded; the input must be
                    // exhausted as well.
                    if cur.token == Token::Eof {
                        let _ = out.send(Event::Token(cur));
                        return true;
                    }
                    self.log.add(
                        Diagnostic::error(format!(
                            "input not fully consumed; `{}` follows the completed parse",
                            cur.token
                        ))
                        .at(cur.loc),
                    );
                    return false;
                }
            };

            match top {
                Symbol::Term(expected) => {
                    if !expected.matches(&cur.token) {
                        self.log.add(
                            Diagnostic::error(format!(
                                "expected {}, but found `{}` instead",
                                describe(&expected),
                                cur.token
                            ))
                            .at(cur.loc),
                        );
                        return false;
                    }
                    trace!("matched `{}`", cur.token);
                    let next = input.recv();
                    if out.send(Event::Token(cur)).is_err() {
                        return false;
                    }
                    cur = match next {
                        Some(scanned) => scanned,
                        None => {
                            self.log
                                .add(Diagnostic::error("token stream ended without end of input"));
                            return false;
                        }
                    };
                }
                Symbol::Nonterm(nt) => {
                    let rule = match self.table.rule(&nt, &cur.token) {
                        Some(rule) => rule.clone(),
                        None => {
                            let possible = self.table.possible_tokens(&nt);
                            let mut diag = Diagnostic::error(format!(
                                "no applicable rule for `{}` given `{}`",
                                nt, cur.token
                            ))
                            .at(cur.loc);
                            if !possible.is_empty() {
                                diag = diag.add_note(format!(
                                    "expected {}",
                                    possible.iter().format(" or ")
                                ));
                            }
                            self.log.add(diag);
                            return false;
                        }
                    };
                    trace!("predicting `{}`", rule);
                    if out.send(Event::Rule(rule.clone())).is_err() {
                        return false;
                    }
                    for sym in rule.rhs.iter().rev() {
                        stack.push(sym.clone());
                    }
                }
            }
        }
    }
}

/// Describe an expected terminal for a diagnostic: fixed symbols by their
/// text, payload-carrying classes by their class name.
fn describe(expected: &Token) -> String {
    match expected.key() {
        Some(key) => key.to_string(),
        None => format!("`{}`", expected),
    }
}
