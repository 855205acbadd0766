// Copyright (c) 2021 Fabian Schuiki

//! The deterministic LL(1) parsing table.
//!
//! The table maps a (nonterminal, lookahead token) pair to the single rule to
//! predict. Determinism is the whole point: inserting a second rule for an
//! occupied slot is a grammar-definition error, not a runtime parse error, and
//! aborts table construction entirely.

use crate::grammar::rules::Rule;
use crate::token::{Token, TokenKey};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A conflict encountered while populating the table: the supplied grammar is
/// not LL(1), even after the best-effort transformation.
#[derive(Clone, Debug)]
pub struct TableConflict {
    pub nonterm: String,
    pub token: TokenKey,
    pub existing: Arc<Rule>,
    pub incoming: Arc<Rule>,
}

impl fmt::Display for TableConflict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "grammar is not LL(1): for nonterminal `{}` and lookahead {}, both `{}` and `{}` apply",
            self.nonterm, self.token, self.existing, self.incoming
        )
    }
}

impl std::error::Error for TableConflict {}

/// The parsing table itself. Built once per grammar, then read-only.
#[derive(Default, Debug)]
pub struct ParsingTable {
    entries: HashMap<String, HashMap<TokenKey, Arc<Rule>>>,
}

impl ParsingTable {
    pub fn new() -> ParsingTable {
        Default::default()
    }

    /// Insert `rule` under the lookahead `token`. The nonterminal is the
    /// rule's left-hand side. Fails on an occupied slot.
    pub fn add_rule(&mut self, token: TokenKey, rule: Arc<Rule>) -> Result<(), TableConflict> {
        let row = self.entries.entry(rule.lhs.clone()).or_default();
        if let Some(existing) = row.get(&token) {
            // Identical re-insertion can fall out of FIRST+ overlap within
            // one rule and is harmless.
            if Arc::ptr_eq(existing, &rule) {
                return Ok(());
            }
            return Err(TableConflict {
                nonterm: rule.lhs.clone(),
                token,
                existing: existing.clone(),
                incoming: rule,
            });
        }
        row.insert(token, rule);
        Ok(())
    }

    /// Look up the rule to predict for `nonterm` under the lookahead `token`.
    pub fn rule(&self, nonterm: &str, token: &Token) -> Option<&Arc<Rule>> {
        let key = token.key()?;
        self.entries.get(nonterm)?.get(&key)
    }

    /// The lookahead tokens for which `nonterm` has a prediction, sorted for
    /// stable diagnostics. Used only to build error messages.
    pub fn possible_tokens(&self, nonterm: &str) -> Vec<TokenKey> {
        let mut keys: Vec<_> = self
            .entries
            .get(nonterm)
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}
