// Copyright (c) 2021 Fabian Schuiki

//! Grammar transformation passes.
//!
//! [`generate_table`] turns an arbitrary rule set into an LL(1) parsing table
//! in three steps: direct left recursion is eliminated, common prefixes are
//! factored into a rule trie, and the resulting rules are inserted into the
//! table under their FIRST+ sets. Every synthetic rule carries provenance, so
//! the transformation can be undone downstream and consumers observe the
//! derivation of the *original* grammar.
//!
//! Factoring does not prove the result is LL(1); residual conflicts surface
//! as a [`TableConflict`] during table population, which is the contractual
//! verification point.

use crate::grammar::rules::{Rule, RuleKind, RuleSet, Symbol};
use crate::grammar::sets::{first_plus_of_rule, first_sets, follow_sets};
use crate::grammar::table::{ParsingTable, TableConflict};
use crate::token::TokenKey;
use std::collections::HashMap;
use std::sync::Arc;

/// An allocator for the ids of synthetic rules, continuing where the rule
/// set's own ids end.
pub struct RuleIds {
    next: usize,
}

impl RuleIds {
    pub fn starting_at(next: usize) -> RuleIds {
        RuleIds { next }
    }

    fn take(&mut self) -> usize {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Group rules by left-hand side, preserving the order in which left-hand
/// sides first appear.
fn group_by_lhs(rules: &[Arc<Rule>]) -> Vec<(&str, Vec<&Arc<Rule>>)> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&Arc<Rule>>> = HashMap::new();
    for rule in rules {
        let entry = groups.entry(&rule.lhs).or_default();
        if entry.is_empty() {
            order.push(&rule.lhs);
        }
        entry.push(rule);
    }
    order
        .into_iter()
        .map(|lhs| (lhs, groups.remove(lhs).unwrap()))
        .collect()
}

/// Eliminate direct left recursion.
///
/// For every group of rules with a left-recursive member `S -> S α`, a fresh
/// nonterminal `S'` is introduced and the group is rewritten into the
/// standard right-recursive form:
///
///   - `S' -> ε` (the recursion terminator),
///   - `S' -> α S'` for every recursive rule (the "head" variants),
///   - `S -> β S'` for every other rule of the group (the "tail" rewrites).
///
/// All emitted rules are [`RuleKind::Recursion`] carrying the rule they stand
/// for. The transformation preserves the language but flips the derivation
/// from left- to right-recursive; the AST compiler undoes the flip when it
/// replays the provenance.
///
/// Only *direct* left recursion is handled: indirect or mutual recursion
/// across several nonterminals is not detected, and will typically surface as
/// a table conflict or a parse failure later on.
pub fn eliminate_recursion(rules: &[Arc<Rule>], ids: &mut RuleIds) -> Vec<Arc<Rule>> {
    info!("Eliminating left recursion");
    let mut out = Vec::new();
    for (lhs, group) in group_by_lhs(rules) {
        let (recursive, rest): (Vec<_>, Vec<_>) = group.into_iter().partition(|rule| {
            matches!(rule.rhs.first(), Some(Symbol::Nonterm(n)) if n == lhs)
        });
        if recursive.is_empty() {
            out.extend(rest.into_iter().cloned());
            continue;
        }
        debug!("Removing left recursion in `{}`", lhs);

        let aux = format!("{}'", lhs);
        out.push(Arc::new(Rule::new(
            ids.take(),
            aux.clone(),
            vec![],
            RuleKind::Recursion {
                original: None,
                head: false,
            },
        )));
        for rule in recursive {
            let mut rhs: Vec<Symbol> = rule.rhs[1..].to_vec();
            rhs.push(Symbol::Nonterm(aux.clone()));
            let repl = Arc::new(Rule::new(
                ids.take(),
                aux.clone(),
                rhs,
                RuleKind::Recursion {
                    original: Some(rule.clone()),
                    head: true,
                },
            ));
            trace!("  `{}` becomes `{}`", rule, repl);
            out.push(repl);
        }
        for rule in rest {
            let mut rhs = rule.rhs.clone();
            rhs.push(Symbol::Nonterm(aux.clone()));
            let repl = Arc::new(Rule::new(
                ids.take(),
                lhs,
                rhs,
                RuleKind::Recursion {
                    original: Some(rule.clone()),
                    head: false,
                },
            ));
            trace!("  `{}` becomes `{}`", rule, repl);
            out.push(repl);
        }
    }
    out
}

/// A trie over the right-hand sides of the rules sharing one left-hand side.
/// Edges are compared under grammar matching, so e.g. two any-identifier
/// slots collapse onto the same path.
#[derive(Default)]
struct RuleTrie {
    edges: Vec<(Symbol, RuleTrie)>,
    /// The rules whose right-hand side ends at this node.
    leaves: Vec<Arc<Rule>>,
}

impl RuleTrie {
    fn insert(&mut self, rhs: &[Symbol], rule: Arc<Rule>) {
        match rhs.split_first() {
            None => self.leaves.push(rule),
            Some((sym, rest)) => {
                for (edge, child) in &mut self.edges {
                    if edge.matches(sym) {
                        child.insert(rest, rule);
                        return;
                    }
                }
                let mut child = RuleTrie::default();
                child.insert(rest, rule);
                self.edges.push((sym.clone(), child));
            }
        }
    }

    /// Decompose the trie back into rules: one chain rule per edge, and one
    /// ε rewrite per leaf.
    fn decompose(
        &self,
        name: &str,
        lhs: &str,
        path: &mut Vec<String>,
        ids: &mut RuleIds,
        out: &mut Vec<Arc<Rule>>,
    ) {
        for original in &self.leaves {
            let leaf = Arc::new(Rule::new(
                ids.take(),
                name,
                vec![],
                RuleKind::Rewrite {
                    original: original.clone(),
                },
            ));
            trace!("  leaf `{}` for `{}`", leaf, original);
            out.push(leaf);
        }
        for (sym, child) in &self.edges {
            path.push(sym.tag());
            let child_name = format!("{}[{}]", lhs, path.join(" "));
            out.push(Arc::new(Rule::new(
                ids.take(),
                name,
                vec![sym.clone(), Symbol::Nonterm(child_name.clone())],
                RuleKind::Plain,
            )));
            child.decompose(&child_name, lhs, path, ids, out);
            path.pop();
        }
    }
}

/// Factor common prefixes out of the grammar, bringing it into a shape where
/// rules sharing a left-hand side no longer compete on the same lookahead
/// for their shared prefix.
///
/// Every group of rules is rebuilt as a trie over its right-hand sides.
/// Decomposing the trie yields one chain rule `S -> v S[v]` per edge (with
/// `S[v]` a fresh nonterminal named after the path) and, at each marked
/// leaf, an ε [`RuleKind::Rewrite`] rule carrying the rule that ended there.
/// Since *every* rule passes through the trie, every pre-factoring rule
/// reappears in the parse stream as its ε leaf, i.e. after all of its
/// constituents have been parsed.
pub fn factor_prefixes(rules: &[Arc<Rule>], ids: &mut RuleIds) -> Vec<Arc<Rule>> {
    info!("Factoring common prefixes");
    let mut out = Vec::new();
    for (lhs, group) in group_by_lhs(rules) {
        let mut trie = RuleTrie::default();
        for rule in group {
            trie.insert(&rule.rhs, rule.clone());
        }
        trie.decompose(lhs, lhs, &mut Vec::new(), ids, &mut out);
    }
    out
}

/// Compile a rule set into an LL(1) parsing table.
///
/// Composes [`eliminate_recursion`] and [`factor_prefixes`], computes FIRST
/// and FOLLOW over the result, and inserts every transformed rule under each
/// token of its FIRST+ set. A conflicting insertion means the grammar is not
/// LL(1) and aborts construction; there is no partial table.
pub fn generate_table<E>(set: &RuleSet<E>) -> Result<ParsingTable, TableConflict> {
    info!("Constructing LL(1) table");
    let mut ids = RuleIds::starting_at(set.next_rule_id());
    let rules = eliminate_recursion(set.rules(), &mut ids);
    let rules = factor_prefixes(&rules, &mut ids);
    let firsts = first_sets(&rules);
    let follows = follow_sets(&rules, set.start(), &firsts);

    let mut table = ParsingTable::new();
    for rule in &rules {
        let mut keys: Vec<TokenKey> = first_plus_of_rule(rule, &firsts, &follows)
            .into_iter()
            .flatten()
            .collect();
        keys.sort();
        for key in keys {
            table.add_rule(key, rule.clone())?;
        }
    }
    Ok(table)
}
