// Copyright (c) 2021 Fabian Schuiki

//! FIRST, FOLLOW, and FIRST+ set computation.
//!
//! The sets are computed as least fixed points by monotone set union, which
//! terminates because the universe of token keys occurring in a grammar is
//! finite. Within a FIRST set, ε is represented as `None`.

use crate::grammar::rules::{Rule, Symbol};
use crate::token::TokenKey;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A FIRST set. `None` is the ε sentinel.
pub type FirstSet = HashSet<Option<TokenKey>>;

/// A FOLLOW set. ε cannot follow anything, so there is no sentinel.
pub type FollowSet = HashSet<TokenKey>;

/// Compute the FIRST set of every nonterminal defined by `rules`.
///
/// Recomputing over the same rules is idempotent: the least fixed point is
/// unique.
pub fn first_sets(rules: &[Arc<Rule>]) -> HashMap<String, FirstSet> {
    let mut firsts = HashMap::new();
    for rule in rules {
        firsts.entry(rule.lhs.clone()).or_insert_with(FirstSet::new);
    }
    loop {
        let mut changed = false;
        for rule in rules {
            let addition = first_of_sequence(&rule.rhs, &firsts);
            let entry = firsts.entry(rule.lhs.clone()).or_default();
            let before = entry.len();
            entry.extend(addition);
            changed |= entry.len() != before;
        }
        if !changed {
            return firsts;
        }
    }
}

/// The FIRST set of a sequence of symbols: the terminals that can begin a
/// derivation of the sequence, plus ε if the whole sequence can derive ε.
///
/// A nonterminal without any rules contributes nothing; during the fixed
/// point iteration this is the usual bottom element.
pub fn first_of_sequence(syms: &[Symbol], firsts: &HashMap<String, FirstSet>) -> FirstSet {
    let mut set = FirstSet::new();
    for sym in syms {
        match sym {
            Symbol::Term(t) => {
                if let Some(key) = t.key() {
                    set.insert(Some(key));
                }
                return set;
            }
            Symbol::Nonterm(name) => {
                let sub = firsts.get(name).cloned().unwrap_or_default();
                let has_epsilon = sub.contains(&None);
                set.extend(sub.into_iter().filter(|x| x.is_some()));
                if !has_epsilon {
                    return set;
                }
            }
        }
    }
    // Walked off the end of the sequence, so it can derive ε.
    set.insert(None);
    set
}

/// The FIRST set of a rule's right-hand side.
pub fn first_of_rule(rule: &Rule, firsts: &HashMap<String, FirstSet>) -> FirstSet {
    first_of_sequence(&rule.rhs, firsts)
}

/// Compute the FOLLOW set of every nonterminal. FOLLOW of the start symbol
/// always contains the end of input.
pub fn follow_sets(
    rules: &[Arc<Rule>],
    start: &str,
    firsts: &HashMap<String, FirstSet>,
) -> HashMap<String, FollowSet> {
    let mut follows: HashMap<String, FollowSet> = HashMap::new();
    for rule in rules {
        follows.entry(rule.lhs.clone()).or_default();
    }
    follows
        .entry(start.to_string())
        .or_default()
        .insert(TokenKey::Eof);

    loop {
        let mut changed = false;
        for rule in rules {
            for (i, sym) in rule.rhs.iter().enumerate() {
                let name = match sym {
                    Symbol::Nonterm(name) => name,
                    Symbol::Term(_) => continue,
                };

                // For a rule `B -> v A w`, FIRST(w) \ ε goes into FOLLOW(A),
                // and if w can derive ε, FOLLOW(B) goes into FOLLOW(A) too.
                let rest = first_of_sequence(&rule.rhs[i + 1..], firsts);
                let mut addition: FollowSet = rest.iter().flatten().cloned().collect();
                if rest.contains(&None) {
                    if let Some(outer) = follows.get(&rule.lhs) {
                        addition.extend(outer.iter().cloned());
                    }
                }

                let entry = follows.entry(name.clone()).or_default();
                let before = entry.len();
                entry.extend(addition);
                changed |= entry.len() != before;
            }
        }
        if !changed {
            return follows;
        }
    }
}

/// The FIRST+ set of a rule: FIRST of its right-hand side, extended with
/// FOLLOW of its left-hand side when the right-hand side can derive ε. This
/// is the set of lookahead tokens under which the rule applies.
pub fn first_plus_of_rule(
    rule: &Rule,
    firsts: &HashMap<String, FirstSet>,
    follows: &HashMap<String, FollowSet>,
) -> FirstSet {
    let mut set = first_of_rule(rule, firsts);
    if set.contains(&None) {
        if let Some(follow) = follows.get(&rule.lhs) {
            set.extend(follow.iter().cloned().map(Some));
        }
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::rules::RuleKind;

    fn rule(id: usize, lhs: &str, rhs: Vec<Symbol>) -> Arc<Rule> {
        Arc::new(Rule::new(id, lhs, rhs, RuleKind::Plain))
    }

    /// The usual stratified expression grammar, already free of left
    /// recursion:
    ///
    ///     E  -> T E'
    ///     E' -> + T E' | ε
    ///     T  -> num | ( E )
    fn sample() -> Vec<Arc<Rule>> {
        vec![
            rule(0, "E", vec![Symbol::nonterm("T"), Symbol::nonterm("E'")]),
            rule(
                1,
                "E'",
                vec![
                    Symbol::symbol("+"),
                    Symbol::nonterm("T"),
                    Symbol::nonterm("E'"),
                ],
            ),
            rule(2, "E'", vec![]),
            rule(3, "T", vec![Symbol::any_number()]),
            rule(
                4,
                "T",
                vec![
                    Symbol::symbol("("),
                    Symbol::nonterm("E"),
                    Symbol::symbol(")"),
                ],
            ),
        ]
    }

    fn sym(s: &str) -> Option<TokenKey> {
        Some(TokenKey::Symbol(s.to_string()))
    }

    #[test]
    fn firsts_converge() {
        let rules = sample();
        let firsts = first_sets(&rules);
        let expected_e: FirstSet = vec![Some(TokenKey::Number), sym("(")].into_iter().collect();
        assert_eq!(firsts["E"], expected_e);
        assert_eq!(firsts["T"], expected_e);
        let expected_ep: FirstSet = vec![sym("+"), None].into_iter().collect();
        assert_eq!(firsts["E'"], expected_ep);
    }

    #[test]
    fn follows_converge() {
        let rules = sample();
        let firsts = first_sets(&rules);
        let follows = follow_sets(&rules, "E", &firsts);
        let expected_e: FollowSet = vec![TokenKey::Eof, TokenKey::Symbol(")".to_string())]
            .into_iter()
            .collect();
        assert_eq!(follows["E"], expected_e);
        assert_eq!(follows["E'"], expected_e);
        let expected_t: FollowSet = vec![
            TokenKey::Eof,
            TokenKey::Symbol(")".to_string()),
            TokenKey::Symbol("+".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(follows["T"], expected_t);
    }

    #[test]
    fn recomputation_is_idempotent() {
        let rules = sample();
        let firsts = first_sets(&rules);
        assert_eq!(firsts, first_sets(&rules));
        let follows = follow_sets(&rules, "E", &firsts);
        assert_eq!(follows, follow_sets(&rules, "E", &firsts));
    }

    #[test]
    fn first_plus_adds_follow_for_epsilon_rules() {
        let rules = sample();
        let firsts = first_sets(&rules);
        let follows = follow_sets(&rules, "E", &firsts);
        // E' -> ε applies under FOLLOW(E').
        let plus = first_plus_of_rule(&rules[2], &firsts, &follows);
        let expected: FirstSet = vec![None, Some(TokenKey::Eof), sym(")")].into_iter().collect();
        assert_eq!(plus, expected);
        // E' -> + T E' applies under `+` only.
        let plus = first_plus_of_rule(&rules[1], &firsts, &follows);
        let expected: FirstSet = vec![sym("+")].into_iter().collect();
        assert_eq!(plus, expected);
    }
}
