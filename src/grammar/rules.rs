// Copyright (c) 2021 Fabian Schuiki

//! The grammar model: symbols, rules, and rule sets.
//!
//! Rules are created once when a grammar is compiled and are immutable for the
//! duration of a run. Synthetic rules produced by the transformation passes
//! carry their provenance in [`RuleKind`], which is what allows the tree
//! reconstructor and the AST compiler to undo the transformation downstream.

use crate::compiler::Build;
use crate::token::Token;
use itertools::Itertools;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A symbol in a rule: either a terminal standing for a class of tokens, or a
/// nonterminal referred to by name. Two nonterminals are equal iff their names
/// are equal; identity is purely by name.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Symbol {
    Term(Token),
    Nonterm(String),
}

impl Symbol {
    pub fn nonterm<S: Into<String>>(name: S) -> Symbol {
        Symbol::Nonterm(name.into())
    }

    pub fn symbol<S: Into<String>>(text: S) -> Symbol {
        Symbol::Term(Token::Symbol(text.into()))
    }

    /// A terminal slot matching any identifier token.
    pub fn any_ident() -> Symbol {
        Symbol::Term(Token::Ident(String::new()))
    }

    /// A terminal slot matching any number token.
    pub fn any_number() -> Symbol {
        Symbol::Term(Token::Number(Default::default()))
    }

    /// A terminal slot matching any string token.
    pub fn any_string() -> Symbol {
        Symbol::Term(Token::Str(String::new()))
    }

    /// Check whether two symbols are equal under grammar matching: terminals
    /// match per [`Token::matches`], nonterminals by name.
    pub fn matches(&self, other: &Symbol) -> bool {
        match (self, other) {
            (Symbol::Term(a), Symbol::Term(b)) => a.matches(b),
            (Symbol::Nonterm(a), Symbol::Nonterm(b)) => a == b,
            _ => false,
        }
    }

    /// A short tag for the symbol, used to derive the names of the fresh
    /// nonterminals introduced by prefix factoring.
    pub fn tag(&self) -> String {
        match *self {
            Symbol::Term(Token::Symbol(ref s)) => s.clone(),
            Symbol::Term(Token::Ident(_)) => "id".to_string(),
            Symbol::Term(Token::Number(_)) => "num".to_string(),
            Symbol::Term(Token::Str(_)) => "str".to_string(),
            Symbol::Term(Token::Eof) => "$".to_string(),
            Symbol::Term(Token::Error(_)) => "?".to_string(),
            Symbol::Nonterm(ref n) => n.clone(),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // Terminal slots are payload-independent within a rule, so they
        // render as their class tag rather than a concrete payload.
        write!(f, "{}", self.tag())
    }
}

/// The provenance of a rule.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum RuleKind {
    /// A rule as written by the grammar author.
    Plain,
    /// A synthetic rule produced by prefix factoring, standing in for the
    /// rule it wraps. Emerges as the ε rule at a leaf of the rule trie.
    Rewrite { original: Arc<Rule> },
    /// A synthetic rule produced by left-recursion elimination. `head` marks
    /// the recursive-call-bearing variant; `original == None` marks the
    /// recursion terminator.
    Recursion {
        original: Option<Arc<Rule>>,
        head: bool,
    },
}

/// A grammar rule `lhs -> rhs`, with an empty `rhs` denoting ε.
///
/// The `id` is assigned at creation and identifies the rule within its rule
/// set (it keys the builder registry); it does not take part in equality,
/// which is structural over lhs, rhs, and provenance.
#[derive(Clone, Debug)]
pub struct Rule {
    pub id: usize,
    pub lhs: String,
    pub rhs: Vec<Symbol>,
    pub kind: RuleKind,
}

impl Rule {
    pub fn new(id: usize, lhs: impl Into<String>, rhs: Vec<Symbol>, kind: RuleKind) -> Rule {
        Rule {
            id,
            lhs: lhs.into(),
            rhs,
            kind,
        }
    }

    /// Whether the right-hand side is ε.
    pub fn is_epsilon(&self) -> bool {
        self.rhs.is_empty()
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.lhs == other.lhs && self.rhs == other.rhs && self.kind == other.kind
    }
}

impl Eq for Rule {}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.rhs.is_empty() {
            write!(f, "{} -> ε", self.lhs)
        } else {
            write!(f, "{} -> {}", self.lhs, self.rhs.iter().format(" "))
        }
    }
}

/// The factory that instantiates a fresh semantic-action builder for one
/// application of a rule.
pub type BuilderFn<E> = Box<dyn Fn() -> Box<dyn Build<E>> + Send + Sync>;

/// An ordered collection of rules together with the semantic-action builder
/// registered for each, and the designated start nonterminal.
pub struct RuleSet<E> {
    start: String,
    rules: Vec<Arc<Rule>>,
    builders: HashMap<usize, BuilderFn<E>>,
}

impl<E> RuleSet<E> {
    pub fn new<S: Into<String>>(start: S) -> RuleSet<E> {
        RuleSet {
            start: start.into(),
            rules: Vec::new(),
            builders: HashMap::new(),
        }
    }

    /// Add a rule and register its builder factory. Rules keep the order they
    /// are added in.
    pub fn add<S, F>(&mut self, lhs: S, rhs: Vec<Symbol>, builder: F) -> Arc<Rule>
    where
        S: Into<String>,
        F: Fn() -> Box<dyn Build<E>> + Send + Sync + 'static,
    {
        let rule = Arc::new(Rule::new(self.rules.len(), lhs, rhs, RuleKind::Plain));
        self.builders.insert(rule.id, Box::new(builder));
        self.rules.push(rule.clone());
        rule
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn rules(&self) -> &[Arc<Rule>] {
        &self.rules
    }

    /// The first id available to synthetic rules.
    pub fn next_rule_id(&self) -> usize {
        self.rules.len()
    }

    /// Instantiate a fresh builder for one application of `rule`.
    pub fn builder(&self, rule: &Rule) -> Option<Box<dyn Build<E>>> {
        self.builders.get(&rule.id).map(|f| f())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_equality_ignores_id() {
        let a = Rule::new(
            0,
            "S",
            vec![Symbol::any_ident(), Symbol::symbol(";")],
            RuleKind::Plain,
        );
        let b = Rule::new(
            7,
            "S",
            vec![Symbol::any_ident(), Symbol::symbol(";")],
            RuleKind::Plain,
        );
        assert_eq!(a, b);
    }

    #[test]
    fn matching_slots() {
        assert!(Symbol::any_ident().matches(&Symbol::Term(Token::Ident("x".to_string()))));
        assert!(!Symbol::any_ident().matches(&Symbol::any_number()));
        assert!(Symbol::nonterm("A").matches(&Symbol::nonterm("A")));
        assert!(!Symbol::nonterm("A").matches(&Symbol::nonterm("B")));
    }

    #[test]
    fn display() {
        let r = Rule::new(
            0,
            "stmt",
            vec![
                Symbol::any_ident(),
                Symbol::symbol(":="),
                Symbol::nonterm("expr"),
            ],
            RuleKind::Plain,
        );
        assert_eq!(format!("{}", r), "stmt -> id := expr");
    }
}
