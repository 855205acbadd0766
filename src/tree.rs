// Copyright (c) 2021 Fabian Schuiki

//! The parse tree reconstructor.
//!
//! The parser's event stream describes a derivation of the *rewritten*
//! grammar: chain rules introduced by prefix factoring, with the provenance-
//! carrying ε rules at the leaves. This stage rebuilds that derivation as a
//! tree and emits a corrected stream for the AST compiler: tokens are
//! forwarded verbatim as they arrive, chain rules only shape the tree, and
//! every ε rewrite leaf is forwarded as the rule it stands for. Since a leaf
//! closes exactly when all constituents of its rule have been consumed, the
//! corrected stream announces each original rule *after* its children — the
//! order the compiler's stack machine needs.
//!
//! Nodes live in an arena and refer to each other by index; the active cursor
//! and the parent links are indices as well, so the tree needs no interior
//! mutability and no back-edge lifetimes.
//!
//! An event that does not fit the tree is not a user-input error: the parser
//! only emits what the table predicts, so a misfit means the grammar
//! transformation and the reconstruction have gone out of sync. Those panic.

use crate::grammar::{Rule, RuleKind, Symbol};
use crate::parser::Event;
use crate::scanner::Scanned;
use crate::token::Token;
use std::sync::Arc;
use strom_common::buffer::{Receiver, Sender};

/// A node in the reconstructed derivation tree.
struct Node {
    /// The parent, used only for walking back up. The root has none.
    parent: Option<usize>,
    kind: NodeKind,
}

enum NodeKind {
    /// A matched input token.
    Leaf(Token),
    /// An applied rule with its children; the children are bounded by the
    /// rule's right-hand side.
    Proper {
        rule: Arc<Rule>,
        children: Vec<usize>,
    },
}

/// The tree reconstructor stage.
#[derive(Default)]
pub struct ParseTree {
    nodes: Vec<Node>,
    root: Option<usize>,
    active: usize,
}

impl ParseTree {
    pub fn new() -> ParseTree {
        Default::default()
    }

    /// Consume the parser's event stream and emit the corrected stream into
    /// `out`. Returns once end of input has been forwarded or the input
    /// stream closes (the upstream failure path).
    pub fn run(mut self, input: &Receiver<Event>, out: &Sender<Event>) {
        while let Some(event) = input.recv() {
            let done = match event {
                Event::Token(scanned) => self.feed_token(scanned, out),
                Event::Rule(rule) => {
                    self.feed_rule(rule, out);
                    false
                }
            };
            if done {
                break;
            }
        }
    }

    /// The expected next symbol of a proper node, or `None` if the node is
    /// full. Returned by value so the caller is free to grow the arena.
    fn expected(&self, index: usize) -> Option<Symbol> {
        match self.nodes[index].kind {
            NodeKind::Proper {
                ref rule,
                ref children,
            } => rule.rhs.get(children.len()).cloned(),
            NodeKind::Leaf(_) => panic!("parse tree cursor on a leaf"),
        }
    }

    fn attach(&mut self, parent: usize, node: Node) -> usize {
        let index = self.nodes.len();
        self.nodes.push(node);
        match self.nodes[parent].kind {
            NodeKind::Proper {
                ref mut children, ..
            } => children.push(index),
            NodeKind::Leaf(_) => panic!("parse tree cursor on a leaf"),
        }
        index
    }

    /// Place a token into the tree and forward it. Returns whether the tree
    /// is complete (end of input seen).
    fn feed_token(&mut self, scanned: Scanned, out: &Sender<Event>) -> bool {
        if self.root.is_none() {
            panic!(
                "internal error: token `{}` arrived before any rule; \
                 the grammar transformation and the reconstructor are out of sync",
                scanned.token
            );
        }
        loop {
            match self.expected(self.active) {
                // The active node is full; retry one level up.
                None => match self.nodes[self.active].parent {
                    Some(parent) => self.active = parent,
                    None => {
                        if scanned.token == Token::Eof {
                            let _ = out.send(Event::Token(scanned));
                            return true;
                        }
                        panic!(
                            "internal error: token `{}` does not fit the completed tree; \
                             the grammar transformation and the reconstructor are out of sync",
                            scanned.token
                        );
                    }
                },
                Some(Symbol::Term(expected)) if expected.matches(&scanned.token) => {
                    let node = Node {
                        parent: Some(self.active),
                        kind: NodeKind::Leaf(scanned.token.clone()),
                    };
                    self.attach(self.active, node);
                    let _ = out.send(Event::Token(scanned));
                    return false;
                }
                Some(expected) => panic!(
                    "internal error: token `{}` arrived where `{}` was expected; \
                     the grammar transformation and the reconstructor are out of sync",
                    scanned.token, expected
                ),
            }
        }
    }

    /// Place a rule into the tree, descend into it, and forward its
    /// provenance if it is a rewrite leaf.
    fn feed_rule(&mut self, rule: Arc<Rule>, out: &Sender<Event>) {
        let index = match self.root {
            // The very first rule becomes the root.
            None => {
                let index = self.nodes.len();
                self.nodes.push(Node {
                    parent: None,
                    kind: NodeKind::Proper {
                        rule: rule.clone(),
                        children: Vec::new(),
                    },
                });
                self.root = Some(index);
                index
            }
            Some(_) => loop {
                match self.expected(self.active) {
                    None => match self.nodes[self.active].parent {
                        Some(parent) => self.active = parent,
                        None => panic!(
                            "internal error: rule `{}` does not fit the completed tree; \
                             the grammar transformation and the reconstructor are out of sync",
                            rule
                        ),
                    },
                    Some(Symbol::Nonterm(name)) if *name == rule.lhs => {
                        let node = Node {
                            parent: Some(self.active),
                            kind: NodeKind::Proper {
                                rule: rule.clone(),
                                children: Vec::new(),
                            },
                        };
                        break self.attach(self.active, node);
                    }
                    Some(expected) => panic!(
                        "internal error: rule `{}` arrived where `{}` was expected; \
                         the grammar transformation and the reconstructor are out of sync",
                        rule, expected
                    ),
                }
            },
        };
        self.active = index;

        // The undo step: a rewrite leaf stands for the rule recorded in its
        // provenance. The tokens of that rule's subtree have already been
        // forwarded verbatim, so forwarding the original here reconstructs
        // the pre-transformation derivation in post-order.
        if let RuleKind::Rewrite { ref original } = rule.kind {
            let _ = out.send(Event::Rule(original.clone()));
        }
    }
}
