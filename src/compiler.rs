// Copyright (c) 2021 Fabian Schuiki

//! The AST compiler.
//!
//! A stack machine over the reconstructed event stream. Tokens are pushed
//! verbatim; when a rule arrives, all of its constituents are already on the
//! stack (the reconstructor announces rules post-order), so the rule's
//! builder pops them off — in reverse order — and produces an AST element.
//!
//! The one wrinkle is left recursion. Recursion elimination turned
//! `S -> S α | β` into right-recursive synthetic rules, so their provenance
//! arrives innermost-first: the α constituents of the *last* recursion step
//! close first. Building eagerly would therefore nest the AST to the right.
//! Instead, a "head" recursion rule does not build: it parks its wrapped
//! original together with the already-popped α constituents in a save area.
//! Once the chain bottoms out and a build pushes an element, the save area is
//! drained in LIFO order, each saved rule consuming the element built just
//! before it — which re-nests the chain to the left, as written in the
//! original grammar. Getting this order wrong silently flips associativity;
//! see the `left_associativity` test below.
//!
//! The element type `E` is entirely the caller's; the compiler moves elements
//! through the stack without inspecting them.

use crate::grammar::{Rule, RuleKind, RuleSet};
use crate::parser::Event;
use crate::token::Token;
use std::sync::Arc;
use strom_common::buffer::Receiver;

/// An entry on the compiler's value stack: a raw token, or an AST element a
/// builder has produced.
#[derive(Debug)]
pub enum StackItem<E> {
    Token(Token),
    Element(E),
}

/// The semantic-action builder for one application of one rule.
///
/// A fresh builder is instantiated per rule application. The compiler feeds
/// it the rule's constituents in reverse order (they come off a stack):
/// [`Build::fits`] decides whether the current stack top still belongs to
/// this rule's construction given what has already been put, [`Build::put`]
/// accepts it, and [`Build::build`] produces the element — or `None` for
/// rules that contribute nothing to the AST.
pub trait Build<E>: Send {
    fn fits(&self, item: &StackItem<E>) -> bool;
    fn put(&mut self, item: StackItem<E>);
    fn build(&mut self) -> Option<E>;
}

/// A builder factory for rules that consume nothing and produce nothing.
pub fn discard<E>() -> Box<dyn Build<E>> {
    struct Discard;
    impl<E> Build<E> for Discard {
        fn fits(&self, _: &StackItem<E>) -> bool {
            false
        }
        fn put(&mut self, _: StackItem<E>) {}
        fn build(&mut self) -> Option<E> {
            None
        }
    }
    Box::new(Discard)
}

/// The AST compiler stage.
pub struct Compiler<'a, E> {
    rules: &'a RuleSet<E>,
    stack: Vec<StackItem<E>>,
    saves: Vec<(Arc<Rule>, Vec<StackItem<E>>)>,
}

impl<'a, E> Compiler<'a, E> {
    pub fn new(rules: &'a RuleSet<E>) -> Compiler<'a, E> {
        Compiler {
            rules,
            stack: Vec::new(),
            saves: Vec::new(),
        }
    }

    /// Consume the reconstructed event stream and return the root element,
    /// or `None` if the upstream parse failed (the input closes without an
    /// end-of-input token) or the grammar produces no element.
    pub fn run(mut self, input: &Receiver<Event>) -> Option<E> {
        while let Some(event) = input.recv() {
            match event {
                Event::Token(scanned) => match scanned.token {
                    Token::Eof => return self.finish(),
                    token => self.stack.push(StackItem::Token(token)),
                },
                Event::Rule(rule) => self.feed_rule(rule),
            }
        }
        None
    }

    fn feed_rule(&mut self, rule: Arc<Rule>) {
        match rule.kind {
            // The recursion terminator carries no semantics.
            RuleKind::Recursion { original: None, .. } => {}
            // A head defers: park the original rule and the constituents of
            // its α tail until the recursion chain has bottomed out.
            RuleKind::Recursion {
                original: Some(ref original),
                head: true,
            } => {
                let tail_len = original.rhs.len().saturating_sub(1);
                if self.stack.len() < tail_len {
                    panic!(
                        "internal error: stack underflow while deferring `{}`; \
                         the grammar transformation and the compiler are out of sync",
                        original
                    );
                }
                let mut items = Vec::with_capacity(tail_len);
                for _ in 0..tail_len {
                    items.push(self.stack.pop().unwrap());
                }
                self.saves.push((original.clone(), items));
            }
            // A tail rewrite stands for its original rule.
            RuleKind::Recursion {
                original: Some(ref original),
                head: false,
            } => self.apply(&original.clone(), Vec::new()),
            RuleKind::Plain => self.apply(&rule, Vec::new()),
            RuleKind::Rewrite { .. } => panic!(
                "internal error: rewrite rule `{}` reached the AST compiler; \
                 the tree reconstructor should have unwrapped it",
                rule
            ),
        }
    }

    /// Run one rule's builder: feed it `saved` constituents first, then pop
    /// the stack while the builder accepts the top. A produced element is
    /// pushed and triggers draining of the save area.
    fn apply(&mut self, rule: &Arc<Rule>, saved: Vec<StackItem<E>>) {
        let mut builder = match self.rules.builder(rule) {
            Some(builder) => builder,
            None => panic!(
                "internal error: no builder registered for rule `{}`",
                rule
            ),
        };
        for item in saved {
            builder.put(item);
        }
        loop {
            match self.stack.last() {
                Some(top) if builder.fits(top) => {
                    let item = self.stack.pop().unwrap();
                    builder.put(item);
                }
                _ => break,
            }
        }
        if let Some(element) = builder.build() {
            self.stack.push(StackItem::Element(element));
            // Replay the most recently deferred recursion step against the
            // element just built.
            if let Some((rule, items)) = self.saves.pop() {
                self.apply(&rule, items);
            }
        }
    }

    fn finish(mut self) -> Option<E> {
        if !self.saves.is_empty() {
            panic!(
                "internal error: {} deferred recursion step(s) left at end of input",
                self.saves.len()
            );
        }
        match self.stack.pop() {
            None => None,
            Some(StackItem::Element(element)) => {
                if !self.stack.is_empty() {
                    panic!(
                        "internal error: {} unconsumed item(s) below the root element",
                        self.stack.len()
                    );
                }
                Some(element)
            }
            Some(StackItem::Token(token)) => panic!(
                "internal error: loose token `{}` on top of the stack at end of input",
                token
            ),
        }
    }
}
