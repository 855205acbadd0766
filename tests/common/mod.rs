// Copyright (c) 2021 Fabian Schuiki

//! A small assignment-and-arithmetic language used by the integration tests:
//!
//!     stmt -> id := expr
//!     expr -> expr + prod | expr - prod | prod
//!     prod -> prod * atom | atom
//!     atom -> num | id | ( expr )
//!
//! Operator precedence comes from the grammar stratification, associativity
//! from the left-recursive rules.

use num::BigInt;
use strom::{Build, CharReader, RuleSet, Scanner, StackItem, Symbol, Token};

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Ast {
    Num(BigInt),
    Var(String),
    Assign(String, Box<Ast>),
    Bin(char, Box<Ast>, Box<Ast>),
}

impl Ast {
    pub fn num(n: u32) -> Ast {
        Ast::Num(n.into())
    }

    pub fn var(name: &str) -> Ast {
        Ast::Var(name.to_string())
    }

    pub fn bin(op: char, lhs: Ast, rhs: Ast) -> Ast {
        Ast::Bin(op, Box::new(lhs), Box::new(rhs))
    }
}

/// Builder for `atom -> num`.
struct NumBuilder {
    value: Option<Ast>,
}

impl Build<Ast> for NumBuilder {
    fn fits(&self, item: &StackItem<Ast>) -> bool {
        self.value.is_none() && matches!(item, StackItem::Token(Token::Number(_)))
    }
    fn put(&mut self, item: StackItem<Ast>) {
        if let StackItem::Token(Token::Number(v)) = item {
            self.value = Some(Ast::Num(v));
        }
    }
    fn build(&mut self) -> Option<Ast> {
        self.value.take()
    }
}

/// Builder for `atom -> id`.
struct VarBuilder {
    value: Option<Ast>,
}

impl Build<Ast> for VarBuilder {
    fn fits(&self, item: &StackItem<Ast>) -> bool {
        self.value.is_none() && matches!(item, StackItem::Token(Token::Ident(_)))
    }
    fn put(&mut self, item: StackItem<Ast>) {
        if let StackItem::Token(Token::Ident(name)) = item {
            self.value = Some(Ast::Var(name));
        }
    }
    fn build(&mut self) -> Option<Ast> {
        self.value.take()
    }
}

/// Builder for the unit rules `expr -> prod` and `prod -> atom`.
struct PassBuilder {
    value: Option<Ast>,
}

impl Build<Ast> for PassBuilder {
    fn fits(&self, item: &StackItem<Ast>) -> bool {
        self.value.is_none() && matches!(item, StackItem::Element(_))
    }
    fn put(&mut self, item: StackItem<Ast>) {
        if let StackItem::Element(ast) = item {
            self.value = Some(ast);
        }
    }
    fn build(&mut self) -> Option<Ast> {
        self.value.take()
    }
}

/// Builder for the binary rules; operands arrive right-to-left.
struct BinBuilder {
    op: char,
    rhs: Option<Ast>,
    op_seen: bool,
    lhs: Option<Ast>,
}

impl BinBuilder {
    fn new(op: char) -> BinBuilder {
        BinBuilder {
            op,
            rhs: None,
            op_seen: false,
            lhs: None,
        }
    }
}

impl Build<Ast> for BinBuilder {
    fn fits(&self, item: &StackItem<Ast>) -> bool {
        if self.rhs.is_none() {
            matches!(item, StackItem::Element(_))
        } else if !self.op_seen {
            matches!(item, StackItem::Token(Token::Symbol(_)))
        } else if self.lhs.is_none() {
            matches!(item, StackItem::Element(_))
        } else {
            false
        }
    }
    fn put(&mut self, item: StackItem<Ast>) {
        match item {
            StackItem::Element(ast) if self.rhs.is_none() => self.rhs = Some(ast),
            StackItem::Token(Token::Symbol(_)) => self.op_seen = true,
            StackItem::Element(ast) => self.lhs = Some(ast),
            StackItem::Token(_) => {}
        }
    }
    fn build(&mut self) -> Option<Ast> {
        match (self.lhs.take(), self.rhs.take()) {
            (Some(lhs), Some(rhs)) => Some(Ast::bin(self.op, lhs, rhs)),
            _ => None,
        }
    }
}

/// Builder for `atom -> ( expr )`; consumes `)`, the inner element, `(`.
struct ParenBuilder {
    inner: Option<Ast>,
    close_seen: bool,
    open_seen: bool,
}

impl Build<Ast> for ParenBuilder {
    fn fits(&self, item: &StackItem<Ast>) -> bool {
        if !self.close_seen {
            matches!(item, StackItem::Token(Token::Symbol(s)) if s == ")")
        } else if self.inner.is_none() {
            matches!(item, StackItem::Element(_))
        } else if !self.open_seen {
            matches!(item, StackItem::Token(Token::Symbol(s)) if s == "(")
        } else {
            false
        }
    }
    fn put(&mut self, item: StackItem<Ast>) {
        match item {
            StackItem::Element(ast) => self.inner = Some(ast),
            StackItem::Token(_) if !self.close_seen => self.close_seen = true,
            StackItem::Token(_) => self.open_seen = true,
        }
    }
    fn build(&mut self) -> Option<Ast> {
        self.inner.take()
    }
}

/// Builder for `stmt -> id := expr`.
struct AssignBuilder {
    value: Option<Ast>,
    op_seen: bool,
    name: Option<String>,
}

impl Build<Ast> for AssignBuilder {
    fn fits(&self, item: &StackItem<Ast>) -> bool {
        if self.value.is_none() {
            matches!(item, StackItem::Element(_))
        } else if !self.op_seen {
            matches!(item, StackItem::Token(Token::Symbol(s)) if s == ":=")
        } else if self.name.is_none() {
            matches!(item, StackItem::Token(Token::Ident(_)))
        } else {
            false
        }
    }
    fn put(&mut self, item: StackItem<Ast>) {
        match item {
            StackItem::Element(ast) => self.value = Some(ast),
            StackItem::Token(Token::Symbol(_)) => self.op_seen = true,
            StackItem::Token(Token::Ident(name)) => self.name = Some(name),
            StackItem::Token(_) => {}
        }
    }
    fn build(&mut self) -> Option<Ast> {
        match (self.name.take(), self.value.take()) {
            (Some(name), Some(value)) => Some(Ast::Assign(name, Box::new(value))),
            _ => None,
        }
    }
}

/// Assemble the rule set of the test language.
pub fn language() -> RuleSet<Ast> {
    let mut set = RuleSet::new("stmt");
    set.add(
        "stmt",
        vec![
            Symbol::any_ident(),
            Symbol::symbol(":="),
            Symbol::nonterm("expr"),
        ],
        || {
            Box::new(AssignBuilder {
                value: None,
                op_seen: false,
                name: None,
            })
        },
    );
    for &op in &['+', '-'] {
        set.add(
            "expr",
            vec![
                Symbol::nonterm("expr"),
                Symbol::symbol(op.to_string()),
                Symbol::nonterm("prod"),
            ],
            move || Box::new(BinBuilder::new(op)),
        );
    }
    set.add("expr", vec![Symbol::nonterm("prod")], || {
        Box::new(PassBuilder { value: None })
    });
    set.add(
        "prod",
        vec![
            Symbol::nonterm("prod"),
            Symbol::symbol("*"),
            Symbol::nonterm("atom"),
        ],
        || Box::new(BinBuilder::new('*')),
    );
    set.add("prod", vec![Symbol::nonterm("atom")], || {
        Box::new(PassBuilder { value: None })
    });
    set.add("atom", vec![Symbol::any_number()], || {
        Box::new(NumBuilder { value: None })
    });
    set.add("atom", vec![Symbol::any_ident()], || {
        Box::new(VarBuilder { value: None })
    });
    set.add(
        "atom",
        vec![
            Symbol::symbol("("),
            Symbol::nonterm("expr"),
            Symbol::symbol(")"),
        ],
        || {
            Box::new(ParenBuilder {
                inner: None,
                close_seen: false,
                open_seen: false,
            })
        },
    );
    set
}

/// A scanner configured for the test language.
pub fn scanner(input: &str) -> Scanner {
    let mut scanner = Scanner::new(CharReader::from_str(input));
    scanner.add_number_scanner();
    for sym in &[":=", "+", "-", "*", "(", ")"] {
        scanner.add_symbol(sym);
    }
    scanner
}
