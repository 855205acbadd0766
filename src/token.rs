// Copyright (c) 2021 Fabian Schuiki

//! Defines all tokens that may result from performing lexical analysis on an
//! input stream, together with the two equalities the pipeline needs: full
//! structural equality, and the payload-independent matching the grammar
//! subsystem uses.

use num::BigInt;
use std::fmt;

/// A primary token emitted by the scanner.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Token {
    /// A fixed symbol registered with the scanner, e.g. `:=` or `while`.
    Symbol(String),
    /// An identifier.
    Ident(String),
    /// An arbitrary-precision integer literal.
    Number(BigInt),
    /// A string literal, with escapes already resolved.
    Str(String),
    /// The end of the input.
    Eof,
    /// An input failure, reified as a token so that it travels down the
    /// pipeline along the normal path instead of being thrown across stage
    /// boundaries.
    Error(String),
}

impl Token {
    /// Check whether this token matches `other` under grammar equality.
    ///
    /// Two `Ident`, `Number`, or `Str` tokens match regardless of their
    /// payload, which lets a single terminal slot in a rule stand for any
    /// identifier or literal. `Symbol` tokens compare by their text. `Error`
    /// tokens never match anything. Consumers that need the payload take it
    /// from the concrete token the scanner produced, not from the rule slot.
    pub fn matches(&self, other: &Token) -> bool {
        match (self, other) {
            (Token::Symbol(a), Token::Symbol(b)) => a == b,
            (Token::Ident(_), Token::Ident(_)) => true,
            (Token::Number(_), Token::Number(_)) => true,
            (Token::Str(_), Token::Str(_)) => true,
            (Token::Eof, Token::Eof) => true,
            _ => false,
        }
    }

    /// Project the token onto its payload-independent table key. `Error`
    /// tokens have no key; they never appear in a parsing table.
    pub fn key(&self) -> Option<TokenKey> {
        match *self {
            Token::Symbol(ref s) => Some(TokenKey::Symbol(s.clone())),
            Token::Ident(_) => Some(TokenKey::Ident),
            Token::Number(_) => Some(TokenKey::Number),
            Token::Str(_) => Some(TokenKey::Str),
            Token::Eof => Some(TokenKey::Eof),
            Token::Error(_) => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Token::Symbol(ref s) => write!(f, "{}", s),
            Token::Ident(ref n) => write!(f, "{}", n),
            Token::Number(ref v) => write!(f, "{}", v),
            Token::Str(ref s) => write!(f, "\"{}\"", s),
            Token::Eof => write!(f, "end of input"),
            Token::Error(ref m) => write!(f, "input error: {}", m),
        }
    }
}

/// The payload-independent equivalence class of a token, used as the lookahead
/// key of the parsing table and as the element of FIRST and FOLLOW sets.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum TokenKey {
    Symbol(String),
    Ident,
    Number,
    Str,
    Eof,
}

impl fmt::Display for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            TokenKey::Symbol(ref s) => write!(f, "`{}`", s),
            TokenKey::Ident => write!(f, "identifier"),
            TokenKey::Number => write!(f, "number"),
            TokenKey::Str => write!(f, "string"),
            TokenKey::Eof => write!(f, "end of input"),
        }
    }
}
