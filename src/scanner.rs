// Copyright (c) 2021 Fabian Schuiki

//! A trie-based tokenizer with pluggable sub-scanners.
//!
//! The scanner recognizes the fixed symbols registered in its token trie by
//! greedy longest match: it walks the trie while the next character continues
//! a known path and stops at a terminator (by default: whitespace) or the end
//! of the input. If the path ends without a marked token, the consumed text
//! becomes an identifier. A registered symbol whose path is interrupted early
//! is *not* returned; the longer identifier wins ("maximal munch"), so `ifx`
//! scans as one identifier even with `if` registered.
//!
//! Tokens whose extent is not a fixed string (numbers, string literals) are
//! handled by [`SubScanner`]s registered per entry code point, which take over
//! the reader when their code point comes up first.

use crate::token::Token;
use num::BigInt;
use std::collections::HashMap;
use std::io;
use strom_common::buffer::Sender;
use strom_common::source::Location;

/// A peekable reader over a stream of code points that tracks line and column
/// information and latches I/O failures.
///
/// The reader pulls from a fallible character iterator. The first error ends
/// the stream and is remembered, so that the scanner can reify it as a
/// [`Token::Error`] travelling the normal token path.
pub struct CharReader<'a> {
    iter: Box<dyn Iterator<Item = io::Result<char>> + Send + 'a>,
    buf: Vec<char>,
    loc: Location,
    error: Option<String>,
}

impl<'a> CharReader<'a> {
    pub fn new<I>(iter: I) -> CharReader<'a>
    where
        I: Iterator<Item = io::Result<char>> + Send + 'a,
    {
        CharReader {
            iter: Box::new(iter),
            buf: Vec::new(),
            loc: Location::start(),
            error: None,
        }
    }

    /// Create a reader over a string slice.
    pub fn from_str(input: &'a str) -> CharReader<'a> {
        CharReader::new(input.chars().map(Ok))
    }

    /// Create a reader that decodes UTF-8 from a byte source.
    pub fn from_read<R: io::Read + Send + 'a>(input: R) -> CharReader<'a> {
        CharReader::new(Utf8Chars {
            bytes: input.bytes(),
        })
    }

    /// Return the character `offset` code points ahead of the current
    /// position, without consuming anything.
    pub fn peek(&mut self, offset: usize) -> Option<char> {
        while self.buf.len() <= offset && self.error.is_none() {
            match self.iter.next() {
                Some(Ok(c)) => self.buf.push(c),
                Some(Err(e)) => self.error = Some(e.to_string()),
                None => break,
            }
        }
        self.buf.get(offset).copied()
    }

    /// Consume the next code point.
    pub fn bump(&mut self) {
        if let Some(c) = self.peek(0) {
            self.loc.advance(c);
            self.buf.remove(0);
        }
    }

    /// The position of the next code point.
    pub fn loc(&self) -> Location {
        self.loc
    }

    /// The latched I/O failure, if any. Only reported once the buffered
    /// characters before the failure have been consumed.
    pub fn error(&self) -> Option<&str> {
        if self.buf.is_empty() {
            self.error.as_deref()
        } else {
            None
        }
    }
}

/// An iterator adapter decoding UTF-8 characters from a byte reader.
struct Utf8Chars<R> {
    bytes: io::Bytes<R>,
}

impl<R: io::Read> Iterator for Utf8Chars<R> {
    type Item = io::Result<char>;

    fn next(&mut self) -> Option<io::Result<char>> {
        let first = match self.bytes.next()? {
            Ok(b) => b,
            Err(e) => return Some(Err(e)),
        };
        let len = match first {
            0x00..=0x7f => return Some(Ok(first as char)),
            0xc0..=0xdf => 2,
            0xe0..=0xef => 3,
            0xf0..=0xf7 => 4,
            _ => return Some(Err(invalid_utf8())),
        };
        let mut buf = vec![first];
        for _ in 1..len {
            match self.bytes.next() {
                Some(Ok(b)) => buf.push(b),
                Some(Err(e)) => return Some(Err(e)),
                None => return Some(Err(invalid_utf8())),
            }
        }
        match std::str::from_utf8(&buf) {
            Ok(s) => s.chars().next().map(Ok),
            Err(_) => Some(Err(invalid_utf8())),
        }
    }
}

fn invalid_utf8() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, "stream did not contain valid UTF-8")
}

/// A scanner for a token class whose extent is not a fixed string, such as
/// number or string literals. Registered per entry code point; when the
/// scanner's code point comes up first in a token, the sub-scanner consumes
/// the entire token including that code point.
pub trait SubScanner: Send {
    fn scan(&self, reader: &mut CharReader) -> Token;
}

/// Scans a run of decimal digits into an arbitrary-precision integer.
pub struct NumberScanner;

impl SubScanner for NumberScanner {
    fn scan(&self, reader: &mut CharReader) -> Token {
        let mut value = BigInt::from(0u32);
        while let Some(c) = reader.peek(0) {
            match c.to_digit(10) {
                Some(d) => {
                    value = value * BigInt::from(10u32) + BigInt::from(d);
                    reader.bump();
                }
                None => break,
            }
        }
        Token::Number(value)
    }
}

/// Scans a string literal delimited by `"`, resolving `\"`, `\\`, `\n`, and
/// `\t` escapes. Line breaks inside the literal are tracked by the reader and
/// can be forbidden.
pub struct StringScanner {
    pub allow_newlines: bool,
}

impl SubScanner for StringScanner {
    fn scan(&self, reader: &mut CharReader) -> Token {
        // Opening quote.
        reader.bump();
        let mut text = String::new();
        loop {
            match reader.peek(0) {
                None => {
                    return Token::Error("string literal is not terminated".to_string());
                }
                Some('"') => {
                    reader.bump();
                    return Token::Str(text);
                }
                Some('\n') if !self.allow_newlines => {
                    return Token::Error(
                        "string literal is not terminated before the end of the line".to_string(),
                    );
                }
                Some('\\') => {
                    reader.bump();
                    match reader.peek(0) {
                        Some('n') => text.push('\n'),
                        Some('t') => text.push('\t'),
                        Some(c) => text.push(c),
                        None => continue,
                    }
                    reader.bump();
                }
                Some(c) => {
                    text.push(c);
                    reader.bump();
                }
            }
        }
    }
}

/// The trie over the fixed symbol strings the scanner recognizes.
#[derive(Default)]
struct TokenTrie {
    children: HashMap<char, TokenTrie>,
    token: Option<Token>,
}

impl TokenTrie {
    fn insert(&mut self, text: &str, token: Token) {
        let mut node = self;
        for c in text.chars() {
            node = node.children.entry(c).or_default();
        }
        node.token = Some(token);
    }
}

/// A token produced by the scanner, together with the position metadata the
/// parser uses for diagnostics: the token's starting line and column, and the
/// code point immediately following it.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Scanned {
    pub token: Token,
    pub loc: Location,
    pub trailing: Option<char>,
}

/// The tokenizer itself. Scanning is a pure pull operation via
/// [`Scanner::next_token`]; [`Scanner::run`] wraps it into the streaming
/// front stage of a pipeline.
pub struct Scanner<'a> {
    reader: CharReader<'a>,
    symbols: TokenTrie,
    subscanners: HashMap<char, Box<dyn SubScanner + 'a>>,
    terminator: Box<dyn Fn(char) -> bool + Send + 'a>,
}

impl<'a> Scanner<'a> {
    /// Create a scanner with the default terminator predicate (whitespace)
    /// and no symbols or sub-scanners.
    pub fn new(reader: CharReader<'a>) -> Scanner<'a> {
        Scanner {
            reader,
            symbols: TokenTrie::default(),
            subscanners: HashMap::new(),
            terminator: Box::new(char::is_whitespace),
        }
    }

    /// Register a fixed symbol string.
    pub fn add_symbol(&mut self, text: &str) {
        self.symbols.insert(text, Token::Symbol(text.to_string()));
    }

    /// Register a sub-scanner taking over tokens that begin with `first`.
    pub fn add_subscanner(&mut self, first: char, sub: impl SubScanner + 'a) {
        self.subscanners.insert(first, Box::new(sub));
    }

    /// Register the digit sub-scanner for `0` through `9`.
    pub fn add_number_scanner(&mut self) {
        for c in '0'..='9' {
            self.subscanners.insert(c, Box::new(NumberScanner));
        }
    }

    /// Register the string-literal sub-scanner for `"`.
    pub fn add_string_scanner(&mut self, allow_newlines: bool) {
        self.subscanners
            .insert('"', Box::new(StringScanner { allow_newlines }));
    }

    /// Replace the terminator predicate deciding which code points end an
    /// identifier.
    pub fn set_terminator(&mut self, terminator: impl Fn(char) -> bool + Send + 'a) {
        self.terminator = Box::new(terminator);
    }

    fn is_terminator(&self, c: char) -> bool {
        (self.terminator)(c)
    }

    /// Produce the next token.
    pub fn next_token(&mut self) -> Scanned {
        // Skip terminator characters preceding the token.
        while let Some(c) = self.reader.peek(0) {
            if !self.is_terminator(c) {
                break;
            }
            self.reader.bump();
        }

        let loc = self.reader.loc();
        if let Some(msg) = self.reader.error() {
            let msg = msg.to_string();
            return Scanned {
                token: Token::Error(msg),
                loc,
                trailing: None,
            };
        }
        let first = match self.reader.peek(0) {
            Some(c) => c,
            None => {
                return Scanned {
                    token: Token::Eof,
                    loc,
                    trailing: None,
                }
            }
        };

        // Hand over to a registered sub-scanner if the first code point
        // matches one.
        if let Some(sub) = self.subscanners.get(&first) {
            let token = sub.scan(&mut self.reader);
            return Scanned {
                token,
                loc,
                trailing: self.reader.peek(0),
            };
        }

        // Walk the symbol trie as long as the input continues a known path.
        // Once the path breaks before a terminator, the text can no longer be
        // a symbol and degrades to an identifier.
        let mut node = Some(&self.symbols);
        let mut text = String::new();
        loop {
            let c = match self.reader.peek(0) {
                Some(c) if !self.is_terminator(c) => c,
                _ => break,
            };
            node = node.and_then(|n| n.children.get(&c));
            text.push(c);
            self.reader.bump();
        }
        let token = match node.and_then(|n| n.token.clone()) {
            Some(token) => token,
            None => Token::Ident(text),
        };
        Scanned {
            token,
            loc,
            trailing: self.reader.peek(0),
        }
    }

    /// Run the scanner as a pipeline stage: pull tokens and push them into
    /// `out` until the end of input (or an input failure) has been pushed.
    pub fn run(mut self, out: &Sender<Scanned>) {
        loop {
            let scanned = self.next_token();
            let done = matches!(scanned.token, Token::Eof | Token::Error(_));
            if out.send(scanned).is_err() {
                // The consumer is gone; stop producing.
                break;
            }
            if done {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner(input: &str) -> Scanner {
        let mut s = Scanner::new(CharReader::from_str(input));
        s.add_number_scanner();
        s.add_string_scanner(false);
        for sym in &[":=", "+", "-", "*", "(", ")", "if"] {
            s.add_symbol(sym);
        }
        s
    }

    fn tokens(input: &str) -> Vec<Token> {
        let mut s = scanner(input);
        let mut out = Vec::new();
        loop {
            let t = s.next_token().token;
            let done = matches!(t, Token::Eof | Token::Error(_));
            out.push(t);
            if done {
                return out;
            }
        }
    }

    fn sym(s: &str) -> Token {
        Token::Symbol(s.to_string())
    }

    fn ident(s: &str) -> Token {
        Token::Ident(s.to_string())
    }

    fn num(n: u32) -> Token {
        Token::Number(n.into())
    }

    #[test]
    fn assignment() {
        assert_eq!(
            tokens("x := 1 + 2 * 3"),
            vec![
                ident("x"),
                sym(":="),
                num(1),
                sym("+"),
                num(2),
                sym("*"),
                num(3),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn maximal_munch() {
        // `ifx` must scan as one identifier, not as `if` followed by `x`.
        assert_eq!(tokens("ifx"), vec![ident("ifx"), Token::Eof]);
        assert_eq!(tokens("if x"), vec![sym("if"), ident("x"), Token::Eof]);
    }

    #[test]
    fn interrupted_symbol_degrades_to_identifier() {
        // `:=` is registered, but the path past `:` breaks on `x`.
        assert_eq!(tokens(":=x"), vec![ident(":=x"), Token::Eof]);
        // A partial symbol path without a mark is also an identifier.
        let mut s = Scanner::new(CharReader::from_str(":"));
        s.add_symbol(":=");
        assert_eq!(s.next_token().token, ident(":"));
    }

    #[test]
    fn numbers_are_arbitrary_precision() {
        let big = "123456789012345678901234567890";
        assert_eq!(
            tokens(big),
            vec![
                Token::Number(big.parse::<num::BigInt>().unwrap()),
                Token::Eof
            ]
        );
    }

    #[test]
    fn string_literals() {
        assert_eq!(
            tokens("\"hello world\""),
            vec![Token::Str("hello world".to_string()), Token::Eof]
        );
        assert_eq!(
            tokens(r#""say \"hi\" \\ once""#),
            vec![Token::Str("say \"hi\" \\ once".to_string()), Token::Eof]
        );
    }

    #[test]
    fn string_newline_policy() {
        assert!(matches!(
            tokens("\"a\nb\"").last(),
            Some(Token::Error(_))
        ));
        let mut s = Scanner::new(CharReader::from_str("\"a\nb\""));
        s.add_string_scanner(true);
        assert_eq!(s.next_token().token, Token::Str("a\nb".to_string()));
    }

    #[test]
    fn positions() {
        let mut s = scanner("x\n  := 1");
        let x = s.next_token();
        assert_eq!((x.loc.line, x.loc.column), (1, 1));
        assert_eq!(x.trailing, Some('\n'));
        let assign = s.next_token();
        assert_eq!((assign.loc.line, assign.loc.column), (2, 3));
        let one = s.next_token();
        assert_eq!((one.loc.line, one.loc.column), (2, 6));
        assert_eq!(one.trailing, None);
    }

    #[test]
    fn io_failure_becomes_error_token() {
        struct FailAfter(usize);
        impl Iterator for FailAfter {
            type Item = io::Result<char>;
            fn next(&mut self) -> Option<io::Result<char>> {
                if self.0 == 0 {
                    Some(Err(io::Error::new(io::ErrorKind::Other, "disk on fire")))
                } else {
                    self.0 -= 1;
                    Some(Ok('a'))
                }
            }
        }
        let mut s = Scanner::new(CharReader::new(FailAfter(3)));
        assert_eq!(s.next_token().token, ident("aaa"));
        assert!(matches!(s.next_token().token, Token::Error(_)));
    }

    #[test]
    fn utf8_from_reader() {
        let mut s = Scanner::new(CharReader::from_read("grüße zürich".as_bytes()));
        assert_eq!(s.next_token().token, ident("grüße"));
        assert_eq!(s.next_token().token, ident("zürich"));
        assert_eq!(s.next_token().token, Token::Eof);
    }
}
