//! Tokenizer for expression text.
//!
//! The lexer walks the input one character at a time and yields
//! [`Token`]s carrying their kind, source text, and byte offset. Whitespace
//! separates tokens and is otherwise dropped.

use core::fmt;

use crate::error::LexError;

/// Token categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Digits with an optional fraction and exponent: `42`, `3.14`, `.5`, `1e-3`.
    Number,
    /// A letter or `_` followed by letters, digits, or `_`.
    Identifier,
    /// One of `+ - * / ^`.
    Operator,
    LeftParen,
    RightParen,
    Comma,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Number => "number",
            TokenKind::Identifier => "identifier",
            TokenKind::Operator => "operator",
            TokenKind::LeftParen => "'('",
            TokenKind::RightParen => "')'",
            TokenKind::Comma => "','",
        };
        f.pad(name)
    }
}

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Byte offset of the first character.
    pub position: usize,
}

impl Token {
    /// Byte offset one past the last character.
    pub fn end(&self) -> usize {
        self.position + self.text.len()
    }

    /// The operator character, for operator tokens.
    pub fn operator_char(&self) -> Option<char> {
        match self.kind {
            TokenKind::Operator => self.text.chars().next(),
            _ => None,
        }
    }
}

/// The lexer struct, which produces tokens from an input string.
#[derive(Clone)]
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    failed: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            failed: false,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset..)?.chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn eat_digits(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        self.pos > start
    }

    /// Consumes an exponent suffix only when at least one digit follows the
    /// marker and optional sign; otherwise leaves the position untouched.
    fn eat_exponent(&mut self) {
        if !matches!(self.peek(), Some('e' | 'E')) {
            return;
        }
        let digit_offset = match self.peek_at(1) {
            Some('+' | '-') => 2,
            _ => 1,
        };
        if self.peek_at(digit_offset).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += digit_offset;
            self.eat_digits();
        }
    }

    fn lex_number(&mut self) {
        self.eat_digits();
        if self.peek() == Some('.') {
            self.advance();
            self.eat_digits();
        }
        self.eat_exponent();
    }

    fn lex_identifier(&mut self) {
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance();
        }
    }

    /// Get the next token from the input.
    pub fn next_token(&mut self) -> Option<Result<Token, LexError>> {
        if self.failed {
            return None;
        }
        self.skip_whitespace();
        let start = self.pos;
        let c = self.peek()?;

        let kind = if c.is_ascii_digit()
            || (c == '.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit()))
        {
            self.lex_number();
            TokenKind::Number
        } else if c.is_ascii_alphabetic() || c == '_' {
            self.lex_identifier();
            TokenKind::Identifier
        } else {
            let kind = match c {
                '+' | '-' | '*' | '/' | '^' => TokenKind::Operator,
                '(' => TokenKind::LeftParen,
                ')' => TokenKind::RightParen,
                ',' => TokenKind::Comma,
                _ => {
                    self.failed = true;
                    return Some(Err(LexError {
                        position: start,
                        character: c,
                    }));
                }
            };
            self.advance();
            kind
        };

        Some(Ok(Token {
            kind,
            text: self.input[start..self.pos].to_string(),
            position: start,
        }))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Splits `input` into tokens, stopping at the first unrecognized character.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(input).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_and_texts(input: &str) -> Vec<(TokenKind, String)> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn test_basic_expression() {
        let tokens = tokenize("x+1").unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].text, "x");
        assert_eq!(tokens[0].position, 0);
        assert_eq!(tokens[1].kind, TokenKind::Operator);
        assert_eq!(tokens[1].operator_char(), Some('+'));
        assert_eq!(tokens[2].kind, TokenKind::Number);
        assert_eq!(tokens[2].position, 2);
    }

    #[test]
    fn test_whitespace_and_positions() {
        let tokens = tokenize("  num1 *\t( 2.5 )").unwrap();
        let positions: Vec<usize> = tokens.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![2, 7, 9, 11, 15]);
        assert_eq!(tokens[3].end(), 14);
    }

    #[test]
    fn test_number_forms() {
        assert_eq!(
            kinds_and_texts("3.14 .5 10. 1e3 2.5E-2"),
            vec![
                (TokenKind::Number, "3.14".to_string()),
                (TokenKind::Number, ".5".to_string()),
                (TokenKind::Number, "10.".to_string()),
                (TokenKind::Number, "1e3".to_string()),
                (TokenKind::Number, "2.5E-2".to_string()),
            ]
        );
    }

    #[test]
    fn test_exponent_requires_digits() {
        // `2e` is a number followed by the identifier `e`
        assert_eq!(
            kinds_and_texts("2e"),
            vec![
                (TokenKind::Number, "2".to_string()),
                (TokenKind::Identifier, "e".to_string()),
            ]
        );
        assert_eq!(
            kinds_and_texts("2e+x"),
            vec![
                (TokenKind::Number, "2".to_string()),
                (TokenKind::Identifier, "e".to_string()),
                (TokenKind::Operator, "+".to_string()),
                (TokenKind::Identifier, "x".to_string()),
            ]
        );
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(
            kinds_and_texts("_tmp x2 sqrt"),
            vec![
                (TokenKind::Identifier, "_tmp".to_string()),
                (TokenKind::Identifier, "x2".to_string()),
                (TokenKind::Identifier, "sqrt".to_string()),
            ]
        );
    }

    #[test]
    fn test_punctuation() {
        let kinds: Vec<TokenKind> = tokenize("max(a,b)")
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier,
                TokenKind::LeftParen,
                TokenKind::Identifier,
                TokenKind::Comma,
                TokenKind::Identifier,
                TokenKind::RightParen,
            ]
        );
    }

    #[test]
    fn test_unknown_character() {
        match tokenize("1 + $") {
            Err(err) => {
                assert_eq!(err.position, 4);
                assert_eq!(err.character, '$');
            }
            Ok(tokens) => panic!("Expected lex error, got {tokens:?}"),
        }
        // A lone dot cannot start a number
        assert!(tokenize("1 + .").is_err());
    }

    #[test]
    fn test_iterator_stops_after_error() {
        let mut lexer = Lexer::new("# 1");
        assert!(matches!(lexer.next(), Some(Err(_))));
        assert!(lexer.next().is_none());
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").unwrap().is_empty());
        assert!(tokenize("   ").unwrap().is_empty());
    }
}
