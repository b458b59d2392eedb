//! Error types and handling for the mathexpr crate.
//!
//! Failures are split by the stage that raised them: the lexer reports
//! [`LexError`], the parser reports [`ParseError`], and the evaluator reports
//! [`EvalError`]. [`ExprError`] wraps all three so that the pipeline entry
//! points can return a single error type while keeping the original context
//! (byte position for lexing and parsing, symbol or function name for
//! evaluation) available for building precise user messages.

use core::fmt;

/// Result type used throughout the crate.
///
/// This is a convenience type alias that uses the `ExprError` type for the error variant.
pub type Result<T> = core::result::Result<T, ExprError>;

/// An unrecognized character in the expression text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    /// Byte offset of the offending character.
    pub position: usize,
    /// The character that could not start any token.
    pub character: char,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unexpected character '{}' at position {}",
            self.character, self.position
        )
    }
}

impl std::error::Error for LexError {}

/// A grammar violation found while building the syntax tree.
///
/// `found` holds the text of the offending token, or `"end of input"` when the
/// token stream ran out. For end-of-input errors `position` points one byte
/// past the last token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// What the parser was looking for.
    pub expected: String,
    /// What it got instead.
    pub found: String,
    /// Byte offset of the offending token.
    pub position: usize,
}

impl ParseError {
    pub fn new(expected: impl Into<String>, found: impl Into<String>, position: usize) -> Self {
        Self {
            expected: expected.into(),
            found: found.into(),
            position,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Expected {} at position {}, found '{}'",
            self.expected, self.position, self.found
        )
    }
}

impl std::error::Error for ParseError {}

/// Classifies evaluation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvalErrorKind {
    /// A symbol is bound neither in the scope nor as a built-in constant.
    UnknownSymbol,
    /// A call names a function missing from the built-in table.
    UnknownFunction,
    /// A function or operator received the wrong number of operands.
    WrongArity,
    /// Division (or a negative power) of an exact zero.
    DivisionByZero,
    /// The operation has no real-valued result for its input.
    DomainError,
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EvalErrorKind::UnknownSymbol => "Unknown symbol",
            EvalErrorKind::UnknownFunction => "Unknown function",
            EvalErrorKind::WrongArity => "Wrong number of arguments",
            EvalErrorKind::DivisionByZero => "Division by zero",
            EvalErrorKind::DomainError => "Domain error",
        };
        f.write_str(name)
    }
}

/// A failure raised while walking the syntax tree.
///
/// For `UnknownSymbol` and `UnknownFunction` the `detail` is exactly the
/// offending name; for the other kinds it is a short description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub detail: String,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn unknown_symbol(name: &str) -> Self {
        Self::new(EvalErrorKind::UnknownSymbol, name)
    }

    pub fn unknown_function(name: &str) -> Self {
        Self::new(EvalErrorKind::UnknownFunction, name)
    }

    pub fn wrong_arity(name: &str, expected: impl fmt::Display, found: usize) -> Self {
        Self::new(
            EvalErrorKind::WrongArity,
            format!("'{name}' expects {expected}, found {found}"),
        )
    }

    pub fn division_by_zero(detail: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::DivisionByZero, detail)
    }

    pub fn domain(detail: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::DomainError, detail)
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EvalErrorKind::UnknownSymbol | EvalErrorKind::UnknownFunction => {
                write!(f, "{}: '{}'", self.kind, self.detail)
            }
            _ => write!(f, "{}: {}", self.kind, self.detail),
        }
    }
}

impl std::error::Error for EvalError {}

/// Error type for the whole tokenize → parse → evaluate pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    /// The lexer met a character that cannot start a token.
    Lex(LexError),

    /// The token stream does not form a single well-formed expression.
    Parse(ParseError),

    /// The tree was well formed but could not be evaluated.
    Eval(EvalError),

    /// A scope was required but the caller supplied an empty one.
    ///
    /// Only raised when the engine runs with `ScopePolicy::RequireNonEmpty`.
    EmptyScope,
}

impl ExprError {
    /// The evaluation failure kind, if this is an evaluation error.
    pub fn eval_kind(&self) -> Option<EvalErrorKind> {
        match self {
            ExprError::Eval(err) => Some(err.kind),
            _ => None,
        }
    }

    /// Byte offset of the failure for lexing and parsing errors.
    pub fn position(&self) -> Option<usize> {
        match self {
            ExprError::Lex(err) => Some(err.position),
            ExprError::Parse(err) => Some(err.position),
            _ => None,
        }
    }

    /// Stable numeric code used across the C ABI. Always positive.
    pub fn error_code(&self) -> i32 {
        match self {
            ExprError::Lex(_) => 1,
            ExprError::Parse(_) => 2,
            ExprError::Eval(err) => match err.kind {
                EvalErrorKind::UnknownSymbol => 10,
                EvalErrorKind::UnknownFunction => 11,
                EvalErrorKind::WrongArity => 12,
                EvalErrorKind::DivisionByZero => 13,
                EvalErrorKind::DomainError => 14,
            },
            ExprError::EmptyScope => 20,
        }
    }
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprError::Lex(err) => write!(f, "Tokenizer error: {err}"),
            ExprError::Parse(err) => write!(f, "Syntax error: {err}"),
            ExprError::Eval(err) => write!(f, "{err}"),
            ExprError::EmptyScope => write!(f, "Scope can't be empty"),
        }
    }
}

impl std::error::Error for ExprError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExprError::Lex(err) => Some(err),
            ExprError::Parse(err) => Some(err),
            ExprError::Eval(err) => Some(err),
            ExprError::EmptyScope => None,
        }
    }
}

impl From<LexError> for ExprError {
    fn from(err: LexError) -> ExprError {
        ExprError::Lex(err)
    }
}

impl From<ParseError> for ExprError {
    fn from(err: ParseError) -> ExprError {
        ExprError::Parse(err)
    }
}

impl From<EvalError> for ExprError {
    fn from(err: EvalError) -> ExprError {
        ExprError::Eval(err)
    }
}
