//! Parsing and the high-level evaluation entry points.
//!
//! The parser is a Pratt parser over the token slice produced by the lexer.
//! [`Engine`] ties lexing, parsing, evaluation, and node collection together
//! under one [`EngineConfig`], and [`Expression`] keeps a parsed tree around
//! for repeated evaluation.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::context::{EngineConfig, Scope, ScopePolicy};
use crate::decimal::Decimal;
use crate::error::{ExprError, ParseError, Result};
use crate::eval::eval_ast;
use crate::lexer::{Token, TokenKind, tokenize};
use crate::traverse::collect_nodes;
use crate::types::{Node, NodeKind, Operator};

/// Token binding powers for the Pratt parser
#[derive(Debug, Clone, Copy)]
struct BindingPower {
    left: u8,
    right: u8,
}

impl BindingPower {
    const fn new(left: u8, right: u8) -> Self {
        Self { left, right }
    }

    // For left-associative operators, right binding power is left + 1
    const fn left_assoc(power: u8) -> Self {
        Self::new(power, power + 1)
    }

    // For right-associative operators, right binding power is same as left
    const fn right_assoc(power: u8) -> Self {
        Self::new(power, power)
    }
}

// Must be lower than `^` so that -2^2 parses as -(2^2)
const PREFIX_BINDING_POWER: u8 = 14;

const END_OF_INPUT: &str = "end of input";

struct PrattParser<'t> {
    tokens: &'t [Token],
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl<'t> PrattParser<'t> {
    fn new(tokens: &'t [Token], max_depth: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            max_depth,
        }
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'t Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    /// Offset reported for errors at end of input: one past the last token.
    fn end_position(&self) -> usize {
        self.tokens.last().map_or(0, Token::end)
    }

    fn error_here(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(tok) => ParseError::new(expected, tok.text.as_str(), tok.position),
            None => ParseError::new(expected, END_OF_INPUT, self.end_position()),
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> core::result::Result<&'t Token, ParseError> {
        match self.peek() {
            Some(tok) if tok.kind == kind => {
                self.pos += 1;
                Ok(tok)
            }
            _ => Err(self.error_here(expected)),
        }
    }

    fn get_binding_power(op: Operator) -> BindingPower {
        match op {
            Operator::Add | Operator::Subtract => BindingPower::left_assoc(9),
            Operator::Multiply | Operator::Divide => BindingPower::left_assoc(10),
            Operator::Pow => BindingPower::right_assoc(15),
            Operator::UnaryMinus | Operator::UnaryPlus => BindingPower::new(PREFIX_BINDING_POWER, PREFIX_BINDING_POWER),
        }
    }

    /// Enters one nesting level, failing once `max_depth` is exceeded.
    fn enter(&mut self) -> core::result::Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(self.error_here("shallower nesting"));
        }
        Ok(())
    }

    fn parse_expr(&mut self, min_bp: u8) -> core::result::Result<Node, ParseError> {
        // Check recursion depth to prevent stack overflow
        self.enter()?;
        let lhs = self.parse_prefix_or_primary()?;
        let result = self.parse_infix_operators(lhs, min_bp);
        self.depth -= 1;
        result
    }

    fn peek_prefix(&self) -> Option<Operator> {
        self.peek()
            .and_then(Token::operator_char)
            .and_then(Operator::unary_from_char)
    }

    /// Parses a run of prefix signs in a loop; each sign still counts as one
    /// nesting level.
    fn parse_prefix_or_primary(&mut self) -> core::result::Result<Node, ParseError> {
        let mut prefixes = Vec::new();
        while let Some(op) = self.peek_prefix() {
            self.next();
            self.enter()?;
            prefixes.push(op);
        }
        if prefixes.is_empty() {
            return self.parse_primary();
        }

        let operand = self.parse_primary()?;
        let mut node = self.parse_infix_operators(operand, PREFIX_BINDING_POWER)?;
        self.depth -= prefixes.len();
        for op in prefixes.into_iter().rev() {
            node = Node::unary(op, node);
        }
        Ok(node)
    }

    fn parse_infix_operators(&mut self, mut lhs: Node, min_bp: u8) -> core::result::Result<Node, ParseError> {
        loop {
            let Some(op) = self
                .peek()
                .and_then(Token::operator_char)
                .and_then(Operator::binary_from_char)
            else {
                break;
            };

            let bp = Self::get_binding_power(op);
            if bp.left < min_bp {
                break;
            }
            self.next();

            // Right-associative `^` re-enters at its own level
            let rhs = if op == Operator::Pow {
                self.parse_expr(bp.right - 1)?
            } else {
                self.parse_expr(bp.right)?
            };
            lhs = Node::binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_primary(&mut self) -> core::result::Result<Node, ParseError> {
        let Some(tok) = self.peek() else {
            return Err(self.error_here("expression"));
        };
        match tok.kind {
            TokenKind::Number => {
                self.next();
                let value: Decimal = tok
                    .text
                    .parse()
                    .map_err(|_| ParseError::new("number in range", tok.text.as_str(), tok.position))?;
                Ok(Node::Constant { value })
            }
            TokenKind::Identifier => {
                self.next();
                match self.peek() {
                    Some(next) if next.kind == TokenKind::LeftParen => {
                        self.next();
                        let args = self.parse_arguments()?;
                        Ok(Node::function(tok.text.as_str(), args))
                    }
                    _ => Ok(Node::symbol(tok.text.as_str())),
                }
            }
            TokenKind::LeftParen => {
                self.next();
                let inner = self.parse_expr(0)?;
                self.expect(TokenKind::RightParen, "')'")?;
                Ok(Node::parenthesis(inner))
            }
            _ => Err(self.error_here("expression")),
        }
    }

    /// Parses `arg, arg, ...)` after the opening parenthesis of a call.
    fn parse_arguments(&mut self) -> core::result::Result<Vec<Node>, ParseError> {
        let mut args = Vec::new();
        if self.peek().is_some_and(|t| t.kind == TokenKind::RightParen) {
            self.next();
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr(0)?);
            match self.peek() {
                Some(tok) if tok.kind == TokenKind::Comma => {
                    self.next();
                }
                Some(tok) if tok.kind == TokenKind::RightParen => {
                    self.next();
                    return Ok(args);
                }
                _ => return Err(self.error_here("',' or ')'")),
            }
        }
    }

    fn parse(&mut self) -> core::result::Result<Node, ParseError> {
        self.depth = 0;
        let expr = self.parse_expr(0)?;

        // Check for unexpected trailing tokens
        if self.peek().is_some() {
            return Err(self.error_here("operator or end of input"));
        }
        Ok(expr)
    }
}

/// Builds a syntax tree from a token sequence.
///
/// Fails on empty input, unbalanced parentheses, missing operands, stray
/// commas, and tokens left over after a complete expression.
pub fn parse(tokens: &[Token]) -> core::result::Result<Node, ParseError> {
    parse_with_max_depth(tokens, EngineConfig::DEFAULT_MAX_DEPTH)
}

/// Like [`parse`], with an explicit bound on nesting depth.
pub fn parse_with_max_depth(tokens: &[Token], max_depth: usize) -> core::result::Result<Node, ParseError> {
    PrattParser::new(tokens, max_depth).parse()
}

/// Parse an expression string into a syntax tree with the default limits.
///
/// # Examples
///
/// ```
/// use mathexpr::engine::parse_expression;
/// use mathexpr::NodeKind;
///
/// let ast = parse_expression("2 * (x + 1)").unwrap();
/// assert_eq!(ast.kind(), NodeKind::Operator);
/// assert_eq!(ast.to_string(), "2 * (x + 1)");
/// ```
pub fn parse_expression(input: &str) -> Result<Node> {
    parse_with_config(input, &EngineConfig::default())
}

fn parse_with_config(input: &str, config: &EngineConfig) -> Result<Node> {
    if input.len() > config.max_expression_length {
        return Err(ParseError::new(
            format!("at most {} bytes", config.max_expression_length),
            format!("{} bytes", input.len()),
            config.max_expression_length,
        )
        .into());
    }
    let tokens = tokenize(input)?;
    Ok(parse_with_max_depth(&tokens, config.max_depth)?)
}

/// A parsed expression, ready to be evaluated any number of times.
///
/// ```
/// use mathexpr::{Expression, Scope};
///
/// let expr = Expression::parse("x ^ 2 + 1").unwrap();
/// for (x, expected) in [(1, "2"), (2, "5"), (3, "10")] {
///     let scope = Scope::new().with("x", x);
///     assert_eq!(expr.evaluate(&scope).unwrap().to_string(), expected);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Expression {
    source: String,
    ast: Arc<Node>,
}

impl Expression {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(Self {
            source: text.to_string(),
            ast: Arc::new(parse_expression(text)?),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &Node {
        &self.ast
    }

    pub fn evaluate(&self, scope: &Scope) -> Result<Decimal> {
        Ok(eval_ast(&self.ast, scope)?)
    }

    /// Canonical texts of the nodes of `kind`, in pre-order.
    pub fn collect_nodes(&self, kind: NodeKind) -> Vec<String> {
        collect_nodes(&self.ast, kind)
    }
}

/// Parsed trees keyed by source text, evicting the oldest entry once
/// `capacity` trees are held.
#[derive(Debug, Default)]
struct ParseCache {
    trees: HashMap<String, Arc<Node>>,
    order: VecDeque<String>,
    capacity: usize,
}

impl ParseCache {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            trees: HashMap::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    fn get(&self, expression: &str) -> Option<Arc<Node>> {
        self.trees.get(expression).cloned()
    }

    fn insert(&mut self, expression: &str, ast: Arc<Node>) {
        if self.capacity == 0 || self.trees.contains_key(expression) {
            return;
        }
        while self.trees.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.trees.remove(&oldest);
        }
        self.order.push_back(expression.to_string());
        self.trees.insert(expression.to_string(), ast);
    }

    fn len(&self) -> usize {
        self.trees.len()
    }

    fn clear(&mut self) {
        self.trees.clear();
        self.order.clear();
    }
}

/// Configured entry point for evaluating expressions.
///
/// An engine is `Send + Sync`; with [`EngineConfig::cache_parsed`] enabled
/// it keeps up to [`EngineConfig::cache_capacity`] parsed trees keyed by
/// their source text, dropping the oldest first. The cache lock is only held
/// for lookup and insertion, never during evaluation.
///
/// # Examples
///
/// ```
/// use mathexpr::{Engine, EngineConfig, Scope};
///
/// let engine = Engine::new(EngineConfig::default().with_precision(5).with_cache(true));
/// let scope = Scope::new().with("x", 1);
/// assert_eq!(engine.evaluate_with_scope("x / 3", &scope).unwrap(), "0.33333");
/// assert_eq!(engine.cached_len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct Engine {
    config: EngineConfig,
    cache: Option<Mutex<ParseCache>>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let cache = config
            .cache_parsed
            .then(|| Mutex::new(ParseCache::with_capacity(config.cache_capacity)));
        Self { config, cache }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parses `expression`, reusing a cached tree when caching is enabled.
    pub fn parse(&self, expression: &str) -> Result<Arc<Node>> {
        let Some(cache) = &self.cache else {
            return Ok(Arc::new(parse_with_config(expression, &self.config)?));
        };

        let cached = cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(expression);
        if let Some(ast) = cached {
            return Ok(ast);
        }

        let ast = Arc::new(parse_with_config(expression, &self.config)?);
        cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(expression, Arc::clone(&ast));
        Ok(ast)
    }

    /// Parses `expression` into a reusable [`Expression`].
    pub fn compile(&self, expression: &str) -> Result<Expression> {
        Ok(Expression {
            source: expression.to_string(),
            ast: self.parse(expression)?,
        })
    }

    /// Evaluates an expression that uses no variables.
    pub fn evaluate(&self, expression: &str) -> Result<String> {
        let value = self.evaluate_decimal(expression, &Scope::new())?;
        Ok(self.render(&value))
    }

    /// Evaluates an expression with the bindings in `scope`.
    ///
    /// Under [`ScopePolicy::RequireNonEmpty`] an empty scope is rejected
    /// before the expression is parsed.
    pub fn evaluate_with_scope(&self, expression: &str, scope: &Scope) -> Result<String> {
        if self.config.scope_policy == ScopePolicy::RequireNonEmpty && scope.is_empty() {
            return Err(ExprError::EmptyScope);
        }
        let value = self.evaluate_decimal(expression, scope)?;
        Ok(self.render(&value))
    }

    /// Evaluates to the exact value rather than its rendered text.
    pub fn evaluate_decimal(&self, expression: &str, scope: &Scope) -> Result<Decimal> {
        let ast = self.parse(expression)?;
        Ok(eval_ast(&ast, scope)?)
    }

    /// Canonical texts of the nodes of `kind`, in pre-order.
    ///
    /// Only lexing and parsing can fail; no scope is consulted.
    pub fn collect_node_names(&self, expression: &str, kind: NodeKind) -> Result<Vec<String>> {
        let ast = self.parse(expression)?;
        Ok(collect_nodes(&ast, kind))
    }

    /// Result text with the configured precision.
    pub fn render(&self, value: &Decimal) -> String {
        value.to_plain_string_with_precision(self.config.precision)
    }

    /// Number of cached trees.
    pub fn cached_len(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| {
            cache
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .len()
        })
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clear();
        }
    }
}

/// Evaluates an expression with no variables and returns the plain decimal text.
///
/// # Examples
///
/// ```
/// use mathexpr::evaluate;
///
/// assert_eq!(evaluate("0.1 + 0.2").unwrap(), "0.3");
/// assert_eq!(evaluate("1 / 3").unwrap(), "0.3333333333333333333333333333333333");
/// assert!(evaluate("1 / 0").is_err());
/// ```
pub fn evaluate(expression: &str) -> Result<String> {
    Engine::default().evaluate(expression)
}

/// Evaluates an expression with the bindings in `scope`.
///
/// ```
/// use mathexpr::{Scope, evaluate_with_scope};
///
/// let scope = Scope::new().with("x", 5);
/// assert_eq!(evaluate_with_scope("x + 1", &scope).unwrap(), "6");
/// ```
pub fn evaluate_with_scope(expression: &str, scope: &Scope) -> Result<String> {
    Engine::default().evaluate_with_scope(expression, scope)
}

/// Canonical texts of every node of `kind` in `expression`, in pre-order.
///
/// ```
/// use mathexpr::{NodeKind, collect_node_names};
///
/// let names = collect_node_names("num1 + num1 * 2", NodeKind::Symbol).unwrap();
/// assert_eq!(names, vec!["num1", "num1"]);
/// ```
pub fn collect_node_names(expression: &str, kind: NodeKind) -> Result<Vec<String>> {
    Engine::default().collect_node_names(expression, kind)
}
