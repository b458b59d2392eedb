//! Type definitions for the expression parser and evaluator.
//!
//! This module contains the syntax tree produced by the parser ([`Node`]),
//! the operator set ([`Operator`]), and the node classification used by the
//! tree walker ([`NodeKind`] and the [`NodeKinds`] bit set).

use core::fmt;
use core::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::decimal::Decimal;

/// Arithmetic operators, binary and unary.
///
/// Serialized with the operation name (`"add"`, `"unaryMinus"`, ...) so that
/// the binary and unary forms of `-` and `+` stay distinct.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Pow,
    UnaryMinus,
    UnaryPlus,
}

impl Operator {
    /// Binary operator for a single-character token.
    pub fn binary_from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Subtract),
            '*' => Some(Operator::Multiply),
            '/' => Some(Operator::Divide),
            '^' => Some(Operator::Pow),
            _ => None,
        }
    }

    /// Prefix operator for a single-character token.
    pub fn unary_from_char(c: char) -> Option<Self> {
        match c {
            '-' => Some(Operator::UnaryMinus),
            '+' => Some(Operator::UnaryPlus),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add | Operator::UnaryPlus => "+",
            Operator::Subtract | Operator::UnaryMinus => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Pow => "^",
        }
    }

    pub fn is_unary(self) -> bool {
        matches!(self, Operator::UnaryMinus | Operator::UnaryPlus)
    }

    /// Number of operands the operator takes.
    pub fn arity(self) -> usize {
        if self.is_unary() { 1 } else { 2 }
    }

    /// Relative binding strength, higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            Operator::Add | Operator::Subtract => 1,
            Operator::Multiply | Operator::Divide => 2,
            Operator::UnaryMinus | Operator::UnaryPlus => 3,
            Operator::Pow => 4,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Syntax tree node.
///
/// Every node owns its children, so a tree is a strict hierarchy without
/// sharing. Trees are never mutated by evaluation or traversal and can be
/// shared read-only between threads.
///
/// The serialized form is internally tagged with the node type name:
///
/// ```
/// use mathexpr::Node;
///
/// let node = Node::symbol("x");
/// let json = serde_json::to_string(&node).unwrap();
/// assert_eq!(json, r#"{"type":"SymbolNode","name":"x"}"#);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    /// A literal number.
    ///
    /// Examples: `3.14`, `42`, `.5`
    #[serde(rename = "ConstantNode")]
    Constant { value: Decimal },

    /// A named reference resolved against the scope.
    ///
    /// Examples: `x`, `num1`, `pi`
    #[serde(rename = "SymbolNode")]
    Symbol { name: String },

    /// An arithmetic operation. `operands` holds one node for the unary
    /// operators and two for the binary ones.
    ///
    /// Examples: `a + b`, `-x`, `2 ^ n`
    #[serde(rename = "OperatorNode")]
    Operator { op: Operator, operands: Vec<Node> },

    /// A call to a built-in function.
    ///
    /// Examples: `cos(x)`, `max(a, b, c)`, `rand()`
    #[serde(rename = "FunctionNode")]
    Function { name: String, args: Vec<Node> },

    /// Grouping parentheses written in the source.
    ///
    /// Kept as a node of its own so that grouping can be told apart from
    /// call syntax; evaluation passes straight through it.
    #[serde(rename = "ParenthesisNode")]
    Parenthesis { content: Box<Node> },
}

impl Node {
    pub fn constant(value: impl Into<Decimal>) -> Self {
        Node::Constant {
            value: value.into(),
        }
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Node::Symbol { name: name.into() }
    }

    pub fn binary(op: Operator, lhs: Node, rhs: Node) -> Self {
        debug_assert!(!op.is_unary());
        Node::Operator {
            op,
            operands: vec![lhs, rhs],
        }
    }

    pub fn unary(op: Operator, operand: Node) -> Self {
        debug_assert!(op.is_unary());
        Node::Operator {
            op,
            operands: vec![operand],
        }
    }

    pub fn function(name: impl Into<String>, args: Vec<Node>) -> Self {
        Node::Function {
            name: name.into(),
            args,
        }
    }

    pub fn parenthesis(content: Node) -> Self {
        Node::Parenthesis {
            content: Box::new(content),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Constant { .. } => NodeKind::Constant,
            Node::Symbol { .. } => NodeKind::Symbol,
            Node::Operator { .. } => NodeKind::Operator,
            Node::Function { .. } => NodeKind::Function,
            Node::Parenthesis { .. } => NodeKind::Parenthesis,
        }
    }

    /// Direct children, left to right.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Constant { .. } | Node::Symbol { .. } => &[],
            Node::Operator { operands, .. } => operands,
            Node::Function { args, .. } => args,
            Node::Parenthesis { content } => core::slice::from_ref(content.as_ref()),
        }
    }

    /// Binding strength used to decide where rendering needs parentheses.
    fn binding(&self) -> u8 {
        match self {
            Node::Operator { op, .. } => op.precedence(),
            Node::Constant { value } if value.is_negative() => Operator::UnaryMinus.precedence(),
            _ => u8::MAX,
        }
    }
}

/// Tears the tree down with an explicit stack; the derived drop would recurse
/// once per level.
impl Drop for Node {
    fn drop(&mut self) {
        let mut pending = match self {
            Node::Operator { operands, .. } if !operands.is_empty() => core::mem::take(operands),
            Node::Function { args, .. } if !args.is_empty() => core::mem::take(args),
            Node::Parenthesis { content } => vec![take_content(content)],
            _ => return,
        };
        while let Some(mut node) = pending.pop() {
            match &mut node {
                Node::Operator { operands, .. } => pending.append(operands),
                Node::Function { args, .. } => pending.append(args),
                Node::Parenthesis { content } => pending.push(take_content(content)),
                Node::Constant { .. } | Node::Symbol { .. } => {}
            }
        }
    }
}

fn take_content(content: &mut Box<Node>) -> Node {
    core::mem::replace(
        content.as_mut(),
        Node::Symbol {
            name: String::new(),
        },
    )
}

/// Pending output while rendering a tree.
enum Piece<'a> {
    Node(&'a Node),
    Text(&'static str),
    Infix(Operator),
}

fn push_operand<'a>(pieces: &mut Vec<Piece<'a>>, node: &'a Node, parens: bool) {
    if parens {
        pieces.push(Piece::Text(")"));
        pieces.push(Piece::Node(node));
        pieces.push(Piece::Text("("));
    } else {
        pieces.push(Piece::Node(node));
    }
}

// Pushed in reverse so the leftmost item is written first
fn push_list<'a>(pieces: &mut Vec<Piece<'a>>, items: &'a [Node]) {
    pieces.push(Piece::Text(")"));
    for (i, item) in items.iter().enumerate().rev() {
        pieces.push(Piece::Node(item));
        if i > 0 {
            pieces.push(Piece::Text(", "));
        }
    }
}

/// Canonical text form.
///
/// Symbols print their name, constants their plain decimal value, calls
/// `name(a, b)`, grouping `(inner)`, binary operators `lhs op rhs`, and unary
/// operators `-x`. Parentheses are inserted where a child binds looser than
/// its parent, so the text always parses back to a tree with the same value.
///
/// Rendering keeps its pending output on an explicit stack, so trees of any
/// depth can be written.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pieces = vec![Piece::Node(self)];
        while let Some(piece) = pieces.pop() {
            let node = match piece {
                Piece::Text(text) => {
                    f.write_str(text)?;
                    continue;
                }
                Piece::Infix(op) => {
                    write!(f, " {op} ")?;
                    continue;
                }
                Piece::Node(node) => node,
            };
            match node {
                Node::Constant { value } => write!(f, "{value}")?,
                Node::Symbol { name } => f.write_str(name)?,
                Node::Parenthesis { content } => {
                    f.write_str("(")?;
                    pieces.push(Piece::Text(")"));
                    pieces.push(Piece::Node(content));
                }
                Node::Function { name, args } => {
                    write!(f, "{name}(")?;
                    push_list(&mut pieces, args);
                }
                Node::Operator { op, operands } => {
                    let prec = op.precedence();
                    match operands.as_slice() {
                        [operand] => {
                            f.write_str(op.symbol())?;
                            push_operand(&mut pieces, operand, operand.binding() < prec);
                        }
                        [lhs, rhs] => {
                            let right_assoc = *op == Operator::Pow;
                            let lhs_parens = if right_assoc {
                                lhs.binding() <= prec
                            } else {
                                lhs.binding() < prec
                            };
                            let rhs_parens = if right_assoc {
                                rhs.binding() < prec
                            } else {
                                rhs.binding() <= prec
                            };
                            push_operand(&mut pieces, rhs, rhs_parens);
                            pieces.push(Piece::Infix(*op));
                            push_operand(&mut pieces, lhs, lhs_parens);
                        }
                        _ => {
                            write!(f, "{}(", op.symbol())?;
                            push_list(&mut pieces, operands);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Classifies syntax tree nodes for traversal filters.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    #[serde(rename = "SymbolNode")]
    Symbol,
    #[serde(rename = "OperatorNode")]
    Operator,
    #[serde(rename = "ConstantNode")]
    Constant,
    #[serde(rename = "ParenthesisNode")]
    Parenthesis,
    #[serde(rename = "FunctionNode")]
    Function,
}

impl NodeKind {
    pub const ALL: [NodeKind; 5] = [
        NodeKind::Symbol,
        NodeKind::Operator,
        NodeKind::Constant,
        NodeKind::Parenthesis,
        NodeKind::Function,
    ];

    /// Node type name, e.g. `"SymbolNode"`.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Symbol => "SymbolNode",
            NodeKind::Operator => "OperatorNode",
            NodeKind::Constant => "ConstantNode",
            NodeKind::Parenthesis => "ParenthesisNode",
            NodeKind::Function => "FunctionNode",
        }
    }

    /// Numeric identifier used across the C ABI.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(NodeKind::Symbol),
            1 => Some(NodeKind::Operator),
            2 => Some(NodeKind::Constant),
            3 => Some(NodeKind::Parenthesis),
            4 => Some(NodeKind::Function),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Error returned when a string names no node kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownNodeKind(pub String);

impl fmt::Display for UnknownNodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown node kind '{}'", self.0)
    }
}

impl std::error::Error for UnknownNodeKind {}

impl FromStr for NodeKind {
    type Err = UnknownNodeKind;

    /// Accepts the type name (`SymbolNode`) or the short form (`symbol`),
    /// case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let short = lowered.strip_suffix("node").unwrap_or(&lowered);
        match short {
            "symbol" => Ok(NodeKind::Symbol),
            "operator" => Ok(NodeKind::Operator),
            "constant" => Ok(NodeKind::Constant),
            "parenthesis" => Ok(NodeKind::Parenthesis),
            "function" => Ok(NodeKind::Function),
            _ => Err(UnknownNodeKind(s.to_string())),
        }
    }
}

bitflags! {
    /// A set of node kinds, for collecting several kinds in one traversal.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NodeKinds: u8 {
        const SYMBOL = 1;
        const OPERATOR = 1 << 1;
        const CONSTANT = 1 << 2;
        const PARENTHESIS = 1 << 3;
        const FUNCTION = 1 << 4;
    }
}

impl NodeKinds {
    pub fn contains_kind(self, kind: NodeKind) -> bool {
        self.contains(NodeKinds::from(kind))
    }
}

impl From<NodeKind> for NodeKinds {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Symbol => NodeKinds::SYMBOL,
            NodeKind::Operator => NodeKinds::OPERATOR,
            NodeKind::Constant => NodeKinds::CONSTANT,
            NodeKind::Parenthesis => NodeKinds::PARENTHESIS,
            NodeKind::Function => NodeKinds::FUNCTION,
        }
    }
}
