//! Syntax tree evaluation.
//!
//! [`eval_ast`] walks a [`Node`] bottom-up against a read-only [`Scope`],
//! combining operand values with exact rational arithmetic and delegating
//! function calls to the built-in table in [`crate::functions`].
//!
//! The walk is iterative: pending work lives on an explicit operation stack
//! and intermediate results on a value stack, so the depth of a tree is
//! bounded by memory rather than by the thread's call stack.

use crate::context::Scope;
use crate::decimal::Decimal;
use crate::error::EvalError;
use crate::functions::{self, Builtin};
use crate::types::{Node, Operator};

/// Initial capacity for stacks (tuned for typical expressions)
const INITIAL_OP_CAPACITY: usize = 32;
const INITIAL_VALUE_CAPACITY: usize = 16;

/// Operations pushed onto the evaluation stack
enum EvalOp<'a> {
    /// Evaluate a subtree and push its value
    Eval(&'a Node),
    /// Pop the operands of `op` and push the result
    ApplyOperator(Operator),
    /// Pop `argc` arguments and push the result of the call
    ApplyFunction { builtin: &'static Builtin, argc: usize },
}

/// Evaluates `node` with the bindings in `scope`.
///
/// Symbols resolve against the scope first and then against the built-in
/// constants `pi` and `e`, so a scope binding shadows a constant of the
/// same name. Neither the tree nor the scope is modified.
///
/// Operands are evaluated left to right, and the first error stops
/// evaluation.
///
/// # Examples
///
/// ```
/// use mathexpr::{Scope, eval::eval_ast, engine::parse_expression};
///
/// let ast = parse_expression("x * (y + 1)").unwrap();
/// let scope = Scope::new().with("x", 3).with("y", 4);
/// assert_eq!(eval_ast(&ast, &scope).unwrap().to_string(), "15");
/// ```
pub fn eval_ast(node: &Node, scope: &Scope) -> Result<Decimal, EvalError> {
    let mut op_stack: Vec<EvalOp<'_>> = Vec::with_capacity(INITIAL_OP_CAPACITY);
    let mut value_stack: Vec<Decimal> = Vec::with_capacity(INITIAL_VALUE_CAPACITY);
    op_stack.push(EvalOp::Eval(node));

    while let Some(op) = op_stack.pop() {
        match op {
            EvalOp::Eval(node) => match node {
                Node::Constant { value } => value_stack.push(value.clone()),
                Node::Symbol { name } => value_stack.push(eval_symbol(name, scope)?),
                Node::Parenthesis { content } => op_stack.push(EvalOp::Eval(content)),
                Node::Operator { op, operands } => {
                    if operands.len() != op.arity() {
                        let expected = if op.is_unary() { "1 operand" } else { "2 operands" };
                        return Err(EvalError::wrong_arity(op.symbol(), expected, operands.len()));
                    }
                    op_stack.push(EvalOp::ApplyOperator(*op));
                    push_children(&mut op_stack, operands);
                }
                Node::Function { name, args } => {
                    let builtin = functions::lookup(name).ok_or_else(|| EvalError::unknown_function(name))?;
                    op_stack.push(EvalOp::ApplyFunction {
                        builtin,
                        argc: args.len(),
                    });
                    push_children(&mut op_stack, args);
                }
            },
            EvalOp::ApplyOperator(op) => {
                let operands = pop_values(&mut value_stack, op.arity());
                value_stack.push(apply_operator(op, operands)?);
            }
            EvalOp::ApplyFunction { builtin, argc } => {
                let args = pop_values(&mut value_stack, argc);
                value_stack.push(builtin.call(&args)?);
            }
        }
    }

    value_stack
        .pop()
        .ok_or_else(|| EvalError::domain("expression produced no value"))
}

// Reversed so the leftmost child is evaluated first
fn push_children<'a>(op_stack: &mut Vec<EvalOp<'a>>, children: &'a [Node]) {
    op_stack.extend(children.iter().rev().map(EvalOp::Eval));
}

fn pop_values(value_stack: &mut Vec<Decimal>, count: usize) -> Vec<Decimal> {
    let at = value_stack.len().saturating_sub(count);
    value_stack.split_off(at)
}

fn eval_symbol(name: &str, scope: &Scope) -> Result<Decimal, EvalError> {
    if let Some(value) = scope.get(name) {
        return Ok(value.clone());
    }
    functions::constant(name).ok_or_else(|| EvalError::unknown_symbol(name))
}

fn apply_operator(op: Operator, operands: Vec<Decimal>) -> Result<Decimal, EvalError> {
    let mut operands = operands.into_iter();
    let (Some(lhs), rhs) = (operands.next(), operands.next()) else {
        return Err(EvalError::wrong_arity(op.symbol(), "an operand", 0));
    };
    match (op, rhs) {
        (Operator::UnaryMinus, None) => Ok(-lhs),
        (Operator::UnaryPlus, None) => Ok(lhs),
        (Operator::Add, Some(rhs)) => Ok(lhs + rhs),
        (Operator::Subtract, Some(rhs)) => Ok(lhs - rhs),
        (Operator::Multiply, Some(rhs)) => Ok(lhs * rhs),
        (Operator::Divide, Some(rhs)) => lhs
            .checked_div(&rhs)
            .ok_or_else(|| EvalError::division_by_zero(format!("{lhs} / 0"))),
        (Operator::Pow, Some(rhs)) => functions::power(&lhs, &rhs),
        (op, rhs) => Err(EvalError::wrong_arity(
            op.symbol(),
            if op.is_unary() { "1 operand" } else { "2 operands" },
            1 + usize::from(rhs.is_some()),
        )),
    }
}
