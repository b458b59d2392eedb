#![doc = r#"
# mathexpr

A scalar math expression parser, evaluator, and syntax-tree walker with exact
decimal results.

## Overview

mathexpr turns expression text such as `num1 + sqrt(int0) / num1` into an
explicit syntax tree and then either evaluates that tree against a scope of
variables or walks it to list the nodes of a given kind. Expression text and
scope values are only ever treated as data.

Key features:
- Exact rational arithmetic for `+ - * /` and integer powers, so
  `0.1 + 0.2` is exactly `0.3`
- Results rendered as plain decimal text, never in scientific notation
- Built-in math functions (`sqrt`, `cos`, `log`, `max`, ...) and the
  constants `pi` and `e`
- Node collection by kind (`SymbolNode`, `OperatorNode`, `ConstantNode`,
  `ParenthesisNode`, `FunctionNode`) in pre-order
- Typed errors carrying byte positions and symbol names
- Serializable syntax trees (serde)
- An optional parse cache for repeated expressions
- A C API for calling from non-Rust code

## Quick Start

```rust
use mathexpr::evaluate;

// Simple expression evaluation
assert_eq!(evaluate("2 + 3 * 4").unwrap(), "14");

// Decimal-safe results
assert_eq!(evaluate("0.1 + 0.2").unwrap(), "0.3");
assert_eq!(evaluate("2 ^ -3").unwrap(), "0.125");
```

## Using Variables

```rust
use mathexpr::{Scope, evaluate_with_scope};

let mut scope = Scope::new();
scope.insert("num1", 4);
scope.insert_str("string2", "2.5").unwrap();

let result = evaluate_with_scope("num1 * string2 - 1", &scope).unwrap();
assert_eq!(result, "9");
```

## Listing Nodes

```rust
use mathexpr::{NodeKind, collect_node_names};

let expr = "( num1+ (string2* cos(float0) )-num1+sqrt(int0)/ num1)";
let symbols = collect_node_names(expr, NodeKind::Symbol).unwrap();
assert_eq!(
    symbols,
    vec!["num1", "string2", "cos", "float0", "num1", "sqrt", "int0", "num1"]
);

let calls = collect_node_names(expr, NodeKind::Function).unwrap();
assert_eq!(calls, vec!["cos(float0)", "sqrt(int0)"]);
```

## Parse Once, Evaluate Many

```rust
use mathexpr::{Expression, Scope};

let expr = Expression::parse("x ^ 2 - 1").unwrap();
let values: Vec<String> = (1..=3)
    .map(|x| expr.evaluate(&Scope::new().with("x", x)).unwrap().to_string())
    .collect();
assert_eq!(values, vec!["0", "3", "8"]);
```

## Error Handling

```rust
use mathexpr::{ExprError, EvalErrorKind, evaluate};

match evaluate("(1+") {
    Err(ExprError::Parse(err)) => assert_eq!(err.position, 3),
    other => panic!("Unexpected result: {:?}", other),
}

let err = evaluate("sqrt(-1)").unwrap_err();
assert_eq!(err.eval_kind(), Some(EvalErrorKind::DomainError));
```

## Supported Grammar

From lowest to highest precedence:

| Precedence | Operators       | Associativity |
|------------|-----------------|---------------|
| 9          | `+` `-`         | Left          |
| 10         | `*` `/`         | Left          |
| 14         | unary `+` `-`   | Right (unary) |
| 15         | `^`             | Right         |

Primaries are numbers (`42`, `3.14`, `.5`, `1e-3`), identifiers, calls
`name(arg, ...)`, and parenthesized expressions. There is no implicit
multiplication: `2x` is a syntax error. `-2^2` is `-4`, and the exponent of
`^` may carry its own sign (`2^-1`).

### Built-in Functions

- Trigonometric: `sin`, `cos`, `tan`, `asin`, `acos`, `atan`, `atan2`
- Hyperbolic: `sinh`, `cosh`, `tanh`
- Exponential/Logarithmic: `exp`, `log` (natural, or `log(x, base)`), `log10`, `log2`
- Power/Root: `sqrt`, `cbrt`, `pow`
- Rounding: `ceil`, `floor`, `round` (optionally `round(x, digits)`)
- Comparison: `max`, `min` (one or more arguments)
- Misc: `abs`, `sign`, `mod`

### Built-in Constants

- `pi`: 3.14159... (π)
- `e`: 2.71828... (Euler's number)

A scope binding with the same name takes precedence over a constant.
"#]

pub mod context;
pub mod decimal;
pub mod engine;
pub mod error;
pub mod eval;
pub mod ffi;
pub mod functions;
pub mod lexer;
pub mod traverse;
pub mod types;

pub use context::{EngineConfig, Scope, ScopePolicy};
pub use decimal::{Decimal, ParseDecimalError};
pub use engine::{Engine, Expression, collect_node_names, evaluate, evaluate_with_scope, parse_expression};
pub use error::{EvalError, EvalErrorKind, ExprError, LexError, ParseError, Result};
pub use lexer::{Lexer, Token, TokenKind, tokenize};
pub use traverse::{collect_nodes, collect_nodes_matching, filter, traverse};
pub use types::{Node, NodeKind, NodeKinds, Operator};

pub mod constants {
    /// Tolerance used by [`assert_approx_eq!`](crate::assert_approx_eq) when none is given.
    pub const TEST_PRECISION: f64 = 1e-10;
}

/// Utility macro to check if two floating point values are approximately equal
/// within a specified epsilon. Supports optional format arguments like assert_eq!.
#[macro_export]
macro_rules! assert_approx_eq {
    // Case 1: assert_approx_eq!(left, right) -> use default epsilon
    ($left:expr, $right:expr $(,)?) => {
        $crate::assert_approx_eq!($left, $right, $crate::constants::TEST_PRECISION)
    };
    // Case 2: assert_approx_eq!(left, right, epsilon) -> use specified epsilon
    ($left:expr, $right:expr, $epsilon:expr $(,)?) => {{
        let left_val: f64 = $left;
        let right_val: f64 = $right;
        let eps: f64 = $epsilon;
        assert!(
            (left_val - right_val).abs() < eps,
            "assertion failed: `(left ≈ right)` (left: `{}`, right: `{}`, epsilon: `{}`)",
            left_val,
            right_val,
            eps
        );
    }};
    // Case 3: assert_approx_eq!(left, right, epsilon, "format message with args", args...)
    ($left:expr, $right:expr, $epsilon:expr, $($arg:tt)+) => {{
        let left_val: f64 = $left;
        let right_val: f64 = $right;
        let eps: f64 = $epsilon;
        assert!((left_val - right_val).abs() < eps, $($arg)+);
    }};
}
