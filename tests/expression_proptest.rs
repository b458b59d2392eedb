//! Property-based tests for parsing, rendering, and exact evaluation

use mathexpr::engine::parse_expression;
use mathexpr::eval::eval_ast;
use mathexpr::{Decimal, Node, NodeKind, Scope, collect_node_names, evaluate, evaluate_with_scope};
use proptest::prelude::*;

/// Generate decimal literals with up to six fractional digits
fn decimal_literal_strategy() -> impl Strategy<Value = String> {
    (0u32..100_000, 0u32..1_000_000, 0usize..=6).prop_map(|(int, frac, places)| {
        if places == 0 {
            int.to_string()
        } else {
            let frac = format!("{frac:06}");
            format!("{int}.{}", &frac[..places])
        }
    })
}

/// Generate variable names that do not collide with built-in names
fn variable_name_strategy() -> impl Strategy<Value = String> {
    "v_[a-z0-9]{0,6}".prop_map(|s| s.to_string())
}

/// Generate well-formed expressions over the variables `a`, `b`, `c`
fn expression_strategy() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        decimal_literal_strategy(),
        Just("a".to_string()),
        Just("b".to_string()),
        Just("c".to_string()),
    ];
    leaf.prop_recursive(4, 32, 3, |inner| {
        prop_oneof![
            (inner.clone(), "[-+*]", inner.clone()).prop_map(|(l, op, r)| format!("{l} {op} {r}")),
            inner.clone().prop_map(|e| format!("({e})")),
            inner.clone().prop_map(|e| format!("-{e}")),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| format!("max({l}, {r})")),
            inner.prop_map(|e| format!("abs({e})")),
        ]
    })
}

fn scope_abc() -> Scope {
    let mut scope = Scope::new();
    scope.insert_str("a", "1.25").unwrap();
    scope.insert_str("b", "-3").unwrap();
    scope.insert_str("c", "0.1").unwrap();
    scope
}

proptest! {
    /// Exact arithmetic: adding then subtracting a decimal gives the original back
    #[test]
    fn prop_addition_is_exact(x in decimal_literal_strategy(), y in decimal_literal_strategy()) {
        let result = evaluate(&format!("{x} + {y} - {y}")).unwrap();
        let expected: Decimal = x.parse().unwrap();
        prop_assert_eq!(result, expected.to_string());
    }

    /// Multiplying and dividing by a non-zero literal is lossless
    #[test]
    fn prop_division_is_exact(x in decimal_literal_strategy(), y in 1u32..10_000) {
        let result = evaluate(&format!("{x} * {y} / {y}")).unwrap();
        let expected: Decimal = x.parse().unwrap();
        prop_assert_eq!(result, expected.to_string());
    }

    /// Rendering a tree and parsing it again gives a tree with the same value
    #[test]
    fn prop_display_round_trip(expr in expression_strategy()) {
        let scope = scope_abc();
        let ast = parse_expression(&expr).unwrap();
        let reparsed = parse_expression(&ast.to_string()).unwrap();
        prop_assert_eq!(eval_ast(&ast, &scope).unwrap(), eval_ast(&reparsed, &scope).unwrap());
    }

    /// Serialized trees deserialize to an identical tree
    #[test]
    fn prop_serde_round_trip(expr in expression_strategy()) {
        let ast = parse_expression(&expr).unwrap();
        let json = serde_json::to_string(&ast).unwrap();
        let restored: Node = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(restored, ast);
    }

    /// Every symbol in a generated expression is listed, in source order
    #[test]
    fn prop_symbols_in_source_order(
        names in prop::collection::vec(variable_name_strategy(), 1..8),
    ) {
        let expr = names.join(" + ");
        let collected = collect_node_names(&expr, NodeKind::Symbol).unwrap();
        prop_assert_eq!(collected, names);
    }

    /// A bound variable evaluates to its own value
    #[test]
    fn prop_variable_lookup(name in variable_name_strategy(), value in decimal_literal_strategy()) {
        let mut scope = Scope::new();
        scope.insert_str(name.as_str(), &value).unwrap();
        let result = evaluate_with_scope(&name, &scope).unwrap();
        let expected: Decimal = value.parse().unwrap();
        prop_assert_eq!(result, expected.to_string());
    }

    /// Evaluation never panics on arbitrary input
    #[test]
    fn prop_arbitrary_input_does_not_panic(input in "[0-9a-z+*/^(), .-]{0,40}") {
        let _ = evaluate(&input);
        let _ = collect_node_names(&input, NodeKind::Operator);
    }
}
