//! Integration tests for the mathexpr library
//! These tests go through the public entry points the way a host application does

use mathexpr::engine::parse_expression;
use mathexpr::eval::eval_ast;
use mathexpr::{
    Decimal, Engine, EngineConfig, EvalErrorKind, ExprError, Node, NodeKind, Scope, ScopePolicy,
    assert_approx_eq, collect_node_names, evaluate, evaluate_with_scope,
};

const REFERENCE: &str = "( num1+ (string2* cos(float0) )-num1+sqrt(int0)/ num1)";

fn reference_scope() -> Scope {
    let mut scope = Scope::new();
    scope.insert("num1", "4".parse::<Decimal>().unwrap());
    scope.insert_str("string2", "5").unwrap();
    scope.insert_f32("float0", 35.0_f32.to_radians()).unwrap();
    scope.insert("int0", 4);
    scope
}

fn expect_eval_error(expr: &str, scope: &Scope) -> EvalErrorKind {
    match evaluate_with_scope(expr, scope) {
        Err(err) => err
            .eval_kind()
            .unwrap_or_else(|| panic!("Expected evaluation error for '{expr}', got {err:?}")),
        Ok(value) => panic!("Expected an error for '{expr}', got {value}"),
    }
}

/// Level 1: Basic expression evaluation
#[test]
fn test_basic_expression_evaluation() {
    assert_eq!(evaluate("2 + 3").unwrap(), "5");
    assert_eq!(evaluate("2 * 3 + 4").unwrap(), "10");
    assert_eq!(evaluate("2 * (3 + 4)").unwrap(), "14");
    assert_eq!(evaluate("10 / 4").unwrap(), "2.5");
    assert_eq!(evaluate("-3 + 1").unwrap(), "-2");
    assert_eq!(evaluate(".5 * 4").unwrap(), "2");
    assert_eq!(evaluate("1.5e2").unwrap(), "150");
}

/// Level 2: Exact decimal arithmetic and rendering
#[test]
fn test_decimal_results() {
    assert_eq!(evaluate("0.1 + 0.2").unwrap(), "0.3");
    assert_eq!(evaluate("0.3 - 0.1").unwrap(), "0.2");
    assert_eq!(evaluate("1 / 3 * 3").unwrap(), "1");
    assert_eq!(evaluate("2 ^ 64").unwrap(), "18446744073709551616");
    assert_eq!(evaluate("10 ^ -20").unwrap(), "0.00000000000000000001");
    assert_eq!(evaluate("2 / 3").unwrap(), "0.6666666666666666666666666666666667");
    assert_eq!(evaluate("sqrt(16) + sqrt(0.25)").unwrap(), "4.5");
}

/// Level 3: The closed-form reference expression
#[test]
fn test_reference_expression() {
    let scope = Scope::new()
        .with("num1", 4)
        .with("string2", 5)
        .with("int0", 4);
    let mut scope = scope;
    scope.insert_str("float0", "35").unwrap();

    let with_scope: f64 = evaluate_with_scope(REFERENCE, &scope)
        .unwrap()
        .parse()
        .unwrap();
    let closed_form: f64 = evaluate("(4+(5*cos(35))-1+sqrt(4)/1)").unwrap().parse().unwrap();
    let expected = 4.0 + 5.0 * 35.0_f64.cos() - 4.0 + 2.0 / 4.0;

    assert_approx_eq!(with_scope, expected);
    assert_approx_eq!(closed_form, 4.0 + 5.0 * 35.0_f64.cos() - 1.0 + 2.0);
}

/// Level 4: Scope built from mixed host values
#[test]
fn test_mixed_scope_values() {
    let scope = reference_scope();
    let result: f64 = evaluate_with_scope(REFERENCE, &scope).unwrap().parse().unwrap();
    // The scope keeps the shortest decimal form of the f32
    let float0: f64 = 35.0_f32.to_radians().to_string().parse().unwrap();
    assert_approx_eq!(result, 5.0 * float0.cos() + 0.5, 1e-9);
    assert_eq!(
        evaluate_with_scope("x + 1", &Scope::new().with("x", 5)).unwrap(),
        "6"
    );
}

#[test]
fn test_evaluation_errors() {
    let empty = Scope::new();
    assert_eq!(expect_eval_error("x + 1", &empty), EvalErrorKind::UnknownSymbol);
    assert_eq!(expect_eval_error("1 / 0", &empty), EvalErrorKind::DivisionByZero);
    assert_eq!(expect_eval_error("sqrt(-1)", &empty), EvalErrorKind::DomainError);
    assert_eq!(expect_eval_error("nope(2)", &empty), EvalErrorKind::UnknownFunction);
    assert_eq!(expect_eval_error("atan2(1)", &empty), EvalErrorKind::WrongArity);
    assert_eq!(expect_eval_error("log(-1)", &empty), EvalErrorKind::DomainError);

    match evaluate_with_scope("num1 + num2", &Scope::new().with("num1", 1)) {
        Err(ExprError::Eval(err)) => assert_eq!(err.detail, "num2"),
        other => panic!("Expected unknown symbol, got {other:?}"),
    }
}

#[test]
fn test_syntax_errors_carry_positions() {
    match evaluate("(1+") {
        Err(ExprError::Parse(err)) => {
            assert_eq!(err.position, 3);
            assert_eq!(err.found, "end of input");
        }
        other => panic!("Expected parse error, got {other:?}"),
    }
    match evaluate("1 + 2 $ 3") {
        Err(ExprError::Lex(err)) => {
            assert_eq!(err.position, 6);
            assert_eq!(err.character, '$');
        }
        other => panic!("Expected lex error, got {other:?}"),
    }
    for broken in ["", "()", "1 +", "* 2", "max(1,", "(1))", "2 (3)"] {
        assert!(
            matches!(evaluate(broken), Err(ExprError::Parse(_))),
            "'{broken}' should not parse"
        );
    }
}

#[test]
fn test_collect_node_names() {
    assert_eq!(
        collect_node_names("num1+num1*2", NodeKind::Symbol).unwrap(),
        vec!["num1", "num1"]
    );
    assert_eq!(
        collect_node_names(REFERENCE, NodeKind::Symbol).unwrap(),
        vec!["num1", "string2", "cos", "float0", "num1", "sqrt", "int0", "num1"]
    );
    // Called function names are listed before their arguments
    assert_eq!(
        collect_node_names("sqrt(x)", NodeKind::Symbol).unwrap(),
        vec!["sqrt", "x"]
    );
    assert_eq!(
        collect_node_names("2 * (x + 0.50)", NodeKind::Constant).unwrap(),
        vec!["2", "0.5"]
    );
    assert_eq!(
        collect_node_names("2 * (x + 1)", NodeKind::Parenthesis).unwrap(),
        vec!["(x + 1)"]
    );
    // No scope is consulted, so unknown names are fine
    assert_eq!(
        collect_node_names("a / b", NodeKind::Operator).unwrap(),
        vec!["a / b"]
    );
    assert!(collect_node_names("a +", NodeKind::Symbol).is_err());
}

#[test]
fn test_display_reparses_to_same_value() {
    let scope = reference_scope();
    for expr in [
        REFERENCE,
        "-2 ^ 2",
        "2 ^ 3 ^ 2",
        "(2 ^ 3) ^ 2",
        "1 - (2 - 3)",
        "8 / (4 / 2)",
        "-(1 + 2) * 3",
        "max(1, -2, 3) - min(4, 5)",
        "2 ^ -num1",
    ] {
        let ast = parse_expression(expr).unwrap();
        let text = ast.to_string();
        let reparsed = parse_expression(&text).unwrap();
        assert_eq!(
            eval_ast(&ast, &scope).unwrap(),
            eval_ast(&reparsed, &scope).unwrap(),
            "'{expr}' rendered as '{text}'"
        );
        assert_eq!(reparsed.to_string(), text);
    }
}

#[test]
fn test_serde_round_trip() {
    let scope = reference_scope();
    let ast = parse_expression(REFERENCE).unwrap();
    let json = serde_json::to_string(&ast).unwrap();
    let restored: Node = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, ast);
    assert_eq!(
        eval_ast(&restored, &scope).unwrap(),
        eval_ast(&ast, &scope).unwrap()
    );

    let value: serde_json::Value = serde_json::to_value(parse_expression("-x").unwrap()).unwrap();
    assert_eq!(value["type"], "OperatorNode");
    assert_eq!(value["op"], "unaryMinus");
    assert_eq!(value["operands"][0]["name"], "x");

    let scope_json = serde_json::to_string(&Scope::new().with("a", 1)).unwrap();
    assert_eq!(scope_json, r#"{"a":"1"}"#);
    let scope: Scope = serde_json::from_str(r#"{"a": 1.5, "b": "1/3"}"#).unwrap();
    assert_eq!(evaluate_with_scope("a * b * 2", &scope).unwrap(), "1");
}

#[test]
fn test_idempotence() {
    let scope = reference_scope();
    let first = evaluate_with_scope(REFERENCE, &scope).unwrap();
    for _ in 0..10 {
        assert_eq!(evaluate_with_scope(REFERENCE, &scope).unwrap(), first);
    }
    let names = collect_node_names(REFERENCE, NodeKind::Symbol).unwrap();
    assert_eq!(collect_node_names(REFERENCE, NodeKind::Symbol).unwrap(), names);
}

#[test]
fn test_engine_configuration() {
    let engine = Engine::new(
        EngineConfig::default()
            .with_precision(6)
            .with_scope_policy(ScopePolicy::RequireNonEmpty)
            .with_cache(true),
    );
    assert_eq!(
        engine.evaluate_with_scope("1 / 7", &Scope::new()),
        Err(ExprError::EmptyScope)
    );
    let scope = Scope::new().with("n", 7);
    assert_eq!(engine.evaluate_with_scope("1 / n", &scope).unwrap(), "0.142857");
    assert_eq!(engine.evaluate_with_scope("1 / n", &scope).unwrap(), "0.142857");
    assert_eq!(engine.cached_len(), 1);
    assert_eq!(ExprError::EmptyScope.to_string(), "Scope can't be empty");
}
