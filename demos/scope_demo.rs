//! Evaluates the reference expression with variables supplied in four
//! different host representations, then lists its symbols.
//!
//! Run with `cargo run --example scope_demo`.

use std::time::Instant;

use mathexpr::{Decimal, NodeKind, Scope, collect_node_names, evaluate_with_scope};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let expression = "( num1+ (string2* cos(float0) )-num1+sqrt(int0)/ num1)";

    let mut scope = Scope::new();
    scope.insert("num1", "4".parse::<Decimal>()?);
    scope.insert_str("string2", "5")?;
    scope.insert_f32("float0", 35.0_f32.to_radians())?;
    scope.insert("int0", 4);

    let started = Instant::now();
    let result = evaluate_with_scope(expression, &scope)?;
    let elapsed = started.elapsed();

    let symbols = collect_node_names(expression, NodeKind::Symbol)?;

    println!("expression: {expression}");
    println!("result:     {result}");
    println!("symbols:    [{}]", symbols.join(", "));
    println!("time:       {} µs", elapsed.as_micros());
    Ok(())
}
