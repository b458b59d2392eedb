use std::process;
use std::time::Instant;

use clap::{Command, CommandFactory, FromArgMatches, Parser};
use mathexpr::traverse::count_kinds;
use mathexpr::{Engine, EngineConfig, NodeKind, Scope, ScopePolicy, functions, tokenize};

/// Evaluates a math expression with exact decimal arithmetic and lists the
/// nodes of its syntax tree.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The expression, e.g. "( num1+ (string2* cos(float0) )-num1+sqrt(int0)/ num1)".
    expression: String,

    /// Binds a variable, as NAME=VALUE. May be repeated.
    #[arg(short = 'D', long = "var", value_name = "NAME=VALUE", value_parser = parse_binding)]
    vars: Vec<(String, String)>,

    /// Also lists the nodes of this kind (symbol, operator, constant,
    /// parenthesis, function).
    #[arg(short, long)]
    kind: Option<NodeKind>,

    /// Significant digits for results without a finite decimal expansion.
    #[arg(short, long, default_value_t = EngineConfig::default().precision)]
    precision: usize,

    /// Rejects evaluation when no variables are given.
    #[arg(long)]
    require_scope: bool,

    /// Prints tokens, the syntax tree, and timing to stderr.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_binding(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, found '{raw}'")),
    }
}

/// The derived command, with the built-in function table listed after the
/// options.
fn command() -> Command {
    let builtins = functions::names().collect::<Vec<_>>().join(", ");
    Args::command().after_help(format!("Built-in functions: {builtins}\nConstants: pi, e"))
}

fn main() {
    let matches = command().get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    let mut scope = Scope::new();
    for (name, value) in &args.vars {
        if let Err(e) = scope.insert_str(name.as_str(), value) {
            eprintln!("Invalid value for '{name}': {e}");
            process::exit(2);
        }
    }

    let policy = if args.require_scope {
        ScopePolicy::RequireNonEmpty
    } else {
        ScopePolicy::Lenient
    };
    let engine = Engine::new(
        EngineConfig::default()
            .with_precision(args.precision)
            .with_scope_policy(policy),
    );

    if args.verbose {
        match tokenize(&args.expression) {
            Ok(tokens) => {
                for token in &tokens {
                    eprintln!("token {:>4} {:<10} {}", token.position, token.kind, token.text);
                }
            }
            Err(e) => eprintln!("tokenize failed: {e}"),
        }
        if let Ok(ast) = engine.parse(&args.expression) {
            eprintln!("tree: {ast}");
            for (kind, count) in NodeKind::ALL.iter().zip(count_kinds(&ast)) {
                eprintln!("  {kind:<16} {count}");
            }
        }
    }

    let started = Instant::now();
    let result = engine.evaluate_with_scope(&args.expression, &scope);
    let elapsed = started.elapsed();

    match result {
        Ok(value) => println!("{value}"),
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    }

    if let Some(kind) = args.kind {
        match engine.collect_node_names(&args.expression, kind) {
            Ok(names) => println!("{kind}: [{}]", names.join(", ")),
            Err(e) => eprintln!("{e}"),
        }
    }

    if args.verbose {
        eprintln!("Measured time: {} µs", elapsed.as_micros());
    }
}
