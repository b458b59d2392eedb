//! Built-in mathematical functions for expression evaluation.
//!
//! The table in this module backs every function call in an expression.
//! Operations that stay inside the rationals (`abs`, `floor`, `min`, `mod`,
//! integer powers, square roots of perfect squares, ...) are computed exactly
//! on [`Decimal`]. Transcendental functions go through `f64` using the `libm`
//! crate and come back through the shortest decimal that round-trips the
//! float result. Inputs outside a function's real domain and non-finite
//! results are reported as domain errors rather than NaN or infinity.

use core::fmt;

use libm::{
    acos as libm_acos, asin as libm_asin, atan as libm_atan, atan2 as libm_atan2,
    cbrt as libm_cbrt, cos as libm_cos, cosh as libm_cosh, exp as libm_exp, log as libm_ln,
    log2 as libm_log2, log10 as libm_log10, pow as libm_pow, sin as libm_sin, sinh as libm_sinh,
    sqrt as libm_sqrt, tan as libm_tan, tanh as libm_tanh,
};
use num_integer::Integer;
use num_rational::BigRational;

use crate::decimal::Decimal;
use crate::error::EvalError;

/// Upper bound on the bit size of an exactly computed power.
pub const MAX_EXACT_POWER_BITS: u64 = 1 << 16;

/// Number of arguments a built-in accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Range(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::Range(lo, hi) => (lo..=hi).contains(&count),
            Arity::AtLeast(n) => count >= n,
        }
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "argument" } else { "arguments" }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Arity::Exact(n) => write!(f, "{n} {}", plural(n)),
            Arity::Range(lo, hi) => write!(f, "{lo} to {hi} arguments"),
            Arity::AtLeast(n) => write!(f, "at least {n} {}", plural(n)),
        }
    }
}

type BuiltinFn = fn(&[Decimal]) -> Result<Decimal, EvalError>;

/// An entry of the built-in function table.
pub struct Builtin {
    pub name: &'static str,
    pub arity: Arity,
    apply: BuiltinFn,
}

impl Builtin {
    /// Applies the function after checking the argument count.
    pub fn call(&self, args: &[Decimal]) -> Result<Decimal, EvalError> {
        if !self.arity.accepts(args.len()) {
            return Err(EvalError::wrong_arity(self.name, self.arity, args.len()));
        }
        (self.apply)(args)
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

macro_rules! builtin {
    ($name:literal, $arity:expr, $apply:expr) => {
        Builtin {
            name: $name,
            arity: $arity,
            apply: $apply,
        }
    };
}

static BUILTINS: &[Builtin] = &[
    builtin!("sqrt", Arity::Exact(1), |a| sqrt(&a[0])),
    builtin!("cbrt", Arity::Exact(1), |a| cbrt(&a[0])),
    builtin!("abs", Arity::Exact(1), |a| Ok(a[0].abs())),
    builtin!("sign", Arity::Exact(1), |a| Ok(a[0].signum())),
    builtin!("exp", Arity::Exact(1), |a| float_fn("exp", &a[0], libm_exp)),
    builtin!("log", Arity::Range(1, 2), log),
    builtin!("log10", Arity::Exact(1), |a| positive_log("log10", &a[0], libm_log10)),
    builtin!("log2", Arity::Exact(1), |a| positive_log("log2", &a[0], libm_log2)),
    builtin!("sin", Arity::Exact(1), |a| float_fn("sin", &a[0], libm_sin)),
    builtin!("cos", Arity::Exact(1), |a| float_fn("cos", &a[0], libm_cos)),
    builtin!("tan", Arity::Exact(1), |a| float_fn("tan", &a[0], libm_tan)),
    builtin!("asin", Arity::Exact(1), |a| unit_interval_fn("asin", &a[0], libm_asin)),
    builtin!("acos", Arity::Exact(1), |a| unit_interval_fn("acos", &a[0], libm_acos)),
    builtin!("atan", Arity::Exact(1), |a| float_fn("atan", &a[0], libm_atan)),
    builtin!("atan2", Arity::Exact(2), |a| {
        from_float("atan2", libm_atan2(a[0].to_f64(), a[1].to_f64()))
    }),
    builtin!("sinh", Arity::Exact(1), |a| float_fn("sinh", &a[0], libm_sinh)),
    builtin!("cosh", Arity::Exact(1), |a| float_fn("cosh", &a[0], libm_cosh)),
    builtin!("tanh", Arity::Exact(1), |a| float_fn("tanh", &a[0], libm_tanh)),
    builtin!("ceil", Arity::Exact(1), |a| Ok(a[0].ceil())),
    builtin!("floor", Arity::Exact(1), |a| Ok(a[0].floor())),
    builtin!("round", Arity::Range(1, 2), round),
    builtin!("min", Arity::AtLeast(1), |a| Ok(extreme(a, |x, best| x < best))),
    builtin!("max", Arity::AtLeast(1), |a| Ok(extreme(a, |x, best| x > best))),
    builtin!("pow", Arity::Exact(2), |a| power(&a[0], &a[1])),
    builtin!("mod", Arity::Exact(2), |a| {
        a[0].checked_mod(&a[1])
            .ok_or_else(|| EvalError::division_by_zero(format!("mod({}, 0)", a[0])))
    }),
];

/// Looks up a built-in function by name.
pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|builtin| builtin.name == name)
}

/// Names of every built-in function, in table order.
pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|builtin| builtin.name)
}

/// Value of a built-in constant (`pi`, `e`).
pub fn constant(name: &str) -> Option<Decimal> {
    match name {
        "pi" => "3.141592653589793238462643383279502884".parse().ok(),
        "e" => "2.718281828459045235360287471352662498".parse().ok(),
        _ => None,
    }
}

fn from_float(name: &str, value: f64) -> Result<Decimal, EvalError> {
    Decimal::from_f64(value)
        .ok_or_else(|| EvalError::domain(format!("{name} has no finite result")))
}

fn float_fn(name: &str, x: &Decimal, f: fn(f64) -> f64) -> Result<Decimal, EvalError> {
    from_float(name, f(x.to_f64()))
}

fn positive_log(name: &str, x: &Decimal, f: fn(f64) -> f64) -> Result<Decimal, EvalError> {
    if x.is_negative() || x.is_zero() {
        return Err(EvalError::domain(format!("{name}({x}) is undefined")));
    }
    float_fn(name, x, f)
}

fn unit_interval_fn(name: &str, x: &Decimal, f: fn(f64) -> f64) -> Result<Decimal, EvalError> {
    if x.abs() > Decimal::one() {
        return Err(EvalError::domain(format!("{name}({x}) is outside [-1, 1]")));
    }
    float_fn(name, x, f)
}

/// Exact root of a rational whose numerator and denominator are both perfect
/// `n`th powers.
fn exact_root(x: &Decimal, n: u32) -> Option<Decimal> {
    let ratio = x.as_ratio();
    let numer = ratio.numer().nth_root(n);
    let denom = ratio.denom().nth_root(n);
    if numer.pow(n) == *ratio.numer() && denom.pow(n) == *ratio.denom() {
        Some(Decimal::from_ratio(BigRational::new(numer, denom)))
    } else {
        None
    }
}

pub fn sqrt(x: &Decimal) -> Result<Decimal, EvalError> {
    if x.is_negative() {
        return Err(EvalError::domain(format!("sqrt({x}) of a negative number")));
    }
    match exact_root(x, 2) {
        Some(root) => Ok(root),
        None => float_fn("sqrt", x, libm_sqrt),
    }
}

fn cbrt(x: &Decimal) -> Result<Decimal, EvalError> {
    match exact_root(x, 3) {
        Some(root) => Ok(root),
        None => float_fn("cbrt", x, libm_cbrt),
    }
}

fn log(args: &[Decimal]) -> Result<Decimal, EvalError> {
    let value = positive_log("log", &args[0], libm_ln)?;
    let Some(base) = args.get(1) else {
        return Ok(value);
    };
    if base.is_negative() || base.is_zero() || *base == Decimal::one() {
        return Err(EvalError::domain(format!("log base {base} is invalid")));
    }
    from_float("log", libm_ln(args[0].to_f64()) / libm_ln(base.to_f64()))
}

fn round(args: &[Decimal]) -> Result<Decimal, EvalError> {
    let digits = match args.get(1) {
        None => 0,
        Some(digits) => digits
            .to_i64()
            .and_then(|d| i32::try_from(d).ok())
            .filter(|d| d.abs() <= 1000)
            .ok_or_else(|| EvalError::domain(format!("round digits {digits} must be a small integer")))?,
    };
    Ok(args[0].round_to(digits))
}

fn extreme(args: &[Decimal], better: fn(&Decimal, &Decimal) -> bool) -> Decimal {
    let mut best = &args[0];
    for arg in &args[1..] {
        if better(arg, best) {
            best = arg;
        }
    }
    best.clone()
}

fn power_bits(base: &Decimal, exp: i64) -> u64 {
    let ratio = base.as_ratio();
    ratio
        .numer()
        .bits()
        .max(ratio.denom().bits())
        .saturating_mul(exp.unsigned_abs())
}

/// `base ^ exp`, shared by the `^` operator and `pow()`.
///
/// Integer exponents are raised exactly whenever the result fits in
/// [`MAX_EXACT_POWER_BITS`]; a larger integer power is a domain error rather
/// than a rounded or zero result. Fractional exponents go through `f64`.
/// Zero to a negative power is a division by zero; a negative base with a
/// fractional exponent has no real result.
pub fn power(base: &Decimal, exp: &Decimal) -> Result<Decimal, EvalError> {
    if base.is_zero() && exp.is_negative() {
        return Err(EvalError::division_by_zero(format!("0 ^ {exp}")));
    }
    if exp.is_integer() {
        return exact_power(base, exp);
    }
    if base.is_negative() {
        return Err(EvalError::domain(format!(
            "{base} ^ {exp} of a negative base with a fractional exponent"
        )));
    }
    let result = from_float("pow", libm_pow(base.to_f64(), exp.to_f64()))?;
    if result.is_zero() && !base.is_zero() {
        return Err(EvalError::domain(format!("{base} ^ {exp} is too small to represent")));
    }
    Ok(result)
}

fn exact_power(base: &Decimal, exp: &Decimal) -> Result<Decimal, EvalError> {
    if base.is_zero() {
        return Ok(if exp.is_zero() { Decimal::one() } else { Decimal::zero() });
    }
    if base.abs() == Decimal::one() {
        let odd = exp.as_ratio().numer().is_odd();
        return Ok(if base.is_negative() && odd { -Decimal::one() } else { Decimal::one() });
    }
    let too_large = || EvalError::domain(format!("{base} ^ {exp} is too large to compute exactly"));
    let n = exp
        .to_i64()
        .filter(|n| power_bits(base, *n) <= MAX_EXACT_POWER_BITS)
        .ok_or_else(too_large)?;
    base.powi(n).ok_or_else(too_large)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalErrorKind;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn call(name: &str, args: &[&str]) -> Result<Decimal, EvalError> {
        let args: Vec<Decimal> = args.iter().map(|s| dec(s)).collect();
        lookup(name).expect("builtin exists").call(&args)
    }

    #[test]
    fn test_exact_roots() {
        assert_eq!(call("sqrt", &["4"]).unwrap(), dec("2"));
        assert_eq!(call("sqrt", &["0.01"]).unwrap(), dec("0.1"));
        assert_eq!(call("sqrt", &["0"]).unwrap(), dec("0"));
        assert_eq!(call("cbrt", &["-27"]).unwrap(), dec("-3"));
        assert_eq!(call("sqrt", &["2"]).unwrap().to_string(), "1.4142135623730951");
    }

    #[test]
    fn test_domain_errors() {
        for (name, args) in [
            ("sqrt", vec!["-1"]),
            ("log", vec!["0"]),
            ("log", vec!["-2"]),
            ("log10", vec!["0"]),
            ("asin", vec!["1.5"]),
            ("acos", vec!["-2"]),
            ("log", vec!["8", "1"]),
            ("exp", vec!["1000"]),
        ] {
            match call(name, &args) {
                Err(err) => assert_eq!(err.kind, EvalErrorKind::DomainError, "{name}{args:?}"),
                Ok(value) => panic!("Expected domain error for {name}{args:?}, got {value}"),
            }
        }
    }

    #[test]
    fn test_arity_checks() {
        let err = call("sqrt", &["1", "2"]).unwrap_err();
        assert_eq!(err.kind, EvalErrorKind::WrongArity);
        assert!(err.detail.contains("1 argument"));
        assert_eq!(call("max", &[]).unwrap_err().kind, EvalErrorKind::WrongArity);
        assert_eq!(call("round", &["1", "2", "3"]).unwrap_err().kind, EvalErrorKind::WrongArity);
        assert_eq!(Arity::Range(1, 2).to_string(), "1 to 2 arguments");
        assert_eq!(Arity::AtLeast(1).to_string(), "at least 1 argument");
    }

    #[test]
    fn test_exact_helpers() {
        assert_eq!(call("abs", &["-2.5"]).unwrap(), dec("2.5"));
        assert_eq!(call("sign", &["-0.1"]).unwrap(), dec("-1"));
        assert_eq!(call("floor", &["-1.5"]).unwrap(), dec("-2"));
        assert_eq!(call("ceil", &["1.2"]).unwrap(), dec("2"));
        assert_eq!(call("round", &["2.345", "2"]).unwrap(), dec("2.35"));
        assert_eq!(call("round", &["-2.5"]).unwrap(), dec("-3"));
        assert_eq!(call("min", &["3", "-1", "2"]).unwrap(), dec("-1"));
        assert_eq!(call("max", &["3", "-1", "2"]).unwrap(), dec("3"));
        assert_eq!(call("mod", &["-7", "3"]).unwrap(), dec("2"));
        assert_eq!(
            call("mod", &["1", "0"]).unwrap_err().kind,
            EvalErrorKind::DivisionByZero
        );
    }

    #[test]
    fn test_transcendental_functions() {
        crate::assert_approx_eq!(call("cos", &["0"]).unwrap().to_f64(), 1.0);
        crate::assert_approx_eq!(call("log", &["8", "2"]).unwrap().to_f64(), 3.0);
        crate::assert_approx_eq!(call("log2", &["1024"]).unwrap().to_f64(), 10.0);
        crate::assert_approx_eq!(
            call("atan2", &["1", "1"]).unwrap().to_f64(),
            core::f64::consts::FRAC_PI_4
        );
        assert_eq!(call("exp", &["0"]).unwrap(), dec("1"));
    }

    #[test]
    fn test_power_rules() {
        assert_eq!(power(&dec("2"), &dec("10")).unwrap(), dec("1024"));
        assert_eq!(power(&dec("2"), &dec("-2")).unwrap(), dec("0.25"));
        assert_eq!(power(&dec("-2"), &dec("3")).unwrap(), dec("-8"));
        assert_eq!(power(&dec("4"), &dec("0.5")).unwrap(), dec("2"));
        assert_eq!(
            power(&dec("0"), &dec("-1")).unwrap_err().kind,
            EvalErrorKind::DivisionByZero
        );
        assert_eq!(
            power(&dec("-8"), &dec("0.5")).unwrap_err().kind,
            EvalErrorKind::DomainError
        );
        assert_eq!(power(&dec("0"), &dec("0")).unwrap(), dec("1"));
    }

    #[test]
    fn test_large_integer_powers_stay_exact() {
        let tiny = power(&dec("10"), &dec("-5000")).unwrap();
        let text = tiny.to_string();
        assert_eq!(text.len(), 5002);
        assert!(text.starts_with("0.0000"));
        assert!(text.ends_with("01"));
        assert_eq!(tiny, Decimal::from_parts(num_bigint::BigInt::from(1u32), 5000));

        let huge = power(&dec("2"), &dec("5000")).unwrap();
        assert_eq!(huge, Decimal::from(num_bigint::BigInt::from(1u32) << 5000usize));

        let half = power(&dec("0.5"), &dec("5000")).unwrap();
        assert!(!half.is_zero());
        assert_eq!(half * huge, Decimal::one());

        assert_eq!(power(&dec("1"), &dec("1000000000000")).unwrap(), dec("1"));
        assert_eq!(power(&dec("-1"), &dec("1000000000001")).unwrap(), dec("-1"));
        assert_eq!(power(&dec("0"), &dec("1000000000000")).unwrap(), dec("0"));
    }

    #[test]
    fn test_powers_past_the_exact_limit_fail() {
        for (base, exp) in [("2", "100000"), ("0.5", "100000"), ("10", "-100000"), ("3", "1e30")] {
            match power(&dec(base), &dec(exp)) {
                Err(err) => assert_eq!(err.kind, EvalErrorKind::DomainError, "{base} ^ {exp}"),
                Ok(value) => panic!("Expected domain error for {base} ^ {exp}, got {value}"),
            }
        }
        assert_eq!(
            power(&dec("0.5"), &dec("100000.5")).unwrap_err().kind,
            EvalErrorKind::DomainError
        );
    }

    #[test]
    fn test_constants_and_lookup() {
        assert!(constant("pi").unwrap().to_string().starts_with("3.14159265358979"));
        assert!(constant("e").unwrap().to_string().starts_with("2.71828182845904"));
        assert!(constant("tau").is_none());
        assert!(lookup("cos").is_some());
        assert!(lookup("Cos").is_none());
        assert!(names().any(|name| name == "atan2"));
    }
}
