//! Evaluation scope and engine configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::decimal::{DEFAULT_PRECISION, Decimal, ParseDecimalError};

/// Variable bindings for evaluating an expression.
///
/// A scope maps case-sensitive names to [`Decimal`] values. The evaluator
/// only reads from it, so one scope can serve any number of evaluations,
/// including concurrent ones.
///
/// Values can come from several host representations:
///
/// ```
/// use mathexpr::{Decimal, Scope, evaluate_with_scope};
///
/// let mut scope = Scope::new();
/// scope.insert("num1", 4);                                 // integer
/// scope.insert_str("string2", "5").unwrap();               // text field
/// scope.insert_f32("float0", 35.0 * 3.14159 / 180.0).unwrap(); // float
/// scope.insert("int0", "4".parse::<Decimal>().unwrap());   // decimal
///
/// let result = evaluate_with_scope("num1 + sqrt(int0) / num1", &scope).unwrap();
/// assert_eq!(result, "4.5");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope {
    values: BTreeMap<String, Decimal>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name`, returning the value it replaced.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Decimal>) -> Option<Decimal> {
        self.values.insert(name.into(), value.into())
    }

    /// Binds `name` to a numeric string such as `"5"`, `"-0.25"` or `"1e3"`.
    pub fn insert_str(&mut self, name: impl Into<String>, value: &str) -> Result<(), ParseDecimalError> {
        let value: Decimal = value.parse()?;
        self.values.insert(name.into(), value);
        Ok(())
    }

    /// Binds `name` to the shortest decimal that round-trips `value`.
    pub fn insert_f64(&mut self, name: impl Into<String>, value: f64) -> Result<(), ParseDecimalError> {
        let value = Decimal::try_from(value)?;
        self.values.insert(name.into(), value);
        Ok(())
    }

    /// Like [`Scope::insert_f64`], using the shortest `f32` form.
    pub fn insert_f32(&mut self, name: impl Into<String>, value: f32) -> Result<(), ParseDecimalError> {
        let value = Decimal::try_from(value)?;
        self.values.insert(name.into(), value);
        Ok(())
    }

    /// Builder form of [`Scope::insert`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Decimal>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Decimal> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Decimal> {
        self.values.remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Bindings in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Decimal)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<K: Into<String>, V: Into<Decimal>> FromIterator<(K, V)> for Scope {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut scope = Scope::new();
        for (name, value) in iter {
            scope.insert(name, value);
        }
        scope
    }
}

impl<K: Into<String>, V: Into<Decimal>> Extend<(K, V)> for Scope {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

/// How evaluation treats a caller-supplied scope with no bindings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopePolicy {
    /// An empty scope is valid; unresolved names fail as unknown symbols.
    #[default]
    Lenient,
    /// Evaluating with an empty scope fails with `ExprError::EmptyScope`.
    ///
    /// Evaluation without a scope (`evaluate`) is unaffected.
    RequireNonEmpty,
}

/// Settings for an [`Engine`](crate::engine::Engine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Significant digits kept when a result has no finite decimal expansion.
    pub precision: usize,
    /// Deepest nesting of parentheses, calls and prefix operators the parser accepts.
    pub max_depth: usize,
    /// Longest expression text, in bytes, accepted for parsing.
    pub max_expression_length: usize,
    pub scope_policy: ScopePolicy,
    /// Keep parsed trees keyed by expression text for reuse.
    pub cache_parsed: bool,
    /// Most trees the parse cache holds before evicting the oldest.
    pub cache_capacity: usize,
}

impl EngineConfig {
    pub const DEFAULT_MAX_DEPTH: usize = 500;
    pub const DEFAULT_MAX_EXPRESSION_LENGTH: usize = 10_000;
    pub const DEFAULT_CACHE_CAPACITY: usize = 256;

    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision.max(1);
        self
    }

    pub fn with_scope_policy(mut self, policy: ScopePolicy) -> Self {
        self.scope_policy = policy;
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_parsed = enabled;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            max_depth: Self::DEFAULT_MAX_DEPTH,
            max_expression_length: Self::DEFAULT_MAX_EXPRESSION_LENGTH,
            scope_policy: ScopePolicy::Lenient,
            cache_parsed: false,
            cache_capacity: Self::DEFAULT_CACHE_CAPACITY,
        }
    }
}
