//! Translation of condition trees into AQL text.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Number;

use crate::condition::{ComparisonOp, Condition};
use crate::error::{FilterError, FilterResult};
use crate::value::{Scalar, Value};

const AND_AQL: &str = " && ";
const OR_AQL: &str = " || ";

fn field_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\A[A-Za-z_][A-Za-z0-9._-]*\z").expect("field pattern is valid")
    })
}

/// Renders conditions against a document variable.
///
/// ```
/// use arango_filter_rs::{Condition, ConditionTranslator};
///
/// let translator = ConditionTranslator::new("u");
/// let aql = translator.translate(&Condition::gte("age", 18i64)).unwrap();
/// assert_eq!(aql, "u.age >= 18");
/// ```
#[derive(Debug, Clone)]
pub struct ConditionTranslator {
    var_name: String,
}

impl ConditionTranslator {
    /// Creates a translator. An empty name falls back to `var`.
    pub fn new(var_name: impl Into<String>) -> Self {
        let var_name = var_name.into();
        Self {
            var_name: if var_name.is_empty() {
                "var".to_string()
            } else {
                var_name
            },
        }
    }

    /// The document variable conditions are rendered against.
    pub fn var_name(&self) -> &str {
        &self.var_name
    }

    /// Translates one condition into an AQL fragment.
    pub fn translate(&self, condition: &Condition) -> FilterResult<String> {
        match condition {
            Condition::Leaf { field, value } => self.comparison(field, ComparisonOp::Eq, value),
            Condition::Comparison { field, op, value } => self.comparison(field, *op, value),
            Condition::Not(inner) => Ok(format!("!({})", self.translate(inner)?)),
            Condition::And(children) => {
                let parts = children
                    .iter()
                    .map(|child| self.translate(child))
                    .collect::<FilterResult<Vec<_>>>()?;
                Ok(format!("({})", parts.join(AND_AQL)))
            }
            Condition::Or(children) => {
                let parts = children
                    .iter()
                    .map(|child| match child {
                        Condition::Group(_) => Ok(format!("({})", self.translate(child)?)),
                        _ => self.translate(child),
                    })
                    .collect::<FilterResult<Vec<_>>>()?;
                Ok(format!("({})", parts.join(OR_AQL)))
            }
            Condition::Group(children) => {
                let parts = children
                    .iter()
                    .map(|child| self.translate(child))
                    .collect::<FilterResult<Vec<_>>>()?;
                Ok(parts.join(AND_AQL))
            }
            Condition::Like {
                text,
                search,
                case_insensitive,
            } => {
                let attribute = self.attribute(text)?;
                let pattern = quote(search);
                // `false` is the LIKE default.
                Ok(match case_insensitive {
                    Some(true) => format!("LIKE({attribute}, {pattern}, true)"),
                    Some(false) | None => format!("LIKE({attribute}, {pattern})"),
                })
            }
        }
    }

    /// Translates top-level where entries, joining them with `&&`.
    pub fn translate_all(&self, conditions: &[Condition]) -> FilterResult<String> {
        let parts = conditions
            .iter()
            .map(|condition| self.translate(condition))
            .collect::<FilterResult<Vec<_>>>()?;
        Ok(parts.join(AND_AQL))
    }

    fn attribute(&self, field: &str) -> FilterResult<String> {
        if !field_pattern().is_match(field) {
            return Err(FilterError::InvalidField {
                field: field.to_string(),
            });
        }
        Ok(format!("{}.{}", self.var_name, field))
    }

    fn comparison(&self, field: &str, op: ComparisonOp, value: &Value) -> FilterResult<String> {
        let attribute = self.attribute(field)?;

        if let Value::Scalar(scalar) = value {
            return Ok(format!("{attribute} {} {}", op.symbol(), scalar_literal(scalar)));
        }

        let membership = match op {
            ComparisonOp::Eq => "IN",
            ComparisonOp::Neq => "NOT IN",
            other => {
                return Err(FilterError::unsupported_type(format!(
                    "array operand for `{}` on `{field}`",
                    other.symbol()
                )))
            }
        };

        Ok(format!("{attribute} {membership} {}", array_literal(value)))
    }
}

fn scalar_literal(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Null => "null".to_string(),
        Scalar::Bool(b) => b.to_string(),
        Scalar::Number(n) => number_literal(n),
        Scalar::String(s) => quote(s),
    }
}

fn array_literal(value: &Value) -> String {
    let elements: Vec<String> = match value {
        Value::Bools(items) => items.iter().map(bool::to_string).collect(),
        Value::Numbers(items) => items.iter().map(number_literal).collect(),
        Value::Strings(items) => items.iter().map(|s| quote(s)).collect(),
        Value::Scalar(scalar) => vec![scalar_literal(scalar)],
    };
    format!("[{}]", elements.join(", "))
}

fn number_literal(number: &Number) -> String {
    number.to_string()
}

/// Single-quotes a string literal, escaping backslashes and quotes.
fn quote(raw: &str) -> String {
    let mut quoted = String::with_capacity(raw.len() + 2);
    quoted.push('\'');
    for c in raw.chars() {
        if c == '\\' || c == '\'' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}
