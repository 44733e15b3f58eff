//! Condition tree for the `where` part of a filter.

use serde_json::Map;

use crate::error::{FilterError, FilterResult};
use crate::value::Value;

/// Comparison operators accepted in a field predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl ComparisonOp {
    /// Looks up an operator by its filter key, ignoring case.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "eq" => Some(ComparisonOp::Eq),
            "neq" => Some(ComparisonOp::Neq),
            "gt" => Some(ComparisonOp::Gt),
            "gte" => Some(ComparisonOp::Gte),
            "lt" => Some(ComparisonOp::Lt),
            "lte" => Some(ComparisonOp::Lte),
            _ => None,
        }
    }

    /// The AQL symbol for the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            ComparisonOp::Eq => "==",
            ComparisonOp::Neq => "!=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Gte => ">=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Lte => "<=",
        }
    }
}

/// One node of a where-tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `{field: value}`, an implicit equality.
    Leaf { field: String, value: Value },

    /// `{field: {op: value}}`.
    Comparison {
        field: String,
        op: ComparisonOp,
        value: Value,
    },

    /// `{not: {...}}`.
    Not(Box<Condition>),

    /// `{and: [{...}, ...]}`, rendered parenthesized.
    And(Vec<Condition>),

    /// `{or: [{...}, ...]}`, rendered parenthesized.
    Or(Vec<Condition>),

    /// `{like: {text, search, case_insensitive?}}`.
    Like {
        text: String,
        search: String,
        case_insensitive: Option<bool>,
    },

    /// Sibling keys of one object, joined with `&&`.
    Group(Vec<Condition>),
}

impl Condition {
    /// Creates an implicit equality on a field.
    pub fn leaf(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Leaf {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates a comparison on a field.
    pub fn compare(field: impl Into<String>, op: ComparisonOp, value: impl Into<Value>) -> Self {
        Condition::Comparison {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, ComparisonOp::Eq, value)
    }

    pub fn neq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, ComparisonOp::Neq, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, ComparisonOp::Gt, value)
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, ComparisonOp::Gte, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, ComparisonOp::Lt, value)
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, ComparisonOp::Lte, value)
    }

    /// Creates a negation.
    pub fn negate(inner: Condition) -> Self {
        Condition::Not(Box::new(inner))
    }

    pub fn and(children: Vec<Condition>) -> Self {
        Condition::And(children)
    }

    pub fn or(children: Vec<Condition>) -> Self {
        Condition::Or(children)
    }

    /// Creates a `LIKE` pattern match.
    ///
    /// Only `Some(true)` renders the case-insensitive third argument; `Some(false)`
    /// and `None` both render the two-argument, case-sensitive form.
    pub fn like(
        text: impl Into<String>,
        search: impl Into<String>,
        case_insensitive: Option<bool>,
    ) -> Self {
        Condition::Like {
            text: text.into(),
            search: search.into(),
            case_insensitive,
        }
    }

    /// Builds a condition from one JSON object of a where-tree.
    ///
    /// Keys are processed in lexicographic order, so the same object always
    /// yields the same condition. An empty object is an error here; only the
    /// top level of a where-tree treats `{}` as "no condition".
    pub fn from_json_object(object: &Map<String, serde_json::Value>) -> FilterResult<Self> {
        let mut children = Vec::with_capacity(object.len());

        for (key, value) in sorted_entries(object) {
            children.push(key_condition(key, value)?);
        }

        match children.len() {
            0 => Err(FilterError::unsupported_type("empty condition object")),
            1 => Ok(children.remove(0)),
            _ => Ok(Condition::Group(children)),
        }
    }

    /// Appends every field name referenced by this condition, depth first.
    pub fn collect_fields(&self, out: &mut Vec<String>) {
        match self {
            Condition::Leaf { field, .. } | Condition::Comparison { field, .. } => {
                out.push(field.clone())
            }
            Condition::Like { text, .. } => out.push(text.clone()),
            Condition::Not(inner) => inner.collect_fields(out),
            Condition::And(children) | Condition::Or(children) | Condition::Group(children) => {
                for child in children {
                    child.collect_fields(out);
                }
            }
        }
    }
}

fn sorted_entries(
    object: &Map<String, serde_json::Value>,
) -> Vec<(&String, &serde_json::Value)> {
    let mut entries: Vec<_> = object.iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    entries
}

/// Converts a single `key: value` pair of a condition object.
fn key_condition(key: &str, value: &serde_json::Value) -> FilterResult<Condition> {
    match key.to_ascii_lowercase().as_str() {
        "not" => match value {
            serde_json::Value::Object(inner) => {
                Ok(Condition::negate(Condition::from_json_object(inner)?))
            }
            other => Err(FilterError::invalid_operand(
                "not",
                format!("must be an object: {other}"),
            )),
        },
        "and" => Ok(Condition::And(combinator_operands("and", value)?)),
        "or" => Ok(Condition::Or(combinator_operands("or", value)?)),
        "like" => like_condition(value),
        _ => field_condition(key.to_string(), value),
    }
}

fn combinator_operands(combinator: &str, value: &serde_json::Value) -> FilterResult<Vec<Condition>> {
    let serde_json::Value::Array(items) = value else {
        return Err(FilterError::invalid_operand(
            combinator,
            format!("must be an array: {value}"),
        ));
    };

    if items.is_empty() {
        return Err(FilterError::invalid_operand(combinator, "must not be empty"));
    }

    items
        .iter()
        .map(|item| match item {
            serde_json::Value::Object(object) => Condition::from_json_object(object),
            other => Err(FilterError::invalid_operand(
                combinator,
                format!("values are present: {other}"),
            )),
        })
        .collect()
}

fn like_condition(value: &serde_json::Value) -> FilterResult<Condition> {
    let serde_json::Value::Object(params) = value else {
        return Err(FilterError::invalid_arguments(
            "like",
            format!("must be an object: {value}"),
        ));
    };

    if let Some(unknown) = params
        .keys()
        .find(|key| !matches!(key.as_str(), "text" | "search" | "case_insensitive"))
    {
        return Err(FilterError::invalid_arguments(
            "like",
            format!("unknown parameter `{unknown}`"),
        ));
    }

    let text = params
        .get("text")
        .and_then(|v| v.as_str())
        .ok_or_else(|| FilterError::invalid_arguments("like", "missing string `text`"))?;
    let search = params
        .get("search")
        .and_then(|v| v.as_str())
        .ok_or_else(|| FilterError::invalid_arguments("like", "missing string `search`"))?;
    let case_insensitive = match params.get("case_insensitive") {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::Bool(b)) => Some(*b),
        Some(other) => {
            return Err(FilterError::invalid_arguments(
                "like",
                format!("`case_insensitive` must be a boolean: {other}"),
            ))
        }
    };

    Ok(Condition::like(text, search, case_insensitive))
}

/// Converts the value attached to a field key.
///
/// Objects hold operator keys; any other key inside them extends the
/// attribute path (`{"address": {"city": "Lyon"}}` targets `address.city`).
fn field_condition(path: String, value: &serde_json::Value) -> FilterResult<Condition> {
    let serde_json::Value::Object(predicates) = value else {
        return Ok(Condition::Leaf {
            field: path,
            value: Value::try_from(value)?,
        });
    };

    let mut children = Vec::with_capacity(predicates.len());

    for (key, operand) in sorted_entries(predicates) {
        if let Some(op) = ComparisonOp::from_key(key) {
            children.push(Condition::Comparison {
                field: path.clone(),
                op,
                value: Value::try_from(operand)?,
            });
            continue;
        }

        match key.to_ascii_lowercase().as_str() {
            connective @ ("not" | "and" | "or" | "like") => {
                return Err(FilterError::invalid_operand(
                    connective,
                    format!("cannot be nested under field `{path}`"),
                ))
            }
            _ => children.push(field_condition(format!("{path}.{key}"), operand)?),
        }
    }

    match children.len() {
        0 => Err(FilterError::unsupported_type(format!(
            "empty object for field `{path}`"
        ))),
        1 => Ok(children.remove(0)),
        _ => Ok(Condition::Group(children)),
    }
}
