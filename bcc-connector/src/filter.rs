//! Filter compilation
//!
//! Conditions stored in event and job metadata are compiled into the nested
//! boolean expressions accepted by the data service. Each node serializes to a
//! JSON object with a single key:
//!
//! ```text
//! {"AND": [left, right]}    {"OR": [left, right]}    {"NOT": [inner]}
//! {"EQUALS": ["mb1/d2", ["modality"]]}
//! {"BETWEEN": ["mb1/d2", min, max]}  {"GREAT": ["mb1/d2", min]}  {"LESS": ["mb1/d2", max]}
//! ```
//!
//! Several filters are merged with [`combine`], which nests them from the
//! left: `[A, B, C]` becomes `AND(AND(A, B), C)`. Consumers compare the
//! compiled shape, so the nesting order is kept as is.

use crate::entity::EntityId;
use crate::{Error, Result};
use chrono::DateTime;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};
use std::fmt;

/// Wire format of datetime bounds and datetime columns (UTC)
pub const DATETIME_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Boolean operator joining two filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

impl BoolOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoolOp::And => "AND",
            BoolOp::Or => "OR",
        }
    }
}

/// One node of a compiled filter tree
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    And(Box<FilterExpr>, Box<FilterExpr>),
    Or(Box<FilterExpr>, Box<FilterExpr>),
    Not(Box<FilterExpr>),
    /// Variable equal to one of `values`
    Equals { variable: String, values: Vec<Value> },
    Between { variable: String, minimum: Value, maximum: Value },
    /// Variable above `minimum`
    Great { variable: String, minimum: Value },
    /// Variable below `maximum`
    Less { variable: String, maximum: Value },
}

impl FilterExpr {
    pub fn join(op: BoolOp, left: FilterExpr, right: FilterExpr) -> Self {
        match op {
            BoolOp::And => FilterExpr::And(Box::new(left), Box::new(right)),
            BoolOp::Or => FilterExpr::Or(Box::new(left), Box::new(right)),
        }
    }

    pub fn negate(self) -> Self {
        FilterExpr::Not(Box::new(self))
    }

    /// Wire JSON of the tree
    pub fn to_json(&self) -> Value {
        match self {
            FilterExpr::And(l, r) => json!({"AND": [l.to_json(), r.to_json()]}),
            FilterExpr::Or(l, r) => json!({"OR": [l.to_json(), r.to_json()]}),
            FilterExpr::Not(inner) => json!({"NOT": [inner.to_json()]}),
            FilterExpr::Equals { variable, values } => json!({"EQUALS": [variable, values]}),
            FilterExpr::Between { variable, minimum, maximum } => {
                json!({"BETWEEN": [variable, minimum, maximum]})
            }
            FilterExpr::Great { variable, minimum } => json!({"GREAT": [variable, minimum]}),
            FilterExpr::Less { variable, maximum } => json!({"LESS": [variable, maximum]}),
        }
    }

    /// Parse a wire JSON filter, e.g. one written by hand on the command line
    pub fn from_json(value: &Value) -> Result<Self> {
        let invalid = || Error::InvalidParameter(format!("not a filter: {}", value));
        let map = value.as_object().filter(|m| m.len() == 1).ok_or_else(invalid)?;
        let (key, args) = map.iter().next().ok_or_else(invalid)?;
        let args = args.as_array().ok_or_else(invalid)?;
        let variable = || {
            args.first()
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(invalid)
        };

        match (key.as_str(), args.len()) {
            ("AND", 2) | ("OR", 2) => {
                let op = if key == "AND" { BoolOp::And } else { BoolOp::Or };
                Ok(Self::join(op, Self::from_json(&args[0])?, Self::from_json(&args[1])?))
            }
            ("NOT", 1) => Ok(Self::from_json(&args[0])?.negate()),
            ("EQUALS", 2) => {
                let values = args[1].as_array().cloned().ok_or_else(invalid)?;
                Ok(FilterExpr::Equals { variable: variable()?, values })
            }
            ("BETWEEN", 3) => Ok(FilterExpr::Between {
                variable: variable()?,
                minimum: args[1].clone(),
                maximum: args[2].clone(),
            }),
            ("GREAT", 2) => Ok(FilterExpr::Great { variable: variable()?, minimum: args[1].clone() }),
            ("LESS", 2) => Ok(FilterExpr::Less { variable: variable()?, maximum: args[1].clone() }),
            _ => Err(invalid()),
        }
    }
}

impl Serialize for FilterExpr {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// Merge filters under one operator, nesting from the left
///
/// Returns an empty list for no filter and a single-element list otherwise.
pub fn combine(filters: Vec<FilterExpr>, op: BoolOp) -> Vec<FilterExpr> {
    let mut iter = filters.into_iter();
    match iter.next() {
        None => Vec::new(),
        Some(first) => vec![iter.fold(first, |acc, next| FilterExpr::join(op, acc, next))],
    }
}

/// Declared type of a variable, from its `type` metadata field
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VariableType {
    Numeric,
    Datetime,
    Discrete,
    #[default]
    Unknown,
    Other(String),
}

impl From<&str> for VariableType {
    fn from(value: &str) -> Self {
        match value {
            "NUMERIC" => VariableType::Numeric,
            "DATETIME" => VariableType::Datetime,
            "DISCRETE" => VariableType::Discrete,
            "" => VariableType::Unknown,
            other => VariableType::Other(other.to_string()),
        }
    }
}

/// What a condition is compiled against: the variable's wire id and type
#[derive(Debug, Clone, PartialEq)]
pub struct FilterTarget {
    pub long_id: String,
    pub var_type: VariableType,
}

/// A declarative constraint on one variable
///
/// Modalities and bounds are both kept; the variable's type decides which
/// of them the compiled filter uses.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub variable: EntityId,
    /// `false` inverts the compiled filter
    pub positive: bool,
    /// Accepted values of a discrete variable
    pub modalities: Vec<Value>,
    pub minimum: Option<Value>,
    pub maximum: Option<Value>,
}

impl Condition {
    /// Read a condition out of entity metadata
    ///
    /// Returns `None` for entries that reference no variable. A missing
    /// `positive` flag reads as positive.
    pub fn from_json(raw: &Value) -> Option<Self> {
        let variable = raw.get("variable")?.get("bcId").and_then(EntityId::from_json)?;
        let positive = raw.get("positive").and_then(Value::as_bool).unwrap_or(true);
        let bound = |key: &str| raw.get(key).filter(|v| !v.is_null()).cloned();
        let modalities = raw
            .get("modalities")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Some(Self {
            variable,
            positive,
            modalities,
            minimum: bound("minimum"),
            maximum: bound("maximum"),
        })
    }

    fn bounds(&self) -> (Option<&Value>, Option<&Value>) {
        (self.minimum.as_ref(), self.maximum.as_ref())
    }
}

/// Compile one condition; `None` when it constrains nothing
pub fn compile_condition(target: &FilterTarget, condition: &Condition) -> Option<FilterExpr> {
    let filter = match target.var_type {
        VariableType::Discrete => discrete_filter(target, &condition.modalities),
        _ => range_filter(target, condition.bounds()),
    }?;

    if condition.positive {
        Some(filter)
    } else {
        Some(filter.negate())
    }
}

fn discrete_filter(target: &FilterTarget, modalities: &[Value]) -> Option<FilterExpr> {
    let equals = modalities
        .iter()
        .map(|modality| FilterExpr::Equals {
            variable: target.long_id.clone(),
            values: vec![modality.clone()],
        })
        .collect();
    combine(equals, BoolOp::Or).pop()
}

fn range_filter(target: &FilterTarget, (minimum, maximum): (Option<&Value>, Option<&Value>)) -> Option<FilterExpr> {
    let convert = |bound: Option<&Value>| match target.var_type {
        VariableType::Datetime => bound.and_then(to_datetime_str).map(Value::String),
        _ => bound.cloned(),
    };
    let variable = target.long_id.clone();

    match (convert(minimum), convert(maximum)) {
        (Some(minimum), Some(maximum)) => Some(FilterExpr::Between { variable, minimum, maximum }),
        (Some(minimum), None) => Some(FilterExpr::Great { variable, minimum }),
        (None, Some(maximum)) => Some(FilterExpr::Less { variable, maximum }),
        (None, None) => None,
    }
}

/// Format an epoch-millisecond timestamp as a service datetime string
///
/// Accepts a JSON number or a numeric string; anything else is no bound.
pub fn to_datetime_str(timestamp_ms: &Value) -> Option<String> {
    let millis = match timestamp_ms {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f as i64),
        _ => None,
    }?;
    DateTime::from_timestamp_millis(millis).map(|dt| dt.format(DATETIME_FORMAT).to_string())
}
