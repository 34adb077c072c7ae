//! Data collection from the braindata service
//!
//! One POST per call: the requested variables and the order variable are
//! expanded to `mb<mb_id>/d<var_id>`, the filters merged into a single AND
//! filter, and each returned column converted according to its declared type.

use crate::entity::{EntityId, MemoryBase};
use crate::filter::{combine, BoolOp, FilterExpr, DATETIME_FORMAT};
use crate::path::join_path;
use crate::transport::Method;
use crate::{Error, Result};
use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

/// Data endpoint, relative to the cube path
pub const DATA_PATH: &str = "braindata/{mb_id}/LF";

const DATA_KEY: &str = "data";

/// `mb<id>`
pub fn long_mb_id(id: &EntityId) -> String {
    format!("mb{}", id)
}

/// `<long_mb_id>/d<var_id>`
pub fn expand_var_id(long_mb_id: &str, var_id: impl fmt::Display) -> String {
    format!("{}/d{}", long_mb_id, var_id)
}

/// Id of the order variable named by memory base metadata
///
/// `referenceDate` holds the id directly; newer descriptions nest it under
/// `referenceDateVariable.bcId`.
pub fn order_variable_id(metadata: &Value) -> Option<EntityId> {
    metadata
        .get("referenceDate")
        .and_then(EntityId::from_json)
        .or_else(|| {
            metadata
                .get("referenceDateVariable")?
                .get("bcId")
                .and_then(EntityId::from_json)
        })
}

/// Body of a data request; the filter context is omitted without filters
pub fn build_request_body(
    long_mb_id: &str,
    order: String,
    definitions: Vec<String>,
    filters: Vec<FilterExpr>,
) -> Value {
    let mut context = json!({ "dataSource": long_mb_id });
    if let Some(filter) = combine(filters, BoolOp::And).pop() {
        context["filter"] = filter.to_json();
    }
    json!({
        "order": order,
        "definitions": definitions,
        "context": context,
    })
}

/// Keys of the returned columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataLabel {
    /// Variable ids
    #[default]
    Id,
    /// Variable display names, at the cost of one variable request per column
    Name,
}

/// One typed column
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Column {
    Integer(Vec<i64>),
    /// Values that do not parse as numbers are NaN
    Float(Vec<f64>),
    /// Values that do not parse as dates are `None`
    Datetime(Vec<Option<NaiveDateTime>>),
    /// Raw values, unconverted
    Text(Vec<Value>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Integer(v) => v.len(),
            Column::Float(v) => v.len(),
            Column::Datetime(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Columns keyed by variable id or name
pub type DataSet = BTreeMap<String, Column>;

fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_float(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .unwrap_or(f64::NAN)
}

fn as_datetime(column: &str, value: &Value) -> Option<NaiveDateTime> {
    let parsed = value
        .as_str()
        .and_then(|s| NaiveDateTime::parse_from_str(s, DATETIME_FORMAT).ok());
    if parsed.is_none() {
        warn!(column, value = %value, "Unparsable datetime value");
    }
    parsed
}

/// Convert one raw column according to its declared type
///
/// A numeric column becomes integers, or floats as a whole as soon as one
/// value is not an integer.
pub fn format_column(column: &str, var_type: &str, values: &[Value], parse_date: bool) -> Column {
    match var_type {
        "DATETIME" if parse_date => {
            Column::Datetime(values.iter().map(|v| as_datetime(column, v)).collect())
        }
        "NUMERIC" => match values.iter().map(as_int).collect::<Option<Vec<_>>>() {
            Some(ints) => Column::Integer(ints),
            None => Column::Float(values.iter().map(as_float).collect()),
        },
        _ => Column::Text(values.to_vec()),
    }
}

/// Extract and convert the columns of a data response
pub fn extract_format_data(raw: &Value, parse_date: bool) -> Result<DataSet> {
    let columns = raw
        .get("datadefs")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::malformed(&raw.to_string()))?;

    let mut dataset = DataSet::new();
    for column in columns {
        let id = column
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::malformed(&column.to_string()))?;
        let key = id.split_once("/d").map_or(id, |(_, var)| var);
        let var_type = column.get("type").and_then(Value::as_str).unwrap_or_default();
        let values = column
            .get(DATA_KEY)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        dataset.insert(key.to_string(), format_column(key, var_type, values, parse_date));
    }
    Ok(dataset)
}

/// Request and convert the data of some variables of a memory base
pub fn collect_data(
    memory_base: &MemoryBase,
    variable_ids: &[EntityId],
    filters: Vec<FilterExpr>,
    label: DataLabel,
) -> Result<DataSet> {
    let long_mb_id = memory_base.long_id();
    let order = memory_base.order_variable_long_id()?;
    let definitions = variable_ids
        .iter()
        .map(|id| expand_var_id(&long_mb_id, id))
        .collect::<Vec<_>>();
    let body = build_request_body(&long_mb_id, order, definitions, filters);

    let data_path = DATA_PATH.replace("{mb_id}", &long_mb_id);
    let path = join_path(&[memory_base.braincube_path(), data_path.as_str()]);
    let client = memory_base.client();
    let raw = client.request_ws(Method::Post, &path, Some(&body), &memory_base.braincube_name())?;

    let dataset = extract_format_data(&raw, client.params().parse_date())?;
    debug!(memory_base = %long_mb_id, columns = dataset.len(), "Collected data");

    match label {
        DataLabel::Id => Ok(dataset),
        DataLabel::Name => label_by_name(dataset, |key| memory_base.variable(key)?.get_name()),
    }
}

/// Re-key columns by variable name; two variables sharing a name is an error
fn label_by_name(dataset: DataSet, mut name_of: impl FnMut(&str) -> Result<String>) -> Result<DataSet> {
    let mut named = DataSet::new();
    for (key, column) in dataset {
        let name = name_of(&key)?;
        if named.contains_key(&name) {
            return Err(Error::InvalidParameter(format!(
                "variable {key} shares the name '{name}' with another requested variable"
            )));
        }
        named.insert(name, column);
    }
    Ok(named)
}
