//! Query filter clauses and the filter normalizer.
//!
//! Callers describe filters loosely: as ready-made clauses, as a flat
//! `field -> value` map, or as `field -> {operator: value}` objects. The
//! normalizer turns any of those into the ordered clause list the query
//! endpoints expect on the wire.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::AutotaskError;

/// Comparison operators accepted by the query endpoints.
///
/// Serialized as the camelCase wire name; deserialized through
/// [`FilterOperator::parse`], so any ASCII case is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    /// Equal.
    Eq,
    /// Not equal.
    Noteq,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// String prefix match.
    BeginsWith,
    /// String suffix match.
    EndsWith,
    /// Substring match.
    Contains,
    /// Field has a value.
    Exist,
    /// Field has no value.
    NotExist,
    /// Value is one of an array.
    In,
    /// Value is none of an array.
    NotIn,
}

impl FilterOperator {
    /// Every operator, in wire-name order.
    pub const ALL: [FilterOperator; 13] = [
        FilterOperator::Eq,
        FilterOperator::Noteq,
        FilterOperator::Gt,
        FilterOperator::Gte,
        FilterOperator::Lt,
        FilterOperator::Lte,
        FilterOperator::BeginsWith,
        FilterOperator::EndsWith,
        FilterOperator::Contains,
        FilterOperator::Exist,
        FilterOperator::NotExist,
        FilterOperator::In,
        FilterOperator::NotIn,
    ];

    /// Wire name of the operator.
    pub fn as_str(self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Noteq => "noteq",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::BeginsWith => "beginsWith",
            FilterOperator::EndsWith => "endsWith",
            FilterOperator::Contains => "contains",
            FilterOperator::Exist => "exist",
            FilterOperator::NotExist => "notExist",
            FilterOperator::In => "in",
            FilterOperator::NotIn => "notIn",
        }
    }

    /// Looks up an operator by wire name, ignoring ASCII case.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(name))
    }

    /// True for operators whose value must be an array.
    pub fn requires_array(self) -> bool {
        matches!(self, FilterOperator::In | FilterOperator::NotIn)
    }

    /// True for operators that carry no value.
    pub fn is_unary(self) -> bool {
        matches!(self, FilterOperator::Exist | FilterOperator::NotExist)
    }
}

impl std::fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FilterOperator {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        FilterOperator::parse(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown filter operator '{}'", name)))
    }
}

/// One `{op, field, value}` condition sent to a query endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterClause {
    /// Comparison operator.
    #[serde(rename = "op", alias = "operator")]
    pub operator: FilterOperator,

    /// Field name, as defined by the server schema.
    pub field: String,

    /// Comparison value; omitted on the wire for unary operators.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub value: Value,
}

impl FilterClause {
    /// Creates a clause.
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: impl Into<Value>) -> Self {
        Self {
            operator,
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates an equality clause.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::Eq, value)
    }

    /// Creates a greater-than-or-equal clause.
    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::Gte, value)
    }

    /// Creates a less-than-or-equal clause.
    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::Lte, value)
    }

    /// Creates a substring clause.
    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::Contains, value)
    }

    /// Creates a membership clause.
    pub fn is_in<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        Self::new(field, FilterOperator::In, Value::Array(values))
    }

    /// The catch-all clause (`id gte 0`) sent when the caller gives no filter.
    /// Query endpoints reject requests without at least one clause.
    pub fn match_all() -> Self {
        Self::gte("id", 0)
    }

    /// Checks the clause shape. Field names are not checked against any schema;
    /// the server rejects unknown fields.
    pub fn validate(&self) -> Result<(), AutotaskError> {
        if self.field.trim().is_empty() {
            return Err(AutotaskError::validation("filter field must not be empty"));
        }
        if self.operator.requires_array() && !self.value.is_array() {
            return Err(AutotaskError::validation(format!(
                "filter operator '{}' on '{}' requires an array value",
                self.operator, self.field
            )));
        }
        if !self.operator.is_unary() && self.value.is_null() {
            return Err(AutotaskError::validation(format!(
                "filter operator '{}' on '{}' requires a value",
                self.operator, self.field
            )));
        }
        Ok(())
    }
}

/// A caller-supplied filter in any of the accepted shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterInput {
    /// Already-normalized clauses.
    Clauses(Vec<FilterClause>),
    /// `field -> scalar` (equality), `field -> array` (membership) or
    /// `field -> {operator: value, ...}` entries, in insertion order.
    Fields(Map<String, Value>),
}

impl Default for FilterInput {
    fn default() -> Self {
        FilterInput::Clauses(Vec::new())
    }
}

impl From<Vec<FilterClause>> for FilterInput {
    fn from(clauses: Vec<FilterClause>) -> Self {
        FilterInput::Clauses(clauses)
    }
}

impl From<FilterClause> for FilterInput {
    fn from(clause: FilterClause) -> Self {
        FilterInput::Clauses(vec![clause])
    }
}

impl From<Map<String, Value>> for FilterInput {
    fn from(fields: Map<String, Value>) -> Self {
        FilterInput::Fields(fields)
    }
}

impl FilterInput {
    /// Interprets loosely-typed JSON as a filter.
    ///
    /// `null` means no filter, an array is read as clauses and an object as
    /// a field map.
    ///
    /// # Errors
    ///
    /// Returns `AutotaskError::Validation` for any other JSON shape or for
    /// array elements that are not clauses.
    pub fn from_value(value: Value) -> Result<Self, AutotaskError> {
        match value {
            Value::Null => Ok(FilterInput::default()),
            Value::Object(fields) => Ok(FilterInput::Fields(fields)),
            Value::Array(items) => items
                .into_iter()
                .map(|item| {
                    serde_json::from_value::<FilterClause>(item).map_err(|e| {
                        AutotaskError::validation(format!("malformed filter clause: {}", e))
                    })
                })
                .collect::<Result<Vec<_>, _>>()
                .map(FilterInput::Clauses),
            other => Err(AutotaskError::validation(format!(
                "filter must be an object or an array of clauses, got {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Returns true when the input holds no conditions.
    pub fn is_empty(&self) -> bool {
        match self {
            FilterInput::Clauses(clauses) => clauses.is_empty(),
            FilterInput::Fields(fields) => fields.is_empty(),
        }
    }
}

/// Normalizes a filter into the ordered clause list sent on the wire.
///
/// - No filter, or an empty one, yields `[id gte 0]`.
/// - Clauses pass through unchanged after validation, so normalizing twice
///   is a no-op.
/// - Field maps keep key order. A scalar means `eq`, an array means `in`,
///   and an object maps operator names to values. An object with several
///   operators (e.g. `{"gte": 1, "lte": 9}`) yields one clause per operator
///   in key order; the top-level clauses are combined with AND by the server.
///
/// # Errors
///
/// Returns `AutotaskError::Validation` for empty field names, unknown
/// operators, empty operator objects, `null` values, or `in`/`notIn`
/// without an array.
pub fn normalize(filter: Option<&FilterInput>) -> Result<Vec<FilterClause>, AutotaskError> {
    let clauses = match filter {
        None => Vec::new(),
        Some(FilterInput::Clauses(clauses)) => clauses.clone(),
        Some(FilterInput::Fields(fields)) => clauses_from_fields(fields)?,
    };

    if clauses.is_empty() {
        return Ok(vec![FilterClause::match_all()]);
    }

    for clause in &clauses {
        clause.validate()?;
    }
    Ok(clauses)
}

fn clauses_from_fields(fields: &Map<String, Value>) -> Result<Vec<FilterClause>, AutotaskError> {
    let mut clauses = Vec::with_capacity(fields.len());

    for (field, value) in fields {
        match value {
            Value::Object(ops) => {
                if ops.is_empty() {
                    return Err(AutotaskError::validation(format!(
                        "filter on '{}' has no operator",
                        field
                    )));
                }
                for (name, operand) in ops {
                    let operator = FilterOperator::parse(name).ok_or_else(|| {
                        AutotaskError::validation(format!(
                            "unknown filter operator '{}' on '{}'",
                            name, field
                        ))
                    })?;
                    clauses.push(FilterClause::new(field.as_str(), operator, operand.clone()));
                }
            }
            Value::Array(_) => {
                clauses.push(FilterClause::new(field.as_str(), FilterOperator::In, value.clone()));
            }
            Value::Null => {
                return Err(AutotaskError::validation(format!(
                    "filter on '{}' is null; use exist/notExist",
                    field
                )));
            }
            scalar => clauses.push(FilterClause::eq(field.as_str(), scalar.clone())),
        }
    }

    Ok(clauses)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
