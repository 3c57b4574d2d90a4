//! Search filters
//!
//! Filters arrive as a JSON object mapping a field name to either a literal
//! (exact match) or an operator object such as `{"$gte": 3.0, "$lt": 5.0}`.
//! Field names and value types are checked against the record catalog
//! before any backend sees them.

use crate::domain::record::series_datetime_format;
use crate::domain::{
    CanonicalRecord, FieldKind, FieldValue, IndexerError, RecordField, Result,
};
use serde_json::Value;

/// Maximum number of records returned by one search
pub const SEARCH_PAGE_SIZE: usize = 500;

/// Comparison operator of a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    pub fn from_operator(op: &str) -> Option<Self> {
        match op {
            "$eq" => Some(Comparison::Eq),
            "$ne" => Some(Comparison::Ne),
            "$gt" => Some(Comparison::Gt),
            "$gte" => Some(Comparison::Gte),
            "$lt" => Some(Comparison::Lt),
            "$lte" => Some(Comparison::Lte),
            _ => None,
        }
    }

    /// SQL operator
    pub fn sql(&self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Ne => "<>",
            Comparison::Gt => ">",
            Comparison::Gte => ">=",
            Comparison::Lt => "<",
            Comparison::Lte => "<=",
        }
    }

    /// PocketBase filter operator
    pub fn pocketbase(&self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Ne => "!=",
            Comparison::Gt => ">",
            Comparison::Gte => ">=",
            Comparison::Lt => "<",
            Comparison::Lte => "<=",
        }
    }

    fn holds(&self, actual: &FieldValue, expected: &FieldValue) -> bool {
        match self {
            Comparison::Eq => actual == expected,
            Comparison::Ne => actual != expected,
            Comparison::Gt => actual > expected,
            Comparison::Gte => actual >= expected,
            Comparison::Lt => actual < expected,
            Comparison::Lte => actual <= expected,
        }
    }
}

/// One validated `field op value` condition
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: RecordField,
    pub comparison: Comparison,
    pub value: FieldValue,
}

/// A conjunction of conditions with a result cap
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    conditions: Vec<Condition>,
    limit: usize,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            conditions: Vec::new(),
            limit: SEARCH_PAGE_SIZE,
        }
    }
}

impl SearchQuery {
    /// Parse a JSON filter object
    ///
    /// # Errors
    ///
    /// Returns a validation error for unknown fields, unknown operators, or
    /// values that don't match the field's type.
    pub fn from_json(filters: &Value) -> Result<Self> {
        let map = match filters {
            Value::Object(map) => map,
            Value::Null => return Ok(Self::default()),
            other => {
                return Err(IndexerError::Validation(format!(
                    "Search filters must be a JSON object, got {other}"
                )))
            }
        };

        let mut conditions = Vec::new();
        for (name, condition) in map {
            let field = RecordField::from_name(name).ok_or_else(|| {
                IndexerError::Validation(format!("Unknown search field '{name}'"))
            })?;

            match condition {
                Value::Object(ops) => {
                    if ops.is_empty() {
                        return Err(IndexerError::Validation(format!(
                            "Empty operator object for field '{name}'"
                        )));
                    }
                    for (op, raw) in ops {
                        let comparison = Comparison::from_operator(op).ok_or_else(|| {
                            IndexerError::Validation(format!(
                                "Unsupported operator '{op}' for field '{name}'"
                            ))
                        })?;
                        conditions.push(Condition {
                            field,
                            comparison,
                            value: coerce_value(field, raw)?,
                        });
                    }
                }
                literal => conditions.push(Condition {
                    field,
                    comparison: Comparison::Eq,
                    value: coerce_value(field, literal)?,
                }),
            }
        }

        Ok(Self {
            conditions,
            limit: SEARCH_PAGE_SIZE,
        })
    }

    pub fn with_condition(
        mut self,
        field: RecordField,
        comparison: Comparison,
        value: FieldValue,
    ) -> Self {
        self.conditions.push(Condition {
            field,
            comparison,
            value,
        });
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Whether `record` satisfies every condition
    pub fn matches(&self, record: &CanonicalRecord) -> bool {
        self.conditions.iter().all(|c| {
            c.comparison
                .holds(&record.field_value(c.field), &c.value)
        })
    }
}

fn coerce_value(field: RecordField, raw: &Value) -> Result<FieldValue> {
    let mismatch = || {
        IndexerError::Validation(format!(
            "Value {raw} does not match the type of field '{}'",
            field.name()
        ))
    };

    match field.kind() {
        FieldKind::Text => match raw {
            Value::String(s) => Ok(FieldValue::Text(s.clone())),
            _ => Err(mismatch()),
        },
        FieldKind::Number => match raw {
            Value::Number(n) => n.as_f64().map(FieldValue::Number).ok_or_else(mismatch),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(FieldValue::Number)
                .map_err(|_| mismatch()),
            _ => Err(mismatch()),
        },
        FieldKind::Boolean => match raw {
            Value::Bool(b) => Ok(FieldValue::Boolean(*b)),
            _ => Err(mismatch()),
        },
        FieldKind::Timestamp => match raw {
            Value::String(s) => series_datetime_format::parse(s)
                .map(FieldValue::Timestamp)
                .ok_or_else(mismatch),
            _ => Err(mismatch()),
        },
    }
}
