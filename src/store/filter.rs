//! Equality/range predicates over stored documents
//!
//! Filters address fields of the serialized document by dotted path
//! (`metadata.type`, `quality_score`, `metadata.language`). Only scalar
//! comparisons are supported; similarity search is layered on top by
//! the ranker.

use crate::error::{Error, Result};
use crate::store::DocumentType;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::OnceLock;

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl FilterOp {
    pub fn sql(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Ne => "!=",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
        }
    }

    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            FilterOp::Eq => ordering == Ordering::Equal,
            FilterOp::Ne => ordering != Ordering::Equal,
            FilterOp::Gt => ordering == Ordering::Greater,
            FilterOp::Gte => ordering != Ordering::Less,
            FilterOp::Lt => ordering == Ordering::Less,
            FilterOp::Lte => ordering != Ordering::Greater,
        }
    }
}

/// A single predicate: `field op value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

fn field_pattern() -> &'static Regex {
    static FIELD_RE: OnceLock<Regex> = OnceLock::new();
    FIELD_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").unwrap()
    })
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Gte, value)
    }

    /// `metadata.type = <doc_type>`
    pub fn doc_type(doc_type: DocumentType) -> Self {
        Self::eq("metadata.type", doc_type.as_str())
    }

    /// `quality_score >= <min>`
    pub fn min_quality(min: f32) -> Self {
        Self::gte("quality_score", f32_value(min))
    }

    /// Check the field path and value shape
    pub fn validate(&self) -> Result<()> {
        if !field_pattern().is_match(&self.field) {
            return Err(Error::InvalidFilter(format!(
                "field '{}' is not a dotted identifier path",
                self.field
            )));
        }

        match &self.value {
            Value::String(_) | Value::Number(_) | Value::Bool(_) => Ok(()),
            other => Err(Error::InvalidFilter(format!(
                "field '{}' must be compared against a scalar, got {}",
                self.field, other
            ))),
        }
    }

    /// SQLite JSON path for the field (`$.metadata.type`)
    pub fn json_path(&self) -> String {
        format!("$.{}", self.field)
    }

    /// Evaluate the predicate against a serialized document
    pub fn matches(&self, document: &Value) -> bool {
        let pointer = format!("/{}", self.field.replace('.', "/"));
        let Some(actual) = document.pointer(&pointer) else {
            return false;
        };

        match compare_scalars(actual, &self.value) {
            Some(ordering) => self.op.accepts(ordering),
            None => self.op == FilterOp::Ne && !actual.is_null(),
        }
    }
}

/// JSON number for an f32 using its shortest decimal form, matching how
/// stored documents serialize their scores
pub fn f32_value(value: f32) -> Value {
    value
        .to_string()
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn compare_scalars(actual: &Value, expected: &Value) -> Option<Ordering> {
    match (actual, expected) {
        (Value::String(a), Value::String(b)) => Some(a.as_str().cmp(b.as_str())),
        _ => {
            let a = as_number(actual)?;
            let b = as_number(expected)?;
            a.partial_cmp(&b)
        }
    }
}

/// A filtered, capped read over the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentQuery {
    pub filters: Vec<Filter>,
    pub limit: usize,
}

impl DocumentQuery {
    pub fn new(limit: usize) -> Self {
        Self {
            filters: Vec::new(),
            limit,
        }
    }

    pub fn with(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.filters.iter().try_for_each(Filter::validate)
    }

    pub fn matches(&self, document: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(document))
    }
}
