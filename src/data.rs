use anyhow::{anyhow, Result};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::HashSet;

use crate::error::{ShapeError, ShapeResult};
use crate::parser::parse_scalar;

/// A single cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    Missing,
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Label text used when the value sits on a category axis.
    pub fn label(&self) -> String {
        match self {
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Value::Number(n) => n.to_string(),
            Value::Text(s) => s.clone(),
            Value::Missing => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Convenience constructor for an all-text column
    pub fn text<S: AsRef<str>>(name: impl Into<String>, values: &[S]) -> Self {
        Self::new(
            name,
            values.iter().map(|v| Value::Text(v.as_ref().to_string())).collect(),
        )
    }

    /// Convenience constructor for an all-numeric column
    pub fn numbers(name: impl Into<String>, values: &[f64]) -> Self {
        Self::new(name, values.iter().map(|&v| Value::Number(v)).collect())
    }
}

/// An ordered table of named columns.
///
/// The identifier and columns are fixed at construction. Shape invariants
/// (equal lengths, unique names) are checked by [`Dataset::validate`], which the
/// classifier runs before looking at any column.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    id: String,
    columns: Vec<Column>,
    label_column: Option<String>,
}

impl Dataset {
    pub fn new(id: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            id: id.into(),
            columns,
            label_column: None,
        }
    }

    /// Mark a column as the dataset's label axis, so it classifies as a
    /// dimension even when its values are numeric (e.g. `Year: 2022, 2023`).
    pub fn with_label_column(mut self, name: impl Into<String>) -> Self {
        self.label_column = Some(name.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn label_column(&self) -> Option<&str> {
        self.label_column.as_deref()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    pub fn validate(&self) -> ShapeResult<()> {
        let rows = self.row_count();
        if self.columns.is_empty() || rows == 0 {
            return Err(ShapeError::EmptyDataset {
                dataset: self.id.clone(),
            });
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if column.values.len() != rows {
                return Err(ShapeError::RaggedColumns {
                    dataset: self.id.clone(),
                    column: column.name.clone(),
                    expected: rows,
                    found: column.values.len(),
                });
            }
            if !seen.insert(column.name.as_str()) {
                return Err(ShapeError::DuplicateColumn {
                    dataset: self.id.clone(),
                    column: column.name.clone(),
                });
            }
        }

        Ok(())
    }

    /// Create a Dataset from a JSON Array of Objects
    pub fn from_json(id: impl Into<String>, value: &JsonValue) -> Result<Self> {
        let array = value
            .as_array()
            .ok_or_else(|| anyhow!("Input data must be a JSON array of objects"))?;

        // An empty array is an empty dataset; the composer notes and skips it
        if array.is_empty() {
            return Ok(Self::new(id, Vec::new()));
        }

        // Column order follows the keys of the first object
        let first_obj = array[0]
            .as_object()
            .ok_or_else(|| anyhow!("Items in array must be objects"))?;
        let headers: Vec<String> = first_obj.keys().cloned().collect();

        let mut columns: Vec<Column> = headers
            .iter()
            .map(|h| Column::new(h.clone(), Vec::with_capacity(array.len())))
            .collect();

        for item in array {
            let obj = item
                .as_object()
                .ok_or_else(|| anyhow!("Items in array must be objects"))?;

            for column in columns.iter_mut() {
                let cell = match obj.get(&column.name) {
                    Some(JsonValue::Number(n)) => n
                        .as_f64()
                        .map(Value::Number)
                        .ok_or_else(|| anyhow!("Number out of range in field '{}'", column.name))?,
                    Some(JsonValue::String(s)) => parse_scalar(s),
                    Some(JsonValue::Bool(b)) => Value::Text(b.to_string()),
                    Some(JsonValue::Null) | None => Value::Missing,
                    _ => return Err(anyhow!("Unsupported value type for field '{}'", column.name)),
                };
                column.values.push(cell);
            }
        }

        Ok(Self::new(id, columns))
    }
}
