//! Result rows handed back by an executor

use crate::error::{Error, Result};
use sea_query::{Value, ValueType};

/// One result row: column names paired with values, in select order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.push((column.into(), value.into()));
    }

    /// Builder form of [`Row::push`]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Raw value for `column`
    ///
    /// A qualified result name such as `book.title` also answers to `title`.
    pub fn value(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| {
                name == column || name.rsplit_once('.').is_some_and(|(_, bare)| bare == column)
            })
            .map(|(_, value)| value)
    }

    pub fn value_at(&self, index: usize) -> Option<&Value> {
        self.columns.get(index).map(|(_, value)| value)
    }

    /// Decode `column` into `T`
    ///
    /// # Errors
    ///
    /// Returns `Error::Decode` if the column is absent or holds a different value type.
    pub fn get<T: ValueType>(&self, column: &str) -> Result<T> {
        let value = self.value(column).ok_or_else(|| Error::Decode {
            column: column.to_string(),
            message: "column not present in row".to_string(),
        })?;
        decode(value.clone(), column)
    }
}

/// Convert a single value into `T`, naming `column` in the error
pub fn decode<T: ValueType>(value: Value, column: &str) -> Result<T> {
    <T as ValueType>::try_from(value).map_err(|e| Error::Decode {
        column: column.to_string(),
        message: format!("{e} (expected {})", std::any::type_name::<T>()),
    })
}
