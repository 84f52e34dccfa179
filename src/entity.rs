//! Entity descriptors: per record type storage and relation metadata

use crate::error::{Error, Result};
use crate::introspect::{self, mapped_columns};
use crate::record::{FieldInfo, Record, RecordType};
use crate::relation::Relation;
use sea_query::{Expr, ExprTrait, Value};
use std::collections::HashMap;

/// Storage and relation metadata for one record type
///
/// Usually produced by [`Registry::parse`](crate::Registry::parse). A descriptor is
/// valid only with at least one key field.
#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    name: String,
    storage_name: String,
    record_type: RecordType,
    fields: &'static [FieldInfo],
    key_fields: Vec<String>,
    key_auto_generated: bool,
    version_field: Option<String>,
    relations: HashMap<String, Relation>,
}

impl EntityDescriptor {
    /// Empty descriptor for `R` with the storage name set to `name`
    pub fn new<R: Record>(name: impl Into<String>) -> Self {
        Self::from_parts(R::record_type(), R::fields(), name.into())
    }

    pub(crate) fn from_parts(
        record_type: RecordType,
        fields: &'static [FieldInfo],
        name: String,
    ) -> Self {
        Self {
            storage_name: name.clone(),
            name,
            record_type,
            fields,
            key_fields: Vec::new(),
            key_auto_generated: false,
            version_field: None,
            relations: HashMap::new(),
        }
    }

    /// Logical name, unique within a registry
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Table name used in generated SQL
    pub fn storage_name(&self) -> &str {
        &self.storage_name
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    pub fn fields(&self) -> &'static [FieldInfo] {
        self.fields
    }

    pub fn key_fields(&self) -> &[String] {
        &self.key_fields
    }

    pub fn key_auto_generated(&self) -> bool {
        self.key_auto_generated
    }

    pub fn version_field(&self) -> Option<&str> {
        self.version_field.as_deref()
    }

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.values()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    pub fn set_storage_name(&mut self, storage_name: impl Into<String>) -> &mut Self {
        self.storage_name = storage_name.into();
        self
    }

    pub fn set_key_fields<I, S>(&mut self, keys: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_fields = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn push_key_field(&mut self, key: impl Into<String>) -> &mut Self {
        self.key_fields.push(key.into());
        self
    }

    pub fn set_key_auto_generated(&mut self, auto: bool) -> &mut Self {
        self.key_auto_generated = auto;
        self
    }

    pub fn set_version_field(&mut self, field: Option<String>) -> &mut Self {
        self.version_field = field.filter(|f| !f.is_empty());
        self
    }

    /// Add or replace a relation under its own name
    pub fn add_relation(&mut self, relation: impl Into<Relation>) -> &mut Self {
        let relation = relation.into();
        self.relations.insert(relation.name().to_string(), relation);
        self
    }

    pub fn is_key_field(&self, column: &str) -> bool {
        self.key_fields.iter().any(|k| k == column)
    }

    /// First key column, the one used by single-column relation predicates
    pub fn primary_key(&self) -> Result<&str> {
        self.key_fields
            .first()
            .map(String::as_str)
            .ok_or_else(|| Error::config(&self.name, "no primary key fields found for type"))
    }

    /// Storage-mapped columns in declaration order, key columns only when `include_keys`
    pub fn sql_fields(&self, include_keys: bool) -> Vec<&'static str> {
        mapped_columns(self.fields)
            .into_iter()
            .filter(|column| include_keys || !self.is_key_field(column))
            .collect()
    }

    /// `key = value` predicates pairing the key columns, in declared order, with `keys`
    pub fn key_predicates(&self, keys: Vec<Value>) -> Vec<Expr> {
        self.key_fields
            .iter()
            .zip(keys)
            .map(|(column, value)| Expr::col(column.clone()).eq(value))
            .collect()
    }

    fn check_type(&self, record_type: RecordType) -> Result<()> {
        if record_type == self.record_type {
            Ok(())
        } else {
            Err(Error::TypeShape(format!(
                "record of type {} passed to descriptor `{}` for {}",
                record_type.name(),
                self.name,
                self.record_type.name()
            )))
        }
    }

    /// Current value of `column` on `record`
    ///
    /// # Errors
    ///
    /// Returns `Error::TypeShape` if no storage-mapped field of the record uses `column`.
    pub fn column_value<R: Record>(&self, record: &R, column: &str) -> Result<Value> {
        self.check_type(R::record_type())?;
        introspect::locate_column(self.record_type, self.fields, column)
            .and_then(|locator| introspect::read(record, &locator))
            .ok_or_else(|| {
                Error::TypeShape(format!(
                    "field with column `{column}` not found on {}",
                    self.record_type.name()
                ))
            })
    }

    /// Key values of `record` in declared key order
    pub fn key_values<R: Record>(&self, record: &R) -> Result<Vec<Value>> {
        self.key_fields
            .iter()
            .map(|k| self.column_value(record, k))
            .collect()
    }

    /// Storage-mapped `(column, value)` pairs of `record`
    pub fn value_map<R: Record>(
        &self,
        record: &R,
        include_keys: bool,
    ) -> Result<Vec<(&'static str, Value)>> {
        self.sql_fields(include_keys)
            .into_iter()
            .map(|column| Ok((column, self.column_value(record, column)?)))
            .collect()
    }
}
