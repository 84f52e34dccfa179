//! Whole-record statements: select, insert, update and delete by key

use super::StatementBuilder;
use crate::entity::EntityDescriptor;
use crate::error::{Error, Result};
use crate::record::Record;
use crate::statement::Statement;
use sea_query::{Expr, ExprTrait, Query, Value};

/// Value a version column takes after one successful update
///
/// # Errors
///
/// Returns `Error::TypeShape` for null or non-integer values and on overflow.
pub fn next_version(current: &Value) -> Result<Value> {
    let next = match current {
        Value::TinyInt(Some(v)) => v.checked_add(1).map(|v| Value::TinyInt(Some(v))),
        Value::SmallInt(Some(v)) => v.checked_add(1).map(|v| Value::SmallInt(Some(v))),
        Value::Int(Some(v)) => v.checked_add(1).map(|v| Value::Int(Some(v))),
        Value::BigInt(Some(v)) => v.checked_add(1).map(|v| Value::BigInt(Some(v))),
        Value::TinyUnsigned(Some(v)) => v.checked_add(1).map(|v| Value::TinyUnsigned(Some(v))),
        Value::SmallUnsigned(Some(v)) => v.checked_add(1).map(|v| Value::SmallUnsigned(Some(v))),
        Value::Unsigned(Some(v)) => v.checked_add(1).map(|v| Value::Unsigned(Some(v))),
        Value::BigUnsigned(Some(v)) => v.checked_add(1).map(|v| Value::BigUnsigned(Some(v))),
        other => {
            return Err(Error::TypeShape(format!(
                "version value {other:?} is not a supported integer"
            )))
        }
    };
    next.ok_or_else(|| Error::TypeShape(format!("version value {current:?} overflows")))
}

fn check_key_arity(desc: &EntityDescriptor, keys: &[Value]) -> Result<()> {
    if keys.len() == desc.key_fields().len() {
        Ok(())
    } else {
        Err(Error::TypeShape(format!(
            "`{}` has {} key fields, got {} key values",
            desc.name(),
            desc.key_fields().len(),
            keys.len()
        )))
    }
}

impl StatementBuilder<'_> {
    /// `SELECT <all columns> FROM <table>`
    pub fn select<R: Record>(&self) -> Result<Statement> {
        let desc = self.registry.descriptor_for::<R>()?;
        let mut query = Query::select();
        query
            .columns(desc.sql_fields(true))
            .from(desc.storage_name().to_owned());
        Ok(self.dialect.build(&query))
    }

    /// Select one row of `R` by explicit key values, in declared key order
    pub fn select_by_key<R: Record>(&self, keys: &[Value]) -> Result<Statement> {
        let desc = self.registry.descriptor_for::<R>()?;
        check_key_arity(&desc, keys)?;
        let mut query = Query::select();
        query
            .columns(desc.sql_fields(true))
            .from(desc.storage_name().to_owned());
        for predicate in desc.key_predicates(keys.to_vec()) {
            query.and_where(predicate);
        }
        Ok(self.dialect.build(&query))
    }

    /// Select the stored row for `record`'s key
    pub fn select_by_id<R: Record>(&self, record: &R) -> Result<Statement> {
        let desc = self.registry.descriptor_for::<R>()?;
        self.select_by_key::<R>(&desc.key_values(record)?)
    }

    /// Insert one record; key columns are left out when the store generates them
    pub fn insert<R: Record>(&self, record: &mut R) -> Result<Statement> {
        self.insert_many(std::slice::from_mut(record))
    }

    /// Multi-row insert of `records`, running each record's `before_insert` hook first
    pub fn insert_many<R: Record>(&self, records: &mut [R]) -> Result<Statement> {
        let desc = self.registry.descriptor_for::<R>()?;
        if records.is_empty() {
            return Err(Error::TypeShape(format!(
                "insert into `{}` needs at least one record",
                desc.name()
            )));
        }
        let columns = desc.sql_fields(!desc.key_auto_generated());

        let mut query = Query::insert();
        query
            .into_table(desc.storage_name().to_owned())
            .columns(columns.iter().copied());
        for record in records.iter_mut() {
            record.before_insert();
            let mut row = Vec::with_capacity(columns.len());
            for column in &columns {
                row.push(Expr::from(desc.column_value(record, column)?));
            }
            query
                .values(row)
                .map_err(|e| Error::TypeShape(format!("insert into `{}`: {e}", desc.name())))?;
        }
        Ok(self.dialect.build(&query))
    }

    /// Update every non-key column of `record` by key
    ///
    /// With a version field the statement sets it to the next value and only matches
    /// the row still holding the current one, so a stale write affects zero rows.
    /// `record` itself keeps the current version; see
    /// [`update_checked`](crate::executor::update_checked).
    pub fn update_by_id<R: Record>(&self, record: &mut R) -> Result<Statement> {
        let desc = self.registry.descriptor_for::<R>()?;
        record.before_update();

        let mut assignments = desc.value_map(record, false)?;
        if assignments.is_empty() {
            return Err(Error::TypeShape(format!(
                "`{}` has no non-key columns to update",
                desc.name()
            )));
        }
        let mut predicates = desc.key_predicates(desc.key_values(record)?);

        if let Some(version) = desc.version_field() {
            let current = desc.column_value(record, version)?;
            let next = next_version(&current)?;
            for (column, value) in assignments.iter_mut() {
                if *column == version {
                    *value = next.clone();
                }
            }
            predicates.push(Expr::col(version.to_owned()).eq(current));
        }

        let mut query = Query::update();
        query
            .table(desc.storage_name().to_owned())
            .values(assignments.into_iter().map(|(column, value)| (column, Expr::from(value))));
        for predicate in predicates {
            query.and_where(predicate);
        }
        Ok(self.dialect.build(&query))
    }

    /// Delete one row of `R` by explicit key values (no version check)
    pub fn delete_by_key<R: Record>(&self, keys: &[Value]) -> Result<Statement> {
        let desc = self.registry.descriptor_for::<R>()?;
        check_key_arity(&desc, keys)?;
        let mut query = Query::delete();
        query.from_table(desc.storage_name().to_owned());
        for predicate in desc.key_predicates(keys.to_vec()) {
            query.and_where(predicate);
        }
        Ok(self.dialect.build(&query))
    }

    /// Delete `record`'s row, also matching its version when the entity has one
    pub fn delete_by_id<R: Record>(&self, record: &R) -> Result<Statement> {
        let desc = self.registry.descriptor_for::<R>()?;
        let mut query = Query::delete();
        query.from_table(desc.storage_name().to_owned());
        for predicate in desc.key_predicates(desc.key_values(record)?) {
            query.and_where(predicate);
        }
        if let Some(version) = desc.version_field() {
            let current = desc.column_value(record, version)?;
            query.and_where(Expr::col(version.to_owned()).eq(current));
        }
        Ok(self.dialect.build(&query))
    }
}
