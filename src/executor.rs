//! Execution seam and the helpers built on it
//!
//! The crate never talks to a database itself. Applications implement [`Executor`] over
//! their driver (or transaction handle) and use the helpers here to run generated
//! statements and apply the results back onto records.

use crate::entity::EntityDescriptor;
use crate::error::{Error, Result};
use crate::introspect;
use crate::query::{next_version, StatementBuilder};
use crate::record::Record;
use crate::row::Row;
use crate::statement::Statement;
use crate::sync::Reconciliation;
use sea_query::Value;
use std::time::Instant;

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;

/// Outcome of a non-query statement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// Store-assigned key of the last inserted row, when the driver reports one
    pub last_insert_id: Option<i64>,
}

/// Minimal execute/query capability supplied by the application
///
/// # Examples
///
/// ```ignore
/// struct SqliteExecutor<'c>(&'c rusqlite::Connection);
///
/// impl Executor for SqliteExecutor<'_> {
///     fn execute(&self, stmt: &Statement) -> Result<ExecResult> { /* bind, run */ }
///     fn query_all(&self, stmt: &Statement) -> Result<Vec<Row>> { /* bind, collect */ }
/// }
/// ```
pub trait Executor {
    /// Run a statement that returns no rows
    ///
    /// # Errors
    ///
    /// Driver failures, wrapped with [`Error::executor`].
    fn execute(&self, statement: &Statement) -> Result<ExecResult>;

    /// Run a query and collect every row
    fn query_all(&self, statement: &Statement) -> Result<Vec<Row>>;
}

impl<E: Executor + ?Sized> Executor for &E {
    fn execute(&self, statement: &Statement) -> Result<ExecResult> {
        (**self).execute(statement)
    }

    fn query_all(&self, statement: &Statement) -> Result<Vec<Row>> {
        (**self).query_all(statement)
    }
}

fn timed_execute<E: Executor + ?Sized>(
    executor: &E,
    kind: &'static str,
    statement: &Statement,
) -> Result<ExecResult> {
    let start = Instant::now();
    let result = executor.execute(statement);
    #[cfg(feature = "metrics")]
    METRICS.record_statement(kind, start.elapsed());
    log::trace!("{kind} took {:?}: {}", start.elapsed(), statement.sql);
    result
}

fn timed_query<E: Executor + ?Sized>(
    executor: &E,
    kind: &'static str,
    statement: &Statement,
) -> Result<Vec<Row>> {
    let start = Instant::now();
    let result = executor.query_all(statement);
    #[cfg(feature = "metrics")]
    METRICS.record_statement(kind, start.elapsed());
    log::trace!("{kind} took {:?}: {}", start.elapsed(), statement.sql);
    result
}

/// Execute `statement` if there is one; a missing statement is a successful no-op
pub fn exec_optional<E: Executor + ?Sized>(
    executor: &E,
    statement: Option<&Statement>,
) -> Result<ExecResult> {
    match statement {
        Some(statement) => timed_execute(executor, "execute", statement),
        None => Ok(ExecResult::default()),
    }
}

/// Require exactly one affected row
///
/// # Errors
///
/// `Error::UpdateFailed` otherwise: the row is gone or its version moved on.
pub fn expect_one_row(result: ExecResult) -> Result<ExecResult> {
    if result.rows_affected == 1 {
        Ok(result)
    } else {
        #[cfg(feature = "metrics")]
        METRICS.record_conflict();
        Err(Error::UpdateFailed)
    }
}

/// Write the store-assigned id from `result` into `record`'s generated key field
///
/// Does nothing for entities whose keys are not store-generated or when the driver
/// reported no id.
///
/// # Errors
///
/// `Error::TypeShape` if an auto-generated entity does not have exactly one key field.
pub fn apply_insert_id<R: Record>(
    desc: &EntityDescriptor,
    record: &mut R,
    result: ExecResult,
) -> Result<()> {
    if !desc.key_auto_generated() {
        return Ok(());
    }
    let [key] = desc.key_fields() else {
        return Err(Error::TypeShape(format!(
            "`{}` needs exactly one key field to receive an insert id, has {}",
            desc.name(),
            desc.key_fields().len()
        )));
    };
    let Some(id) = result.last_insert_id else {
        return Ok(());
    };
    let locator = introspect::locate_column(desc.record_type(), desc.fields(), key)
        .ok_or_else(|| {
            Error::TypeShape(format!("key column `{key}` not found on {}", desc.name()))
        })?;
    match introspect::write(record, &locator, Value::BigInt(Some(id))) {
        Err(Error::Decode { .. }) => {
            let narrow = i32::try_from(id)
                .map_err(|_| Error::TypeShape(format!("insert id {id} does not fit key `{key}`")))?;
            introspect::write(record, &locator, Value::Int(Some(narrow)))
        }
        other => other,
    }
}

/// Fill empty text key fields with random UUIDs
///
/// Only for entities whose keys are not store-generated. Non-empty keys are kept, so a
/// record can be given an id before insert. Returns how many keys were filled.
pub fn generate_keys<R: Record>(desc: &EntityDescriptor, record: &mut R) -> Result<usize> {
    if desc.key_auto_generated() {
        return Ok(0);
    }
    let mut filled = 0;
    for key in desc.key_fields() {
        let current = desc.column_value(record, key)?;
        let empty = match &current {
            Value::String(Some(s)) => s.is_empty(),
            Value::String(None) => true,
            _ => false,
        };
        if empty {
            let locator = introspect::locate_column(desc.record_type(), desc.fields(), key)
                .ok_or_else(|| Error::TypeShape(format!("key column `{key}` not found")))?;
            introspect::write(record, &locator, Value::from(uuid::Uuid::new_v4().to_string()))?;
            filled += 1;
        }
    }
    Ok(filled)
}

/// Insert `record`, then copy a store-assigned id back into it
pub fn insert<E: Executor + ?Sized, R: Record>(
    executor: &E,
    builder: &StatementBuilder<'_>,
    record: &mut R,
) -> Result<ExecResult> {
    let desc = builder.registry().descriptor_for::<R>()?;
    let statement = builder.insert(record)?;
    let result = timed_execute(executor, "insert", &statement)?;
    apply_insert_id(&desc, record, result)?;
    Ok(result)
}

/// Run a versioned update and advance `record`'s version once it succeeded
///
/// # Errors
///
/// `Error::UpdateFailed` when zero (or several) rows matched; `record` is unchanged then.
pub fn update_checked<E: Executor + ?Sized, R: Record>(
    executor: &E,
    builder: &StatementBuilder<'_>,
    record: &mut R,
) -> Result<ExecResult> {
    let desc = builder.registry().descriptor_for::<R>()?;
    let statement = builder.update_by_id(record)?;
    let result = expect_one_row(timed_execute(executor, "update", &statement)?)?;
    if let Some(version) = desc.version_field() {
        let next = next_version(&desc.column_value(record, version)?)?;
        let locator = introspect::locate_column(desc.record_type(), desc.fields(), version)
            .ok_or_else(|| Error::TypeShape(format!("version column `{version}` not found")))?;
        introspect::write(record, &locator, next)?;
    }
    Ok(result)
}

/// Delete `record` by key (and version), requiring exactly one row
pub fn delete_checked<E: Executor + ?Sized, R: Record>(
    executor: &E,
    builder: &StatementBuilder<'_>,
    record: &R,
) -> Result<ExecResult> {
    let statement = builder.delete_by_id(record)?;
    expect_one_row(timed_execute(executor, "delete", &statement)?)
}

/// Load the stored row for `record`'s key; `None` when there is none
pub fn reload<E: Executor + ?Sized, R: Record>(
    executor: &E,
    builder: &StatementBuilder<'_>,
    record: &R,
) -> Result<Option<R>> {
    let statement = builder.select_by_id(record)?;
    let rows = timed_query(executor, "select", &statement)?;
    rows.first().map(R::from_row).transpose()
}

/// Run the select for `relation_name` and store the result in the relation's field
///
/// Returns the number of rows loaded.
pub fn load_relation<E: Executor + ?Sized, R: Record>(
    executor: &E,
    builder: &StatementBuilder<'_>,
    record: &mut R,
    relation_name: &str,
) -> Result<usize> {
    let (statement, mut target) = builder.select_relation_target(record, relation_name)?;
    let rows = timed_query(executor, "select_relation", &statement)?;
    target.fill(&rows)?;
    Ok(rows.len())
}

/// Converge the join table of `relation_name` to `record`'s identifier list
///
/// Runs the delete, then the insert. Call it inside a transaction: a failure between
/// the two leaves only part of the change applied.
pub fn sync_relation<E: Executor + ?Sized, R: Record>(
    executor: &E,
    builder: &StatementBuilder<'_>,
    record: &R,
    relation_name: &str,
) -> Result<Reconciliation> {
    let plan = builder.reconcile(record, relation_name)?;
    timed_execute(executor, "reconcile_delete", &plan.delete)?;
    exec_optional(executor, plan.insert.as_ref())?;
    #[cfg(feature = "metrics")]
    METRICS.record_reconciliation();
    Ok(plan)
}
