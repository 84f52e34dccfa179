//! Generated statements and SQL dialects

use crate::error::{Error, Result};
use sea_query::{
    Expr, MysqlQueryBuilder, OnConflict, PostgresQueryBuilder, Query,
    QueryStatementWriter, SqliteQueryBuilder, Value, Values,
};
use serde::Deserialize;
use std::fmt;

/// SQL text with its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub values: Values,
}

impl Statement {
    pub fn params(&self) -> &[Value] {
        &self.values.0
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Target database, chosen by configuration
///
/// Selects the sea-query backend and the duplicate-tolerant insert idiom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Sqlite,
    Mysql,
    #[serde(alias = "postgresql")]
    Postgres,
}

impl Dialect {
    /// Render `query` with this dialect's sea-query builder
    pub fn build<Q: QueryStatementWriter>(self, query: &Q) -> Statement {
        let (sql, values) = match self {
            Dialect::Sqlite => query.build(SqliteQueryBuilder),
            Dialect::Mysql => query.build(MysqlQueryBuilder),
            Dialect::Postgres => query.build(PostgresQueryBuilder),
        };
        log::trace!("{self:?}: {sql} ({} params)", values.0.len());
        Statement { sql, values }
    }

    /// Wrap SQL already written in this dialect's placeholder style
    pub fn statement(self, sql: String, values: Vec<Value>) -> Statement {
        Statement {
            sql,
            values: Values(values),
        }
    }

    /// Multi-row insert into `table` that skips rows whose `columns` values already exist
    ///
    /// Returns `Ok(None)` for an empty row set. Postgres gets an `ON CONFLICT .. DO NOTHING`
    /// clause from the builder. SQLite and MySQL spell the same thing as a keyword after
    /// `INSERT`, which sea-query does not render, so it is spliced into the built text.
    ///
    /// # Errors
    ///
    /// Returns `Error::TypeShape` when a row's length differs from `columns`.
    pub fn insert_ignore(
        self,
        table: &str,
        columns: &[&str],
        rows: Vec<Vec<Value>>,
    ) -> Result<Option<Statement>> {
        if rows.is_empty() {
            return Ok(None);
        }
        let mut insert = Query::insert();
        insert
            .into_table(table.to_owned())
            .columns(columns.iter().map(|c| c.to_string()));
        for row in rows {
            insert
                .values(row.into_iter().map(Expr::from))
                .map_err(|e| Error::TypeShape(format!("insert into `{table}`: {e}")))?;
        }

        let statement = match self {
            Dialect::Postgres => {
                insert.on_conflict(
                    OnConflict::columns(columns.iter().map(|c| c.to_string()))
                        .do_nothing()
                        .to_owned(),
                );
                self.build(&insert)
            }
            Dialect::Sqlite => with_insert_keyword(self.build(&insert), "OR IGNORE"),
            Dialect::Mysql => with_insert_keyword(self.build(&insert), "IGNORE"),
        };
        Ok(Some(statement))
    }
}

fn with_insert_keyword(mut statement: Statement, keyword: &str) -> Statement {
    if let Some(rest) = statement.sql.strip_prefix("INSERT ") {
        statement.sql = format!("INSERT {keyword} {rest}");
    }
    statement
}
