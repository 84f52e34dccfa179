//! Bookstore fixtures and an in-memory SQLite executor shared by the integration tests
//!
//! Relationships:
//! - Author has_many Books, Publisher has_many Books (versioned)
//! - Book belongs_to Author and Publisher
//! - Book belongs_to_many Categories through book_category (records and ids)
//! - Category has_one CategoryInfo (auto-increment key), CategoryInfo belongs_to Category

#![allow(dead_code)]

use relmeta::sea_query::Value;
use relmeta::{
    Dialect, Error, ExecResult, Executor, Record, Registry, Result, Row, Statement,
    StatementBuilder,
};
use rusqlite::types::Value as SqlValue;
use rusqlite::Connection;

// ============================================================================
// Test Entities
// ============================================================================

#[derive(Record, Debug, Clone, Default, PartialEq)]
pub struct Author {
    #[relmeta(pk)]
    pub author_id: String,
    pub nom_de_plume: String,
    #[relmeta(has_many)]
    pub book_list: Vec<Book>,
}

#[derive(Record, Debug, Clone, Default, PartialEq)]
pub struct Publisher {
    #[relmeta(pk)]
    pub publisher_id: String,
    pub company_name: String,
    #[relmeta(version)]
    pub version: i64,
    #[relmeta(has_many)]
    pub book_list: Vec<Book>,
}

#[derive(Record, Debug, Clone, Default, PartialEq)]
pub struct Book {
    #[relmeta(pk)]
    pub book_id: String,
    pub author_id: String,
    #[relmeta(belongs_to)]
    pub author: Option<Author>,
    pub publisher_id: String,
    #[relmeta(belongs_to)]
    pub publisher: Option<Publisher>,
    pub title: String,
    #[relmeta(belongs_to_many, join_name = "book_category")]
    pub category_list: Vec<Category>,
    #[relmeta(belongs_to_many_ids, join_name = "book_category")]
    pub category_id_list: Vec<String>,
}

#[derive(Record, Debug, Clone, Default, PartialEq)]
pub struct BookCategory {
    #[relmeta(pk)]
    pub book_id: String,
    #[relmeta(pk)]
    pub category_id: String,
}

#[derive(Record, Debug, Clone, Default, PartialEq)]
pub struct Category {
    #[relmeta(pk)]
    pub category_id: String,
    pub name: String,
    #[relmeta(belongs_to_many, join_name = "book_category")]
    pub book_list: Vec<Book>,
    #[relmeta(has_one)]
    pub category_info: Option<CategoryInfo>,
}

#[derive(Record, Debug, Clone, Default, PartialEq)]
pub struct CategoryInfo {
    #[relmeta(pk, auto_incr)]
    pub category_info_id: i64,
    pub category_id: String,
    pub info_stuff: String,
    #[relmeta(belongs_to)]
    pub category: Option<Box<Category>>,
}

/// Route `log` output through the test harness; repeated calls are ignored
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn registry() -> Registry {
    init_logging();
    let registry = Registry::new();
    registry.must_parse::<Author>();
    registry.must_parse::<Publisher>();
    registry.must_parse::<Book>();
    registry.must_parse::<BookCategory>();
    registry.must_parse::<Category>();
    registry.must_parse::<CategoryInfo>();
    registry
}

pub fn sqlite(registry: &Registry) -> StatementBuilder<'_> {
    StatementBuilder::new(registry, Dialect::Sqlite)
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// SQLite executor
// ============================================================================

const SCHEMA: &str = "
    CREATE TABLE author (author_id TEXT PRIMARY KEY, nom_de_plume TEXT NOT NULL);
    CREATE TABLE publisher (publisher_id TEXT PRIMARY KEY, company_name TEXT NOT NULL,
        version INTEGER NOT NULL);
    CREATE TABLE book (book_id TEXT PRIMARY KEY, author_id TEXT NOT NULL,
        publisher_id TEXT NOT NULL, title TEXT NOT NULL);
    CREATE TABLE book_category (book_id TEXT NOT NULL, category_id TEXT NOT NULL,
        PRIMARY KEY (book_id, category_id));
    CREATE TABLE category (category_id TEXT PRIMARY KEY, name TEXT NOT NULL);
    CREATE TABLE category_info (category_info_id INTEGER PRIMARY KEY AUTOINCREMENT,
        category_id TEXT NOT NULL, info_stuff TEXT NOT NULL);
";

pub struct SqliteExecutor {
    pub conn: Connection,
}

impl SqliteExecutor {
    /// Fresh in-memory database with the bookstore schema
    pub fn new() -> Self {
        let conn = Connection::open_in_memory().expect("open in-memory sqlite");
        conn.execute_batch(SCHEMA).expect("create schema");
        Self { conn }
    }

    /// `(book_id, category_id)` pairs currently linked for `book_id`, sorted
    pub fn links(&self, book_id: &str) -> Vec<String> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT category_id FROM book_category WHERE book_id = ?1 ORDER BY category_id",
            )
            .expect("prepare links query");
        stmt.query_map([book_id], |row| row.get::<_, String>(0))
            .expect("query links")
            .collect::<rusqlite::Result<Vec<_>>>()
            .expect("read links")
    }

    pub fn count(&self, table: &str) -> i64 {
        self.conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .expect("count rows")
    }
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Bool(Some(v)) => SqlValue::Integer(i64::from(*v)),
        Value::TinyInt(Some(v)) => SqlValue::Integer(i64::from(*v)),
        Value::SmallInt(Some(v)) => SqlValue::Integer(i64::from(*v)),
        Value::Int(Some(v)) => SqlValue::Integer(i64::from(*v)),
        Value::BigInt(Some(v)) => SqlValue::Integer(*v),
        Value::TinyUnsigned(Some(v)) => SqlValue::Integer(i64::from(*v)),
        Value::SmallUnsigned(Some(v)) => SqlValue::Integer(i64::from(*v)),
        Value::Unsigned(Some(v)) => SqlValue::Integer(i64::from(*v)),
        Value::Double(Some(v)) => SqlValue::Real(*v),
        Value::String(Some(v)) => SqlValue::Text(v.to_string()),
        _ => SqlValue::Null,
    }
}

fn from_sql(value: SqlValue) -> Value {
    match value {
        SqlValue::Integer(v) => Value::BigInt(Some(v)),
        SqlValue::Real(v) => Value::Double(Some(v)),
        SqlValue::Text(v) => Value::from(v),
        SqlValue::Blob(v) => Value::from(v),
        SqlValue::Null => Value::String(None),
    }
}

impl Executor for SqliteExecutor {
    fn execute(&self, statement: &Statement) -> Result<ExecResult> {
        let params = statement.params().iter().map(to_sql);
        let affected = self
            .conn
            .execute(&statement.sql, rusqlite::params_from_iter(params))
            .map_err(Error::executor)?;
        Ok(ExecResult {
            rows_affected: affected as u64,
            last_insert_id: Some(self.conn.last_insert_rowid()),
        })
    }

    fn query_all(&self, statement: &Statement) -> Result<Vec<Row>> {
        let mut prepared = self.conn.prepare(&statement.sql).map_err(Error::executor)?;
        let names: Vec<String> = prepared.column_names().into_iter().map(String::from).collect();
        let params = statement.params().iter().map(to_sql);
        let mut rows = prepared
            .query(rusqlite::params_from_iter(params))
            .map_err(Error::executor)?;

        let mut out = Vec::new();
        while let Some(sql_row) = rows.next().map_err(Error::executor)? {
            let mut row = Row::new();
            for (index, name) in names.iter().enumerate() {
                let value: SqlValue = sql_row.get(index).map_err(Error::executor)?;
                row.push(name.clone(), from_sql(value));
            }
            out.push(row);
        }
        Ok(out)
    }
}
