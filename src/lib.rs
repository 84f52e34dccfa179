//! # relmeta
//!
//! Relation metadata for plain Rust records and the SQL that follows from it.
//!
//! Records derive [`Record`]; a [`Registry`] parses their annotations into
//! [`EntityDescriptor`]s (keys, version field, named relations of five kinds);
//! a [`StatementBuilder`] turns descriptors plus record values into [`Statement`]s,
//! including relation selects and join-table reconciliation. Execution stays with the
//! application through the [`Executor`] trait.
//!
//! ```ignore
//! use relmeta::{Dialect, Record, Registry, StatementBuilder};
//!
//! #[derive(Record, Default)]
//! pub struct Book {
//!     #[relmeta(pk)]
//!     pub book_id: String,
//!     pub author_id: String,
//!     #[relmeta(belongs_to)]
//!     pub author: Option<Author>,
//!     #[relmeta(belongs_to_many_ids, join_name = "book_category")]
//!     pub category_id_list: Vec<String>,
//! }
//!
//! let registry = Registry::new();
//! registry.parse::<Book>()?;
//! let builder = StatementBuilder::new(&registry, Dialect::Sqlite);
//! let plan = builder.reconcile(&book, "category_id_list")?;
//! ```

// Lets the derive's `::relmeta::` paths resolve inside this crate's own tests.
extern crate self as relmeta;

pub mod config;
pub mod entity;
pub mod error;
pub mod executor;
pub mod introspect;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod naming;
pub mod query;
pub mod record;
pub mod registry;
pub mod relation;
pub mod row;
pub mod statement;
pub mod sync;
pub mod tag;

pub use sea_query;

pub use config::RelmetaConfig;
pub use entity::EntityDescriptor;
pub use error::{Error, Result};
pub use executor::{ExecResult, Executor};
pub use introspect::{field_value, relation_target_handle, FieldLocator};
pub use query::StatementBuilder;
pub use record::{
    FieldInfo, FieldKind, IdSlot, ManySlot, OneSlot, Record, RecordHooks, RecordType,
    RelationShape, RelationTarget,
};
pub use registry::{global, Registry};
pub use relation::{Relation, RelationKind};
pub use row::Row;
pub use statement::{Dialect, Statement};
pub use sync::Reconciliation;

pub use relmeta_derive::Record;
