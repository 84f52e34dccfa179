//! Record shapes: static field tables and per-instance field access
//!
//! `#[derive(Record)]` implements [`Record`] for a struct. The implementation exposes a
//! static [`FieldInfo`] table (one entry per declared field, in declaration order) and
//! index-addressed accessors, which together stand in for runtime reflection:
//!
//! - scalar fields are read and written as [`sea_query::Value`]
//! - `#[db(flatten)]` fields expose the embedded record as `&dyn Record`
//! - relation fields expose a [`RelationTarget`] handle that a loader can fill
//!
//! ```ignore
//! #[derive(Record, Default)]
//! pub struct Author {
//!     #[relmeta(pk)]
//!     pub author_id: String,
//!     pub nom_de_plume: String,
//!     #[relmeta(has_many)]
//!     pub book_list: Vec<Book>,
//! }
//! ```

use crate::error::{Error, Result};
use crate::row::{decode, Row};
use sea_query::{Value, ValueType};
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Runtime handle for a record type
///
/// Equality and hashing use the `TypeId` only. `Box<T>` reports `T`'s handle.
#[derive(Clone, Copy)]
pub struct RecordType {
    id: TypeId,
    name: &'static str,
}

impl RecordType {
    pub fn of<T: 'static>(name: &'static str) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The Rust type name as declared (e.g. `CategoryInfo`)
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for RecordType {}

impl Hash for RecordType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Rust shape of a relation field, which decides the handle family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationShape {
    /// `Option<T>`
    One,
    /// `Vec<T>` of records
    Many,
    /// `Vec<K>` of scalar identifiers
    Ids,
}

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Scalar,
    /// Embedded record whose fields are promoted into the parent
    Flatten(fn() -> &'static [FieldInfo]),
    Relation {
        shape: RelationShape,
        target: Option<fn() -> RecordType>,
    },
}

/// Static description of one declared field
#[derive(Debug, Clone, Copy)]
pub struct FieldInfo {
    /// Rust field identifier
    pub name: &'static str,
    /// Storage column, `None` when the field is not storage-mapped
    pub column: Option<&'static str>,
    /// Annotation tokens in the mini-language form
    pub tag: &'static str,
    pub kind: FieldKind,
}

impl FieldInfo {
    pub fn is_mapped(&self) -> bool {
        self.column.is_some()
    }

    pub fn relation_shape(&self) -> Option<RelationShape> {
        match self.kind {
            FieldKind::Relation { shape, .. } => Some(shape),
            _ => None,
        }
    }

    /// Related record type for `One`/`Many` relation fields
    pub fn relation_target(&self) -> Option<RecordType> {
        match self.kind {
            FieldKind::Relation {
                target: Some(target),
                ..
            } => Some(target()),
            _ => None,
        }
    }
}

/// Lifecycle hooks run by the insert and update builders
///
/// The derive emits an empty implementation unless the struct carries `#[relmeta(hooks)]`.
pub trait RecordHooks {
    /// Called before an insert statement is built (e.g. to stamp creation time)
    fn before_insert(&mut self) {}

    /// Called before an update statement is built
    fn before_update(&mut self) {}
}

/// A storage-mapped record type
///
/// Field indexes refer to positions in [`Record::fields`].
pub trait Record: RecordHooks + 'static {
    fn record_type() -> RecordType
    where
        Self: Sized;

    fn fields() -> &'static [FieldInfo]
    where
        Self: Sized;

    /// Build an instance from a result row; unmapped fields take their defaults
    fn from_row(row: &Row) -> Result<Self>
    where
        Self: Sized;

    /// Current value of a storage-mapped field
    fn field_value(&self, index: usize) -> Option<Value>;

    /// Overwrite a storage-mapped field
    fn set_field_value(&mut self, index: usize, value: Value) -> Result<()>;

    fn flattened(&self, _index: usize) -> Option<&dyn Record> {
        None
    }

    fn flattened_mut(&mut self, _index: usize) -> Option<&mut dyn Record> {
        None
    }

    /// Writable handle to a relation field
    fn relation_target(&mut self, _index: usize) -> Option<RelationTarget<'_>> {
        None
    }

    /// Identifier list held by a `Vec<K>` relation field
    fn relation_ids(&self, _index: usize) -> Option<Vec<Value>> {
        None
    }
}

impl<T: Record> RecordHooks for Box<T> {
    fn before_insert(&mut self) {
        (**self).before_insert()
    }

    fn before_update(&mut self) {
        (**self).before_update()
    }
}

impl<T: Record> Record for Box<T> {
    fn record_type() -> RecordType {
        T::record_type()
    }

    fn fields() -> &'static [FieldInfo] {
        T::fields()
    }

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Box::new(T::from_row(row)?))
    }

    fn field_value(&self, index: usize) -> Option<Value> {
        (**self).field_value(index)
    }

    fn set_field_value(&mut self, index: usize, value: Value) -> Result<()> {
        (**self).set_field_value(index, value)
    }

    fn flattened(&self, index: usize) -> Option<&dyn Record> {
        (**self).flattened(index)
    }

    fn flattened_mut(&mut self, index: usize) -> Option<&mut dyn Record> {
        (**self).flattened_mut(index)
    }

    fn relation_target(&mut self, index: usize) -> Option<RelationTarget<'_>> {
        (**self).relation_target(index)
    }

    fn relation_ids(&self, index: usize) -> Option<Vec<Value>> {
        (**self).relation_ids(index)
    }
}

/// Destination for a single related record (`Option<T>`)
pub trait OneSlot {
    /// Replace the content with the first row, or clear it when there are none
    fn fill(&mut self, rows: &[Row]) -> Result<()>;
    fn is_set(&self) -> bool;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Destination for a collection of related records (`Vec<T>`)
pub trait ManySlot {
    fn fill(&mut self, rows: &[Row]) -> Result<()>;
    fn len(&self) -> usize;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Destination for a list of related identifiers (`Vec<K>`)
pub trait IdSlot {
    /// Replace the content with the first column of every row
    fn fill(&mut self, rows: &[Row]) -> Result<()>;
    fn values(&self) -> Vec<Value>;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Record> OneSlot for Option<T> {
    fn fill(&mut self, rows: &[Row]) -> Result<()> {
        *self = rows.first().map(T::from_row).transpose()?;
        Ok(())
    }

    fn is_set(&self) -> bool {
        self.is_some()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<T: Record> ManySlot for Vec<T> {
    fn fill(&mut self, rows: &[Row]) -> Result<()> {
        *self = rows.iter().map(T::from_row).collect::<Result<Vec<_>>>()?;
        Ok(())
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<K> IdSlot for Vec<K>
where
    K: ValueType + Into<Value> + Clone + 'static,
{
    fn fill(&mut self, rows: &[Row]) -> Result<()> {
        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            let value = row.value_at(0).cloned().ok_or_else(|| Error::Decode {
                column: "<first>".to_string(),
                message: "identifier row has no columns".to_string(),
            })?;
            ids.push(decode::<K>(value, "<first>")?);
        }
        *self = ids;
        Ok(())
    }

    fn values(&self) -> Vec<Value> {
        self.iter().cloned().map(Into::into).collect()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Writable handle to the field a named relation populates
///
/// The handle borrows the record; writes through it are visible on the record afterwards.
pub enum RelationTarget<'a> {
    One(&'a mut dyn OneSlot),
    Many(&'a mut dyn ManySlot),
    Ids(&'a mut dyn IdSlot),
}

impl<'a> RelationTarget<'a> {
    pub fn shape(&self) -> RelationShape {
        match self {
            RelationTarget::One(_) => RelationShape::One,
            RelationTarget::Many(_) => RelationShape::Many,
            RelationTarget::Ids(_) => RelationShape::Ids,
        }
    }

    /// Load query results into the field
    pub fn fill(&mut self, rows: &[Row]) -> Result<()> {
        match self {
            RelationTarget::One(slot) => slot.fill(rows),
            RelationTarget::Many(slot) => slot.fill(rows),
            RelationTarget::Ids(slot) => slot.fill(rows),
        }
    }

    pub fn into_any_mut(self) -> &'a mut dyn Any {
        match self {
            RelationTarget::One(slot) => slot.as_any_mut(),
            RelationTarget::Many(slot) => slot.as_any_mut(),
            RelationTarget::Ids(slot) => slot.as_any_mut(),
        }
    }

    /// Typed access to the underlying field, e.g. `downcast::<Option<Author>>()`
    pub fn downcast<T: Any>(self) -> Option<&'a mut T> {
        self.into_any_mut().downcast_mut::<T>()
    }
}

impl fmt::Debug for RelationTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RelationTarget").field(&self.shape()).finish()
    }
}
