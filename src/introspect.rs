//! Field introspection: locators, value access and relation handles
//!
//! A [`FieldLocator`] is an index path through `#[db(flatten)]` records down to one field.
//! Locator resolution scans the static field tables once per (type, name) pair; results,
//! including misses, are kept in a process-wide cache that only ever grows.

use crate::entity::EntityDescriptor;
use crate::error::{Error, Result};
use crate::record::{FieldInfo, FieldKind, Record, RecordType, RelationTarget};
use once_cell::sync::Lazy;
use sea_query::Value;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Index path from a record to one of its (possibly promoted) fields
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldLocator(Vec<usize>);

impl FieldLocator {
    pub fn path(&self) -> &[usize] {
        &self.0
    }

    /// Number of flattened records crossed to reach the field
    pub fn depth(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    fn split(&self) -> Option<(&[usize], usize)> {
        let (last, parents) = self.0.split_last()?;
        Some((parents, *last))
    }
}

/// A field reachable from a record, with its promoted position
#[derive(Debug, Clone)]
pub struct FieldEntry {
    pub locator: FieldLocator,
    pub info: &'static FieldInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum LookupKind {
    Column,
    FieldName,
}

type CacheKey = (TypeId, LookupKind, String);

static LOCATOR_CACHE: Lazy<RwLock<HashMap<CacheKey, Option<FieldLocator>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Every non-flatten field reachable from `fields`, flattened fields promoted in place
pub fn walk_fields(fields: &'static [FieldInfo]) -> Vec<FieldEntry> {
    let mut out = Vec::new();
    walk_into(fields, &mut Vec::new(), &mut out);
    out
}

fn walk_into(fields: &'static [FieldInfo], prefix: &mut Vec<usize>, out: &mut Vec<FieldEntry>) {
    for (index, info) in fields.iter().enumerate() {
        prefix.push(index);
        match info.kind {
            FieldKind::Flatten(inner) => walk_into(inner(), prefix, out),
            _ => out.push(FieldEntry {
                locator: FieldLocator(prefix.clone()),
                info,
            }),
        }
        prefix.pop();
    }
}

/// Storage columns of `fields` in declaration order, promoted columns included
pub fn mapped_columns(fields: &'static [FieldInfo]) -> Vec<&'static str> {
    walk_fields(fields)
        .into_iter()
        .filter_map(|entry| entry.info.column)
        .collect()
}

fn cached_lookup(
    record_type: RecordType,
    fields: &'static [FieldInfo],
    kind: LookupKind,
    name: &str,
) -> Option<FieldLocator> {
    let key = (record_type.id(), kind, name.to_string());
    {
        let cache = LOCATOR_CACHE.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(hit) = cache.get(&key) {
            return hit.clone();
        }
    }

    // Shallowest match wins when a promoted field shares a name with a direct one.
    let found = walk_fields(fields)
        .into_iter()
        .filter(|entry| match kind {
            LookupKind::Column => entry.info.column == Some(name),
            LookupKind::FieldName => entry.info.name == name,
        })
        .min_by_key(|entry| entry.locator.depth())
        .map(|entry| entry.locator);

    LOCATOR_CACHE
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(key)
        .or_insert_with(|| found.clone());
    found
}

/// Resolve a storage column name to a locator; `None` when no field maps to it
pub fn locate_column(
    record_type: RecordType,
    fields: &'static [FieldInfo],
    column: &str,
) -> Option<FieldLocator> {
    cached_lookup(record_type, fields, LookupKind::Column, column)
}

/// Resolve a declared Rust field name (e.g. a relation's value field) to a locator
pub fn locate_field(
    record_type: RecordType,
    fields: &'static [FieldInfo],
    field_name: &str,
) -> Option<FieldLocator> {
    cached_lookup(record_type, fields, LookupKind::FieldName, field_name)
}

pub fn field_locator<R: Record>(column: &str) -> Option<FieldLocator> {
    locate_column(R::record_type(), R::fields(), column)
}

/// Static description of the field at `locator`
pub fn field_info(
    fields: &'static [FieldInfo],
    locator: &FieldLocator,
) -> Option<&'static FieldInfo> {
    let (parents, last) = locator.split()?;
    let mut current = fields;
    for &index in parents {
        match current.get(index)?.kind {
            FieldKind::Flatten(inner) => current = inner(),
            _ => return None,
        }
    }
    current.get(last)
}

fn descend<'a>(mut record: &'a dyn Record, path: &[usize]) -> Option<&'a dyn Record> {
    for &index in path {
        record = record.flattened(index)?;
    }
    Some(record)
}

fn descend_mut<'a>(mut record: &'a mut dyn Record, path: &[usize]) -> Option<&'a mut dyn Record> {
    for &index in path {
        record = record.flattened_mut(index)?;
    }
    Some(record)
}

pub fn read(record: &dyn Record, locator: &FieldLocator) -> Option<Value> {
    let (parents, last) = locator.split()?;
    descend(record, parents)?.field_value(last)
}

/// Overwrite the field at `locator`
///
/// # Errors
///
/// Returns `Error::TypeShape` if the path does not lead to a storage-mapped field, or
/// `Error::Decode` if `value` does not convert into the field's type.
pub fn write(record: &mut dyn Record, locator: &FieldLocator, value: Value) -> Result<()> {
    let (parents, last) = locator
        .split()
        .ok_or_else(|| Error::TypeShape("empty field locator".to_string()))?;
    let target = descend_mut(record, parents)
        .ok_or_else(|| Error::TypeShape(format!("no flattened record at {locator:?}")))?;
    target.set_field_value(last, value)
}

/// Writable handle to the relation field at `locator`
pub fn relation_handle<'a>(
    record: &'a mut dyn Record,
    locator: &FieldLocator,
) -> Option<RelationTarget<'a>> {
    let (parents, last) = locator.split()?;
    descend_mut(record, parents)?.relation_target(last)
}

/// Identifier list held by the relation field at `locator`
pub fn relation_ids(record: &dyn Record, locator: &FieldLocator) -> Option<Vec<Value>> {
    let (parents, last) = locator.split()?;
    descend(record, parents)?.relation_ids(last)
}

/// Read a storage-mapped field by column name
pub fn field_value<R: Record>(record: &R, column: &str) -> Option<Value> {
    let locator = field_locator::<R>(column)?;
    read(record, &locator)
}

/// Writable handle to the field populated by `relation_name`
///
/// Returns `None` if the descriptor has no such relation or its value field is absent.
pub fn relation_target_handle<'a, R: Record>(
    descriptor: &EntityDescriptor,
    record: &'a mut R,
    relation_name: &str,
) -> Option<RelationTarget<'a>> {
    let relation = descriptor.relation(relation_name)?;
    let locator = locate_field(R::record_type(), R::fields(), relation.value_field())?;
    relation_handle(record, &locator)
}
