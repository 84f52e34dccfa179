//! Relation descriptors.
//!
//! One struct per kind, each carrying only the linkage its statements need, gathered
//! in the closed [`Relation`] sum. Descriptors are built once when an entity is parsed
//! and shared read-only afterwards.

use super::types::RelationKind;

/// Single related record; `sql_id_field` on this record holds the target's key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BelongsTo {
    pub name: String,
    pub value_field: String,
    pub sql_id_field: String,
}

/// Related records whose `sql_other_id_field` holds this record's key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HasMany {
    pub name: String,
    pub value_field: String,
    pub sql_other_id_field: String,
}

/// At most one related record whose `sql_other_id_field` holds this record's key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HasOne {
    pub name: String,
    pub value_field: String,
    pub sql_other_id_field: String,
}

/// Related records reached through the join entity `join_name`
///
/// `sql_id_field` is the join column holding this record's key, `sql_other_id_field`
/// the one holding the target's key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BelongsToMany {
    pub name: String,
    pub value_field: String,
    pub join_name: String,
    pub sql_id_field: String,
    pub sql_other_id_field: String,
}

/// Like [`BelongsToMany`], but loads only the other side's identifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BelongsToManyIds {
    pub name: String,
    pub value_field: String,
    pub join_name: String,
    pub sql_id_field: String,
    pub sql_other_id_field: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation {
    BelongsTo(BelongsTo),
    HasMany(HasMany),
    HasOne(HasOne),
    BelongsToMany(BelongsToMany),
    BelongsToManyIds(BelongsToManyIds),
}

impl Relation {
    pub fn kind(&self) -> RelationKind {
        match self {
            Relation::BelongsTo(_) => RelationKind::BelongsTo,
            Relation::HasMany(_) => RelationKind::HasMany,
            Relation::HasOne(_) => RelationKind::HasOne,
            Relation::BelongsToMany(_) => RelationKind::BelongsToMany,
            Relation::BelongsToManyIds(_) => RelationKind::BelongsToManyIds,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Relation::BelongsTo(r) => &r.name,
            Relation::HasMany(r) => &r.name,
            Relation::HasOne(r) => &r.name,
            Relation::BelongsToMany(r) => &r.name,
            Relation::BelongsToManyIds(r) => &r.name,
        }
    }

    /// Rust field on the owning record that this relation populates
    pub fn value_field(&self) -> &str {
        match self {
            Relation::BelongsTo(r) => &r.value_field,
            Relation::HasMany(r) => &r.value_field,
            Relation::HasOne(r) => &r.value_field,
            Relation::BelongsToMany(r) => &r.value_field,
            Relation::BelongsToManyIds(r) => &r.value_field,
        }
    }

    pub fn join_name(&self) -> Option<&str> {
        match self {
            Relation::BelongsToMany(r) => Some(&r.join_name),
            Relation::BelongsToManyIds(r) => Some(&r.join_name),
            _ => None,
        }
    }

    pub fn sql_id_field(&self) -> Option<&str> {
        match self {
            Relation::BelongsTo(r) => Some(&r.sql_id_field),
            Relation::BelongsToMany(r) => Some(&r.sql_id_field),
            Relation::BelongsToManyIds(r) => Some(&r.sql_id_field),
            _ => None,
        }
    }

    pub fn sql_other_id_field(&self) -> Option<&str> {
        match self {
            Relation::HasMany(r) => Some(&r.sql_other_id_field),
            Relation::HasOne(r) => Some(&r.sql_other_id_field),
            Relation::BelongsToMany(r) => Some(&r.sql_other_id_field),
            Relation::BelongsToManyIds(r) => Some(&r.sql_other_id_field),
            Relation::BelongsTo(_) => None,
        }
    }
}

impl From<BelongsTo> for Relation {
    fn from(r: BelongsTo) -> Self {
        Relation::BelongsTo(r)
    }
}

impl From<HasMany> for Relation {
    fn from(r: HasMany) -> Self {
        Relation::HasMany(r)
    }
}

impl From<HasOne> for Relation {
    fn from(r: HasOne) -> Self {
        Relation::HasOne(r)
    }
}

impl From<BelongsToMany> for Relation {
    fn from(r: BelongsToMany) -> Self {
        Relation::BelongsToMany(r)
    }
}

impl From<BelongsToManyIds> for Relation {
    fn from(r: BelongsToManyIds) -> Self {
        Relation::BelongsToManyIds(r)
    }
}
