//! Relation module for entity relationships.
//!
//! Five kinds are supported:
//! - belongs_to: many-to-one, foreign key on this record
//! - has_many: one-to-many, foreign key on the other record
//! - has_one: one-to-one, foreign key on the other record
//! - belongs_to_many: many-to-many through a join table, loading records
//! - belongs_to_many_ids: many-to-many through a join table, loading identifiers

pub mod types;
#[doc(inline)]
pub use types::RelationKind;

pub mod def;
#[doc(inline)]
pub use def::{BelongsTo, BelongsToMany, BelongsToManyIds, HasMany, HasOne, Relation};
