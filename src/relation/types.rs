//! Relation kind definitions.

use crate::record::RelationShape;
use std::fmt;

/// Kind of relationship between two entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// Single related record, foreign key stored on this record
    BelongsTo,
    /// Collection of related records, foreign key stored on the other record
    HasMany,
    /// Single related record, foreign key stored on the other record
    HasOne,
    /// Collection of related records through a join table
    BelongsToMany,
    /// Collection of related identifiers through a join table
    BelongsToManyIds,
}

impl RelationKind {
    pub const ALL: [RelationKind; 5] = [
        RelationKind::BelongsTo,
        RelationKind::HasMany,
        RelationKind::HasOne,
        RelationKind::BelongsToMany,
        RelationKind::BelongsToManyIds,
    ];

    /// Annotation token selecting this kind
    pub fn token(self) -> &'static str {
        match self {
            RelationKind::BelongsTo => "belongs_to",
            RelationKind::HasMany => "has_many",
            RelationKind::HasOne => "has_one",
            RelationKind::BelongsToMany => "belongs_to_many",
            RelationKind::BelongsToManyIds => "belongs_to_many_ids",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.token() == token)
    }

    /// Field shape the relation populates
    pub fn shape(self) -> RelationShape {
        match self {
            RelationKind::BelongsTo | RelationKind::HasOne => RelationShape::One,
            RelationKind::HasMany | RelationKind::BelongsToMany => RelationShape::Many,
            RelationKind::BelongsToManyIds => RelationShape::Ids,
        }
    }

    pub fn uses_join_table(self) -> bool {
        matches!(
            self,
            RelationKind::BelongsToMany | RelationKind::BelongsToManyIds
        )
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
