//! Relation selects, one shape per relation kind

use super::{value_field, StatementBuilder};
use crate::entity::EntityDescriptor;
use crate::error::{Error, Result};
use crate::introspect;
use crate::record::{Record, RelationTarget};
use crate::relation::{HasMany, HasOne, Relation};
use crate::statement::Statement;
use sea_query::{Expr, ExprTrait, Query};
use std::sync::Arc;

impl StatementBuilder<'_> {
    /// Descriptor of the record type a `One`/`Many` relation field holds
    fn target_descriptor<R: Record>(&self, relation: &Relation) -> Result<Arc<EntityDescriptor>> {
        let (info, _) = value_field::<R>(relation)?;
        let target = info.relation_target().ok_or_else(|| {
            Error::TypeShape(format!(
                "field `{}` does not hold related records",
                info.name
            ))
        })?;
        self.registry.descriptor(target)
    }

    /// Select the rows that populate `relation_name` on `record`
    ///
    /// - belongs_to: target row whose first key equals this record's `sql_id_field`
    /// - has_many / has_one: target rows whose `sql_other_id_field` equals this record's
    ///   first key (composite keys contribute their first column only)
    /// - belongs_to_many: target rows joined through the join table
    /// - belongs_to_many_ids: the join table's other-side column only
    ///
    /// # Errors
    ///
    /// `NotRegistered` for an unregistered record, target or join entity,
    /// `RelationNotFound` for an unknown relation name, `TypeShape` when the relation's
    /// value field is missing or mis-shaped.
    pub fn select_relation<R: Record>(&self, record: &R, relation_name: &str) -> Result<Statement> {
        let (desc, relation) = self.resolve::<R>(relation_name)?;
        let mut query = Query::select();
        match &relation {
            Relation::BelongsTo(rel) => {
                let target = self.target_descriptor::<R>(&relation)?;
                query
                    .columns(target.sql_fields(true))
                    .from(target.storage_name().to_owned())
                    .and_where(
                        Expr::col(target.primary_key()?.to_owned())
                            .eq(desc.column_value(record, &rel.sql_id_field)?),
                    );
            }
            Relation::HasMany(HasMany {
                sql_other_id_field, ..
            })
            | Relation::HasOne(HasOne {
                sql_other_id_field, ..
            }) => {
                let target = self.target_descriptor::<R>(&relation)?;
                query
                    .columns(target.sql_fields(true))
                    .from(target.storage_name().to_owned())
                    .and_where(
                        Expr::col(sql_other_id_field.clone())
                            .eq(desc.column_value(record, desc.primary_key()?)?),
                    );
            }
            Relation::BelongsToMany(rel) => {
                let target = self.target_descriptor::<R>(&relation)?;
                let join = self.registry.descriptor_named(&rel.join_name)?;
                let join_table = join.storage_name().to_owned();
                let target_table = target.storage_name().to_owned();
                query
                    .columns(
                        target
                            .sql_fields(true)
                            .into_iter()
                            .map(|column| (target_table.clone(), column)),
                    )
                    .from(join_table.clone())
                    .inner_join(
                        target_table.clone(),
                        Expr::col((join_table.clone(), rel.sql_other_id_field.clone()))
                            .equals((target_table, target.primary_key()?.to_owned())),
                    )
                    .and_where(
                        Expr::col((join_table, rel.sql_id_field.clone()))
                            .eq(desc.column_value(record, desc.primary_key()?)?),
                    );
            }
            Relation::BelongsToManyIds(rel) => {
                value_field::<R>(&relation)?;
                let join = self.registry.descriptor_named(&rel.join_name)?;
                query
                    .column(rel.sql_other_id_field.clone())
                    .from(join.storage_name().to_owned())
                    .and_where(
                        Expr::col(rel.sql_id_field.clone())
                            .eq(desc.column_value(record, desc.primary_key()?)?),
                    );
            }
        }
        Ok(self.dialect.build(&query))
    }

    /// [`select_relation`](Self::select_relation) plus the handle to fill with its rows
    pub fn select_relation_target<'a, R: Record>(
        &self,
        record: &'a mut R,
        relation_name: &str,
    ) -> Result<(Statement, RelationTarget<'a>)> {
        let statement = self.select_relation(&*record, relation_name)?;
        let (_, relation) = self.resolve::<R>(relation_name)?;
        let (_, locator) = value_field::<R>(&relation)?;
        let target = introspect::relation_handle(record, &locator).ok_or_else(|| {
            Error::TypeShape(format!(
                "field `{}` exposes no relation handle",
                relation.value_field()
            ))
        })?;
        Ok((statement, target))
    }
}
