//! Join-table reconciliation for `belongs_to_many_ids` relations
//!
//! The record's identifier list is the complete desired link set. Running
//! [`StatementBuilder::reconcile_delete`] and then [`StatementBuilder::reconcile_insert`]
//! converges the join table to exactly that set, and running them again changes nothing.
//! Both statements must run inside one transaction; on their own the join table ends up
//! with a subset or superset of the desired links.

use crate::error::{Error, Result};
use crate::introspect;
use crate::query::{self, StatementBuilder};
use crate::record::Record;
use crate::relation::{BelongsToManyIds, Relation};
use crate::statement::Statement;
use sea_query::{Expr, ExprTrait, Query, Value};

/// The two statements of one reconciliation
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub delete: Statement,
    /// `None` when the desired set is empty
    pub insert: Option<Statement>,
}

struct JoinPlan {
    table: String,
    relation: BelongsToManyIds,
    own_id: Value,
    desired: Vec<Value>,
}

impl StatementBuilder<'_> {
    fn join_plan<R: Record>(&self, record: &R, relation_name: &str) -> Result<JoinPlan> {
        let (desc, relation) = self.resolve::<R>(relation_name)?;
        let link = match &relation {
            Relation::BelongsToManyIds(link) => link.clone(),
            other => {
                return Err(Error::UnsupportedRelationKind {
                    relation: relation_name.to_string(),
                    kind: other.kind(),
                    operation: "join table reconciliation",
                })
            }
        };
        let (info, locator) = query::value_field::<R>(&relation)?;
        let ids = introspect::relation_ids(record, &locator).ok_or_else(|| {
            Error::TypeShape(format!("field `{}` exposes no identifier list", info.name))
        })?;
        let join = self.registry().descriptor_named(&link.join_name)?;

        let mut desired: Vec<Value> = Vec::with_capacity(ids.len());
        for id in ids {
            if !desired.contains(&id) {
                desired.push(id);
            }
        }

        Ok(JoinPlan {
            table: join.storage_name().to_string(),
            own_id: desc.column_value(record, desc.primary_key()?)?,
            relation: link,
            desired,
        })
    }

    /// Delete the join rows of `record` whose other-side id is not in the desired set
    ///
    /// With an empty desired set every join row of `record` is deleted.
    ///
    /// # Errors
    ///
    /// `UnsupportedRelationKind` unless the relation is `belongs_to_many_ids`, plus the
    /// lookup errors of [`select_relation`](Self::select_relation).
    pub fn reconcile_delete<R: Record>(
        &self,
        record: &R,
        relation_name: &str,
    ) -> Result<Statement> {
        let plan = self.join_plan(record, relation_name)?;
        let rel = plan.relation;
        let mut query = Query::delete();
        query
            .from_table(plan.table)
            .and_where(Expr::col(rel.sql_id_field).eq(plan.own_id));
        if !plan.desired.is_empty() {
            query.and_where(Expr::col(rel.sql_other_id_field).is_not_in(plan.desired));
        }
        Ok(self.dialect().build(&query))
    }

    /// Insert `(own id, other id)` for every desired id, ignoring rows that already exist
    ///
    /// Returns `Ok(None)` when the desired set is empty.
    pub fn reconcile_insert<R: Record>(
        &self,
        record: &R,
        relation_name: &str,
    ) -> Result<Option<Statement>> {
        let plan = self.join_plan(record, relation_name)?;
        let rel = &plan.relation;
        let rows = plan
            .desired
            .iter()
            .map(|id| vec![plan.own_id.clone(), id.clone()])
            .collect();
        self.dialect().insert_ignore(
            &plan.table,
            &[rel.sql_id_field.as_str(), rel.sql_other_id_field.as_str()],
            rows,
        )
    }

    /// Both reconciliation statements for `relation_name`
    pub fn reconcile<R: Record>(&self, record: &R, relation_name: &str) -> Result<Reconciliation> {
        let delete = self.reconcile_delete(record, relation_name)?;
        let insert = self.reconcile_insert(record, relation_name)?;
        log::debug!(
            "reconciling {relation_name}: {} ({} inserts)",
            delete.sql,
            insert.as_ref().map_or(0, |s| s.params().len() / 2)
        );
        Ok(Reconciliation { delete, insert })
    }
}
