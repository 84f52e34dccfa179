//! Statement generation from entity descriptors.
//!
//! [`StatementBuilder`] pairs a [`Registry`] with a [`Dialect`] and turns registered
//! metadata plus record values into [`Statement`]s. It never executes anything; see
//! [`crate::executor`] for the helpers that hand statements to an executor.
//!
//! ```ignore
//! let builder = StatementBuilder::new(&registry, Dialect::Postgres);
//! let stmt = builder.select_relation(&book, "author")?;
//! // SELECT "author_id", "nom_de_plume" FROM "author" WHERE "author_id" = $1
//! ```

mod crud;
mod relation;

pub use crud::next_version;

use crate::config::RelmetaConfig;
use crate::entity::EntityDescriptor;
use crate::error::{Error, Result};
use crate::introspect;
use crate::record::{FieldInfo, Record};
use crate::registry::Registry;
use crate::relation::Relation;
use crate::statement::Dialect;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
pub struct StatementBuilder<'r> {
    registry: &'r Registry,
    dialect: Dialect,
}

impl<'r> StatementBuilder<'r> {
    pub fn new(registry: &'r Registry, dialect: Dialect) -> Self {
        Self { registry, dialect }
    }

    pub fn from_config(registry: &'r Registry, config: &RelmetaConfig) -> Self {
        Self::new(registry, config.dialect)
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Descriptor for `R` and its relation `name`
    pub(crate) fn resolve<R: Record>(
        &self,
        relation_name: &str,
    ) -> Result<(Arc<EntityDescriptor>, Relation)> {
        let desc = self.registry.descriptor_for::<R>()?;
        let relation = desc
            .relation(relation_name)
            .cloned()
            .ok_or_else(|| Error::relation_not_found(desc.name(), relation_name))?;
        Ok((desc, relation))
    }
}

/// Static info and locator of the field `relation` populates on `R`
///
/// # Errors
///
/// Returns `Error::TypeShape` if the field is missing or its shape does not match the
/// relation kind.
pub(crate) fn value_field<R: Record>(
    relation: &Relation,
) -> Result<(&'static FieldInfo, introspect::FieldLocator)> {
    let record_type = R::record_type();
    let locator = introspect::locate_field(record_type, R::fields(), relation.value_field())
        .ok_or_else(|| {
            Error::TypeShape(format!(
                "relation {:?} names field `{}`, which {} does not have",
                relation.name(),
                relation.value_field(),
                record_type.name()
            ))
        })?;
    let info = introspect::field_info(R::fields(), &locator).ok_or_else(|| {
        Error::TypeShape(format!("dangling locator for `{}`", relation.value_field()))
    })?;
    let expected = relation.kind().shape();
    if info.relation_shape() != Some(expected) {
        return Err(Error::TypeShape(format!(
            "field `{}` of {} must be a {expected:?} relation field for {} relation {:?}",
            info.name,
            record_type.name(),
            relation.kind(),
            relation.name()
        )));
    }
    Ok((info, locator))
}
