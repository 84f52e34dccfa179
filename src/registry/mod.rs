//! Entity registry
//!
//! Holds one [`EntityDescriptor`] per record type. Descriptors are parsed from the
//! derive-generated field tables, stored behind `Arc` and handed out by type, by logical
//! name or by instance. The registry is an explicit value: build one at startup, share it
//! by reference (or `Arc`), and optionally install it as the process default with
//! [`global::install`].

pub mod global;
mod parse;

pub use parse::{guess_other_id_field, parse_descriptor};

use crate::config::RelmetaConfig;
use crate::entity::EntityDescriptor;
use crate::error::{Error, Result};
use crate::record::{Record, RecordType};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
pub struct Registry {
    entries: RwLock<HashMap<TypeId, Arc<EntityDescriptor>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<TypeId, Arc<EntityDescriptor>>> {
        // Every mutation is a single map operation, so a poisoned map is still consistent.
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<TypeId, Arc<EntityDescriptor>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Parse `R` under its snake_case type name and register it
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for invalid annotations; nothing is registered then.
    pub fn parse<R: Record>(&self) -> Result<Arc<EntityDescriptor>> {
        Ok(self.register(parse_descriptor::<R>(None)?))
    }

    /// Parse `R` under an explicit logical name and register it
    pub fn parse_named<R: Record>(&self, name: &str) -> Result<Arc<EntityDescriptor>> {
        Ok(self.register(parse_descriptor::<R>(Some(name))?))
    }

    /// [`Registry::parse`] for metadata known to be valid; panics on error
    #[track_caller]
    pub fn must_parse<R: Record>(&self) -> Arc<EntityDescriptor> {
        self.parse::<R>()
            .unwrap_or_else(|e| panic!("relmeta: cannot register {}: {e}", R::record_type().name()))
    }

    /// [`Registry::parse_named`] for metadata known to be valid; panics on error
    #[track_caller]
    pub fn must_parse_named<R: Record>(&self, name: &str) -> Arc<EntityDescriptor> {
        self.parse_named::<R>(name)
            .unwrap_or_else(|e| panic!("relmeta: cannot register {name}: {e}"))
    }

    /// Store `descriptor` for its record type
    ///
    /// Replaces the type's previous descriptor and removes any other type registered
    /// under the same logical name, so a customized shape can take over a base entity.
    pub fn register(&self, descriptor: EntityDescriptor) -> Arc<EntityDescriptor> {
        let descriptor = Arc::new(descriptor);
        let type_id = descriptor.record_type().id();
        let mut entries = self.write();
        entries.retain(|id, existing| *id == type_id || existing.name() != descriptor.name());
        entries.insert(type_id, Arc::clone(&descriptor));
        log::debug!(
            "registered entity `{}` for {} (table `{}`, {} relations)",
            descriptor.name(),
            descriptor.record_type().name(),
            descriptor.storage_name(),
            descriptor.relation_count()
        );
        descriptor
    }

    pub fn lookup_by_type(&self, record_type: RecordType) -> Option<Arc<EntityDescriptor>> {
        self.read().get(&record_type.id()).cloned()
    }

    pub fn lookup<R: Record>(&self) -> Option<Arc<EntityDescriptor>> {
        self.lookup_by_type(R::record_type())
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<Arc<EntityDescriptor>> {
        self.read().values().find(|desc| desc.name() == name).cloned()
    }

    /// Descriptor for the type of `record`; `Box<R>` resolves to `R`'s entry
    pub fn lookup_for<R: Record>(&self, _record: &R) -> Option<Arc<EntityDescriptor>> {
        self.lookup::<R>()
    }

    /// Like [`Registry::lookup_by_type`], failing with `Error::NotRegistered`
    pub fn descriptor(&self, record_type: RecordType) -> Result<Arc<EntityDescriptor>> {
        self.lookup_by_type(record_type)
            .ok_or_else(|| Error::NotRegistered(record_type.name().to_string()))
    }

    pub fn descriptor_for<R: Record>(&self) -> Result<Arc<EntityDescriptor>> {
        self.descriptor(R::record_type())
    }

    /// Like [`Registry::lookup_by_name`], failing with `Error::NotRegistered`
    pub fn descriptor_named(&self, name: &str) -> Result<Arc<EntityDescriptor>> {
        self.lookup_by_name(name)
            .ok_or_else(|| Error::NotRegistered(name.to_string()))
    }

    /// Apply `mapper` to every registered storage name
    ///
    /// Logical names and relation linkage are untouched. `Arc`s handed out earlier keep
    /// the storage name they had.
    pub fn rename_storage_names<F>(&self, mapper: F)
    where
        F: Fn(&str) -> String,
    {
        let mut entries = self.write();
        for desc in entries.values_mut() {
            let renamed = mapper(desc.storage_name());
            log::debug!("entity `{}` now stored in `{renamed}`", desc.name());
            Arc::make_mut(desc).set_storage_name(renamed);
        }
    }

    /// Apply configuration-driven naming, currently the table prefix
    pub fn apply_config(&self, config: &RelmetaConfig) {
        if let Some(prefix) = config.table_prefix.as_deref().filter(|p| !p.is_empty()) {
            self.rename_storage_names(|name| format!("{prefix}{name}"));
        }
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Registered logical names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().values().map(|d| d.name().to_string()).collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Record;

    #[derive(Record, Default)]
    struct Widget {
        #[relmeta(pk)]
        widget_id: String,
    }

    #[derive(Record, Default)]
    struct CustomWidget {
        #[relmeta(pk)]
        widget_id: String,
        colour: String,
    }

    #[test]
    fn test_lookups() {
        let registry = Registry::new();
        registry.parse::<Widget>().unwrap();
        assert_eq!(registry.lookup::<Widget>().unwrap().name(), "widget");
        assert_eq!(
            registry.lookup_by_name("widget").unwrap().record_type(),
            Widget::record_type()
        );
        let boxed = Box::new(Widget::default());
        assert_eq!(registry.lookup_for(&boxed).unwrap().name(), "widget");
        assert!(registry.lookup::<CustomWidget>().is_none());
        assert!(matches!(
            registry.descriptor_for::<CustomWidget>(),
            Err(Error::NotRegistered(_))
        ));
    }

    #[test]
    fn test_same_logical_name_last_writer_wins() {
        let registry = Registry::new();
        registry.parse::<Widget>().unwrap();
        registry.parse_named::<CustomWidget>("widget").unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.lookup::<Widget>().is_none());
        assert_eq!(
            registry.lookup_by_name("widget").unwrap().record_type(),
            CustomWidget::record_type()
        );
    }

    #[test]
    fn test_reparse_replaces_entry() {
        let registry = Registry::new();
        registry.parse::<Widget>().unwrap();
        registry.parse_named::<Widget>("gadget").unwrap();
        assert_eq!(registry.names(), vec!["gadget".to_string()]);
    }

    #[test]
    fn test_rename_storage_names() {
        let registry = Registry::new();
        registry.parse::<Widget>().unwrap();
        registry.parse::<CustomWidget>().unwrap();
        registry.rename_storage_names(|name| format!("shop_{name}"));
        let desc = registry.lookup::<CustomWidget>().unwrap();
        assert_eq!(desc.name(), "custom_widget");
        assert_eq!(desc.storage_name(), "shop_custom_widget");
        assert_eq!(registry.lookup::<Widget>().unwrap().storage_name(), "shop_widget");
    }

    #[test]
    fn test_apply_config_prefix() {
        let registry = Registry::new();
        registry.parse::<Widget>().unwrap();
        registry.apply_config(&RelmetaConfig {
            table_prefix: Some("t_".into()),
            ..RelmetaConfig::default()
        });
        assert_eq!(registry.lookup::<Widget>().unwrap().storage_name(), "t_widget");
    }

    #[test]
    #[should_panic(expected = "cannot register")]
    fn test_must_parse_panics_on_invalid_metadata() {
        #[derive(Record, Default)]
        struct NoKey {
            label: String,
        }
        Registry::new().must_parse::<NoKey>();
    }
}
