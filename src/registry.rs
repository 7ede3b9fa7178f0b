//! Реестр модулей.

use log::{debug, trace};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::descriptor::ModuleDescriptor;
use crate::error::{DnaError, DnaResult};
use crate::factory::ModuleFactory;

/// Зарегистрированный модуль.
#[derive(Clone)]
struct RegisteredModule {
    descriptor: ModuleDescriptor,
    factory: Arc<dyn ModuleFactory>,
}

/// Реестр известных модулей.
///
/// Заполняется на старте (или в тесте) и дальше только читается.
/// Явный объект, передаётся всем, кому нужен: никаких глобальных синглтонов.
#[derive(Default, Clone)]
pub struct ModuleRegistry {
    /// Модули по идентификатору
    modules: BTreeMap<String, RegisteredModule>,
}

impl ModuleRegistry {
    /// Создать пустой реестр.
    pub fn new() -> Self {
        Self::default()
    }

    /// Зарегистрировать модуль.
    ///
    /// Повторная регистрация того же id даёт ошибку `DuplicateModule`,
    /// реестр при этом не меняется.
    pub fn register(
        &mut self,
        descriptor: ModuleDescriptor,
        factory: impl ModuleFactory + 'static,
    ) -> DnaResult<()> {
        descriptor.validate()?;

        match self.modules.entry(descriptor.id.clone()) {
            Entry::Occupied(_) => Err(DnaError::DuplicateModule { id: descriptor.id }),
            Entry::Vacant(slot) => {
                debug!("registered module {}@{}", descriptor.id, descriptor.version);
                slot.insert(RegisteredModule {
                    descriptor,
                    factory: Arc::new(factory),
                });
                Ok(())
            }
        }
    }

    /// Зарегистрировать модуль, заменив существующий с тем же id.
    ///
    /// Возвращает прежний дескриптор, если он был.
    pub fn register_overwrite(
        &mut self,
        descriptor: ModuleDescriptor,
        factory: impl ModuleFactory + 'static,
    ) -> DnaResult<Option<ModuleDescriptor>> {
        descriptor.validate()?;

        let id = descriptor.id.clone();
        let previous = self.modules.insert(
            id.clone(),
            RegisteredModule {
                descriptor,
                factory: Arc::new(factory),
            },
        );

        if previous.is_some() {
            debug!("replaced module {}", id);
        }

        Ok(previous.map(|m| m.descriptor))
    }

    /// Получить дескриптор по id.
    pub fn get(&self, id: &str) -> Option<&ModuleDescriptor> {
        trace!("registry lookup {}", id);
        self.modules.get(id).map(|m| &m.descriptor)
    }

    /// Получить фабрику модуля.
    pub fn factory(&self, id: &str) -> Option<Arc<dyn ModuleFactory>> {
        self.modules.get(id).map(|m| Arc::clone(&m.factory))
    }

    /// Проверить, зарегистрирован ли модуль.
    pub fn has(&self, id: &str) -> bool {
        self.modules.contains_key(id)
    }

    /// Все зарегистрированные id (по возрастанию).
    pub fn list_ids(&self) -> Vec<String> {
        self.modules.keys().cloned().collect()
    }

    /// Все дескрипторы (по возрастанию id).
    pub fn iter(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.modules.values().map(|m| &m.descriptor)
    }

    /// Дескрипторы, сгруппированные по категории.
    pub fn by_category(&self) -> BTreeMap<&str, Vec<&ModuleDescriptor>> {
        let mut groups: BTreeMap<&str, Vec<&ModuleDescriptor>> = BTreeMap::new();
        for descriptor in self.iter() {
            groups
                .entry(descriptor.category.as_str())
                .or_default()
                .push(descriptor);
        }
        groups
    }

    /// Количество модулей.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Пустой ли реестр.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Очистить реестр.
    pub fn clear(&mut self) {
        debug!("clearing registry ({} modules)", self.modules.len());
        self.modules.clear();
    }
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.modules.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::TemplateFactory;

    fn module(id: &str, category: &str) -> ModuleDescriptor {
        ModuleDescriptor::new(id, "1.0.0").with_category(category)
    }

    #[test]
    fn test_registry_register() {
        let mut registry = ModuleRegistry::new();
        registry
            .register(module("user_analytics", "analytics"), TemplateFactory::empty())
            .unwrap();

        assert!(registry.has("user_analytics"));
        assert!(!registry.has("payments"));
        assert_eq!(registry.get("user_analytics").unwrap().version, "1.0.0");
        assert!(registry.get("payments").is_none());
        assert!(registry.factory("user_analytics").is_some());
    }

    #[test]
    fn test_duplicate_leaves_registry_unchanged() {
        let mut registry = ModuleRegistry::new();
        registry
            .register(module("auth-jwt", "auth"), TemplateFactory::empty())
            .unwrap();

        let second = ModuleDescriptor::new("auth-jwt", "2.0.0").with_category("auth");
        let err = registry.register(second, TemplateFactory::empty()).unwrap_err();

        assert!(matches!(err, DnaError::DuplicateModule { ref id } if id == "auth-jwt"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("auth-jwt").unwrap().version, "1.0.0");
    }

    #[test]
    fn test_overwrite() {
        let mut registry = ModuleRegistry::new();
        registry
            .register(module("auth-jwt", "auth"), TemplateFactory::empty())
            .unwrap();

        let previous = registry
            .register_overwrite(ModuleDescriptor::new("auth-jwt", "2.0.0"), TemplateFactory::empty())
            .unwrap();

        assert_eq!(previous.unwrap().version, "1.0.0");
        assert_eq!(registry.get("auth-jwt").unwrap().version, "2.0.0");
    }

    #[test]
    fn test_invalid_descriptor_is_rejected() {
        let mut registry = ModuleRegistry::new();
        let bad = ModuleDescriptor::new("loop", "1.0.0").depends_on("loop", None);

        assert!(registry.register(bad, TemplateFactory::empty()).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ModuleRegistry>();
    }

    #[test]
    fn test_list_group_and_clear() {
        let mut registry = ModuleRegistry::new();
        for (id, cat) in [("stripe", "payments"), ("auth-jwt", "auth"), ("auth-oauth", "auth")] {
            registry.register(module(id, cat), TemplateFactory::empty()).unwrap();
        }

        assert_eq!(registry.list_ids(), vec!["auth-jwt", "auth-oauth", "stripe"]);

        let groups = registry.by_category();
        assert_eq!(groups["auth"].len(), 2);
        assert_eq!(groups["payments"][0].id, "stripe");

        registry.clear();
        assert!(registry.is_empty());
        assert!(!registry.has("stripe"));
    }
}
