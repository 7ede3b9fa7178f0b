//! Module catalog (`dna.toml` / `dna.json`) handling.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::descriptor::{ConflictSpec, DependencySpec, Framework, ModuleDescriptor, SupportLevel};
use crate::error::{DnaError, DnaResult};
use crate::factory::{FileTemplate, TemplateFactory};
use crate::registry::ModuleRegistry;

/// Файл каталога по умолчанию.
pub const CATALOG_FILE: &str = "dna.toml";

/// Каталог модулей.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Модули
    #[serde(default, rename = "module")]
    pub modules: Vec<CatalogModule>,
}

/// Модуль в каталоге: дескриптор плюс шаблоны файлов.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogModule {
    /// Идентификатор
    pub id: String,

    /// Версия
    pub version: String,

    /// Категория
    #[serde(default)]
    pub category: String,

    /// Зависимости
    #[serde(default)]
    pub dependencies: Vec<DependencySpec>,

    /// Конфликты
    #[serde(default)]
    pub conflicts: Vec<ConflictSpec>,

    /// Поддержка фреймворков
    #[serde(default)]
    pub framework_support: BTreeMap<Framework, SupportLevel>,

    /// Шаблоны файлов
    #[serde(default)]
    pub files: Vec<FileTemplate>,
}

impl CatalogModule {
    /// Дескриптор модуля.
    pub fn descriptor(&self) -> ModuleDescriptor {
        ModuleDescriptor {
            id: self.id.clone(),
            version: self.version.clone(),
            dependencies: self.dependencies.clone(),
            conflicts: self.conflicts.clone(),
            framework_support: self.framework_support.clone(),
            category: self.category.clone(),
        }
    }
}

impl Catalog {
    /// Загрузить каталог; формат определяется по расширению.
    pub fn load(path: impl AsRef<Path>) -> DnaResult<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let parse: fn(&str) -> Result<Catalog, String> = match extension.as_deref() {
            Some("toml") => |s: &str| toml::from_str(s).map_err(|e| e.to_string()),
            Some("json") => |s: &str| serde_json::from_str(s).map_err(|e| e.to_string()),
            _ => return Err(DnaError::UnsupportedCatalogFormat(path.to_path_buf())),
        };

        let content = fs::read_to_string(path).map_err(|source| DnaError::CatalogIo {
            path: path.to_path_buf(),
            source,
        })?;

        let catalog = parse(&content).map_err(|message| DnaError::CatalogParse {
            path: path.to_path_buf(),
            message,
        })?;

        debug!("loaded {} module(s) from {}", catalog.modules.len(), path.display());
        Ok(catalog)
    }

    /// Разобрать каталог из TOML.
    pub fn from_toml_str(content: &str) -> DnaResult<Self> {
        toml::from_str(content).map_err(|e| DnaError::CatalogParse {
            path: CATALOG_FILE.into(),
            message: e.to_string(),
        })
    }

    /// Сериализовать каталог в TOML.
    pub fn to_toml_string(&self) -> DnaResult<String> {
        toml::to_string_pretty(self).map_err(|e| DnaError::CatalogParse {
            path: CATALOG_FILE.into(),
            message: e.to_string(),
        })
    }

    /// Зарегистрировать все модули каталога в реестре.
    ///
    /// Первая же ошибка прерывает регистрацию; уже добавленные модули
    /// остаются в реестре.
    pub fn register_into(&self, registry: &mut ModuleRegistry) -> DnaResult<()> {
        for module in &self.modules {
            registry.register(module.descriptor(), TemplateFactory::new(module.files.clone()))?;
        }
        info!("registered {} module(s) from catalog", self.modules.len());
        Ok(())
    }

    /// Построить новый реестр из каталога.
    pub fn into_registry(self) -> DnaResult<ModuleRegistry> {
        let mut registry = ModuleRegistry::new();
        self.register_into(&mut registry)?;
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    const ANALYTICS: &str = r#"
[[module]]
id = "user_analytics"
version = "1.0.0"
category = "analytics"

[module.framework_support]
nextjs = "full"
flutter = "full"

[[module]]
id = "business_intelligence"
version = "1.2.0"
category = "analytics"

[[module.dependencies]]
module_id = "user_analytics"
version_range = "^1.0.0"
reason = "consumes the event stream"

[module.framework_support]
nextjs = "full"
flutter = "unsupported"

[[module.files]]
path = "lib/{{module}}.ts"
contents = "export const project = '{{project}}';"
"#;

    #[test]
    fn test_parse_toml() {
        let catalog = Catalog::from_toml_str(ANALYTICS).unwrap();
        assert_eq!(catalog.modules.len(), 2);

        let bi = catalog.modules[1].descriptor();
        assert_eq!(bi.dependencies[0].module_id, "user_analytics");
        assert!(!bi.dependencies[0].optional);
        assert_eq!(bi.support_for(Framework::Flutter), SupportLevel::Unsupported);
        assert_eq!(catalog.modules[1].files.len(), 1);
    }

    #[test]
    fn test_load_json_file() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        write!(
            file,
            r#"{{"module": [{{"id": "docs", "version": "0.3.0", "framework_support": {{"electron": "partial"}}}}]}}"#
        )
        .unwrap();

        let registry = Catalog::load(file.path()).unwrap().into_registry().unwrap();
        assert_eq!(
            registry.get("docs").unwrap().support_for(Framework::Electron),
            SupportLevel::Partial
        );
    }

    #[test]
    fn test_load_toml_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CATALOG_FILE);
        fs::write(&path, ANALYTICS).unwrap();

        let registry = Catalog::load(&path).unwrap().into_registry().unwrap();
        assert_eq!(registry.list_ids(), vec!["business_intelligence", "user_analytics"]);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempdir().unwrap();

        let yaml = dir.path().join("dna.yaml");
        fs::write(&yaml, "module: []").unwrap();
        assert!(matches!(
            Catalog::load(&yaml),
            Err(DnaError::UnsupportedCatalogFormat(_))
        ));

        assert!(matches!(
            Catalog::load(dir.path().join("missing.toml")),
            Err(DnaError::CatalogIo { .. })
        ));

        let broken = dir.path().join("broken.toml");
        fs::write(&broken, "[[module]]\nid = 1").unwrap();
        assert!(matches!(
            Catalog::load(&broken),
            Err(DnaError::CatalogParse { .. })
        ));
    }

    #[test]
    fn test_duplicate_in_catalog() {
        let catalog = Catalog::from_toml_str(
            r#"
[[module]]
id = "stripe"
version = "1.0.0"

[[module]]
id = "stripe"
version = "1.1.0"
"#,
        )
        .unwrap();

        assert!(matches!(
            catalog.into_registry(),
            Err(DnaError::DuplicateModule { .. })
        ));
    }

    #[test]
    fn test_toml_roundtrip_keeps_support_matrix() {
        let catalog = Catalog::from_toml_str(ANALYTICS).unwrap();
        let text = catalog.to_toml_string().unwrap();
        assert!(text.contains("flutter = \"unsupported\""));
        assert_eq!(Catalog::from_toml_str(&text).unwrap(), catalog);
    }
}
