//! Module descriptors.
//!
//! Дескриптор: неизменяемое описание DNA-модуля: идентификатор, версия,
//! зависимости, конфликты и матрица поддержки фреймворков.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::{DnaError, DnaResult};
use crate::version::{parse_version, VersionRange};

/// Целевой фреймворк, для которого генерируется код.
///
/// В каталогах записывается строкой (`"react-native"`), в том числе как
/// ключ таблицы поддержки.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Framework {
    Nextjs,
    Flutter,
    ReactNative,
    Tauri,
    Sveltekit,
    Electron,
}

impl Framework {
    /// Все известные фреймворки.
    pub const ALL: [Framework; 6] = [
        Framework::Nextjs,
        Framework::Flutter,
        Framework::ReactNative,
        Framework::Tauri,
        Framework::Sveltekit,
        Framework::Electron,
    ];

    /// Идентификатор фреймворка.
    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::Nextjs => "nextjs",
            Framework::Flutter => "flutter",
            Framework::ReactNative => "react-native",
            Framework::Tauri => "tauri",
            Framework::Sveltekit => "sveltekit",
            Framework::Electron => "electron",
        }
    }
}

impl std::fmt::Display for Framework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Framework {
    type Err = DnaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Framework::ALL
            .iter()
            .copied()
            .find(|fw| fw.as_str() == needle)
            .ok_or_else(|| DnaError::UnknownFramework(s.to_string()))
    }
}

impl Serialize for Framework {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Framework {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Уровень поддержки фреймворка модулем.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportLevel {
    Full,
    Partial,
    #[default]
    Unsupported,
}

impl std::fmt::Display for SupportLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SupportLevel::Full => write!(f, "full"),
            SupportLevel::Partial => write!(f, "partial"),
            SupportLevel::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Серьёзность конфликта или проблемы.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    #[default]
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Зависимость модуля от другого модуля.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySpec {
    /// Идентификатор модуля-зависимости
    pub module_id: String,

    /// Требуемый диапазон версий (None: любая)
    #[serde(default)]
    pub version_range: Option<String>,

    /// Опциональная зависимость
    #[serde(default)]
    pub optional: bool,

    /// Зачем нужна
    #[serde(default)]
    pub reason: String,
}

impl DependencySpec {
    /// Обязательная зависимость.
    pub fn required(module_id: impl Into<String>, version_range: Option<&str>) -> Self {
        Self {
            module_id: module_id.into(),
            version_range: version_range.map(str::to_string),
            optional: false,
            reason: String::new(),
        }
    }

    /// Опциональная зависимость.
    pub fn optional(module_id: impl Into<String>, version_range: Option<&str>) -> Self {
        Self {
            optional: true,
            ..Self::required(module_id, version_range)
        }
    }

    /// Указать причину.
    pub fn because(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }
}

/// Объявленный конфликт с другим модулем.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictSpec {
    /// С каким модулем
    pub module_id: String,

    /// Серьёзность
    #[serde(default)]
    pub severity: Severity,

    /// Причина конфликта
    #[serde(default)]
    pub reason: String,

    /// Как разрешить
    #[serde(default)]
    pub resolution: Option<String>,
}

/// Дескриптор модуля.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    /// Уникальный идентификатор
    pub id: String,

    /// Версия (semver)
    pub version: String,

    /// Зависимости
    #[serde(default)]
    pub dependencies: Vec<DependencySpec>,

    /// Конфликты
    #[serde(default)]
    pub conflicts: Vec<ConflictSpec>,

    /// Поддержка фреймворков
    #[serde(default)]
    pub framework_support: BTreeMap<Framework, SupportLevel>,

    /// Категория (только для отображения)
    #[serde(default)]
    pub category: String,
}

impl ModuleDescriptor {
    /// Создать дескриптор без зависимостей и поддержки.
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
            dependencies: Vec::new(),
            conflicts: Vec::new(),
            framework_support: BTreeMap::new(),
            category: String::new(),
        }
    }

    /// Установить категорию.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Добавить зависимость.
    pub fn with_dependency(mut self, dependency: DependencySpec) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Добавить обязательную зависимость.
    pub fn depends_on(self, module_id: &str, version_range: Option<&str>) -> Self {
        self.with_dependency(DependencySpec::required(module_id, version_range))
    }

    /// Добавить конфликт.
    pub fn conflicts_with(
        mut self,
        module_id: impl Into<String>,
        severity: Severity,
        reason: impl Into<String>,
    ) -> Self {
        self.conflicts.push(ConflictSpec {
            module_id: module_id.into(),
            severity,
            reason: reason.into(),
            resolution: None,
        });
        self
    }

    /// Объявить уровень поддержки фреймворка.
    pub fn supports(mut self, framework: Framework, level: SupportLevel) -> Self {
        self.framework_support.insert(framework, level);
        self
    }

    /// Полная поддержка всех известных фреймворков.
    pub fn supports_all(mut self) -> Self {
        for fw in Framework::ALL {
            self.framework_support.insert(fw, SupportLevel::Full);
        }
        self
    }

    /// Уровень поддержки фреймворка. Отсутствие записи означает `Unsupported`.
    pub fn support_for(&self, framework: Framework) -> SupportLevel {
        self.framework_support
            .get(&framework)
            .copied()
            .unwrap_or_default()
    }

    /// Найти объявленный конфликт с модулем.
    pub fn conflict_with(&self, module_id: &str) -> Option<&ConflictSpec> {
        self.conflicts.iter().find(|c| c.module_id == module_id)
    }

    /// Проверить дескриптор перед регистрацией.
    pub fn validate(&self) -> DnaResult<()> {
        if self.id.trim().is_empty() {
            return Err(DnaError::invalid_descriptor(&self.id, "empty module id"));
        }

        parse_version(&self.version).map_err(|e| {
            DnaError::invalid_descriptor(&self.id, format!("bad version '{}': {}", self.version, e))
        })?;

        for dep in &self.dependencies {
            if dep.module_id == self.id {
                return Err(DnaError::invalid_descriptor(&self.id, "module depends on itself"));
            }
            if let Some(range) = &dep.version_range {
                VersionRange::parse(range).map_err(|e| {
                    DnaError::invalid_descriptor(
                        &self.id,
                        format!("bad version range '{}' for '{}': {}", range, dep.module_id, e),
                    )
                })?;
            }
        }

        if self.conflicts.iter().any(|c| c.module_id == self.id) {
            return Err(DnaError::invalid_descriptor(&self.id, "module conflicts with itself"));
        }

        Ok(())
    }
}
