//! Module factories.
//!
//! Фабрика: способность модуля сгенерировать файлы для конкретного проекта.
//! Ядро планирования фабрики не вызывает; это делает [`crate::installer::Installer`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::descriptor::{Framework, ModuleDescriptor};

/// Контекст генерации.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationContext {
    /// Имя проекта
    pub project_name: String,
    /// Целевой фреймворк
    pub framework: Framework,
}

impl GenerationContext {
    /// Создать контекст.
    pub fn new(project_name: impl Into<String>, framework: Framework) -> Self {
        Self {
            project_name: project_name.into(),
            framework,
        }
    }
}

/// Сгенерированный файл.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Относительный путь внутри проекта
    pub path: PathBuf,
    /// Содержимое
    pub contents: String,
    /// Какой модуль его создал
    pub module_id: String,
}

/// Генератор файлов модуля.
pub trait ModuleFactory: Send + Sync {
    /// Сгенерировать файлы модуля.
    fn generate_files(
        &self,
        descriptor: &ModuleDescriptor,
        context: &GenerationContext,
    ) -> Vec<GeneratedFile>;
}

impl<F> ModuleFactory for F
where
    F: Fn(&ModuleDescriptor, &GenerationContext) -> Vec<GeneratedFile> + Send + Sync,
{
    fn generate_files(
        &self,
        descriptor: &ModuleDescriptor,
        context: &GenerationContext,
    ) -> Vec<GeneratedFile> {
        self(descriptor, context)
    }
}

/// Шаблон файла из каталога.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTemplate {
    /// Путь (может содержать плейсхолдеры)
    pub path: String,
    /// Содержимое (может содержать плейсхолдеры)
    #[serde(default)]
    pub contents: String,
}

/// Фабрика из статических шаблонов.
///
/// Плейсхолдеры: `{{module}}`, `{{version}}`, `{{project}}`, `{{framework}}`.
#[derive(Debug, Clone, Default)]
pub struct TemplateFactory {
    templates: Vec<FileTemplate>,
}

impl TemplateFactory {
    /// Создать фабрику из шаблонов.
    pub fn new(templates: Vec<FileTemplate>) -> Self {
        Self { templates }
    }

    /// Фабрика, которая ничего не генерирует.
    pub fn empty() -> Self {
        Self::default()
    }

    fn render(template: &str, descriptor: &ModuleDescriptor, context: &GenerationContext) -> String {
        template
            .replace("{{module}}", &descriptor.id)
            .replace("{{version}}", &descriptor.version)
            .replace("{{project}}", &context.project_name)
            .replace("{{framework}}", context.framework.as_str())
    }
}

impl ModuleFactory for TemplateFactory {
    fn generate_files(
        &self,
        descriptor: &ModuleDescriptor,
        context: &GenerationContext,
    ) -> Vec<GeneratedFile> {
        self.templates
            .iter()
            .map(|t| GeneratedFile {
                path: PathBuf::from(Self::render(&t.path, descriptor, context)),
                contents: Self::render(&t.contents, descriptor, context),
                module_id: descriptor.id.clone(),
            })
            .collect()
    }
}
