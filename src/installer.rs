//! Module installer.
//!
//! Проходит по плану в порядке установки, вызывает фабрику каждого модуля
//! и записывает сгенерированные файлы вместе с lock-файлом.

use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{DnaError, DnaResult};
use crate::factory::{GeneratedFile, GenerationContext};
use crate::planner::Plan;
use crate::registry::ModuleRegistry;

/// Lock-файл.
pub const LOCK_FILE: &str = "dna.lock";

/// Итог установки.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Записанные файлы (относительные пути)
    pub files: Vec<PathBuf>,
    /// Путь к lock-файлу
    pub lock_file: PathBuf,
}

#[derive(Serialize)]
struct LockFile<'a> {
    framework: &'a str,
    project: &'a str,
    #[serde(rename = "module")]
    modules: Vec<LockedModule<'a>>,
}

#[derive(Serialize)]
struct LockedModule<'a> {
    id: &'a str,
    version: &'a str,
    dependencies: Vec<&'a str>,
}

/// Установщик модулей.
pub struct Installer<'r> {
    /// Реестр модулей
    registry: &'r ModuleRegistry,
    /// Имя проекта
    project_name: String,
}

impl<'r> Installer<'r> {
    /// Создать установщик.
    pub fn new(registry: &'r ModuleRegistry, project_name: impl Into<String>) -> Self {
        Self {
            registry,
            project_name: project_name.into(),
        }
    }

    /// Сгенерировать файлы всех модулей плана.
    ///
    /// Если два модуля генерируют один и тот же путь, побеждает модуль,
    /// стоящий в плане позже.
    pub fn generate(&self, plan: &Plan) -> DnaResult<Vec<GeneratedFile>> {
        let context = GenerationContext::new(self.project_name.clone(), plan.framework());
        let mut files: Vec<GeneratedFile> = Vec::new();
        let mut by_path: HashMap<PathBuf, usize> = HashMap::new();

        for id in plan.modules() {
            let descriptor = self
                .registry
                .get(id)
                .ok_or_else(|| DnaError::UnknownModule { id: id.clone() })?;
            let factory = self
                .registry
                .factory(id)
                .ok_or_else(|| DnaError::UnknownModule { id: id.clone() })?;

            let generated = factory.generate_files(descriptor, &context);
            debug!("{} generated {} file(s)", id, generated.len());

            for file in generated {
                check_relative(&file.path)?;
                match by_path.get(&file.path) {
                    Some(&index) => {
                        warn!(
                            "{} overwrites {} from {}",
                            id,
                            file.path.display(),
                            files[index].module_id
                        );
                        files[index] = file;
                    }
                    None => {
                        by_path.insert(file.path.clone(), files.len());
                        files.push(file);
                    }
                }
            }
        }

        Ok(files)
    }

    /// Сгенерировать файлы и записать их в директорию проекта.
    pub fn install(&self, plan: &Plan, project_dir: &Path) -> DnaResult<InstallReport> {
        let files = self.generate(plan)?;
        fs::create_dir_all(project_dir)?;

        let mut written = Vec::with_capacity(files.len());
        for file in &files {
            let target = project_dir.join(&file.path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, &file.contents)?;
            written.push(file.path.clone());
        }

        let lock_file = self.write_lock_file(plan, project_dir)?;
        info!(
            "installed {} module(s), {} file(s) into {}",
            plan.len(),
            written.len(),
            project_dir.display()
        );

        Ok(InstallReport {
            files: written,
            lock_file,
        })
    }

    /// Записать lock-файл.
    fn write_lock_file(&self, plan: &Plan, project_dir: &Path) -> DnaResult<PathBuf> {
        let mut modules = Vec::with_capacity(plan.len());
        for id in plan.modules() {
            let descriptor = self
                .registry
                .get(id)
                .ok_or_else(|| DnaError::UnknownModule { id: id.clone() })?;
            modules.push(LockedModule {
                id: &descriptor.id,
                version: &descriptor.version,
                dependencies: descriptor
                    .dependencies
                    .iter()
                    .filter(|d| plan.contains(&d.module_id))
                    .map(|d| d.module_id.as_str())
                    .collect(),
            });
        }

        let lock = LockFile {
            framework: plan.framework().as_str(),
            project: &self.project_name,
            modules,
        };

        let mut content = String::from("# DNA lock file - DO NOT EDIT\n\n");
        content.push_str(&toml::to_string_pretty(&lock).map_err(|e| {
            DnaError::Io(std::io::Error::other(e.to_string()))
        })?);

        let path = project_dir.join(LOCK_FILE);
        fs::write(&path, content)?;
        Ok(path)
    }
}

/// Путь должен быть относительным и не выходить наружу.
fn check_relative(path: &Path) -> DnaResult<()> {
    let safe = !path.as_os_str().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));

    if safe {
        Ok(())
    } else {
        Err(DnaError::UnsafeOutputPath(path.to_path_buf()))
    }
}
