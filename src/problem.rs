//! Planning problems.
//!
//! Каждая проблема, найденная при проверке совместимости или сортировке,
//! имеет код, серьёзность и список затронутых модулей.

use serde::Serialize;
use thiserror::Error;

use crate::descriptor::{Framework, Severity};

/// Код проблемы.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProblemCode {
    UnknownModule,
    FrameworkUnsupported,
    PartialSupport,
    MissingDependency,
    VersionMismatch,
    Conflict,
    ConflictWarning,
    Cycle,
}

impl std::fmt::Display for ProblemCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProblemCode::UnknownModule => "unknown-module",
            ProblemCode::FrameworkUnsupported => "framework-unsupported",
            ProblemCode::PartialSupport => "partial-support",
            ProblemCode::MissingDependency => "missing-dependency",
            ProblemCode::VersionMismatch => "version-mismatch",
            ProblemCode::Conflict => "conflict",
            ProblemCode::ConflictWarning => "conflict-warning",
            ProblemCode::Cycle => "cycle",
        };
        f.write_str(name)
    }
}

/// Проблема планирования.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    /// Запрошен неизвестный модуль.
    #[error("Module '{id}' is not registered")]
    UnknownModule { id: String },

    /// Модуль не поддерживает фреймворк.
    #[error("Module '{id}' does not support {framework}")]
    FrameworkUnsupported { id: String, framework: Framework },

    /// Модуль поддерживает фреймворк частично.
    #[error("Module '{id}' has only partial support for {framework}")]
    PartialSupport { id: String, framework: Framework },

    /// Обязательная зависимость не зарегистрирована.
    #[error("Module '{required_by}' requires '{module_id}', which is not registered")]
    MissingDependency {
        module_id: String,
        required_by: String,
    },

    /// Версия зависимости не подходит под диапазон.
    #[error("Module '{required_by}' requires '{module_id}' {required}, but {actual} is registered")]
    VersionMismatch {
        module_id: String,
        required_by: String,
        required: String,
        actual: String,
    },

    /// Два модуля конфликтуют.
    #[error("Modules '{module_a}' and '{module_b}' conflict: {reason}")]
    Conflict {
        module_a: String,
        module_b: String,
        reason: String,
        resolution: Option<String>,
    },

    /// Некритичный конфликт.
    #[error("Modules '{module_a}' and '{module_b}' may conflict: {reason}")]
    ConflictWarning {
        module_a: String,
        module_b: String,
        reason: String,
        resolution: Option<String>,
    },

    /// Цикл в графе зависимостей.
    #[error("Dependency cycle: {}", format_cycle(.members))]
    Cycle { members: Vec<String> },
}

fn format_cycle(members: &[String]) -> String {
    match members.first() {
        Some(first) => format!("{} -> {}", members.join(" -> "), first),
        None => String::new(),
    }
}

impl Problem {
    /// Код проблемы.
    pub fn code(&self) -> ProblemCode {
        match self {
            Problem::UnknownModule { .. } => ProblemCode::UnknownModule,
            Problem::FrameworkUnsupported { .. } => ProblemCode::FrameworkUnsupported,
            Problem::PartialSupport { .. } => ProblemCode::PartialSupport,
            Problem::MissingDependency { .. } => ProblemCode::MissingDependency,
            Problem::VersionMismatch { .. } => ProblemCode::VersionMismatch,
            Problem::Conflict { .. } => ProblemCode::Conflict,
            Problem::ConflictWarning { .. } => ProblemCode::ConflictWarning,
            Problem::Cycle { .. } => ProblemCode::Cycle,
        }
    }

    /// Серьёзность: предупреждения не блокируют план.
    pub fn severity(&self) -> Severity {
        match self {
            Problem::PartialSupport { .. } | Problem::ConflictWarning { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Фатальна ли проблема.
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Error
    }

    /// Затронутые модули.
    pub fn involved_modules(&self) -> Vec<&str> {
        match self {
            Problem::UnknownModule { id }
            | Problem::FrameworkUnsupported { id, .. }
            | Problem::PartialSupport { id, .. } => vec![id.as_str()],
            Problem::MissingDependency {
                module_id,
                required_by,
            }
            | Problem::VersionMismatch {
                module_id,
                required_by,
                ..
            } => vec![required_by.as_str(), module_id.as_str()],
            Problem::Conflict {
                module_a, module_b, ..
            }
            | Problem::ConflictWarning {
                module_a, module_b, ..
            } => vec![module_a.as_str(), module_b.as_str()],
            Problem::Cycle { members } => members.iter().map(String::as_str).collect(),
        }
    }

    /// Подсказка по разрешению, если модуль её объявил.
    pub fn resolution(&self) -> Option<&str> {
        match self {
            Problem::Conflict { resolution, .. } | Problem::ConflictWarning { resolution, .. } => {
                resolution.as_deref()
            }
            _ => None,
        }
    }
}
