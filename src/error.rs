//! Определения ошибок для DNA-модулей.
//!
//! Здесь только ошибки, которые прерывают операцию целиком: регистрация,
//! загрузка каталога, запись файлов. Проблемы планирования являются значениями
//! ([`crate::problem::Problem`]), а не ошибки.

use std::path::PathBuf;
use thiserror::Error;

/// Основной тип `Result` для библиотеки.
pub type DnaResult<T> = Result<T, DnaError>;

/// Перечисление всех возможных ошибок.
#[derive(Error, Debug)]
pub enum DnaError {
    #[error("Module '{id}' is already registered")]
    DuplicateModule { id: String },

    #[error("Invalid descriptor for module '{id}': {reason}")]
    InvalidDescriptor { id: String, reason: String },

    #[error("Module not found: {id}")]
    UnknownModule { id: String },

    #[error("Unknown framework: {0}")]
    UnknownFramework(String),

    #[error("Cannot read catalog {path}: {source}")]
    CatalogIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse catalog {path}: {message}")]
    CatalogParse { path: PathBuf, message: String },

    #[error("Unsupported catalog format: {0} (expected .toml or .json)")]
    UnsupportedCatalogFormat(PathBuf),

    #[error("Refusing to write outside of the output directory: {0}")]
    UnsafeOutputPath(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DnaError {
    /// Создать ошибку "некорректный дескриптор".
    pub fn invalid_descriptor(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            id: id.into(),
            reason: reason.into(),
        }
    }
}
