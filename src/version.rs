//! Version ranges.
//!
//! Диапазоны версий для зависимостей между модулями. Поверх `semver`,
//! но голая версия (`"1.2.0"`) означает точное совпадение, как в npm.

use semver::{Version, VersionReq};

/// Разобранный диапазон версий.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    /// Исходная строка
    raw: String,
    /// Нормализованное требование
    req: VersionReq,
}

impl VersionRange {
    /// Разобрать диапазон.
    ///
    /// Поддерживаемые формы:
    /// - `"1.0.0"` -> `"=1.0.0"` (точная версия)
    /// - `"^1.0.0"` -> `">=1.0.0, <2.0.0"`
    /// - `"~1.0.0"` -> `">=1.0.0, <1.1.0"`
    /// - `">=1.0.0, <2.0.0"` -> как есть
    /// - `"*"` или пустая строка -> любая версия
    pub fn parse(range: &str) -> Result<Self, semver::Error> {
        let trimmed = range.trim();

        let normalized = if trimmed.is_empty() {
            "*".to_string()
        } else if trimmed.starts_with(['=', '^', '~', '>', '<', '*']) {
            trimmed.to_string()
        } else {
            format!("={}", trimmed)
        };

        Ok(Self {
            raw: trimmed.to_string(),
            req: VersionReq::parse(&normalized)?,
        })
    }

    /// Исходная строка диапазона.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Удовлетворяет ли версия диапазону.
    pub fn matches(&self, version: &Version) -> bool {
        self.req.matches(version)
    }

    /// Удовлетворяет ли строковая версия диапазону.
    ///
    /// Нераспарсиваемая версия не удовлетворяет ничему.
    pub fn matches_str(&self, version: &str) -> bool {
        Version::parse(version.trim())
            .map(|v| self.matches(&v))
            .unwrap_or(false)
    }
}

impl std::fmt::Display for VersionRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.raw.is_empty() {
            write!(f, "*")
        } else {
            write!(f, "{}", self.raw)
        }
    }
}

/// Разобрать semver-версию.
pub fn parse_version(version: &str) -> Result<Version, semver::Error> {
    Version::parse(version.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_version_is_exact() {
        let range = VersionRange::parse("1.2.0").unwrap();
        assert!(range.matches_str("1.2.0"));
        assert!(!range.matches_str("1.2.1"));
    }

    #[test]
    fn test_caret_range() {
        let range = VersionRange::parse("^1.0.0").unwrap();
        assert!(range.matches_str("1.0.0"));
        assert!(range.matches_str("1.9.3"));
        assert!(!range.matches_str("2.0.0"));
        assert!(!range.matches_str("0.9.0"));
    }

    #[test]
    fn test_tilde_range() {
        let range = VersionRange::parse("~1.4.0").unwrap();
        assert!(range.matches_str("1.4.7"));
        assert!(!range.matches_str("1.5.0"));
    }

    #[test]
    fn test_wildcard_and_empty() {
        assert!(VersionRange::parse("*").unwrap().matches_str("7.0.0"));
        assert!(VersionRange::parse("").unwrap().matches_str("0.0.1"));
        assert_eq!(VersionRange::parse("").unwrap().to_string(), "*");
    }

    #[test]
    fn test_comparison_range() {
        let range = VersionRange::parse(">=1.0.0, <2.0.0").unwrap();
        assert!(range.matches_str("1.5.0"));
        assert!(!range.matches_str("2.0.0"));
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(VersionRange::parse("not-a-version").is_err());
        // Мусорная версия не совпадает ни с чем
        assert!(!VersionRange::parse("*").unwrap().matches_str("latest"));
    }
}
