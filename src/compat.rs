//! Compatibility checker.
//!
//! Проверка набора модулей перед сортировкой: неизвестные модули,
//! транзитивное раскрытие зависимостей, поддержка фреймворка, конфликты
//! и диапазоны версий. Все проблемы собираются за один проход.

use log::{debug, trace};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::descriptor::{Framework, Severity, SupportLevel};
use crate::problem::Problem;
use crate::registry::ModuleRegistry;
use crate::version::VersionRange;

/// Результат проверки совместимости.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompatibilityReport {
    /// Раскрытый набор модулей (запрошенные + транзитивные зависимости)
    pub expanded: BTreeSet<String>,
    /// Все найденные проблемы, включая предупреждения
    pub problems: Vec<Problem>,
}

impl CompatibilityReport {
    /// Есть ли фатальные проблемы.
    pub fn has_errors(&self) -> bool {
        self.problems.iter().any(Problem::is_fatal)
    }

    /// Только фатальные проблемы.
    pub fn errors(&self) -> impl Iterator<Item = &Problem> {
        self.problems.iter().filter(|p| p.is_fatal())
    }

    /// Только предупреждения.
    pub fn warnings(&self) -> impl Iterator<Item = &Problem> {
        self.problems.iter().filter(|p| !p.is_fatal())
    }
}

/// Проверить набор модулей для фреймворка.
pub fn check(
    requested: &BTreeSet<String>,
    framework: Framework,
    registry: &ModuleRegistry,
) -> CompatibilityReport {
    let mut report = CompatibilityReport::default();

    for id in requested {
        if !registry.has(id) {
            debug!("unknown module requested: {}", id);
            report.problems.push(Problem::UnknownModule { id: id.clone() });
        }
    }

    expand(requested, registry, &mut report);
    check_frameworks(framework, registry, &mut report);
    check_conflicts(registry, &mut report);
    check_versions(registry, &mut report);

    debug!(
        "compatibility check for {}: {} modules, {} problems",
        framework,
        report.expanded.len(),
        report.problems.len()
    );

    report
}

/// Транзитивное раскрытие обязательных зависимостей.
fn expand(requested: &BTreeSet<String>, registry: &ModuleRegistry, report: &mut CompatibilityReport) {
    let mut queue: VecDeque<String> = requested
        .iter()
        .filter(|id| registry.has(id))
        .cloned()
        .collect();
    report.expanded.extend(queue.iter().cloned());

    let mut reported = BTreeSet::new();

    while let Some(id) = queue.pop_front() {
        let Some(descriptor) = registry.get(&id) else {
            continue;
        };

        for dep in descriptor.dependencies.iter().filter(|d| !d.optional) {
            if registry.has(&dep.module_id) {
                if report.expanded.insert(dep.module_id.clone()) {
                    trace!("{} pulls in {}", id, dep.module_id);
                    queue.push_back(dep.module_id.clone());
                }
            } else if reported.insert((dep.module_id.clone(), id.clone())) {
                debug!("{} requires unregistered {}", id, dep.module_id);
                report.problems.push(Problem::MissingDependency {
                    module_id: dep.module_id.clone(),
                    required_by: id.clone(),
                });
            }
        }
    }
}

fn check_frameworks(framework: Framework, registry: &ModuleRegistry, report: &mut CompatibilityReport) {
    for id in &report.expanded {
        let Some(descriptor) = registry.get(id) else {
            continue;
        };

        match descriptor.support_for(framework) {
            SupportLevel::Full => {}
            SupportLevel::Partial => report.problems.push(Problem::PartialSupport {
                id: id.clone(),
                framework,
            }),
            SupportLevel::Unsupported => report.problems.push(Problem::FrameworkUnsupported {
                id: id.clone(),
                framework,
            }),
        }
    }
}

/// Конфликты проверяются по неупорядоченным парам: достаточно объявления
/// с одной стороны, при объявлениях с обеих сторон побеждает `error`.
fn check_conflicts(registry: &ModuleRegistry, report: &mut CompatibilityReport) {
    let mut pairs: BTreeMap<(String, String), (Severity, String, Option<String>)> = BTreeMap::new();

    for id in &report.expanded {
        let Some(descriptor) = registry.get(id) else {
            continue;
        };

        for conflict in &descriptor.conflicts {
            if !report.expanded.contains(&conflict.module_id) {
                continue;
            }

            let key = if *id < conflict.module_id {
                (id.clone(), conflict.module_id.clone())
            } else {
                (conflict.module_id.clone(), id.clone())
            };

            let incoming = (
                conflict.severity,
                conflict.reason.clone(),
                conflict.resolution.clone(),
            );
            pairs
                .entry(key)
                .and_modify(|existing| {
                    if incoming.0 > existing.0 {
                        *existing = incoming.clone();
                    }
                })
                .or_insert(incoming);
        }
    }

    for ((module_a, module_b), (severity, reason, resolution)) in pairs {
        debug!("{} conflict between {} and {}", severity, module_a, module_b);
        report.problems.push(match severity {
            Severity::Error => Problem::Conflict {
                module_a,
                module_b,
                reason,
                resolution,
            },
            Severity::Warning => Problem::ConflictWarning {
                module_a,
                module_b,
                reason,
                resolution,
            },
        });
    }
}

fn check_versions(registry: &ModuleRegistry, report: &mut CompatibilityReport) {
    for id in &report.expanded {
        let Some(descriptor) = registry.get(id) else {
            continue;
        };

        for dep in &descriptor.dependencies {
            let Some(range) = &dep.version_range else {
                continue;
            };
            if !report.expanded.contains(&dep.module_id) {
                continue;
            }
            let Some(target) = registry.get(&dep.module_id) else {
                continue;
            };

            let satisfied = VersionRange::parse(range)
                .map(|r| r.matches_str(&target.version))
                .unwrap_or(false);

            if !satisfied {
                debug!(
                    "{} requires {} {}, found {}",
                    id, dep.module_id, range, target.version
                );
                report.problems.push(Problem::VersionMismatch {
                    module_id: dep.module_id.clone(),
                    required_by: id.clone(),
                    required: range.clone(),
                    actual: target.version.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{DependencySpec, ModuleDescriptor};
    use crate::factory::TemplateFactory;
    use crate::problem::ProblemCode;

    fn registry(modules: Vec<ModuleDescriptor>) -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        for m in modules {
            registry.register(m, TemplateFactory::empty()).unwrap();
        }
        registry
    }

    fn ids(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn codes(report: &CompatibilityReport) -> Vec<ProblemCode> {
        report.problems.iter().map(Problem::code).collect()
    }

    #[test]
    fn test_auto_expansion() {
        let reg = registry(vec![
            ModuleDescriptor::new("auth-core", "1.0.0").supports_all(),
            ModuleDescriptor::new("auth-session", "1.0.0")
                .supports_all()
                .depends_on("auth-core", Some("^1.0.0")),
            ModuleDescriptor::new("auth-mfa", "1.0.0")
                .supports_all()
                .depends_on("auth-session", None),
        ]);

        let report = check(&ids(&["auth-mfa"]), Framework::Nextjs, &reg);
        assert!(report.problems.is_empty());
        assert_eq!(report.expanded, ids(&["auth-core", "auth-mfa", "auth-session"]));
    }

    #[test]
    fn test_optional_dependency_not_expanded() {
        let reg = registry(vec![
            ModuleDescriptor::new("docs", "1.0.0").supports_all(),
            ModuleDescriptor::new("payments", "1.0.0")
                .supports_all()
                .with_dependency(DependencySpec::optional("docs", None))
                .with_dependency(DependencySpec::optional("ghost", None)),
        ]);

        let report = check(&ids(&["payments"]), Framework::Nextjs, &reg);
        assert!(report.problems.is_empty());
        assert_eq!(report.expanded, ids(&["payments"]));
    }

    #[test]
    fn test_missing_dependency() {
        let reg = registry(vec![ModuleDescriptor::new("business_intelligence", "1.0.0")
            .supports_all()
            .depends_on("user_analytics", None)]);

        let report = check(&ids(&["business_intelligence"]), Framework::Nextjs, &reg);
        assert_eq!(
            report.problems,
            vec![Problem::MissingDependency {
                module_id: "user_analytics".into(),
                required_by: "business_intelligence".into(),
            }]
        );
    }

    #[test]
    fn test_partial_support_is_warning() {
        let reg = registry(vec![ModuleDescriptor::new("presence", "1.0.0")
            .supports(Framework::Flutter, SupportLevel::Partial)]);

        let report = check(&ids(&["presence"]), Framework::Flutter, &reg);
        assert!(!report.has_errors());
        assert_eq!(codes(&report), vec![ProblemCode::PartialSupport]);
    }

    #[test]
    fn test_transitive_module_must_support_framework() {
        let reg = registry(vec![
            ModuleDescriptor::new("ai-core", "1.0.0").supports(Framework::Nextjs, SupportLevel::Full),
            ModuleDescriptor::new("ai-chat", "1.0.0")
                .supports_all()
                .depends_on("ai-core", None),
        ]);

        let report = check(&ids(&["ai-chat"]), Framework::Electron, &reg);
        assert_eq!(
            report.problems,
            vec![Problem::FrameworkUnsupported {
                id: "ai-core".into(),
                framework: Framework::Electron,
            }]
        );
    }

    #[test]
    fn test_conflict_declared_on_one_side() {
        let reg = registry(vec![
            ModuleDescriptor::new("ai-anthropic", "1.0.0").supports_all(),
            ModuleDescriptor::new("ai-openai-enhanced", "1.0.0")
                .supports_all()
                .conflicts_with("ai-anthropic", Severity::Error, "single AI provider"),
        ]);

        let report = check(&ids(&["ai-anthropic", "ai-openai-enhanced"]), Framework::Nextjs, &reg);
        assert_eq!(codes(&report), vec![ProblemCode::Conflict]);
        assert_eq!(
            report.problems[0].involved_modules(),
            vec!["ai-anthropic", "ai-openai-enhanced"]
        );
    }

    #[test]
    fn test_conflict_both_sides_reported_once() {
        let reg = registry(vec![
            ModuleDescriptor::new("a", "1.0.0")
                .supports_all()
                .conflicts_with("b", Severity::Warning, "overlap"),
            ModuleDescriptor::new("b", "1.0.0")
                .supports_all()
                .conflicts_with("a", Severity::Error, "same route"),
        ]);

        let report = check(&ids(&["a", "b"]), Framework::Tauri, &reg);
        assert_eq!(codes(&report), vec![ProblemCode::Conflict]);
        assert!(report.problems[0].to_string().contains("same route"));
    }

    #[test]
    fn test_conflict_with_absent_module_ignored() {
        let reg = registry(vec![ModuleDescriptor::new("a", "1.0.0")
            .supports_all()
            .conflicts_with("b", Severity::Error, "")]);

        let report = check(&ids(&["a"]), Framework::Tauri, &reg);
        assert!(report.problems.is_empty());
    }

    #[test]
    fn test_conflict_warning_does_not_block() {
        let reg = registry(vec![
            ModuleDescriptor::new("auth-jwt", "1.0.0")
                .supports_all()
                .conflicts_with("auth-session", Severity::Warning, "two session stores"),
            ModuleDescriptor::new("auth-session", "1.0.0").supports_all(),
        ]);

        let report = check(&ids(&["auth-jwt", "auth-session"]), Framework::Sveltekit, &reg);
        assert!(!report.has_errors());
        assert_eq!(report.warnings().count(), 1);
    }

    #[test]
    fn test_version_mismatch() {
        let reg = registry(vec![
            ModuleDescriptor::new("payments-core", "2.1.0").supports_all(),
            ModuleDescriptor::new("stripe", "1.0.0")
                .supports_all()
                .depends_on("payments-core", Some("^1.4.0")),
        ]);

        let report = check(&ids(&["stripe"]), Framework::Nextjs, &reg);
        assert_eq!(
            report.problems,
            vec![Problem::VersionMismatch {
                module_id: "payments-core".into(),
                required_by: "stripe".into(),
                required: "^1.4.0".into(),
                actual: "2.1.0".into(),
            }]
        );
    }

    #[test]
    fn test_collects_every_problem() {
        let reg = registry(vec![ModuleDescriptor::new("dashboard", "1.0.0")
            .supports(Framework::Nextjs, SupportLevel::Full)
            .depends_on("charts", None)
            .depends_on("tables", None)]);

        let report = check(&ids(&["dashboard"]), Framework::Flutter, &reg);
        assert_eq!(report.errors().count(), 3);
        assert_eq!(
            codes(&report),
            vec![
                ProblemCode::MissingDependency,
                ProblemCode::MissingDependency,
                ProblemCode::FrameworkUnsupported,
            ]
        );
    }
}
