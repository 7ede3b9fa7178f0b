//! Installation planner.
//!
//! Точка входа ядра: проверка совместимости, затем топологическая
//! сортировка. Результат: либо [`Plan`], либо [`Rejection`] со всеми
//! найденными проблемами сразу.

use log::{debug, info};
use std::collections::BTreeSet;

use crate::compat;
use crate::descriptor::Framework;
use crate::problem::{Problem, ProblemCode};
use crate::registry::ModuleRegistry;
use crate::resolver;

/// Запрос на установку.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationRequest {
    /// Запрошенные модули (без повторов)
    pub modules: BTreeSet<String>,
    /// Целевой фреймворк
    pub framework: Framework,
}

impl InstallationRequest {
    /// Создать запрос.
    pub fn new<I, S>(modules: I, framework: Framework) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            modules: modules.into_iter().map(Into::into).collect(),
            framework,
        }
    }
}

/// Упорядоченный план установки.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    framework: Framework,
    modules: Vec<String>,
    warnings: Vec<Problem>,
}

impl Plan {
    /// Фреймворк, для которого построен план.
    pub fn framework(&self) -> Framework {
        self.framework
    }

    /// Модули в порядке установки.
    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    /// Некритичные проблемы.
    pub fn warnings(&self) -> &[Problem] {
        &self.warnings
    }

    /// Позиция модуля в плане.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.modules.iter().position(|m| m == id)
    }

    /// Содержит ли план модуль.
    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// Количество модулей.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Пустой ли план.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Отказ в построении плана.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    problems: Vec<Problem>,
    warnings: Vec<Problem>,
}

impl Rejection {
    /// Фатальные проблемы.
    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    /// Предупреждения, найденные попутно.
    pub fn warnings(&self) -> &[Problem] {
        &self.warnings
    }

    /// Коды фатальных проблем.
    pub fn codes(&self) -> Vec<ProblemCode> {
        self.problems.iter().map(Problem::code).collect()
    }

    /// Есть ли проблема с данным кодом.
    pub fn contains(&self, code: ProblemCode) -> bool {
        self.problems.iter().any(|p| p.code() == code)
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cannot plan installation: {} problem(s)", self.problems.len())?;
        for problem in &self.problems {
            write!(f, "\n  [{}] {}", problem.code(), problem)?;
        }
        Ok(())
    }
}

impl std::error::Error for Rejection {}

/// Наблюдатель за ходом планирования.
///
/// Все методы необязательны; вызываются синхронно из `plan_with_observer`.
pub trait PlanObserver {
    /// Набор модулей раскрыт.
    fn on_expanded(&mut self, _modules: &BTreeSet<String>) {}

    /// Найдена проблема (включая предупреждения).
    fn on_problem(&mut self, _problem: &Problem) {}

    /// План построен.
    fn on_planned(&mut self, _plan: &Plan) {}
}

/// Наблюдатель, который ничего не делает.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PlanObserver for NoopObserver {}

/// Построить план установки.
pub fn plan(request: &InstallationRequest, registry: &ModuleRegistry) -> Result<Plan, Rejection> {
    plan_with_observer(request, registry, &mut NoopObserver)
}

/// Построить план установки, сообщая наблюдателю о ходе работы.
pub fn plan_with_observer(
    request: &InstallationRequest,
    registry: &ModuleRegistry,
    observer: &mut dyn PlanObserver,
) -> Result<Plan, Rejection> {
    debug!(
        "planning {:?} for {}",
        request.modules, request.framework
    );

    let report = compat::check(&request.modules, request.framework, registry);
    observer.on_expanded(&report.expanded);
    for problem in &report.problems {
        observer.on_problem(problem);
    }

    let (problems, warnings): (Vec<Problem>, Vec<Problem>) =
        report.problems.into_iter().partition(Problem::is_fatal);

    if !problems.is_empty() {
        info!("rejected: {} problem(s)", problems.len());
        return Err(Rejection { problems, warnings });
    }

    let modules = match resolver::resolve(&report.expanded, registry) {
        Ok(order) => order,
        Err(cycles) => {
            for problem in &cycles {
                observer.on_problem(problem);
            }
            info!("rejected: {} dependency cycle(s)", cycles.len());
            return Err(Rejection {
                problems: cycles,
                warnings,
            });
        }
    };

    let plan = Plan {
        framework: request.framework,
        modules,
        warnings,
    };

    info!(
        "planned {} module(s) for {}: {}",
        plan.len(),
        plan.framework,
        plan.modules.join(", ")
    );
    observer.on_planned(&plan);

    Ok(plan)
}
