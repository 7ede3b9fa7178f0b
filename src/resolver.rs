//! Dependency resolver.
//!
//! Топологическая сортировка раскрытого набора модулей. Зависимости всегда
//! идут раньше зависящих от них модулей; среди готовых к установке модулей
//! первым берётся наименьший по id.

use log::{debug, trace};
use std::collections::{BTreeMap, BTreeSet};

use crate::problem::Problem;
use crate::registry::ModuleRegistry;

/// Граф зависимостей: модуль -> его зависимости.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    edges: BTreeMap<String, BTreeSet<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

impl DependencyGraph {
    /// Пустой граф.
    pub fn new() -> Self {
        Self::default()
    }

    /// Построить граф для набора модулей.
    ///
    /// Учитываются только рёбра внутри набора, в том числе опциональные
    /// зависимости, если модуль-зависимость в наборе присутствует.
    pub fn from_registry(modules: &BTreeSet<String>, registry: &ModuleRegistry) -> Self {
        let mut graph = Self::new();

        for id in modules {
            graph.add_module(id);
            let Some(descriptor) = registry.get(id) else {
                continue;
            };
            for dep in &descriptor.dependencies {
                if dep.module_id != *id && modules.contains(&dep.module_id) {
                    graph.add_dependency(id, &dep.module_id);
                }
            }
        }

        graph
    }

    /// Добавить узел.
    pub fn add_module(&mut self, id: &str) {
        self.edges.entry(id.to_string()).or_default();
    }

    /// Добавить ребро: `module` зависит от `dependency`.
    pub fn add_dependency(&mut self, module: &str, dependency: &str) {
        self.add_module(dependency);
        self.edges
            .entry(module.to_string())
            .or_default()
            .insert(dependency.to_string());
    }

    /// Зависимости модуля.
    pub fn dependencies_of(&self, id: &str) -> impl Iterator<Item = &str> {
        self.edges
            .get(id)
            .into_iter()
            .flat_map(|deps| deps.iter().map(String::as_str))
    }

    /// Количество узлов.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Пустой ли граф.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Порядок установки.
    ///
    /// При цикле возвращает по одной проблеме `Cycle` на каждый найденный цикл.
    pub fn install_order(&self) -> Result<Vec<String>, Vec<Problem>> {
        let mut pending: BTreeMap<&str, usize> = BTreeMap::new();
        let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

        for (module, deps) in &self.edges {
            pending.insert(module.as_str(), deps.len());
            for dep in deps {
                dependents.entry(dep.as_str()).or_default().push(module.as_str());
            }
        }

        let mut ready: BTreeSet<&str> = pending
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(id, _)| *id)
            .collect();

        let mut order = Vec::with_capacity(self.edges.len());

        while let Some(next) = ready.pop_first() {
            trace!("install {}", next);
            order.push(next.to_string());
            pending.remove(next);

            for dependent in dependents.get(next).into_iter().flatten() {
                if let Some(count) = pending.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(*dependent);
                    }
                }
            }
        }

        if pending.is_empty() {
            return Ok(order);
        }

        let stuck: BTreeSet<&str> = pending.keys().copied().collect();
        debug!("{} modules blocked by cycles", stuck.len());

        Err(self
            .find_cycles(&stuck)
            .into_iter()
            .map(|members| Problem::Cycle { members })
            .collect())
    }

    /// Поиск циклов обходом в глубину с трёхцветной разметкой.
    ///
    /// Обход итеративный; каждый цикл начинается с наименьшего id и
    /// идёт по направлению зависимостей.
    fn find_cycles(&self, nodes: &BTreeSet<&str>) -> Vec<Vec<String>> {
        let mut marks: BTreeMap<&str, Mark> = nodes.iter().map(|id| (*id, Mark::Unvisited)).collect();
        let mut seen: BTreeSet<Vec<String>> = BTreeSet::new();
        let mut cycles = Vec::new();

        for &start in nodes {
            if marks.get(start) != Some(&Mark::Unvisited) {
                continue;
            }

            marks.insert(start, Mark::InProgress);
            let mut stack: Vec<(&str, Vec<&str>, usize)> = vec![(start, self.children_within(start, nodes), 0)];

            while let Some((node, next_children, cursor)) = stack.last_mut() {
                if *cursor >= next_children.len() {
                    let finished = *node;
                    marks.insert(finished, Mark::Done);
                    stack.pop();
                    continue;
                }

                let next = next_children[*cursor];
                *cursor += 1;

                match marks.get(next).copied() {
                    Some(Mark::Unvisited) => {
                        marks.insert(next, Mark::InProgress);
                        stack.push((next, self.children_within(next, nodes), 0));
                    }
                    Some(Mark::InProgress) => {
                        if let Some(pos) = stack.iter().position(|(id, _, _)| *id == next) {
                            let mut members: Vec<String> =
                                stack[pos..].iter().map(|(id, _, _)| id.to_string()).collect();
                            if let Some(min_pos) = members
                                .iter()
                                .enumerate()
                                .min_by(|a, b| a.1.cmp(b.1))
                                .map(|(i, _)| i)
                            {
                                members.rotate_left(min_pos);
                            }

                            let mut key = members.clone();
                            key.sort();
                            if seen.insert(key) {
                                debug!("dependency cycle: {}", members.join(" -> "));
                                cycles.push(members);
                            }
                        }
                    }
                    Some(Mark::Done) | None => {}
                }
            }
        }

        cycles
    }

    fn children_within<'a>(&'a self, id: &str, nodes: &BTreeSet<&str>) -> Vec<&'a str> {
        self.dependencies_of(id)
            .filter(|dep| nodes.contains(*dep))
            .collect()
    }
}

/// Упорядочить набор модулей по зависимостям из реестра.
pub fn resolve(
    modules: &BTreeSet<String>,
    registry: &ModuleRegistry,
) -> Result<Vec<String>, Vec<Problem>> {
    DependencyGraph::from_registry(modules, registry).install_order()
}
