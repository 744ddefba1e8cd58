//! Module collections keyed by object name.

use std::collections::BTreeMap;

use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::{Module, ObjName};
use crate::error::{Error, Result};

/// A set of modules with unique object names.
///
/// Uniqueness is checked once, when the collection is assembled. Lookups and
/// ordering only ever go through [`ObjName`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Modules {
    by_obj_name: BTreeMap<ObjName, Module>,
}

impl Modules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a collection.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateObjName`] if two modules share an object name.
    pub fn from_modules(modules: impl IntoIterator<Item = Module>) -> Result<Self> {
        let mut set = Self::new();
        for module in modules {
            set.insert(module)?;
        }
        Ok(set)
    }

    /// Add a module, rejecting a second module with the same object name.
    pub fn insert(&mut self, module: Module) -> Result<()> {
        if let Some(existing) = self.by_obj_name.get(module.obj_name()) {
            return Err(Error::DuplicateObjName {
                obj_name: module.obj_name().to_string(),
                first: existing.name().to_string(),
                second: module.name().to_string(),
            });
        }
        self.by_obj_name.insert(module.obj_name().clone(), module);
        Ok(())
    }

    pub fn get(&self, obj_name: &ObjName) -> Option<&Module> {
        self.by_obj_name.get(obj_name)
    }

    /// Modules in object-name order.
    pub fn iter(&self) -> impl Iterator<Item = &Module> {
        self.by_obj_name.values()
    }

    pub fn len(&self) -> usize {
        self.by_obj_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_obj_name.is_empty()
    }

    /// Modules sorted so that every module comes after its dependencies.
    ///
    /// # Errors
    /// - [`Error::ModuleNotFound`] when `deps` names a module not in the set
    /// - [`Error::CyclicDependency`] when the dependencies form a cycle
    pub fn topological(&self, deps: &ModuleDeps) -> Result<Vec<&Module>> {
        use petgraph::algo::{kosaraju_scc, toposort};

        let mut graph: DiGraph<&ObjName, ()> = DiGraph::new();
        let mut nodes: FxHashMap<&ObjName, NodeIndex> = FxHashMap::default();
        for obj_name in self.by_obj_name.keys() {
            nodes.insert(obj_name, graph.add_node(obj_name));
        }

        let lookup = |name: &ObjName| {
            nodes
                .get(name)
                .copied()
                .ok_or_else(|| Error::ModuleNotFound(name.to_string()))
        };
        for (module, module_deps) in &deps.0 {
            let consumer = lookup(module)?;
            for dep in module_deps {
                let producer = lookup(dep)?;
                graph.add_edge(producer, consumer, ());
            }
        }

        toposort(&graph, None)
            .map(|order| {
                order
                    .into_iter()
                    .filter_map(|idx| self.by_obj_name.get(graph[idx]))
                    .collect()
            })
            .map_err(|cycle| {
                let members: Vec<String> = kosaraju_scc(&graph)
                    .into_iter()
                    .find(|scc| scc.contains(&cycle.node_id()))
                    .unwrap_or_else(|| vec![cycle.node_id()])
                    .into_iter()
                    .map(|idx| graph[idx].to_string())
                    .collect();
                Error::CyclicDependency(members.join(" -> "))
            })
    }
}

impl<'a> IntoIterator for &'a Modules {
    type Item = &'a Module;
    type IntoIter = std::collections::btree_map::Values<'a, ObjName, Module>;

    fn into_iter(self) -> Self::IntoIter {
        self.by_obj_name.values()
    }
}

/// Direct dependencies between modules of one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleDeps(BTreeMap<ObjName, Vec<ObjName>>);

impl ModuleDeps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `module` depends on `dep`.
    pub fn add(&mut self, module: ObjName, dep: ObjName) {
        self.0.entry(module).or_default().push(dep);
    }
}
