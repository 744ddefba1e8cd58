//! Salsa tracked query functions.
//!
//! Results are memoized and only recomputed when [`LibraryIndex`] or
//! [`FlagBundle`] change.

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;

use super::inputs::{FlagBundle, LibraryIndex};
use crate::error::Error;
use crate::library::{LibName, Library};
use crate::variant::ConfigVariant;

/// Result wrapper for salsa queries that can fail.
///
/// Query results must be `Clone + Eq + Hash`, which rules out
/// [`crate::Error`] as the error type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryResult<T, E = String> {
    Ok(T),
    Err(E),
}

impl<T, E> QueryResult<T, E> {
    pub fn into_result(self) -> std::result::Result<T, E> {
        match self {
            Self::Ok(v) => Ok(v),
            Self::Err(e) => Err(e),
        }
    }
}

/// Why a library closure could not be computed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClosureError {
    NotFound(LibName),
    Cycle(Vec<LibName>),
}

impl From<ClosureError> for Error {
    fn from(e: ClosureError) -> Self {
        match e {
            ClosureError::NotFound(name) => Error::LibraryNotFound(name.to_string()),
            ClosureError::Cycle(names) => {
                let names: Vec<&str> = names.iter().map(LibName::as_str).collect();
                Error::CyclicDependency(names.join(" -> "))
            }
        }
    }
}

/// Tracked function: look up a library by name.
#[salsa::tracked]
pub fn library(db: &dyn salsa::Database, index: LibraryIndex, name: String) -> Option<Library> {
    index.libraries(db).get(&LibName::new(name)).cloned()
}

/// Tracked function: look up an installed library by name.
///
/// Local libraries are not visible through this query.
#[salsa::tracked]
pub fn installed_library(
    db: &dyn salsa::Database,
    index: LibraryIndex,
    name: String,
) -> Option<Library> {
    library(db, index, name).filter(|lib| !lib.is_local())
}

/// Tracked function: `name` and everything it transitively requires, each
/// library after its dependencies.
#[salsa::tracked]
pub fn library_closure(
    db: &dyn salsa::Database,
    index: LibraryIndex,
    name: String,
) -> QueryResult<Vec<Library>, ClosureError> {
    let libraries = index.libraries(db);

    let mut graph: DiGraph<LibName, ()> = DiGraph::new();
    let mut nodes: FxHashMap<LibName, NodeIndex> = FxHashMap::default();
    let root = LibName::new(name);
    let mut stack = vec![root.clone()];
    nodes.insert(root.clone(), graph.add_node(root));

    while let Some(current) = stack.pop() {
        let Some(lib) = libraries.get(&current) else {
            tracing::error!("Library {} is required but unknown", current);
            return QueryResult::Err(ClosureError::NotFound(current));
        };
        let consumer = nodes[&current];
        for dep in &lib.requires {
            let producer = match nodes.get(dep) {
                Some(&idx) => idx,
                None => {
                    let idx = graph.add_node(dep.clone());
                    nodes.insert(dep.clone(), idx);
                    stack.push(dep.clone());
                    idx
                }
            };
            graph.add_edge(producer, consumer, ());
        }
    }

    match toposort(&graph, None) {
        Ok(order) => QueryResult::Ok(
            order
                .into_iter()
                .filter_map(|idx| libraries.get(&graph[idx]).cloned())
                .collect(),
        ),
        Err(cycle) => {
            let members: Vec<LibName> = petgraph::algo::kosaraju_scc(&graph)
                .into_iter()
                .find(|scc| scc.contains(&cycle.node_id()))
                .unwrap_or_else(|| vec![cycle.node_id()])
                .into_iter()
                .map(|idx| graph[idx].clone())
                .collect();
            tracing::error!("Cyclic library dependency through {}", graph[cycle.node_id()]);
            QueryResult::Err(ClosureError::Cycle(members))
        }
    }
}

/// Tracked function: the variant selected by the compile flags.
#[salsa::tracked]
pub fn link_variant(db: &dyn salsa::Database, flags: FlagBundle) -> ConfigVariant {
    ConfigVariant::of_flags(&flags.compile(db))
}
