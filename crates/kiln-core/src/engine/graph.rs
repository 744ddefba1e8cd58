//! In-memory build engine.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use petgraph::algo::{kosaraju_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;
use serde::Serialize;

use super::{BuildEngine, ResolvedAction, Rule, RuleMode};
use crate::error::{Error, Result};

#[derive(Debug, Default)]
struct GraphState {
    rules: Vec<Rule>,
    by_target: FxHashMap<PathBuf, usize>,
}

/// Collects registered rules and orders them by their data dependencies.
///
/// A rule depends on another when one of its inputs is the other's target.
#[derive(Debug, Default)]
pub struct ActionGraph {
    state: Mutex<GraphState>,
}

/// A rule ready to run, with its action resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledRule {
    pub dir: PathBuf,
    pub target: PathBuf,
    pub mode: RuleMode,
    pub action: ResolvedAction,
    /// Cache key of the action.
    pub digest: u64,
}

impl ActionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the rules in registration order.
    pub fn rules(&self) -> Vec<Rule> {
        self.lock().rules.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The rule producing `target`, if any.
    pub fn producer(&self, target: &Path) -> Option<Rule> {
        let state = self.lock();
        state.by_target.get(target).map(|&i| state.rules[i].clone())
    }

    /// Resolve every action and sort the rules so producers come before
    /// their consumers.
    ///
    /// # Errors
    /// Fails if an action does not resolve, or with
    /// [`Error::CyclicDependency`] if rules depend on each other in a cycle.
    pub fn execution_order(&self) -> Result<Vec<ScheduledRule>> {
        let state = self.lock();

        let resolved = state
            .rules
            .iter()
            .map(|rule| rule.action.resolve())
            .collect::<Result<Vec<_>>>()?;

        let mut graph: DiGraph<usize, ()> = DiGraph::new();
        let nodes: Vec<NodeIndex> = (0..state.rules.len()).map(|i| graph.add_node(i)).collect();
        for (consumer, action) in resolved.iter().enumerate() {
            for dep in action.deps() {
                if let Some(&producer) = state.by_target.get(dep) {
                    graph.add_edge(nodes[producer], nodes[consumer], ());
                }
            }
        }

        let order = toposort(&graph, None).map_err(|cycle| {
            let members: Vec<String> = kosaraju_scc(&graph)
                .into_iter()
                .find(|scc| scc.contains(&cycle.node_id()))
                .unwrap_or_else(|| vec![cycle.node_id()])
                .into_iter()
                .map(|idx| state.rules[graph[idx]].target.display().to_string())
                .collect();
            Error::CyclicDependency(members.join(" -> "))
        })?;

        Ok(order
            .into_iter()
            .map(|idx| {
                let i = graph[idx];
                let rule = &state.rules[i];
                let action = resolved[i].clone();
                ScheduledRule {
                    dir: rule.dir.clone(),
                    target: rule.target.clone(),
                    mode: rule.mode,
                    digest: action.digest(),
                    action,
                }
            })
            .collect())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, GraphState> {
        // Registrations never leave the state half-updated.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl BuildEngine for ActionGraph {
    fn add_rule(&self, rule: Rule) -> Result<()> {
        let mut state = self.lock();
        if state.by_target.contains_key(&rule.target) {
            return Err(Error::DuplicateTarget(rule.target));
        }
        tracing::debug!("Registered rule for {}", rule.target.display());
        let index = state.rules.len();
        state.by_target.insert(rule.target.clone(), index);
        state.rules.push(rule);
        Ok(())
    }
}
