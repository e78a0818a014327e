//! Records which sectors depend on which fuels so that they can be solved in a valid order.
use anyhow::{Result, anyhow};
use indexmap::IndexMap;
use petgraph::Directed;
use petgraph::algo::toposort;
use petgraph::graph::{Graph, NodeIndex};

/// A graph with an edge from each fuel to every sector consuming it
type DependencyGraph = Graph<String, (), Directed>;

/// Collects dependencies between sectors and their input fuels
#[derive(Debug, Default)]
pub struct DependencyFinder {
    graph: DependencyGraph,
    nodes: IndexMap<String, NodeIndex>,
}

impl DependencyFinder {
    /// Create an empty dependency finder
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, name: &str) -> NodeIndex {
        if let Some(index) = self.nodes.get(name) {
            return *index;
        }

        let index = self.graph.add_node(name.to_string());
        self.nodes.insert(name.to_string(), index);
        index
    }

    /// Record that `dependent` consumes `dependency`
    pub fn add_dependency(&mut self, dependent: &str, dependency: &str) {
        let from = self.node(dependency);
        let to = self.node(dependent);
        self.graph.update_edge(from, to, ());
    }

    /// The number of distinct sectors and fuels seen
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no dependencies have been recorded
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// An order in which every item comes after everything it depends on
    pub fn ordering(&self) -> Result<Vec<String>> {
        let order = toposort(&self.graph, None).map_err(|cycle| {
            anyhow!(
                "Dependency cycle detected involving {}",
                self.graph[cycle.node_id()]
            )
        })?;

        Ok(order
            .into_iter()
            .map(|index| self.graph[index].clone())
            .collect())
    }
}
