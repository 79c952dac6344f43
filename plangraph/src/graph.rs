//! Directed multigraph of states.
use std::{
    collections::{BTreeSet, HashMap},
    hash::Hash,
};

use petgraph::{
    Direction,
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
};

/// Reachability graph over states identified by `K`.
///
/// Transitions are never deduplicated by endpoints: two actions leading from
/// the same source to the same target produce two parallel edges.
#[derive(Debug, Clone)]
pub struct StateGraph<K> {
    graph: DiGraph<K, ()>,
    index: HashMap<K, NodeIndex>,
    initial: Option<NodeIndex>,
    goals: BTreeSet<NodeIndex>,
}

impl<K> Default for StateGraph<K> {
    fn default() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
            initial: None,
            goals: BTreeSet::new(),
        }
    }
}

impl<K: Clone + Eq + Hash> StateGraph<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `key` if absent and return its node.
    pub fn add_state(&mut self, key: K) -> NodeIndex {
        if let Some(&node) = self.index.get(&key) {
            return node;
        }
        let node = self.graph.add_node(key.clone());
        self.index.insert(key, node);
        node
    }

    /// Record a transition, inserting both endpoints when needed.
    pub fn add_transition(&mut self, from: K, to: K) {
        let source = self.add_state(from);
        let target = self.add_state(to);
        self.graph.add_edge(source, target, ());
    }

    pub fn set_initial(&mut self, key: K) {
        let node = self.add_state(key);
        self.initial = Some(node);
    }

    pub fn mark_goal(&mut self, key: K) {
        let node = self.add_state(key);
        self.goals.insert(node);
    }

    pub fn node(&self, key: &K) -> Option<NodeIndex> {
        self.index.get(key).copied()
    }

    pub fn key(&self, node: NodeIndex) -> &K {
        &self.graph[node]
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    pub fn initial(&self) -> Option<&K> {
        self.initial.map(|node| &self.graph[node])
    }

    pub fn is_goal(&self, key: &K) -> bool {
        self.node(key).is_some_and(|node| self.goals.contains(&node))
    }

    pub fn goals(&self) -> impl Iterator<Item = &K> {
        self.goals.iter().map(|&node| &self.graph[node])
    }

    pub fn goal_nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.goals.iter().copied()
    }

    /// States in insertion order.
    pub fn states(&self) -> impl Iterator<Item = &K> {
        self.graph.node_weights()
    }

    /// Every transition as `(source, target)`, parallel edges included.
    pub fn transitions(&self) -> impl Iterator<Item = (&K, &K)> {
        self.graph
            .edge_references()
            .map(|edge| (&self.graph[edge.source()], &self.graph[edge.target()]))
    }

    /// Targets of the outgoing transitions of `key`, once per edge.
    pub fn successors(&self, key: &K) -> impl Iterator<Item = &K> {
        self.node(key)
            .into_iter()
            .flat_map(|node| self.graph.neighbors_directed(node, Direction::Outgoing))
            .map(|node| &self.graph[node])
    }

    /// Sources of the incoming transitions of `node`, once per edge.
    pub fn predecessor_nodes(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(node, Direction::Incoming)
    }

    pub fn out_degree(&self, key: &K) -> usize {
        self.successors(key).count()
    }

    pub fn state_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn transition_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn goal_count(&self) -> usize {
        self.goals.len()
    }

    /// Underlying petgraph structure.
    pub fn raw(&self) -> &DiGraph<K, ()> {
        &self.graph
    }
}
