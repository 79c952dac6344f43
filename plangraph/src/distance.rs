//! Shortest distance-to-goal labels.
//!
//! Distances are computed by a multi-source breadth-first traversal of the
//! reversed graph, seeded with every goal state at distance 0. Since BFS
//! visits states in non-decreasing distance order, the first time a state is
//! reached its distance is final. States without a forward path to any goal
//! are never reached and carry no label.
use std::{
    collections::{HashMap, VecDeque},
    hash::Hash,
};

use log::debug;

use crate::graph::StateGraph;

/// Distance labels produced by [`goal_distances`].
#[derive(Debug, Clone)]
pub struct GoalDistances<K> {
    distances: HashMap<K, usize>,
    max_distance: usize,
}

impl<K: Eq + Hash> GoalDistances<K> {
    /// Distance of `key`, or `None` when no goal is reachable from it.
    pub fn get(&self, key: &K) -> Option<usize> {
        self.distances.get(key).copied()
    }

    pub fn is_labeled(&self, key: &K) -> bool {
        self.distances.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, usize)> {
        self.distances.iter().map(|(key, &distance)| (key, distance))
    }

    /// Labels ordered by key.
    pub fn sorted(&self) -> Vec<(&K, usize)>
    where
        K: Ord,
    {
        let mut labels: Vec<_> = self.iter().collect();
        labels.sort();
        labels
    }

    /// Number of labeled states.
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// Largest assigned distance, 0 when there is no goal state.
    pub fn max_distance(&self) -> usize {
        self.max_distance
    }
}

/// Label every state of `graph` with its shortest distance to a goal state.
pub fn goal_distances<K: Clone + Eq + Hash>(graph: &StateGraph<K>) -> GoalDistances<K> {
    let mut labels: Vec<Option<usize>> = vec![None; graph.state_count()];
    let mut queue = VecDeque::new();

    for goal in graph.goal_nodes() {
        labels[goal.index()] = Some(0);
        queue.push_back(goal);
    }

    let mut max_distance = 0;
    while let Some(current) = queue.pop_front() {
        let Some(distance) = labels[current.index()] else {
            continue;
        };
        for predecessor in graph.predecessor_nodes(current) {
            let slot = &mut labels[predecessor.index()];
            if slot.is_none() {
                *slot = Some(distance + 1);
                max_distance = max_distance.max(distance + 1);
                queue.push_back(predecessor);
            }
        }
    }

    let distances: HashMap<K, usize> = labels
        .into_iter()
        .enumerate()
        .filter_map(|(index, label)| {
            label.map(|distance| {
                let node = petgraph::graph::NodeIndex::new(index);
                (graph.key(node).clone(), distance)
            })
        })
        .collect();

    debug!(
        "labeled {} of {} states, max distance {}",
        distances.len(),
        graph.state_count(),
        max_distance
    );

    GoalDistances {
        distances,
        max_distance,
    }
}
