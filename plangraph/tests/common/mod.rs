#![allow(dead_code)]

use std::collections::BTreeSet;

use plangraph::{
    identity::{Proposition, Valuation},
    model::TransitionModel,
};

/// Transition system over numbered locations given as an explicit edge list.
/// The state of location `n` is the valuation `{at(n)}`.
#[derive(Debug, Clone)]
pub struct EdgeListModel {
    pub initial: u32,
    pub edges: Vec<(u32, &'static str, u32)>,
    pub goals: BTreeSet<u32>,
    /// Produce successors in reverse edge-list order.
    pub reversed: bool,
}

impl EdgeListModel {
    pub fn new(initial: u32, edges: &[(u32, &'static str, u32)], goals: &[u32]) -> Self {
        Self {
            initial,
            edges: edges.to_vec(),
            goals: goals.iter().copied().collect(),
            reversed: false,
        }
    }

    pub fn reversed(mut self) -> Self {
        self.reversed = !self.reversed;
        self
    }

    /// Straight line `0 -> 1 -> ... -> length` with the goal at the end.
    pub fn chain(length: u32) -> Self {
        let edges: Vec<_> = (0..length).map(|n| (n, "step", n + 1)).collect();
        Self::new(0, &edges, &[length])
    }
}

pub fn at(location: u32) -> Valuation {
    Valuation::from_iter([Proposition::new("at", [location.to_string()])])
}

pub fn location(state: &Valuation) -> u32 {
    state
        .iter()
        .find(|p| p.predicate == "at")
        .and_then(|p| p.args.first())
        .and_then(|arg| arg.parse().ok())
        .expect("state without location")
}

impl TransitionModel for EdgeListModel {
    type Action = &'static str;

    fn initial_state(&self) -> Valuation {
        at(self.initial)
    }

    fn successors(&self, state: &Valuation) -> impl Iterator<Item = (Self::Action, Valuation)> {
        let here = location(state);
        let mut next: Vec<_> = self
            .edges
            .iter()
            .filter(|(from, _, _)| *from == here)
            .map(|&(_, action, to)| (action, at(to)))
            .collect();
        if self.reversed {
            next.reverse();
        }
        next.into_iter()
    }

    fn is_goal(&self, state: &Valuation) -> bool {
        self.goals.contains(&location(state))
    }

    fn goal_objects(&self) -> Vec<String> {
        self.goals.iter().map(|goal| goal.to_string()).collect()
    }
}
