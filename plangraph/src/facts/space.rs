use std::collections::{BTreeMap, BTreeSet};

use log::warn;

use crate::{
    facts::Fact,
    graph::StateGraph,
    identity::Valuation,
    utils::error::{Error, PgResult},
};

/// A state space reconstructed from facts.
///
/// States are keyed by their textual token as found in the document, so any
/// producer's identifiers are accepted.
#[derive(Debug, Clone, Default)]
pub struct FactSpace {
    pub graph: StateGraph<String>,
    pub valuations: BTreeMap<String, Valuation>,
    pub goal_objects: BTreeSet<String>,
    /// Distance labels present in the document.
    pub distances: BTreeMap<String, usize>,
    pub max_distance: Option<usize>,
}

impl FactSpace {
    /// Fold facts into a space. Role-tagged `holds/3` facts carry no state
    /// space information and are ignored.
    pub fn from_facts(facts: impl IntoIterator<Item = Fact>) -> Self {
        let mut space = Self::default();

        for fact in facts {
            match fact {
                Fact::Holds { state, atom } => {
                    space.graph.add_state(state.clone());
                    space.valuations.entry(state).or_default().insert(atom);
                }
                Fact::Transition { from, to } => space.graph.add_transition(from, to),
                Fact::Init(state) => {
                    if let Some(previous) = space.graph.initial() {
                        warn!("initial state `{previous}` replaced by `{state}`");
                    }
                    space.graph.set_initial(state);
                }
                Fact::Goal(state) => space.graph.mark_goal(state),
                Fact::GoalObject(object) => {
                    space.goal_objects.insert(object);
                }
                Fact::VStar { state, distance } => {
                    space.graph.add_state(state.clone());
                    space.distances.insert(state, distance);
                }
                Fact::MaxVStar(distance) => space.max_distance = Some(distance),
                Fact::RoleHolds { .. } => {}
            }
        }

        space
    }

    pub fn initial(&self) -> PgResult<&String> {
        self.graph.initial().ok_or(Error::MissingInitialState)
    }

    pub fn valuation(&self, state: &str) -> Option<&Valuation> {
        self.valuations.get(state)
    }

    /// Facts describing this space, in writing order.
    pub fn to_facts(&self, include_distances: bool) -> Vec<Fact> {
        let mut facts: Vec<Fact> = self
            .graph
            .transitions()
            .map(|(from, to)| Fact::Transition {
                from: from.clone(),
                to: to.clone(),
            })
            .collect();

        for state in self.graph.states() {
            if let Some(valuation) = self.valuations.get(state) {
                facts.extend(valuation.iter().map(|atom| Fact::Holds {
                    state: state.clone(),
                    atom: atom.clone(),
                }));
            }
        }

        facts.extend(self.graph.initial().cloned().map(Fact::Init));
        facts.extend(self.graph.goals().cloned().map(Fact::Goal));
        facts.extend(self.goal_objects.iter().cloned().map(Fact::GoalObject));

        if include_distances && !self.distances.is_empty() {
            facts.extend(self.distances.iter().map(|(state, &distance)| Fact::VStar {
                state: state.clone(),
                distance,
            }));
            let max = self
                .max_distance
                .or_else(|| self.distances.values().copied().max())
                .unwrap_or(0);
            facts.push(Fact::MaxVStar(max));
        }

        facts
    }
}
