//! Interface of the transition-system provider.
//!
//! Parsing a domain description and evaluating action preconditions/effects
//! happen outside of this crate. A provider only has to expose the three
//! functions below; all of them must be pure, and the order in which
//! successors are produced carries no meaning.
use std::fmt::Debug;

use crate::identity::Valuation;

/// A finite transition system over ground propositions.
pub trait TransitionModel {
    /// Label of an applied action. Only used for tracing.
    type Action: Debug;

    /// The designated initial state.
    fn initial_state(&self) -> Valuation;

    /// Every `(action, next_state)` pair applicable in `state`.
    fn successors(&self, state: &Valuation) -> impl Iterator<Item = (Self::Action, Valuation)>;

    /// Whether `state` satisfies the goal condition.
    fn is_goal(&self, state: &Valuation) -> bool;

    /// Objects referenced by the goal condition.
    fn goal_objects(&self) -> Vec<String> {
        Vec::new()
    }
}
