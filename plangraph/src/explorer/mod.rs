//! Breadth-first exploration of the reachable state space.
//!
//! The explorer walks the transition system of a [`TransitionModel`] from its
//! initial state and records every reachable state, every transition and every
//! goal state. Goal states are terminal: they are recorded but never expanded,
//! even when the model offers successors from them.
//!
//! ## Core concepts
//! * [`StateSpaceExplorer`] – Drives the traversal for one model.
//! * [`ExplorerContext`] – All mutable traversal state (frontier, identity
//!   table, partial graph). It is an explicit value so a run can be stopped
//!   between two dequeues and resumed later.
//! * [`ExplorationBudget`] – Optional state-count and wall-clock limits.
//! * [`ExploredSpace`] – The finished graph together with the valuation of
//!   every state.
//! * [`ParallelExplorer`] – Level-synchronous variant expanding one BFS layer
//!   on several threads.
//!
//! ## Budget semantics
//! * `max_states`: the run is interrupted as soon as more than `max_states`
//!   states have been discovered and the frontier is not empty.
//! * `time_budget`: hard wall-clock cutoff checked between two dequeues.
//!
//! No bound is applied by default; exploring a very large or unbounded domain
//! without a budget exhausts memory.
use std::{
    collections::{HashMap, VecDeque},
    time::{Duration, Instant},
};

use log::{debug, info, trace};
use strum::EnumIs;

use crate::{
    config::ExplorationConfig,
    graph::StateGraph,
    identity::{StateId, StateRegistry, Valuation},
    model::TransitionModel,
    utils::error::{Error, PgResult},
};

mod parallel;

pub use parallel::ParallelExplorer;

/// The reachable part of a transition system.
#[derive(Debug, Clone)]
pub struct ExploredSpace {
    /// States, transitions, initial state and goal states.
    pub graph: StateGraph<StateId>,
    /// Valuation of every state in [`Self::graph`].
    pub valuations: HashMap<StateId, Valuation>,
    /// Objects referenced by the goal condition.
    pub goal_objects: Vec<String>,
    /// States in the order they were dequeued.
    pub order: Vec<StateId>,
}

impl ExploredSpace {
    pub fn initial(&self) -> Option<StateId> {
        self.graph.initial().copied()
    }

    pub fn valuation(&self, id: StateId) -> Option<&Valuation> {
        self.valuations.get(&id)
    }

    pub fn state_count(&self) -> usize {
        self.graph.state_count()
    }
}

/// Limits applied by [`StateSpaceExplorer::run`]. The default is unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExplorationBudget {
    pub max_states: Option<usize>,
    pub time_budget: Option<Duration>,
}

impl ExplorationBudget {
    pub fn unlimited() -> Self {
        Self::default()
    }
}

impl From<&ExplorationConfig> for ExplorationBudget {
    fn from(config: &ExplorationConfig) -> Self {
        Self {
            max_states: config.max_states,
            time_budget: config.time_budget_ms.map(Duration::from_millis),
        }
    }
}

/// Mutable traversal state of a sequential exploration.
#[derive(Debug, Clone)]
pub struct ExplorerContext {
    frontier: VecDeque<StateId>,
    registry: StateRegistry,
    graph: StateGraph<StateId>,
    order: Vec<StateId>,
}

impl ExplorerContext {
    /// Number of states waiting to be dequeued.
    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    /// Number of distinct states seen so far.
    pub fn discovered(&self) -> usize {
        self.registry.len()
    }

    /// Number of states dequeued so far.
    pub fn dequeued(&self) -> usize {
        self.order.len()
    }

    /// Graph recorded so far.
    pub fn graph(&self) -> &StateGraph<StateId> {
        &self.graph
    }
}

/// Outcome of a single [`StateSpaceExplorer::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIs)]
pub enum StepStatus {
    /// A state was dequeued and processed.
    Continue,
    /// The frontier was empty, nothing happened.
    Exhausted,
}

/// Snapshot metrics about a (possibly interrupted) exploration run.
#[derive(Debug, Clone)]
pub struct ExplorationRunInfo {
    pub dequeued: usize,
    pub discovered: usize,
    pub time_elapsed: Duration,
}

/// Result of [`StateSpaceExplorer::run`].
#[derive(Debug, Clone, EnumIs)]
pub enum ExplorationOutcome {
    /// The frontier was exhausted.
    Completed(ExploredSpace),
    /// A budget was hit. The context can be passed back to resume.
    Interrupted(ExplorerContext),
}

#[derive(Debug, Clone)]
pub struct ExplorationResult {
    pub outcome: ExplorationOutcome,
    pub run_info: ExplorationRunInfo,
}

/// Sequential breadth-first explorer.
pub struct StateSpaceExplorer<'m, M> {
    model: &'m M,
}

impl<'m, M: TransitionModel> StateSpaceExplorer<'m, M> {
    pub fn new(model: &'m M) -> Self {
        Self { model }
    }

    /// Create a context whose frontier holds only the initial state.
    pub fn initialize_context(&self) -> ExplorerContext {
        let initial = self.model.initial_state();
        let initial_id = initial.id();

        let mut registry = StateRegistry::new();
        // First insertion into an empty registry, cannot collide.
        let _ = registry.insert(initial_id, initial);

        let mut graph = StateGraph::new();
        graph.set_initial(initial_id);

        ExplorerContext {
            frontier: VecDeque::from([initial_id]),
            registry,
            graph,
            order: Vec::new(),
        }
    }

    /// Dequeue and process one state.
    pub fn step(&self, context: &mut ExplorerContext) -> PgResult<StepStatus> {
        let Some(id) = context.frontier.pop_front() else {
            return Ok(StepStatus::Exhausted);
        };
        context.order.push(id);

        let valuation = context.registry.get(id).ok_or_else(|| {
            Error::Unknown(format!("state `{id}` is queued but was never registered"))
        })?;

        if self.model.is_goal(valuation) {
            trace!("goal state {id} reached, not expanded");
            context.graph.mark_goal(id);
            return Ok(StepStatus::Continue);
        }

        let successors: Vec<_> = self.model.successors(valuation).collect();
        for (action, next) in successors {
            let registration = context.registry.register(next)?;
            let next_id = registration.id();
            trace!("{id} --{action:?}--> {next_id}");

            context.graph.add_transition(id, next_id);
            if registration.is_fresh() {
                context.frontier.push_back(next_id);
            }
        }

        Ok(StepStatus::Continue)
    }

    /// Turn a context into the explored space. Intended for exhausted
    /// contexts; an interrupted context yields the partial graph.
    pub fn finalize(&self, context: ExplorerContext) -> ExploredSpace {
        ExploredSpace {
            graph: context.graph,
            valuations: context.registry.into_inner(),
            goal_objects: self.model.goal_objects(),
            order: context.order,
        }
    }

    /// Run (or resume) an exploration under `budget`.
    pub fn run(
        &self,
        context: Option<ExplorerContext>,
        budget: &ExplorationBudget,
    ) -> PgResult<ExplorationResult> {
        let mut context = context.unwrap_or_else(|| self.initialize_context());
        let start_time = Instant::now();
        let dequeued_before = context.dequeued();

        let interrupted = loop {
            if context.frontier.is_empty() {
                break false;
            }
            if budget
                .max_states
                .is_some_and(|max| context.discovered() > max)
            {
                debug!(
                    "state budget of {:?} exceeded ({} discovered)",
                    budget.max_states,
                    context.discovered()
                );
                break true;
            }
            if budget
                .time_budget
                .is_some_and(|limit| start_time.elapsed() >= limit)
            {
                debug!("time budget of {:?} exceeded", budget.time_budget);
                break true;
            }

            self.step(&mut context)?;
        };

        let run_info = ExplorationRunInfo {
            dequeued: context.dequeued() - dequeued_before,
            discovered: context.discovered(),
            time_elapsed: start_time.elapsed(),
        };

        let outcome = if interrupted {
            ExplorationOutcome::Interrupted(context)
        } else {
            let space = self.finalize(context);
            info!(
                "explored {} states, {} transitions, {} goal states in {:?}",
                space.graph.state_count(),
                space.graph.transition_count(),
                space.graph.goal_count(),
                run_info.time_elapsed
            );
            ExplorationOutcome::Completed(space)
        };

        Ok(ExplorationResult { outcome, run_info })
    }

    /// Explore the whole reachable state space without limits.
    pub fn explore(&self) -> PgResult<ExploredSpace> {
        let mut context = self.initialize_context();
        while self.step(&mut context)?.is_continue() {}
        let space = self.finalize(context);
        info!(
            "explored {} states, {} transitions, {} goal states",
            space.graph.state_count(),
            space.graph.transition_count(),
            space.graph.goal_count()
        );
        Ok(space)
    }
}
