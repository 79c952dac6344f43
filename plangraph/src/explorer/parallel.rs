use std::{num::NonZeroUsize, time::Instant};

use dashmap::{DashMap, mapref::entry::Entry};
use log::{debug, info};

use crate::{
    config::ExplorationConfig,
    explorer::ExploredSpace,
    graph::StateGraph,
    identity::{StateId, Valuation},
    model::TransitionModel,
    utils::error::{Error, PgResult},
};

/// Records produced by one worker while expanding its share of a layer.
#[derive(Default)]
struct LayerBuffer {
    transitions: Vec<(StateId, StateId)>,
    goals: Vec<StateId>,
    fresh: Vec<StateId>,
}

/// Level-synchronous breadth-first explorer.
///
/// Every BFS layer is split between worker threads. The visited set is a
/// concurrent map: inserting an identifier is an atomic check-and-insert, so
/// the first worker to reach a state owns it and later discoveries only record
/// their transition. Workers buffer their records locally and the buffers are
/// merged at the end of each layer.
///
/// The resulting vertex set, transition multiset and goal set are the same as
/// with [`super::StateSpaceExplorer`]; only the order of
/// [`ExploredSpace::order`] within a layer may differ.
pub struct ParallelExplorer<'m, M> {
    model: &'m M,
    threads: NonZeroUsize,
}

impl<'m, M: TransitionModel + Sync> ParallelExplorer<'m, M> {
    pub fn new(model: &'m M, threads: NonZeroUsize) -> Self {
        Self { model, threads }
    }

    /// Use `config.threads`, falling back to the available parallelism.
    pub fn from_config(model: &'m M, config: &ExplorationConfig) -> Self {
        let threads = config
            .threads
            .and_then(NonZeroUsize::new)
            .or_else(|| std::thread::available_parallelism().ok())
            .unwrap_or(NonZeroUsize::MIN);
        Self::new(model, threads)
    }

    pub fn explore(&self) -> PgResult<ExploredSpace> {
        let start_time = Instant::now();
        let visited: DashMap<StateId, Valuation> = DashMap::new();

        let initial = self.model.initial_state();
        let initial_id = initial.id();
        visited.insert(initial_id, initial);

        let mut graph = StateGraph::new();
        graph.set_initial(initial_id);

        let mut order = Vec::new();
        let mut layer = vec![initial_id];
        let mut depth = 0usize;

        while !layer.is_empty() {
            debug!("expanding layer {} with {} states", depth, layer.len());
            let chunk_size = layer.len().div_ceil(self.threads.get());

            let visited_ref = &visited;
            let buffers = crossbeam::thread::scope(|scope| {
                let handles: Vec<_> = layer
                    .chunks(chunk_size)
                    .map(|chunk| scope.spawn(move |_| self.expand_chunk(chunk, visited_ref)))
                    .collect();
                handles
                    .into_iter()
                    .map(|handle| {
                        handle.join().unwrap_or_else(|_| {
                            Err(Error::WorkerPanicked(format!(
                                "worker panicked while expanding layer {depth}"
                            )))
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .map_err(|_| Error::WorkerPanicked(format!("layer {depth} scope panicked")))?;

            let mut next_layer = Vec::new();
            for buffer in buffers {
                let buffer = buffer?;
                for goal in buffer.goals {
                    graph.mark_goal(goal);
                }
                for (from, to) in buffer.transitions {
                    graph.add_transition(from, to);
                }
                next_layer.extend(buffer.fresh);
            }

            order.append(&mut layer);
            layer = next_layer;
            depth += 1;
        }

        let space = ExploredSpace {
            graph,
            valuations: visited.into_iter().collect(),
            goal_objects: self.model.goal_objects(),
            order,
        };
        info!(
            "explored {} states, {} transitions, {} goal states over {} layers on {} threads in {:?}",
            space.graph.state_count(),
            space.graph.transition_count(),
            space.graph.goal_count(),
            depth,
            self.threads,
            start_time.elapsed()
        );
        Ok(space)
    }

    fn expand_chunk(
        &self,
        chunk: &[StateId],
        visited: &DashMap<StateId, Valuation>,
    ) -> PgResult<LayerBuffer> {
        let mut buffer = LayerBuffer::default();

        for &id in chunk {
            // Cloned so that no shard guard is held while inserting below.
            let valuation = visited.get(&id).map(|v| v.value().clone()).ok_or_else(|| {
                Error::Unknown(format!("state `{id}` is queued but was never registered"))
            })?;

            if self.model.is_goal(&valuation) {
                buffer.goals.push(id);
                continue;
            }

            for (_, next) in self.model.successors(&valuation) {
                let next_id = next.id();
                buffer.transitions.push((id, next_id));

                match visited.entry(next_id) {
                    Entry::Vacant(slot) => {
                        slot.insert(next);
                        buffer.fresh.push(next_id);
                    }
                    Entry::Occupied(slot) if slot.get() == &next => {}
                    Entry::Occupied(slot) => {
                        return Err(Error::IdentityCollision {
                            id: next_id,
                            existing: slot.get().to_string(),
                            incoming: next.to_string(),
                        });
                    }
                }
            }
        }

        Ok(buffer)
    }
}
