use std::{hash::Hash, io::Write};

use crate::{
    distance::GoalDistances,
    explorer::ExploredSpace,
    facts::{Fact, FactSpace},
    identity::{StateId, sanitize_problem_name},
    utils::error::PgResult,
};

/// Writes facts, one per line, to any [`Write`] sink.
///
/// The writer knows the problem name so it can render [`StateId`]s as
/// `s_<problem>_<p|m><magnitude>` tokens.
pub struct FactWriter<W: Write> {
    out: W,
    problem: String,
    written: usize,
}

impl<W: Write> FactWriter<W> {
    pub fn new(out: W, problem: &str) -> Self {
        Self {
            out,
            problem: sanitize_problem_name(problem),
            written: 0,
        }
    }

    /// Token of `id` for this writer's problem.
    pub fn state_token(&self, id: StateId) -> String {
        id.token(&self.problem)
    }

    /// Number of facts written so far (comments excluded).
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn write_fact(&mut self, fact: &Fact) -> PgResult<()> {
        writeln!(self.out, "{}", fact)?;
        self.written += 1;
        Ok(())
    }

    pub fn write_facts<'f>(&mut self, facts: impl IntoIterator<Item = &'f Fact>) -> PgResult<()> {
        for fact in facts {
            self.write_fact(fact)?;
        }
        Ok(())
    }

    /// Write a `%` comment line.
    pub fn write_comment(&mut self, comment: &str) -> PgResult<()> {
        writeln!(self.out, "% {}", comment)?;
        Ok(())
    }

    /// Write an explored space: transitions, valuations (in dequeue order),
    /// the initial state, goal states, goal objects and, when given, the
    /// distance labels.
    pub fn write_space(
        &mut self,
        space: &ExploredSpace,
        distances: Option<&GoalDistances<StateId>>,
    ) -> PgResult<()> {
        let token = |id: &StateId| id.token(&self.problem);

        let transitions: Vec<Fact> = space
            .graph
            .transitions()
            .map(|(from, to)| Fact::Transition {
                from: token(from),
                to: token(to),
            })
            .collect();

        let mut holds = Vec::new();
        let mut goals = Vec::new();
        for id in &space.order {
            if let Some(valuation) = space.valuation(*id) {
                holds.extend(valuation.iter().map(|atom| Fact::Holds {
                    state: token(id),
                    atom: atom.clone(),
                }));
            }
            if space.graph.is_goal(id) {
                goals.push(Fact::Goal(token(id)));
            }
        }

        let init = space.initial().map(|id| Fact::Init(token(&id)));

        self.write_facts(&transitions)?;
        self.write_facts(&holds)?;
        self.write_facts(&init)?;
        self.write_facts(&goals)?;
        for object in &space.goal_objects {
            self.write_fact(&Fact::GoalObject(object.clone()))?;
        }
        if let Some(distances) = distances {
            let problem = self.problem.clone();
            self.write_distances(distances, |id| id.token(&problem))?;
        }
        Ok(())
    }

    /// Write a space reconstructed from facts, in the same order as
    /// [`Self::write_space`].
    pub fn write_fact_space(
        &mut self,
        space: &FactSpace,
        distances: Option<&GoalDistances<String>>,
    ) -> PgResult<()> {
        self.write_facts(&space.to_facts(false))?;
        if let Some(distances) = distances {
            self.write_distances(distances, |state: &String| state.clone())?;
        }
        Ok(())
    }

    /// Write `v_star/2` for every labeled state, ordered by token, followed by
    /// `max_v_star/1`.
    pub fn write_distances<K: Eq + Hash>(
        &mut self,
        distances: &GoalDistances<K>,
        token: impl Fn(&K) -> String,
    ) -> PgResult<()> {
        let mut labels: Vec<(String, usize)> = distances
            .iter()
            .map(|(key, distance)| (token(key), distance))
            .collect();
        labels.sort();

        for (state, distance) in labels {
            self.write_fact(&Fact::VStar { state, distance })?;
        }
        self.write_fact(&Fact::MaxVStar(distances.max_distance()))
    }

    pub fn flush(&mut self) -> PgResult<()> {
        self.out.flush()?;
        Ok(())
    }

    /// Flush and return the underlying sink.
    pub fn finish(mut self) -> PgResult<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
