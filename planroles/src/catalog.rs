//! Discovery of derived roles by closure under relation operators.
//!
//! Starting from one primitive relation per predicate, every pass forms
//! candidates with three operators:
//!
//! | Operator            | Candidate name  | Operands                               |
//! |---------------------|-----------------|----------------------------------------|
//! | intersection        | `P_inter_Q`     | unordered pairs, `P_self_inter` if P=Q |
//! | composition         | `P_compose_Q`   | ordered pairs                          |
//! | transitive closure  | `P_tc`          | single role                            |
//!
//! A candidate is accepted when its pair set is non-empty and differs from the
//! extent of every role accepted so far. Only candidates with at least one
//! operand accepted in the previous pass are formed: combinations of older
//! roles were already tried and their result is known. Discovery converges
//! once a pass accepts nothing; the number of distinct pair sets over a finite
//! universe is finite, so this always happens, though possibly after a very
//! large number of roles. [`ClosureOptions::max_definitions`] caps that.
use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    fmt,
};

use log::{debug, info};
use plangraph::config::ClosureConfig;
use strum::EnumIs;

use crate::{
    error::{Error, RoleResult},
    relation::Relation,
};

/// Index of a definition in its [`RoleCatalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoleId(u32);

impl RoleId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// How a role is computed from other roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs)]
pub enum RoleOp {
    /// Read directly from the predicate of the same name.
    Primitive,
    Intersect(RoleId, RoleId),
    Compose(RoleId, RoleId),
    TransitiveClosure(RoleId),
}

impl RoleOp {
    /// Apply a derived operator to the values of its operands, `None` for
    /// primitives.
    pub fn apply<'r>(self, value: impl Fn(RoleId) -> &'r Relation) -> Option<Relation> {
        match self {
            RoleOp::Primitive => None,
            RoleOp::Intersect(a, b) => Some(value(a).intersect(value(b))),
            RoleOp::Compose(a, b) => Some(value(a).compose(value(b))),
            RoleOp::TransitiveClosure(a) => Some(value(a).transitive_closure()),
        }
    }

    /// Operands of the operator.
    pub fn operands(self) -> impl Iterator<Item = RoleId> {
        let (a, b) = match self {
            RoleOp::Primitive => (None, None),
            RoleOp::Intersect(a, b) | RoleOp::Compose(a, b) => (Some(a), Some(b)),
            RoleOp::TransitiveClosure(a) => (Some(a), None),
        };
        a.into_iter().chain(b)
    }
}

#[derive(Debug, Clone)]
pub struct RoleDefinition {
    pub name: String,
    pub op: RoleOp,
    /// Value of the role on the global (all-states) relations.
    pub extent: Relation,
    /// Pass in which the role was accepted, 0 for primitives.
    pub pass: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClosureOptions {
    /// Upper bound on the number of definitions, primitives included.
    /// Primitives are always kept even when they alone exceed it.
    pub max_definitions: Option<usize>,
}

impl From<&ClosureConfig> for ClosureOptions {
    fn from(config: &ClosureConfig) -> Self {
        Self {
            max_definitions: config.max_definitions,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIs)]
pub enum ClosureStatus {
    /// No operator produces a new relation any more.
    Converged,
    /// Discovery stopped at [`ClosureOptions::max_definitions`].
    Truncated,
}

/// Candidate produced during a pass, not yet named.
struct Candidate {
    base_name: String,
    op: RoleOp,
    extent: Relation,
}

/// All primitive and derived roles of a domain.
#[derive(Debug, Clone)]
pub struct RoleCatalog {
    definitions: Vec<RoleDefinition>,
    by_name: HashMap<String, RoleId>,
    /// Definitions sorted by name.
    sorted: Vec<RoleId>,
    status: ClosureStatus,
    passes: usize,
    /// Suffix for the next name collision.
    counter: usize,
}

impl RoleCatalog {
    fn empty() -> Self {
        Self {
            definitions: Vec::new(),
            by_name: HashMap::new(),
            sorted: Vec::new(),
            status: ClosureStatus::Converged,
            passes: 0,
            counter: 1,
        }
    }

    /// Run the closure over the global relation of each predicate.
    pub fn discover(primitives: BTreeMap<String, Relation>, options: &ClosureOptions) -> Self {
        let mut catalog = Self::empty();
        let mut seen: HashSet<Relation> = HashSet::new();
        let mut frontier: BTreeSet<RoleId> = BTreeSet::new();

        for (name, extent) in primitives {
            seen.insert(extent.clone());
            frontier.insert(catalog.push(name, RoleOp::Primitive, extent, 0));
        }
        debug!("role discovery starts from {} primitives", catalog.len());

        'passes: while !frontier.is_empty() {
            catalog.passes += 1;
            catalog.sort_names();

            let candidates = catalog.candidates(&frontier, &seen);
            let candidate_count = candidates.len();
            let mut accepted = BTreeSet::new();

            for candidate in candidates {
                // Two candidates of one pass may coincide.
                if seen.contains(&candidate.extent) {
                    continue;
                }
                if options
                    .max_definitions
                    .is_some_and(|max| catalog.len() >= max)
                {
                    catalog.status = ClosureStatus::Truncated;
                    info!(
                        "role discovery truncated at {} definitions in pass {}",
                        catalog.len(),
                        catalog.passes
                    );
                    break 'passes;
                }

                let name = catalog.unique_name(&candidate.base_name);
                seen.insert(candidate.extent.clone());
                let pass = catalog.passes;
                accepted.insert(catalog.push(name, candidate.op, candidate.extent, pass));
            }

            debug!(
                "pass {}: {} candidates, {} roles accepted",
                catalog.passes,
                candidate_count,
                accepted.len()
            );
            frontier = accepted;
        }

        catalog.sort_names();
        if catalog.status.is_converged() {
            info!(
                "role discovery converged with {} roles after {} passes",
                catalog.len(),
                catalog.passes
            );
        }
        catalog
    }

    /// Candidates of one pass, in a fixed order: intersections, compositions,
    /// then closures, each over roles sorted by name.
    fn candidates(&self, frontier: &BTreeSet<RoleId>, seen: &HashSet<Relation>) -> Vec<Candidate> {
        let is_new = |id: &RoleId| frontier.contains(id);
        let keep = |extent: &Relation| !extent.is_empty() && !seen.contains(extent);
        let mut candidates = Vec::new();

        for (i, &left) in self.sorted.iter().enumerate() {
            for &right in &self.sorted[i..] {
                if !is_new(&left) && !is_new(&right) {
                    continue;
                }
                let extent = self.extent(left).intersect(self.extent(right));
                if keep(&extent) {
                    let base_name = if left == right {
                        format!("{}_self_inter", self.name(left))
                    } else {
                        format!("{}_inter_{}", self.name(left), self.name(right))
                    };
                    candidates.push(Candidate {
                        base_name,
                        op: RoleOp::Intersect(left, right),
                        extent,
                    });
                }
            }
        }

        for &left in &self.sorted {
            for &right in &self.sorted {
                if !is_new(&left) && !is_new(&right) {
                    continue;
                }
                let extent = self.extent(left).compose(self.extent(right));
                if keep(&extent) {
                    candidates.push(Candidate {
                        base_name: format!("{}_compose_{}", self.name(left), self.name(right)),
                        op: RoleOp::Compose(left, right),
                        extent,
                    });
                }
            }
        }

        for &role in self.sorted.iter().filter(|id| is_new(id)) {
            let extent = self.extent(role).transitive_closure();
            if keep(&extent) {
                candidates.push(Candidate {
                    base_name: format!("{}_tc", self.name(role)),
                    op: RoleOp::TransitiveClosure(role),
                    extent,
                });
            }
        }

        candidates
    }

    fn push(&mut self, name: String, op: RoleOp, extent: Relation, pass: usize) -> RoleId {
        let id = RoleId(self.definitions.len() as u32);
        self.by_name.insert(name.clone(), id);
        self.definitions.push(RoleDefinition {
            name,
            op,
            extent,
            pass,
        });
        id
    }

    /// `base`, or `base_<n>` with the next free counter value when taken.
    fn unique_name(&mut self, base: &str) -> String {
        let mut name = base.to_string();
        while self.by_name.contains_key(&name) {
            name = format!("{}_{}", base, self.counter);
            self.counter += 1;
        }
        name
    }

    fn sort_names(&mut self) {
        let mut sorted: Vec<RoleId> = (0..self.definitions.len() as u32).map(RoleId).collect();
        sorted.sort_by(|a, b| self.name(*a).cmp(self.name(*b)));
        self.sorted = sorted;
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn status(&self) -> ClosureStatus {
        self.status
    }

    /// Number of passes run, including the final empty one.
    pub fn passes(&self) -> usize {
        self.passes
    }

    pub fn definition(&self, id: RoleId) -> &RoleDefinition {
        &self.definitions[id.index()]
    }

    pub fn name(&self, id: RoleId) -> &str {
        &self.definition(id).name
    }

    pub fn extent(&self, id: RoleId) -> &Relation {
        &self.definition(id).extent
    }

    pub fn id(&self, name: &str) -> RoleResult<RoleId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownRole(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&RoleDefinition> {
        self.by_name.get(name).map(|&id| self.definition(id))
    }

    /// Definitions in acceptance order; operands always precede their users.
    pub fn definitions(&self) -> impl Iterator<Item = (RoleId, &RoleDefinition)> {
        self.definitions
            .iter()
            .enumerate()
            .map(|(index, definition)| (RoleId(index as u32), definition))
    }

    /// Role ids ordered by name.
    pub fn sorted_ids(&self) -> &[RoleId] {
        &self.sorted
    }

    /// Human-readable definition of `id`, e.g. `on_tc = tc(on)`.
    pub fn expression(&self, id: RoleId) -> String {
        format!("{} = {}", self.name(id), Expression(self, id))
    }
}

struct Expression<'c>(&'c RoleCatalog, RoleId);

impl fmt::Display for Expression<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Expression(catalog, id) = *self;
        match catalog.definition(id).op {
            RoleOp::Primitive => write!(f, "primitive"),
            RoleOp::Intersect(a, b) => write!(f, "{} & {}", catalog.name(a), catalog.name(b)),
            RoleOp::Compose(a, b) => write!(f, "{} ; {}", catalog.name(a), catalog.name(b)),
            RoleOp::TransitiveClosure(a) => write!(f, "tc({})", catalog.name(a)),
        }
    }
}
