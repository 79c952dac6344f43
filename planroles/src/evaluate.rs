//! Per-state evaluation of role definitions.
use std::{collections::BTreeMap, io::Write};

use log::debug;
use plangraph::{
    explorer::ExploredSpace,
    facts::{Fact, FactSpace, FactWriter},
    identity::{Proposition, StateId, Valuation},
};

use crate::{
    catalog::{RoleCatalog, RoleId, RoleOp},
    error::RoleResult,
    relation::{EMPTY, Relation},
    universe::ObjectUniverse,
};

/// Binary relations true in each state, keyed by predicate name.
///
/// Propositions of any arity other than 2 do not define a relation and are
/// ignored.
#[derive(Debug, Clone)]
pub struct StateRelations<K> {
    universe: ObjectUniverse,
    states: BTreeMap<K, BTreeMap<String, Relation>>,
}

impl<K: Ord> Default for StateRelations<K> {
    fn default() -> Self {
        Self {
            universe: ObjectUniverse::new(),
            states: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone> StateRelations<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a state, possibly without any relation.
    pub fn add_state(&mut self, state: K) {
        self.states.entry(state).or_default();
    }

    pub fn add_pair(&mut self, state: K, predicate: &str, from: &str, to: &str) {
        let from = self.universe.search_or_insert(from);
        let to = self.universe.search_or_insert(to);
        self.states
            .entry(state)
            .or_default()
            .entry(predicate.to_string())
            .or_default()
            .insert(from, to);
    }

    /// Add every binary proposition of `valuation` to `state`.
    pub fn add_valuation(&mut self, state: K, valuation: &Valuation) {
        self.add_state(state.clone());
        for proposition in valuation.iter().filter(|p| p.arity() == 2) {
            self.add_pair(
                state.clone(),
                &proposition.predicate,
                &proposition.args[0],
                &proposition.args[1],
            );
        }
    }

    pub fn universe(&self) -> &ObjectUniverse {
        &self.universe
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// States in key order with their relations.
    pub fn states(&self) -> impl Iterator<Item = (&K, &BTreeMap<String, Relation>)> {
        self.states.iter()
    }

    pub fn relations(&self, state: &K) -> Option<&BTreeMap<String, Relation>> {
        self.states.get(state)
    }

    /// Union of each predicate over all states.
    pub fn global(&self) -> BTreeMap<String, Relation> {
        let mut global: BTreeMap<String, Relation> = BTreeMap::new();
        for relations in self.states.values() {
            for (predicate, relation) in relations {
                global
                    .entry(predicate.clone())
                    .or_default()
                    .extend(relation.iter());
            }
        }
        global
    }
}

impl StateRelations<String> {
    /// Relations of a space read from a fact document, keyed by state token.
    pub fn from_fact_space(space: &FactSpace) -> Self {
        let mut relations = Self::new();
        for (state, valuation) in &space.valuations {
            relations.add_valuation(state.clone(), valuation);
        }
        relations
    }
}

impl StateRelations<StateId> {
    /// Relations of an explored space. Objects are interned in exploration
    /// order.
    pub fn from_explored(space: &ExploredSpace) -> Self {
        let mut relations = Self::new();
        for &id in &space.order {
            if let Some(valuation) = space.valuation(id) {
                relations.add_valuation(id, valuation);
            }
        }
        relations
    }
}

/// Evaluates the roles of a catalog on the relations of one state.
///
/// Values are memoized, so roles sharing sub-expressions compute them once.
pub struct RoleEvaluator<'c> {
    catalog: &'c RoleCatalog,
    relations: &'c BTreeMap<String, Relation>,
    memo: Vec<Option<Relation>>,
}

impl<'c> RoleEvaluator<'c> {
    pub fn new(catalog: &'c RoleCatalog, relations: &'c BTreeMap<String, Relation>) -> Self {
        Self {
            catalog,
            relations,
            memo: vec![None; catalog.len()],
        }
    }

    fn ensure(&mut self, id: RoleId) {
        if self.memo[id.index()].is_some() {
            return;
        }

        let catalog = self.catalog;
        let definition = catalog.definition(id);
        let value = match definition.op {
            // An absent predicate is an empty relation.
            RoleOp::Primitive => self
                .relations
                .get(&definition.name)
                .cloned()
                .unwrap_or_default(),
            op => {
                for operand in op.operands() {
                    self.ensure(operand);
                }
                let this = &*self;
                op.apply(|operand| this.value(operand)).unwrap_or_default()
            }
        };
        self.memo[id.index()] = Some(value);
    }

    fn value(&self, id: RoleId) -> &Relation {
        self.memo[id.index()].as_ref().unwrap_or(&EMPTY)
    }

    pub fn evaluate(&mut self, id: RoleId) -> &Relation {
        self.ensure(id);
        self.value(id)
    }

    pub fn evaluate_role(&mut self, name: &str) -> RoleResult<&Relation> {
        let id = self.catalog.id(name)?;
        Ok(self.evaluate(id))
    }

    /// Every non-empty role, ordered by name.
    pub fn evaluate_all(&mut self) -> Vec<(RoleId, Relation)> {
        let catalog = self.catalog;
        let mut values = Vec::new();
        for &id in catalog.sorted_ids() {
            let value = self.evaluate(id);
            if !value.is_empty() {
                values.push((id, value.clone()));
            }
        }
        values
    }
}

impl RoleCatalog {
    /// Evaluator over the relations of a single state.
    pub fn evaluate<'c>(&'c self, relations: &'c BTreeMap<String, Relation>) -> RoleEvaluator<'c> {
        RoleEvaluator::new(self, relations)
    }
}

/// A non-empty role value in one state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedRelation<K> {
    pub state: K,
    pub role: String,
    pub pairs: Relation,
}

/// Evaluate every role in every state. Only non-empty values are returned,
/// ordered by state and then by role name.
pub fn derive_all<K: Ord + Clone>(
    catalog: &RoleCatalog,
    relations: &StateRelations<K>,
) -> Vec<DerivedRelation<K>> {
    let mut derived = Vec::new();
    for (state, state_relations) in relations.states() {
        let mut evaluator = catalog.evaluate(state_relations);
        derived.extend(
            evaluator
                .evaluate_all()
                .into_iter()
                .map(|(id, pairs)| DerivedRelation {
                    state: state.clone(),
                    role: catalog.name(id).to_string(),
                    pairs,
                }),
        );
    }
    debug!(
        "{} non-empty role values over {} states",
        derived.len(),
        relations.state_count()
    );
    derived
}

/// Write derived relations as `holds(S, ("role", x, y)).` facts, with a
/// comment line opening each state and each role. Pairs are written in
/// object-name order. Returns the number of facts written.
pub fn write_derived<W: Write, K: PartialEq>(
    writer: &mut FactWriter<W>,
    universe: &ObjectUniverse,
    derived: &[DerivedRelation<K>],
    token: impl Fn(&K) -> String,
) -> RoleResult<usize> {
    let before = writer.written();
    let mut current: Option<&K> = None;

    for relation in derived {
        let state = token(&relation.state);
        if current != Some(&relation.state) {
            writer.write_comment(&format!("Derived relations for state: {state}"))?;
            current = Some(&relation.state);
        }
        writer.write_comment(&relation.role)?;

        let mut pairs: Vec<(&str, &str)> = relation
            .pairs
            .iter()
            .map(|(x, y)| (universe.name(x), universe.name(y)))
            .collect();
        pairs.sort();

        for (x, y) in pairs {
            writer.write_fact(&Fact::Holds {
                state: state.clone(),
                atom: Proposition::new(relation.role.as_str(), [x, y]),
            })?;
        }
    }

    Ok(writer.written() - before)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog::ClosureOptions, error::Error};

    fn two_states() -> StateRelations<String> {
        let mut relations = StateRelations::new();
        relations.add_pair("s1".to_string(), "on", "a", "b");
        relations.add_pair("s1".to_string(), "on", "b", "c");
        relations.add_pair("s2".to_string(), "on", "c", "d");
        relations.add_state("s3".to_string());
        relations
    }

    #[test]
    fn global_relations_are_unions() {
        let relations = two_states();
        let global = relations.global();
        assert_eq!(global.len(), 1);
        assert_eq!(global["on"].len(), 3);
        assert_eq!(relations.state_count(), 3);
    }

    #[test]
    fn roles_are_evaluated_on_each_state_alone() {
        let relations = two_states();
        let catalog = RoleCatalog::discover(relations.global(), &ClosureOptions::default());
        let universe = relations.universe();

        let s1 = relations.relations(&"s1".to_string()).unwrap();
        let mut evaluator = catalog.evaluate(s1);
        assert_eq!(
            evaluator.evaluate_role("on_compose_on").unwrap().display(universe),
            "{(a, c)}"
        );
        assert_eq!(evaluator.evaluate_role("on_tc").unwrap().len(), 3);

        // Globally (b, c) ; (c, d) composes, but not inside s2.
        let s2 = relations.relations(&"s2".to_string()).unwrap();
        let mut evaluator = catalog.evaluate(s2);
        assert!(evaluator.evaluate_role("on_compose_on").unwrap().is_empty());
        assert_eq!(
            evaluator.evaluate_role("on_tc").unwrap().display(universe),
            "{(c, d)}"
        );
        assert!(matches!(
            evaluator.evaluate_role("under"),
            Err(Error::UnknownRole(name)) if name == "under"
        ));
    }

    #[test]
    fn derive_all_skips_empty_values_and_is_ordered() {
        let relations = two_states();
        let catalog = RoleCatalog::discover(relations.global(), &ClosureOptions::default());
        let derived = derive_all(&catalog, &relations);

        assert!(derived.iter().all(|d| !d.pairs.is_empty()));
        assert!(derived.iter().all(|d| d.state != "s3"));
        assert!(
            derived
                .windows(2)
                .all(|w| (&w[0].state, &w[0].role) < (&w[1].state, &w[1].role))
        );
        assert!(
            !derived
                .iter()
                .any(|d| d.state == "s2" && d.role == "on_compose_on")
        );
    }

    #[test]
    fn derived_facts_are_written_per_state() {
        let mut relations = StateRelations::new();
        relations.add_pair("s".to_string(), "on", "b", "c");
        relations.add_pair("s".to_string(), "on", "a", "b");
        let catalog = RoleCatalog::discover(relations.global(), &ClosureOptions::default());
        let derived = derive_all(&catalog, &relations);

        let mut writer = FactWriter::new(Vec::new(), "p");
        let count =
            write_derived(&mut writer, relations.universe(), &derived, |s: &String| s.clone())
                .unwrap();
        let output = String::from_utf8(writer.finish().unwrap()).unwrap();

        assert_eq!(count, 6);
        let expected = "% Derived relations for state: s\n\
            % on\n\
            holds(\"s\", (\"on\", a, b)).\n\
            holds(\"s\", (\"on\", b, c)).\n\
            % on_compose_on\n\
            holds(\"s\", (\"on_compose_on\", a, c)).\n\
            % on_tc\n\
            holds(\"s\", (\"on_tc\", a, b)).\n\
            holds(\"s\", (\"on_tc\", a, c)).\n\
            holds(\"s\", (\"on_tc\", b, c)).\n";
        assert_eq!(output, expected);
    }

    #[test]
    fn unary_and_nullary_propositions_are_ignored() {
        let valuation: Valuation = [
            Proposition::new("on", ["a", "b"]),
            Proposition::new("clear", ["a"]),
            Proposition::nullary("handempty"),
        ]
        .into_iter()
        .collect();

        let mut relations = StateRelations::new();
        relations.add_valuation(0u32, &valuation);
        assert_eq!(relations.global().keys().collect::<Vec<_>>(), vec!["on"]);
    }
}
