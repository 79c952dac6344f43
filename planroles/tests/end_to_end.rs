use std::collections::BTreeSet;

use plangraph::{
    explorer::StateSpaceExplorer,
    facts::{Fact, FactSpace, FactWriter, parse_facts},
    identity::{Proposition, StateId, Valuation},
    model::TransitionModel,
};
use planroles::{
    ClosureOptions, DerivedRelation, ObjectUniverse, RoleCatalog, StateRelations, derive_all,
    write_derived,
};

/// Three stacked blocks that can be moved from a tower top to the table.
struct Unstack;

fn on(x: &str, y: &str) -> Proposition {
    Proposition::new("on", [x, y])
}

impl TransitionModel for Unstack {
    type Action = String;

    fn initial_state(&self) -> Valuation {
        [on("a", "b"), on("b", "c")].into_iter().collect()
    }

    fn successors(&self, state: &Valuation) -> impl Iterator<Item = (Self::Action, Valuation)> {
        let below: BTreeSet<&str> = state.iter().map(|p| p.args[1].as_str()).collect();
        let mut next = Vec::new();
        for proposition in state.iter() {
            let top = proposition.args[0].as_str();
            if below.contains(top) {
                continue;
            }
            let mut successor = state.clone();
            successor.remove(proposition);
            next.push((format!("unstack({top})"), successor));
        }
        next.into_iter()
    }

    fn is_goal(&self, state: &Valuation) -> bool {
        state.is_empty()
    }

    fn goal_objects(&self) -> Vec<String> {
        vec!["a".into(), "b".into(), "c".into()]
    }
}

#[test]
fn roles_are_derived_from_a_written_state_space() {
    let space = StateSpaceExplorer::new(&Unstack).explore().unwrap();
    assert_eq!(space.state_count(), 3);

    let mut writer = FactWriter::new(Vec::new(), "unstack");
    writer.write_space(&space, None).unwrap();
    let source = String::from_utf8(writer.finish().unwrap()).unwrap();

    let facts = FactSpace::from_facts(parse_facts(&source).unwrap().facts);
    let relations = StateRelations::from_fact_space(&facts);
    let catalog = RoleCatalog::discover(relations.global(), &ClosureOptions::default());
    assert!(catalog.status().is_converged());
    assert!(catalog.get("on_tc").is_some());

    let derived = derive_all(&catalog, &relations);
    let initial = facts.initial().unwrap().clone();
    let initial_tc = derived
        .iter()
        .find(|d| d.state == initial && d.role == "on_tc")
        .unwrap();
    let universe = relations.universe();
    let mut pairs: Vec<(&str, &str)> = initial_tc
        .pairs
        .iter()
        .map(|(x, y)| (universe.name(x), universe.name(y)))
        .collect();
    pairs.sort();
    assert_eq!(pairs, vec![("a", "b"), ("a", "c"), ("b", "c")]);

    let mut writer = FactWriter::new(Vec::new(), "unstack");
    let count = write_derived(&mut writer, relations.universe(), &derived, |s: &String| {
        s.clone()
    })
    .unwrap();
    let output = String::from_utf8(writer.finish().unwrap()).unwrap();

    let reread = parse_facts(&output).unwrap();
    assert_eq!(reread.facts.len(), count);
    assert!(reread.facts.contains(&Fact::Holds {
        state: initial,
        atom: Proposition::new("on_tc", ["a", "c"]),
    }));
}

/// Derived pairs as `(state, role, x, y)` names, independent of object interning order.
fn named<K>(
    derived: &[DerivedRelation<K>],
    universe: &ObjectUniverse,
    token: impl Fn(&K) -> String,
) -> BTreeSet<(String, String, String, String)> {
    derived
        .iter()
        .flat_map(|d| {
            let state = token(&d.state);
            d.pairs.iter().map(move |(x, y)| {
                (
                    state.clone(),
                    d.role.clone(),
                    universe.name(x).to_string(),
                    universe.name(y).to_string(),
                )
            })
        })
        .collect()
}

#[test]
fn explored_and_reread_spaces_derive_the_same_roles() {
    let space = StateSpaceExplorer::new(&Unstack).explore().unwrap();
    let direct = StateRelations::from_explored(&space);
    assert_eq!(direct.state_count(), space.state_count());

    let mut writer = FactWriter::new(Vec::new(), "unstack");
    writer.write_space(&space, None).unwrap();
    let source = String::from_utf8(writer.finish().unwrap()).unwrap();
    let reread = StateRelations::from_fact_space(&FactSpace::from_facts(
        parse_facts(&source).unwrap().facts,
    ));

    assert_eq!(
        direct.global().keys().collect::<Vec<_>>(),
        reread.global().keys().collect::<Vec<_>>()
    );

    let options = ClosureOptions::default();
    let direct_catalog = RoleCatalog::discover(direct.global(), &options);
    let reread_catalog = RoleCatalog::discover(reread.global(), &options);
    assert_eq!(direct_catalog.len(), reread_catalog.len());

    let direct_derived = derive_all(&direct_catalog, &direct);
    let reread_derived = derive_all(&reread_catalog, &reread);
    assert_eq!(
        named(&direct_derived, direct.universe(), |id: &StateId| id.token("unstack")),
        named(&reread_derived, reread.universe(), |s: &String| s.clone())
    );
}
