mod common;

use std::collections::BTreeMap;

use common::EdgeListModel;
use plangraph::{
    distance::goal_distances,
    explorer::StateSpaceExplorer,
    facts::{FactSpace, FactWriter, parse_facts},
    identity::StateId,
};

#[test]
fn written_space_reads_back_identically() {
    let edges = [
        (0, "a", 1),
        (0, "b", 2),
        (1, "c", 2),
        (1, "c2", 2),
        (2, "d", 3),
        (3, "e", 0),
        (2, "f", 5),
        (5, "g", 5),
    ];
    let model = EdgeListModel::new(0, &edges, &[3]);
    let space = StateSpaceExplorer::new(&model).explore().unwrap();
    let distances = goal_distances(&space.graph);

    let mut writer = FactWriter::new(Vec::new(), "Loop problem-1");
    writer.write_space(&space, Some(&distances)).unwrap();
    let written = writer.written();
    let source = String::from_utf8(writer.finish().unwrap()).unwrap();

    let parsed = parse_facts(&source).unwrap();
    assert_eq!(parsed.skipped, 0);
    assert_eq!(parsed.facts.len(), written);

    let read = FactSpace::from_facts(parsed.facts);
    assert_eq!(read.graph.state_count(), space.state_count());
    assert_eq!(read.graph.transition_count(), space.graph.transition_count());
    assert_eq!(read.goal_objects.len(), 1);

    let mut original: BTreeMap<(StateId, StateId), usize> = BTreeMap::new();
    for (from, to) in space.graph.transitions() {
        *original.entry((*from, *to)).or_default() += 1;
    }
    let mut decoded: BTreeMap<(StateId, StateId), usize> = BTreeMap::new();
    for (from, to) in read.graph.transitions() {
        assert!(from.starts_with("s_Loop_problem_1_"));
        let key = (
            StateId::from_token(from).unwrap(),
            StateId::from_token(to).unwrap(),
        );
        *decoded.entry(key).or_default() += 1;
    }
    assert_eq!(original, decoded);

    let initial = StateId::from_token(read.initial().unwrap()).unwrap();
    assert_eq!(Some(initial), space.initial());

    for (token, valuation) in &read.valuations {
        let id = StateId::from_token(token).unwrap();
        assert_eq!(space.valuation(id), Some(valuation));
        assert_eq!(valuation.id(), id);
    }

    // Distances recomputed on the reconstructed graph agree with the labels.
    let recomputed = goal_distances(&read.graph);
    assert_eq!(recomputed.len(), read.distances.len());
    for (state, distance) in &read.distances {
        assert_eq!(recomputed.get(state), Some(*distance));
    }
    assert_eq!(read.max_distance, Some(distances.max_distance()));
}
