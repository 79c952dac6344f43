use plangraph::{distance::goal_distances, graph::StateGraph};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

fn random_graph(rng: &mut ChaCha20Rng, states: u32) -> StateGraph<u32> {
    let mut graph = StateGraph::new();
    for state in 0..states {
        graph.add_state(state);
        if rng.random_bool(0.15) {
            graph.mark_goal(state);
        }
    }
    let edges = rng.random_range(0..states * 3);
    for _ in 0..edges {
        graph.add_transition(rng.random_range(0..states), rng.random_range(0..states));
    }
    graph
}

/// Goals are at 0, every other labeled state is one more than its best
/// labeled successor, and unlabeled states have no labeled successor.
#[test]
fn labels_satisfy_the_bellman_equation() {
    let mut rng = ChaCha20Rng::seed_from_u64(0x5eed);

    for _ in 0..200 {
        let states = rng.random_range(1..30);
        let graph = random_graph(&mut rng, states);
        let distances = goal_distances(&graph);

        let mut max = 0;
        for state in graph.states() {
            let best_successor = graph.successors(state).filter_map(|s| distances.get(s)).min();
            match distances.get(state) {
                Some(0) => assert!(graph.is_goal(state)),
                Some(distance) => {
                    assert!(!graph.is_goal(state));
                    assert_eq!(best_successor, Some(distance - 1));
                    max = max.max(distance);
                }
                None => {
                    assert!(!graph.is_goal(state));
                    assert_eq!(best_successor, None);
                }
            }
        }
        assert_eq!(distances.max_distance(), max);
        assert_eq!(
            graph.goals().count(),
            distances.iter().filter(|(_, d)| *d == 0).count()
        );
    }
}
