//! End-to-end scenarios driving a session the way a test framework would.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use lazypair::{PairwiseError, Session, SessionConfig};

/// Run `body` until the session reports completion, collecting the picks
fn drive<F>(session: &mut Session<String>, limit: usize, mut body: F) -> Vec<Vec<u16>>
where
    F: FnMut(&mut Session<String>) -> Vec<u16>,
{
    let mut runs = Vec::new();
    loop {
        session.start_new_run().unwrap();
        runs.push(body(session));
        if !session.has_pending_combinations().unwrap() {
            return runs;
        }
        assert!(runs.len() < limit, "no termination after {limit} runs");
    }
}

fn pick(session: &mut Session<String>, name: &str, combine: bool, size: u16) -> u16 {
    session.pick(name.to_string(), combine, size).unwrap()
}

fn covers(runs: &[Vec<u16>], i: usize, j: usize, x: u16, y: u16) -> bool {
    runs.iter().any(|run| run[i] == x && run[j] == y)
}

// ============================================================================
// Unconditional parameters
// ============================================================================

#[test]
fn test_three_booleans_pairwise() {
    let mut session = Session::new();
    let runs = drive(&mut session, 20, |s| {
        vec![
            pick(s, "a", true, 2),
            pick(s, "b", true, 2),
            pick(s, "c", true, 2),
        ]
    });
    assert!((4..=8).contains(&runs.len()), "{} runs", runs.len());
    for (i, j) in [(0, 1), (0, 2), (1, 2)] {
        for x in 0..2 {
            for y in 0..2 {
                assert!(covers(&runs, i, j, x, y), "pair ({i}={x}, {j}={y}) missing");
            }
        }
    }
}

#[test]
fn test_wide_parameters_stay_below_cartesian_product() {
    let mut session = Session::new();
    let runs = drive(&mut session, 1000, |s| {
        vec![
            pick(s, "os", true, 3),
            pick(s, "browser", true, 4),
            pick(s, "locale", true, 3),
            pick(s, "theme", true, 2),
        ]
    });
    assert!(runs.len() < 3 * 4 * 3 * 2);
    assert!(runs.len() >= 12);
    assert_eq!(session.open_pairs(), 0);
    let sizes = [3, 4, 3, 2];
    for i in 0..4 {
        for j in i + 1..4 {
            for x in 0..sizes[i] {
                for y in 0..sizes[j] {
                    assert!(covers(&runs, i, j, x, y));
                }
            }
        }
    }
}

/// Drive a chain of combined parameters of the given sizes
fn chain(sizes: &[u16]) -> (Vec<Vec<u16>>, usize) {
    let mut session = Session::new();
    let runs = drive(&mut session, 10_000, |s| {
        sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| pick(s, &format!("p{i}"), true, size))
            .collect()
    });
    (runs, session.open_pairs())
}

/// Runs allowed for a combined chain: `max_domain^2 * parameters`
fn polynomial_bound(sizes: &[u16]) -> usize {
    let widest = sizes.iter().copied().max().unwrap_or(1) as usize;
    widest * widest * sizes.len()
}

#[test]
fn test_fifteen_booleans_polynomial_runs() {
    let sizes = [2; 15];
    let (runs, open_pairs) = chain(&sizes);
    assert!(runs.len() <= polynomial_bound(&sizes), "{} runs", runs.len());
    assert_eq!(open_pairs, 0);
    for i in 0..sizes.len() {
        for j in i + 1..sizes.len() {
            for x in 0..2 {
                for y in 0..2 {
                    assert!(covers(&runs, i, j, x, y));
                }
            }
        }
    }
}

#[test]
fn test_twenty_ternary_parameters_polynomial_runs() {
    let sizes = [3; 20];
    let (runs, open_pairs) = chain(&sizes);
    assert!(runs.len() <= polynomial_bound(&sizes), "{} runs", runs.len());
    assert_eq!(open_pairs, 0);
}

#[test]
fn test_uncombined_parameter_does_not_multiply_runs() {
    let mut session = Session::new();
    let runs = drive(&mut session, 100, |s| {
        vec![pick(s, "a", true, 2), pick(s, "b", true, 2), pick(s, "seed", false, 3)]
    });
    assert_eq!(runs.len(), 4);
    let summary = session.summary();
    assert!(summary.complete);
    assert_eq!(summary.untouched_values, 0);
    let seed = summary
        .definitions
        .iter()
        .find(|definition| definition.id == "\"seed\"")
        .unwrap();
    assert!(!seed.combined);
    assert!(seed.value_counts.iter().all(|&count| count >= 1));
}

// ============================================================================
// Control flow that depends on earlier picks
// ============================================================================

#[test]
fn test_conditional_parameter() {
    let mut session = Session::new();
    let runs = drive(&mut session, 20, |s| {
        let a = pick(s, "a", true, 2);
        let b = if a == 1 { Some(pick(s, "b", true, 3)) } else { None };
        let c = pick(s, "c", true, 2);
        vec![a, b.unwrap_or(u16::MAX), c]
    });
    assert!(runs.len() <= 8);
    for a in 0..2 {
        for c in 0..2 {
            assert!(covers(&runs, 0, 2, a, c));
        }
    }
    for b in 0..3 {
        assert!(covers(&runs, 0, 1, 1, b));
        for c in 0..2 {
            assert!(covers(&runs, 1, 2, b, c));
        }
    }
}

#[test]
fn test_variable_length_list() {
    let mut session = Session::new();
    let runs = drive(&mut session, 20, |s| {
        let len = pick(s, "len", true, 3);
        let mut run = vec![len];
        for _ in 0..len {
            run.push(pick(s, "item", true, 2));
        }
        run
    });
    assert!(runs.len() <= 7);
    for len in 0..3 {
        assert!(runs.iter().any(|run| run[0] == len));
    }
    assert_eq!(session.summary().untouched_values, 0);
}

// ============================================================================
// Inconsistent repetition
// ============================================================================

#[test]
fn test_alternating_parameters_detected() {
    let mut session = Session::new();
    session.start_new_run().unwrap();
    pick(&mut session, "first", true, 2);
    session.has_pending_combinations().unwrap();

    session.start_new_run().unwrap();
    let err = session.pick("second".to_string(), true, 2).unwrap_err();
    assert!(matches!(err, PairwiseError::InconsistentRepetition { .. }));
    let message = err.to_string();
    assert!(message.contains("first"));
    assert!(message.contains("second"));
    assert!(session.is_poisoned());
    let aborted = session.has_pending_combinations().unwrap_err();
    assert!(aborted.to_string().contains("first"));
}

// ============================================================================
// Determinism and configuration
// ============================================================================

fn replay(config: SessionConfig) -> Vec<Vec<u16>> {
    let mut session = Session::with_config(config);
    drive(&mut session, 500, |s| {
        let x = pick(s, "x", true, 7);
        let y = pick(s, "y", true, 5);
        let z = if y % 2 == 0 { pick(s, "z", true, 3) } else { pick(s, "w", false, 4) };
        vec![x, y, z]
    })
}

#[test]
fn test_replay_is_deterministic() {
    assert_eq!(replay(SessionConfig::default()), replay(SessionConfig::default()));
    let without = SessionConfig::default().without_parking();
    assert_eq!(replay(without), replay(without));
}

#[test]
fn test_config_from_yaml_drives_session() {
    let config = SessionConfig::from_yaml_str("parking:\n  enabled: false\n").unwrap();
    let mut session = Session::with_config(config);
    let runs = drive(&mut session, 100, |s| vec![pick(s, "a", true, 6), pick(s, "b", true, 6)]);
    assert_eq!(runs[1], vec![1, 1]);
    assert!(runs.len() <= 36);
}

#[test]
fn test_summary_json_export() {
    let mut session = Session::new();
    drive(&mut session, 10, |s| vec![pick(s, "a", true, 2)]);
    let json = session.summary().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["runs"], 2);
    assert_eq!(value["complete"], true);
    assert_eq!(value["definitions"][0]["value_counts"], serde_json::json!([1, 1]));
}

// ============================================================================
// Property tests
// ============================================================================

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    fn shape() -> impl Strategy<Value = Vec<(u16, bool)>> {
        prop::collection::vec((1u16..=4, any::<bool>()), 1..=4)
    }

    fn run_shape(shape: &[(u16, bool)]) -> Vec<Vec<u16>> {
        let mut session = Session::new();
        drive(&mut session, 1000, |s| {
            shape
                .iter()
                .enumerate()
                .map(|(i, &(size, combine))| pick(s, &format!("p{i}"), combine, size))
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_runs_bounded_by_cartesian_product(shape in shape()) {
            let runs = run_shape(&shape);
            let product: usize = shape.iter().map(|&(size, _)| size as usize).product();
            prop_assert!(runs.len() <= product);
        }

        #[test]
        fn prop_combined_pairs_covered(shape in shape()) {
            let runs = run_shape(&shape);
            for i in 0..shape.len() {
                for j in i + 1..shape.len() {
                    if !(shape[i].1 && shape[j].1) {
                        continue;
                    }
                    for x in 0..shape[i].0 {
                        for y in 0..shape[j].0 {
                            prop_assert!(covers(&runs, i, j, x, y));
                        }
                    }
                }
            }
        }

        #[test]
        fn prop_every_value_touched(shape in shape()) {
            let runs = run_shape(&shape);
            for (i, &(size, _)) in shape.iter().enumerate() {
                for x in 0..size {
                    prop_assert!(runs.iter().any(|run| run[i] == x));
                }
            }
        }

        #[test]
        fn prop_combined_chain_runs_polynomial(
            sizes in prop::collection::vec(2u16..=4, 5..=12)
        ) {
            let (runs, open_pairs) = chain(&sizes);
            prop_assert!(runs.len() <= polynomial_bound(&sizes));
            prop_assert_eq!(open_pairs, 0);
        }

        #[test]
        fn prop_replay_is_deterministic(shape in shape()) {
            prop_assert_eq!(run_shape(&shape), run_shape(&shape));
        }
    }
}
