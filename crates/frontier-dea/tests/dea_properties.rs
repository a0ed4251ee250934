//! Batch-level properties of the DEA engine on random data.

use approx::assert_relative_eq;
use frontier_dea::{DeaConfig, DeaError, DeaModel, LpStatus, MetricMatrix};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_matrix(rng: &mut StdRng, rows: usize, cols: usize) -> Array2<f64> {
    Array2::from_shape_fn((rows, cols), |_| rng.gen_range(1.0..10.0))
}

fn tickers(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("T{i:03}")).collect()
}

fn model(seed: u64, units: usize, parallel: bool) -> DeaModel {
    let mut rng = StdRng::seed_from_u64(seed);
    let inputs = MetricMatrix::new(
        tickers(units),
        vec!["Trailing P/E".into(), "Price/Book".into(), "Price/Sales".into()],
        random_matrix(&mut rng, units, 3),
    )
    .unwrap();
    let outputs = MetricMatrix::new(
        tickers(units),
        vec!["Return on Equity".into(), "Profit Margin".into()],
        random_matrix(&mut rng, units, 2),
    )
    .unwrap();

    DeaModel::new(
        inputs,
        outputs,
        DeaConfig {
            parallel,
            ..Default::default()
        },
    )
    .unwrap()
}

#[test]
fn test_one_result_per_unit() {
    let solution = model(7, 25, true).solve();

    assert_eq!(solution.len(), 25);
    assert_eq!(solution.statuses().len(), 25);
    assert_eq!(solution.weights().len(), 25);
    assert_eq!(solution.efficiency().len(), 25);

    for (i, row) in solution.efficiency().rows().iter().enumerate() {
        assert_eq!(row.index, i);
        assert_eq!(row.unit, format!("T{i:03}"));
    }
}

#[test]
fn test_scores_bounded_by_one() {
    for seed in [1, 2, 3, 42] {
        let solution = model(seed, 30, true).solve();
        let mut frontier = 0;

        for result in solution.results() {
            assert_eq!(result.status, LpStatus::Optimal, "unit {}", result.unit);
            assert!(result.efficiency > 0.0);
            assert!(result.efficiency <= 1.0 + 1e-6, "unit {}", result.unit);
            if (result.efficiency - 1.0).abs() < 1e-6 {
                frontier += 1;
            }
        }

        // At least one unit always lies on the frontier.
        assert!(frontier >= 1);
    }
}

#[test]
fn test_dominating_unit_is_efficient() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut inputs = random_matrix(&mut rng, 12, 3);
    let mut outputs = random_matrix(&mut rng, 12, 2);

    // Unit 5: smallest inputs and largest outputs of all.
    inputs.row_mut(5).fill(0.5);
    outputs.row_mut(5).fill(20.0);

    let model = DeaModel::from_arrays(inputs, outputs, DeaConfig::default()).unwrap();
    let result = model.solve_unit(5).unwrap();

    assert_eq!(result.status, LpStatus::Optimal);
    assert_relative_eq!(result.efficiency, 1.0, epsilon = 1e-9);
}

#[test]
fn test_solve_order_independent() {
    let model = model(5, 20, false);
    let batch = model.solve();

    let forward: Vec<f64> = (0..20)
        .map(|j| model.solve_unit(j).unwrap().efficiency)
        .collect();
    let mut reverse: Vec<(usize, f64)> = (0..20)
        .rev()
        .map(|j| (j, model.solve_unit(j).unwrap().efficiency))
        .collect();
    reverse.sort_by_key(|(j, _)| *j);

    for j in 0..20 {
        assert_eq!(forward[j], reverse[j].1);
        assert_eq!(forward[j], batch.results()[j].efficiency);
    }
}

#[test]
fn test_parallel_matches_sequential() {
    let parallel = model(9, 40, true).solve();
    let sequential = model(9, 40, false).solve();
    assert_eq!(parallel.efficiency().scores(), sequential.efficiency().scores());
}

#[test]
fn test_row_count_mismatch() {
    let err = DeaModel::from_arrays(
        Array2::ones((5, 3)),
        Array2::ones((4, 2)),
        DeaConfig::default(),
    );
    assert!(matches!(err, Err(DeaError::DimensionMismatch(_))));
}

#[test]
fn test_infeasible_unit_does_not_block_batch() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut inputs = random_matrix(&mut rng, 8, 2);
    let outputs = random_matrix(&mut rng, 8, 2);
    inputs.row_mut(2).fill(0.0);

    let solution = DeaModel::from_arrays(inputs, outputs, DeaConfig::default())
        .unwrap()
        .solve();

    assert_eq!(solution.statuses()["2"], LpStatus::Infeasible);
    assert!(solution.efficiency().get("2").unwrap().efficiency.is_nan());
    assert_eq!(solution.status_counts()["Optimal"], 7);
}
