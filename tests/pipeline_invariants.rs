//! End-to-end invariants of the estimation and simulation pipeline.
//!
//! Each test pins one numeric property with hand-computable data.

use chrono::NaiveDate;
use portfolio_prep::{
    Alignment, CompareOptions, DatWriter, Frame, Frequency, Horizon, PrepError, Series, aggregate,
    compare, compare_with, dat, estimate,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn frame(dates: Vec<NaiveDate>, cols: &[(&str, Vec<f64>)]) -> Frame {
    Frame::new(
        dates,
        cols.iter().map(|(s, _)| s.to_string()).collect(),
        cols.iter().map(|(_, c)| c.clone()).collect(),
    )
    .unwrap()
}

// ============================================================================
// Aggregation
// ============================================================================

#[test]
fn daily_prices_compound_into_one_week() {
    // Mon..Wed of the same week
    let prices = frame(
        vec![d(2024, 1, 1), d(2024, 1, 2), d(2024, 1, 3)],
        &[("SPY", vec![100.0, 110.0, 121.0])],
    );
    let (rets, dropped) = portfolio_prep::simple_returns(&prices);
    assert!(dropped.is_empty());
    assert_eq!(rets.n_dates(), prices.n_dates() - 1);

    let weekly = aggregate(&prices, Frequency::Weekly);
    assert_eq!(weekly.n_periods(), 1);
    assert_eq!(weekly.returns.dates(), &[d(2024, 1, 7)]);
    let r = weekly.returns.column("SPY").unwrap()[0];
    assert!((r - 0.21).abs() < 1e-12);
}

#[test]
fn periods_partition_the_range() {
    let dates: Vec<NaiveDate> = (1..=31).map(|day| d(2024, 1, day)).collect();
    let prices: Vec<f64> = (0..31).map(|i| 100.0 * 1.001f64.powi(i)).collect();
    let weekly = aggregate(&frame(dates, &[("A", prices)]), Frequency::Weekly);

    // returns run Jan 2..31 -> weeks ending 7, 14, 21, 28 and partial Feb 4
    assert_eq!(
        weekly.returns.dates(),
        &[d(2024, 1, 7), d(2024, 1, 14), d(2024, 1, 21), d(2024, 1, 28), d(2024, 2, 4)]
    );
    let total: f64 = weekly
        .returns
        .column("A")
        .unwrap()
        .iter()
        .fold(1.0, |acc, r| acc * (1.0 + r));
    assert!((total - 1.001f64.powi(30)).abs() < 1e-12);
}

// ============================================================================
// Estimation
// ============================================================================

#[test]
fn ewma_matches_hand_computation() {
    let returns = frame(
        vec![d(2024, 1, 31), d(2024, 2, 29), d(2024, 3, 31)],
        &[("A", vec![0.02, -0.01, 0.03])],
    );
    let agg = portfolio_prep::AggregatedReturnTable {
        frequency: Frequency::Monthly,
        returns,
        dropped: Vec::new(),
    };
    let t = estimate(&agg, 0.94, &Horizon::FromToday, d(2024, 4, 1)).unwrap();
    let e = t.row("A").unwrap();
    let e1 = 0.94 * 0.02 + 0.06 * -0.01;
    let e2 = 0.94 * e1 + 0.06 * 0.03;
    assert!((e[0] - 0.02).abs() < 1e-12);
    assert!((e[1] - 0.0182).abs() < 1e-12);
    assert!((e[2] - e2).abs() < 1e-12);
}

#[test]
fn relabel_preserves_count_in_every_mode() {
    let returns = frame(
        (1..=5).map(|m| Frequency::Monthly.period_end(d(2023, m, 1))).collect(),
        &[("A", vec![0.01; 5]), ("B", vec![0.02; 5])],
    );
    let agg = portfolio_prep::AggregatedReturnTable {
        frequency: Frequency::Monthly,
        returns,
        dropped: Vec::new(),
    };
    let today = d(2024, 7, 15);
    let horizons = [
        Horizon::FromToday,
        Horizon::Window {
            start: d(2022, 1, 1),
            end: Some(d(2023, 6, 30)),
        },
        Horizon::Window {
            start: d(2022, 1, 1),
            end: None,
        },
    ];
    for h in &horizons {
        let t = estimate(&agg, 0.9, h, today).unwrap();
        assert_eq!(t.n_periods(), 5);
        assert!(t.values.iter().all(|row| row.len() == 5));
        assert!(t.periods.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn invalid_lambda_rejected() {
    let agg = aggregate(
        &frame(vec![d(2024, 1, 1), d(2024, 1, 2)], &[("A", vec![1.0, 2.0])]),
        Frequency::Daily,
    );
    for lambda in [0.0, 1.0, -0.1, 1.5, f64::INFINITY, f64::NAN] {
        let err = estimate(&agg, lambda, &Horizon::FromToday, d(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, PrepError::InvalidParameter(_)), "lambda {lambda}");
    }
}

// ============================================================================
// Simulation
// ============================================================================

#[test]
fn zero_returns_keep_capital_flat() {
    let dates = vec![d(2024, 1, 31), d(2024, 2, 29), d(2024, 3, 31)];
    let weights = frame(dates.clone(), &[("A", vec![40.0, 50.0, 60.0]), ("B", vec![60.0, 50.0, 40.0])]);
    let realized = frame(dates.clone(), &[("A", vec![0.0; 3]), ("B", vec![0.0; 3])]);
    let planned: Series = dates.iter().zip([100.0, 103.0, 107.0]).map(|(&d, v)| (d, v)).collect();

    for alignment in [Alignment::Next, Alignment::Same] {
        let options = CompareOptions {
            alignment,
            ..CompareOptions::default()
        };
        let (traj, report) = compare_with(&weights, &planned, &realized, 100.0, &options);
        assert!(traj.points.iter().all(|p| p.real == Some(100.0)));
        assert_eq!(report.final_difference, Some(100.0 - 107.0));
    }
}

#[test]
fn symbol_without_returns_contributes_zero() {
    let dates = vec![d(2024, 1, 31), d(2024, 2, 29)];
    let weights = frame(dates.clone(), &[("A", vec![50.0, 50.0]), ("GHOST", vec![50.0, 50.0])]);
    let realized = frame(dates.clone(), &[("A", vec![0.1, 0.1])]);
    let planned: Series = vec![(dates[0], 100.0), (dates[1], 105.0)].into_iter().collect();

    let (traj, report) = compare(&weights, &planned, &realized, 100.0);
    // Jan positions earn Feb: 50 * 0.1 from A, nothing from GHOST
    assert_eq!(traj.real().get(dates[1]), Some(105.0));
    assert_eq!(report.final_difference, Some(0.0));
}

// ============================================================================
// Serialization
// ============================================================================

#[test]
fn expected_returns_survive_dat_round_trip() {
    let returns = frame(
        vec![d(2024, 1, 7), d(2024, 1, 14), d(2024, 1, 21)],
        &[
            ("MSFT", vec![0.0123456789, -0.004, 0.0301]),
            ("AAPL", vec![-0.02, 0.015, 0.0000004]),
        ],
    );
    let agg = portfolio_prep::AggregatedReturnTable {
        frequency: Frequency::Weekly,
        returns,
        dropped: Vec::new(),
    };
    let t = estimate(&agg, 0.94, &Horizon::FromToday, d(2024, 2, 1)).unwrap();

    let mut w = DatWriter::new();
    w.matrix("r", &t.values);
    let parsed = dat::read_matrix(&w.finish(), "r").unwrap();

    assert_eq!(parsed.len(), t.n_symbols());
    for (row, original) in parsed.iter().zip(&t.values) {
        assert_eq!(row.len(), original.len());
        for (a, b) in row.iter().zip(original) {
            assert!((a - b).abs() <= 5e-7, "{a} vs {b}");
        }
    }
}
