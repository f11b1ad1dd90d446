//! End-to-end runs of `generate` and `compare` against a mock feed and
//! temporary files.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use portfolio_prep::dat::{read_list, read_matrix, read_set};
use portfolio_prep::{Alignment, AssetClass, Frequency, InstrumentProfile};
use portfolio_prep_feed::FeedError;
use portfolio_prep_feed::mock::MockFeed;
use portfolio_prep_planner::config::{Config, WindowConfig};
use portfolio_prep_planner::error::Error;
use portfolio_prep_planner::{compare, generate};
use tempfile::TempDir;

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

/// Daily closes for January 1..=28, growing by `step` per day.
fn january(start: f64, step: f64) -> Vec<(NaiveDate, f64)> {
    (1..=28).map(|d| (date(1, d), start + step * d as f64)).collect()
}

fn generate_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.data.symbols = vec!["SPY".into(), "TLT".into(), "ZZZ".into()];
    config.data.universe_size = 3;
    config.data.frequency = "W".into();
    config.data.window = Some(WindowConfig {
        start: date(1, 1),
        end: Some(date(1, 29)),
    });
    config.solver.output = dir.join("out").join("model.dat");
    config
}

// ============================================================================
// generate
// ============================================================================

#[test]
fn generate_writes_solver_file() {
    let dir = TempDir::new().unwrap();
    let config = generate_config(dir.path());
    let feed = MockFeed::builder()
        .with_series("SPY", january(100.0, 1.0))
        .with_series("TLT", january(50.0, -0.1))
        .with_profile(InstrumentProfile::new("SPY").with_kind("ETF"))
        .build();

    let summary = generate::run(&feed, &config, date(6, 1)).unwrap();
    assert_eq!(summary.dropped, vec!["ZZZ".to_string()]);
    assert_eq!(summary.classes["SPY"], AssetClass::Etf);
    // no live profile; the built-in table knows it
    assert_eq!(summary.classes["TLT"], AssetClass::Bonds);

    let text = fs::read_to_string(&config.solver.output).unwrap();
    assert!(text.starts_with("// --- Sets ---"));
    assert_eq!(read_set(&text, "I").unwrap(), vec!["SPY", "TLT"]);
    assert_eq!(read_set(&text, "C").unwrap(), vec!["Bonds", "ETF"]);
    // four Sunday-ending weeks, relabelled forward from the window end
    assert!(text.contains("H = 4;"));
    assert_eq!(
        read_set(&text, "D").unwrap(),
        vec!["2024-02-04", "2024-02-11", "2024-02-18", "2024-02-25"]
    );
    let r = read_matrix(&text, "r").unwrap();
    assert_eq!(r.len(), 2);
    assert!(r.iter().all(|row| row.len() == 4));
    assert!(r[0].iter().all(|&v| v > 0.0));
    assert!(r[1].iter().all(|&v| v < 0.0));
    assert_eq!(read_list(&text, "c_buy").unwrap(), vec![0.0005, 0.0008]);
    assert_eq!(read_list(&text, "X_max").unwrap(), vec![1.0, 1.0]);
    assert!(text.contains("W0 = 100;"));
}

#[test]
fn generate_applies_configured_limits() {
    let dir = TempDir::new().unwrap();
    let mut config = generate_config(dir.path());
    config.limits.assets.insert("spy".into(), [0.1, 0.6]);
    config.limits.classes.insert("Bonds".into(), [0.2, 0.5]);
    let feed = MockFeed::builder()
        .with_series("SPY", january(100.0, 1.0))
        .with_series("TLT", january(50.0, -0.1))
        .build();

    generate::run(&feed, &config, date(6, 1)).unwrap();
    let text = fs::read_to_string(&config.solver.output).unwrap();
    assert_eq!(read_list(&text, "X_min").unwrap(), vec![0.1, 0.0]);
    assert_eq!(read_list(&text, "X_max").unwrap(), vec![0.6, 1.0]);
    // SPY falls back to the built-in table as ETF
    assert_eq!(read_list(&text, "L").unwrap(), vec![0.2, 0.0]);
    assert_eq!(read_list(&text, "U").unwrap(), vec![0.5, 1.0]);
}

#[test]
fn generate_explicit_list_length_mismatch() {
    let dir = TempDir::new().unwrap();
    let mut config = generate_config(dir.path());
    config.limits.asset_lower = Some(vec![0.0]);
    config.limits.asset_upper = Some(vec![1.0]);
    let feed = MockFeed::builder()
        .with_series("SPY", january(100.0, 1.0))
        .with_series("TLT", january(50.0, -0.1))
        .build();

    let err = generate::run(&feed, &config, date(6, 1)).unwrap_err();
    assert!(matches!(err, Error::Prep(_)));
    assert!(!config.solver.output.exists());
}

#[test]
fn generate_offline_feed_is_data_unavailable() {
    let dir = TempDir::new().unwrap();
    let config = generate_config(dir.path());
    let feed = MockFeed::builder().offline().build();

    let err = generate::run(&feed, &config, date(6, 1)).unwrap_err();
    assert!(matches!(err, Error::DataUnavailable(FeedError::Connection(_))));
}

#[test]
fn generate_no_symbol_with_data() {
    let dir = TempDir::new().unwrap();
    let config = generate_config(dir.path());
    let feed = MockFeed::builder().build();

    let err = generate::run(&feed, &config, date(6, 1)).unwrap_err();
    assert!(matches!(err, Error::DataUnavailable(FeedError::NoData(_))));
}

// ============================================================================
// compare
// ============================================================================

const RESULTS: &str = "\
Variable,Activo,2024-01-31,2024-02-29
x,SPY,100.0,100.0
y,SPY,100.0,0.0
z,SPY,0.0,0.0
W,,100.0,101.0
";

fn compare_config(dir: &Path, results: &str, params: &str) -> Config {
    let mut config = Config::default();
    config.solver.results = dir.join("results.csv");
    config.solver.params = dir.join("params.txt");
    fs::write(&config.solver.results, results).unwrap();
    fs::write(&config.solver.params, params).unwrap();
    config
}

fn realized_feed() -> MockFeed {
    MockFeed::builder()
        .with_series("SPY", vec![
            (date(1, 31), 100.0),
            (date(2, 29), 110.0),
            (date(3, 28), 121.0),
        ])
        .build()
}

#[test]
fn compare_books_next_period_returns() {
    let dir = TempDir::new().unwrap();
    let config = compare_config(dir.path(), RESULTS, "Horizonte: 2\nCapital inicial (W0): 100\n");

    let run = compare::run(&realized_feed(), &config, date(12, 1)).unwrap();
    assert_eq!(run.frequency, Frequency::Monthly);
    assert_eq!(run.initial_capital, 100.0);

    let real = run.trajectory.real();
    assert_eq!(real.get(date(1, 31)), Some(100.0));
    assert!((real.get(date(2, 29)).unwrap() - 110.0).abs() < 1e-9);
    assert!((real.get(date(3, 31)).unwrap() - 120.0).abs() < 1e-9);

    assert_eq!(run.report.final_planned, Some(101.0));
    assert!((run.report.final_difference.unwrap() - 19.0).abs() < 1e-9);
    assert!((run.report.mean_abs_deviation.unwrap() - 4.5).abs() < 1e-9);
    assert!(run.report.to_string().contains("=== Plan vs Real ==="));
}

#[test]
fn compare_same_alignment() {
    let dir = TempDir::new().unwrap();
    let mut config = compare_config(dir.path(), RESULTS, "Capital inicial (W0): 100\n");
    config.compare.alignment = Alignment::Same;

    let run = compare::run(&realized_feed(), &config, date(12, 1)).unwrap();
    // only the 2024-02-29 decision has a realized period with the same label
    let real = run.trajectory.real();
    assert_eq!(real.get(date(1, 31)), Some(100.0));
    assert!((real.get(date(2, 29)).unwrap() - 110.0).abs() < 1e-9);
    assert!((real.get(date(3, 31)).unwrap() - 110.0).abs() < 1e-9);
}

#[test]
fn compare_week_without_prices_earns_nothing() {
    let dir = TempDir::new().unwrap();
    let results = "Variable,Activo,2024-01-07,2024-01-14\nx,SPY,100.0,100.0\nW,,100.0,100.0\n";
    let config = compare_config(dir.path(), results, "Capital inicial (W0): 100\n");
    // no closes in the week ending 2024-01-14
    let feed = MockFeed::builder()
        .with_series("SPY", vec![(date(1, 8), 100.0), (date(1, 19), 110.0)])
        .build();

    let run = compare::run(&feed, &config, date(12, 1)).unwrap();
    assert_eq!(run.frequency, Frequency::Weekly);
    let real = run.trajectory.real();
    assert_eq!(real.get(date(1, 14)), Some(100.0));
    // only the 2024-01-14 positions earn the week ending 2024-01-21
    assert!((run.report.final_real.unwrap() - 110.0).abs() < 1e-9);
}

#[test]
fn compare_zero_plan_is_undefined_percentage() {
    let dir = TempDir::new().unwrap();
    let results = "Variable,Activo,2024-01-31,2024-02-29\nx,SPY,0.0,0.0\nW,,0.0,0.0\n";
    let config = compare_config(dir.path(), results, "Capital inicial (W0): 100\n");

    let run = compare::run(&realized_feed(), &config, date(12, 1)).unwrap();
    assert_eq!(run.report.mean_pct_deviation, None);
    assert_eq!(run.report.undefined_pct_points, 2);
    assert!(run.report.to_string().contains("undefined"));
}

#[test]
fn compare_missing_params_file() {
    let dir = TempDir::new().unwrap();
    let mut config = compare_config(dir.path(), RESULTS, "");
    config.solver.params = dir.path().join("nope.txt");

    let err = compare::run(&realized_feed(), &config, date(12, 1)).unwrap_err();
    assert!(matches!(err, Error::FileRead { .. }));
}

#[test]
fn compare_params_without_capital_line() {
    let dir = TempDir::new().unwrap();
    let config = compare_config(dir.path(), RESULTS, "Horizonte: 2\n");

    let err = compare::run(&realized_feed(), &config, date(12, 1)).unwrap_err();
    let Error::MalformedFile { path, .. } = err else {
        panic!("expected MalformedFile, got {err}");
    };
    assert_eq!(path, config.solver.params);
}

#[test]
fn compare_malformed_results() {
    let dir = TempDir::new().unwrap();
    let config = compare_config(
        dir.path(),
        "Variable,Activo,2024-01-31\nx,SPY,1.0\n",
        "Capital inicial (W0): 100\n",
    );

    let err = compare::run(&realized_feed(), &config, date(12, 1)).unwrap_err();
    assert!(matches!(err, Error::MalformedFile { .. }));
}
