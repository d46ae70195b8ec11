//! End-to-end scenarios for the signal pipeline.

use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};
use cot_core::{
    CategoryConfig, Config, Contract, CrowdingDirection, RawReportRow, TradeDecision,
    TraderCategory,
};
use cot_features::SignalEngine;

const OI: f64 = 1000.0;

fn week(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 3).unwrap() + Duration::weeks(i as i64)
}

/// Build a contract series from AM and LF net-percent values.
fn series(contract: Contract, am: &[f64], lf: &[f64]) -> Vec<RawReportRow> {
    am.iter()
        .zip(lf)
        .enumerate()
        .map(|(i, (&am_pct, &lf_pct))| {
            let am_net = am_pct * OI / 100.0;
            let lf_net = lf_pct * OI / 100.0;
            RawReportRow::new(week(i), contract, Some(OI))
                .with_positions(TraderCategory::AssetManagers, Some(200.0 + am_net), Some(200.0))
                .with_positions(TraderCategory::LeveragedFunds, Some(200.0 + lf_net), Some(200.0))
        })
        .collect()
}

fn config(lookback: usize, min_required: usize) -> Config {
    let mut config = Config::default();
    config.signal.lookback_weeks = lookback;
    config.signal.min_required_weeks = min_required;
    config
}

#[test]
fn test_known_z_and_percentile() {
    let engine = SignalEngine::new(&config(4, 2)).unwrap();
    let rows = series(Contract::Es, &[10.0, 20.0, 30.0, 40.0], &[0.0; 4]);
    let out = engine.compute(&rows);

    let am = out[3].category(TraderCategory::AssetManagers).unwrap();
    assert_relative_eq!(am.net_pct_oi.unwrap(), 40.0, epsilon = 1e-9);
    assert_relative_eq!(am.z_score.unwrap(), 1.1618950038622251, epsilon = 1e-7);
    assert_relative_eq!(am.percentile_rank.unwrap(), 100.0);

    // First week is below the two-observation floor
    let first = out[0].category(TraderCategory::AssetManagers).unwrap();
    assert!(first.z_score.is_none());
    assert!(first.percentile_rank.is_none());
}

#[test]
fn test_zero_open_interest_row_is_kept() {
    let engine = SignalEngine::new(&config(4, 1)).unwrap();
    let mut rows = series(Contract::Es, &[10.0, 20.0, 30.0], &[1.0, 2.0, 3.0]);
    rows[1].open_interest = Some(0.0);

    let out = engine.compute(&rows);
    assert_eq!(out.len(), 3);

    let row = &out[1];
    assert_eq!(row.report_date, week(1));
    for signal in &row.categories {
        assert!(signal.net_pct_oi.is_none());
        assert!(signal.z_score.is_none());
        assert!(signal.percentile_rank.is_none());
        assert!(!signal.is_extreme);
    }
    // Raw counts are still reported
    assert!(row.categories[0].long.is_some());
}

#[test]
fn test_missing_open_interest_row_is_kept() {
    let engine = SignalEngine::new(&config(4, 1)).unwrap();
    let mut rows = series(Contract::Nq, &[1.0, 2.0], &[1.0, 2.0]);
    rows[0].open_interest = None;

    let out = engine.compute(&rows);
    assert!(out[0].categories[0].net_pct_oi.is_none());
    // The gap does not poison later weeks
    assert!(out[1].categories[0].percentile_rank.is_some());
}

#[test]
fn test_two_week_confirmation() {
    let mut cfg = config(4, 2);
    cfg.signal.extreme_z_threshold = 100.0;
    cfg.signal.confirm_weeks = 2;
    let engine = SignalEngine::new(&cfg).unwrap();

    // AM keeps making new highs: percentile 100 once stats exist
    let out = engine.compute(&series(Contract::Es, &[10.0, 20.0, 30.0], &[0.0; 3]));
    let flags: Vec<bool> = out.iter().map(|r| r.categories[0].is_extreme).collect();
    let confirmed: Vec<bool> = out.iter().map(|r| r.categories[0].is_confirmed).collect();

    assert_eq!(flags, vec![false, true, true]);
    assert_eq!(confirmed, vec![false, false, true]);
    assert_eq!(out[2].trade_decision, TradeDecision::YesShort);
    assert_eq!(out[1].trade_decision, TradeDecision::No);
}

#[test]
fn test_conflict_decision() {
    let mut cfg = config(4, 2);
    cfg.signal.extreme_z_threshold = 0.5;
    let engine = SignalEngine::new(&cfg).unwrap();

    let out = engine.compute(&series(
        Contract::Es,
        &[10.0, 20.0, 30.0],
        &[-10.0, -20.0, -30.0],
    ));

    let am = out[2].category(TraderCategory::AssetManagers).unwrap();
    let lf = out[2].category(TraderCategory::LeveragedFunds).unwrap();
    assert!(am.is_confirmed);
    assert!(lf.is_confirmed);
    assert_eq!(out[2].trade_decision, TradeDecision::YesConflict);
}

#[test]
fn test_long_decision_from_leveraged_funds() {
    let mut cfg = config(4, 2);
    cfg.signal.extreme_z_threshold = 0.5;
    let engine = SignalEngine::new(&cfg).unwrap();

    // AM getting less long, LF getting shorter every week
    let out = engine.compute(&series(
        Contract::Nq,
        &[30.0, 20.0, 10.0],
        &[-10.0, -20.0, -30.0],
    ));
    assert_eq!(out[2].trade_decision, TradeDecision::YesLong);
}

#[test]
fn test_no_look_ahead() {
    let am: Vec<f64> = (0..30).map(|i| ((i * 13) % 11) as f64 - 4.0).collect();
    let lf: Vec<f64> = (0..30).map(|i| -(((i * 7) % 9) as f64)).collect();
    let rows = series(Contract::Es, &am, &lf);
    let engine = SignalEngine::new(&config(8, 3)).unwrap();
    let full = engine.compute(&rows);

    for end in 1..=rows.len() {
        let prefix = engine.compute(&rows[..end]);
        assert_eq!(prefix[end - 1], full[end - 1], "row {} changed with future data", end - 1);
    }
}

#[test]
fn test_z_undefined_below_floor() {
    let am: Vec<f64> = (0..10).map(|i| i as f64).collect();
    let rows = series(Contract::Es, &am, &am);
    let engine = SignalEngine::new(&config(6, 4)).unwrap();
    let out = engine.compute(&rows);

    for (i, row) in out.iter().enumerate() {
        let defined = row.categories[0].z_score.is_some();
        assert_eq!(defined, i + 1 >= 4, "row {i}");
    }
}

#[test]
fn test_deterministic() {
    let am: Vec<f64> = (0..20).map(|i| (i as f64 * 1.7).sin() * 10.0).collect();
    let lf: Vec<f64> = (0..20).map(|i| (i as f64 * 0.9).cos() * -8.0).collect();
    let mut rows = series(Contract::Es, &am, &lf);
    rows.extend(series(Contract::Nq, &lf, &am));

    let engine = SignalEngine::new(&config(10, 5)).unwrap();
    assert_eq!(engine.compute(&rows), engine.compute(&rows));
}

#[test]
fn test_contracts_are_isolated() {
    let engine = SignalEngine::new(&config(4, 2)).unwrap();
    let es = series(Contract::Es, &[10.0, 20.0, 30.0, 40.0], &[0.0; 4]);
    let nq = series(Contract::Nq, &[-5.0, 50.0, 3.0, 7.0], &[1.0; 4]);

    let mut mixed = es.clone();
    mixed.extend(nq);
    let together = engine.compute(&mixed);
    let alone = engine.compute(&es);

    assert_eq!(&together[..4], &alone[..]);
}

#[test]
fn test_unsorted_input_is_ordered() {
    let engine = SignalEngine::new(&config(4, 2)).unwrap();
    let mut rows = series(Contract::Es, &[10.0, 20.0, 30.0, 40.0], &[0.0; 4]);
    let sorted = engine.compute(&rows);
    rows.reverse();
    assert_eq!(engine.compute(&rows), sorted);
}

#[test]
fn test_additional_category_is_advisory() {
    let mut cfg = config(4, 2);
    cfg.signal.extreme_z_threshold = 0.5;
    cfg.categories.push(CategoryConfig::new(
        TraderCategory::Dealers,
        CrowdingDirection::Short,
    ));
    let engine = SignalEngine::new(&cfg).unwrap();

    let rows: Vec<RawReportRow> = series(Contract::Es, &[30.0, 20.0, 10.0], &[10.0, 20.0, 30.0])
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            let short = 100.0 + 100.0 * i as f64;
            row.with_positions(TraderCategory::Dealers, Some(100.0), Some(short))
        })
        .collect();
    let out = engine.compute(&rows);

    let dealers = out[2].category(TraderCategory::Dealers).unwrap();
    assert!(dealers.is_confirmed);
    assert_eq!(out[2].categories.len(), 3);
    assert_eq!(out[2].trade_decision, TradeDecision::No);
}
