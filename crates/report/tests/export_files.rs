//! Writing engine output to disk.

use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};
use cot_core::{Config, Contract, RawReportRow, TraderCategory};
use cot_features::SignalEngine;
use cot_report::{render_summary, write_csv, write_json, TableLayout};

fn rows() -> Vec<RawReportRow> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 3).unwrap();
    (0..4)
        .map(|i| {
            let oi = if i == 1 { Some(0.0) } else { Some(1000.0) };
            RawReportRow::new(start + Duration::weeks(i), Contract::Es, oi)
                .with_positions(TraderCategory::AssetManagers, Some(300.0 + 100.0 * i as f64), Some(200.0))
                .with_positions(TraderCategory::LeveragedFunds, Some(100.0), None)
        })
        .collect()
}

fn engine_output() -> (Config, Vec<cot_core::NormalizedRow>) {
    let mut config = Config::default();
    config.signal.lookback_weeks = 4;
    config.signal.min_required_weeks = 2;
    let out = SignalEngine::new(&config).unwrap().compute(&rows());
    (config, out)
}

#[test]
fn test_csv_file() {
    let (config, out) = engine_output();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/out/signals.csv");

    write_csv(&path, &TableLayout::new(&config.categories), &out).unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let header: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(header.first().map(String::as_str), Some("report_date"));
    assert_eq!(header.last().map(String::as_str), Some("trade_decision"));

    let records: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(records.len(), 4);

    let col = |name: &str| header.iter().position(|h| h == name).unwrap();
    // Zero open interest: no ratio, row still present
    assert_eq!(&records[1][col("am_net_pct_oi")], "");
    assert_eq!(&records[1][col("report_date")], "2023-01-10");
    // Missing short side: no net
    assert_eq!(&records[0][col("lf_net")], "");
    assert_eq!(&records[3][col("am_net_pct_oi")], "40");
    assert_eq!(&records[3][col("am_is_extreme_long")], "true");
}

#[test]
fn test_json_file() {
    let (config, out) = engine_output();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("signals.json");

    write_json(&path, &TableLayout::new(&config.categories), &out).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    let records = value.as_array().unwrap();
    assert_eq!(records.len(), 4);

    assert!(records[1]["am_z_score"].is_null());
    assert!(records[0]["am_z_score"].is_null());
    assert_relative_eq!(records[3]["am_percentile_rank"].as_f64().unwrap(), 100.0);
    assert_eq!(records[3]["contract"], "ES");
    assert_eq!(records[3]["am_is_confirmed_extreme_long"], true);
    assert_eq!(records[3]["trade_decision"], "YES_SHORT");
}

#[test]
fn test_summary_from_engine() {
    let (_, out) = engine_output();
    let text = render_summary(&out);
    assert!(text.starts_with("Latest report date: 2023-01-24\n"));
    assert!(text.contains("ES [2023-01-24]: AM long"));
    assert!(text.contains("LF short z=n/a"));
}
