//! Tidy table export.
//!
//! Every output format goes through [`TableLayout`], so CSV headers and JSON
//! keys share one column order.

use cot_core::{CategoryConfig, CategorySignal, CrowdingDirection, NormalizedRow, Result, TraderCategory};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// One output value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    /// `None` and non-finite values are written as an empty CSV field or JSON `null`.
    Number(Option<f64>),
    Bool(bool),
}

impl Cell {
    fn to_csv_field(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(Some(v)) if v.is_finite() => v.to_string(),
            Cell::Number(_) => String::new(),
            Cell::Bool(b) => b.to_string(),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::Number(Some(v)) if v.is_finite() => serializer.serialize_f64(*v),
            Cell::Number(_) => serializer.serialize_none(),
            Cell::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

/// Column order for a set of tracked categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    categories: Vec<(TraderCategory, CrowdingDirection)>,
}

impl TableLayout {
    pub fn new(categories: &[CategoryConfig]) -> Self {
        Self {
            categories: categories.iter().map(|c| (c.category, c.direction)).collect(),
        }
    }

    /// Header names, in output order.
    pub fn header(&self) -> Vec<String> {
        let mut header: Vec<String> = ["report_date", "contract", "market_name", "open_interest"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        for (category, direction) in &self.categories {
            let id = category.column_prefix();
            for suffix in ["long", "short", "net", "net_pct_oi", "z_score", "percentile_rank"] {
                header.push(format!("{id}_{suffix}"));
            }
            header.push(format!("{id}_is_extreme_{direction}"));
            header.push(format!("{id}_is_confirmed_extreme_{direction}"));
        }

        header.push("extreme_crowding".to_string());
        header.push("trade_decision".to_string());
        header
    }

    /// Cells for one row, aligned with [`TableLayout::header`].
    ///
    /// A category missing from the row yields empty values and `false` flags.
    pub fn cells(&self, row: &NormalizedRow) -> Vec<Cell> {
        let mut cells = vec![
            Cell::Text(row.report_date.format("%Y-%m-%d").to_string()),
            Cell::Text(row.contract.code().to_string()),
            Cell::Text(row.market_name.clone()),
            Cell::Number(row.open_interest),
        ];

        for (category, _) in &self.categories {
            let signal = row.category(*category);
            let number = |f: fn(&CategorySignal) -> Option<f64>| Cell::Number(signal.and_then(f));
            let flag = |f: fn(&CategorySignal) -> bool| Cell::Bool(signal.is_some_and(f));

            cells.push(number(|s| s.long));
            cells.push(number(|s| s.short));
            cells.push(number(|s| s.net));
            cells.push(number(|s| s.net_pct_oi));
            cells.push(number(|s| s.z_score));
            cells.push(number(|s| s.percentile_rank));
            cells.push(flag(|s| s.is_extreme));
            cells.push(flag(|s| s.is_confirmed));
        }

        cells.push(Cell::Bool(row.extreme_crowding));
        cells.push(Cell::Text(row.trade_decision.as_str().to_string()));
        cells
    }

    /// Write CSV to any writer.
    pub fn write_csv_to<W: Write>(&self, writer: W, rows: &[NormalizedRow]) -> Result<()> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(self.header())?;
        for row in rows {
            out.write_record(self.cells(row).iter().map(Cell::to_csv_field))?;
        }
        out.flush()?;
        Ok(())
    }

    /// Write a JSON array of records to any writer.
    pub fn write_json_to<W: Write>(&self, writer: W, rows: &[NormalizedRow]) -> Result<()> {
        let table = JsonTable {
            header: self.header(),
            layout: self,
            rows,
        };
        serde_json::to_writer_pretty(writer, &table)?;
        Ok(())
    }
}

/// Serializes rows as objects whose keys follow the header order.
struct JsonTable<'a> {
    header: Vec<String>,
    layout: &'a TableLayout,
    rows: &'a [NormalizedRow],
}

impl Serialize for JsonTable<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in self.rows {
            seq.serialize_element(&JsonRecord {
                header: &self.header,
                cells: self.layout.cells(row),
            })?;
        }
        seq.end()
    }
}

struct JsonRecord<'a> {
    header: &'a [String],
    cells: Vec<Cell>,
}

impl Serialize for JsonRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (key, cell) in self.header.iter().zip(&self.cells) {
            map.serialize_entry(key, cell)?;
        }
        map.end()
    }
}

/// Write the tidy table as CSV, creating parent directories.
pub fn write_csv(path: &Path, layout: &TableLayout, rows: &[NormalizedRow]) -> Result<()> {
    let file = create_file(path)?;
    layout.write_csv_to(BufWriter::new(file), rows)?;
    info!(path = %path.display(), rows = rows.len(), "wrote CSV");
    Ok(())
}

/// Write the tidy table as JSON records, creating parent directories.
pub fn write_json(path: &Path, layout: &TableLayout, rows: &[NormalizedRow]) -> Result<()> {
    let file = create_file(path)?;
    let mut writer = BufWriter::new(file);
    layout.write_json_to(&mut writer, rows)?;
    writer.flush()?;
    info!(path = %path.display(), rows = rows.len(), "wrote JSON");
    Ok(())
}

fn create_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use cot_core::{Config, Contract, TradeDecision};

    fn signal(category: TraderCategory, direction: CrowdingDirection, z: Option<f64>) -> CategorySignal {
        CategorySignal {
            category,
            direction,
            long: Some(600.0),
            short: Some(100.0),
            net: Some(500.0),
            net_pct_oi: Some(50.0),
            z_score: z,
            percentile_rank: z.map(|_| 95.0),
            is_extreme: z.is_some(),
            is_confirmed: false,
        }
    }

    fn row() -> NormalizedRow {
        NormalizedRow {
            report_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            contract: Contract::Es,
            market_name: "E-MINI S&P 500".into(),
            open_interest: Some(1000.0),
            categories: vec![
                signal(TraderCategory::AssetManagers, CrowdingDirection::Long, Some(2.5)),
                signal(TraderCategory::LeveragedFunds, CrowdingDirection::Short, None),
            ],
            extreme_crowding: true,
            trade_decision: TradeDecision::No,
        }
    }

    fn layout() -> TableLayout {
        TableLayout::new(&Config::default().categories)
    }

    #[test]
    fn test_header_order() {
        let header = layout().header();
        assert_eq!(header.len(), 4 + 2 * 8 + 2);
        assert_eq!(&header[..5], ["report_date", "contract", "market_name", "open_interest", "am_long"]);
        assert_eq!(header[10], "am_is_extreme_long");
        assert_eq!(header[11], "am_is_confirmed_extreme_long");
        assert_eq!(header[19], "lf_is_confirmed_extreme_short");
        assert_eq!(header[21], "trade_decision");
    }

    #[test]
    fn test_cells_align_with_header() {
        let layout = layout();
        let cells = layout.cells(&row());
        assert_eq!(cells.len(), layout.header().len());
        assert_eq!(cells[0], Cell::Text("2024-01-02".into()));
        assert_eq!(cells[8], Cell::Number(Some(2.5)));
        assert_eq!(cells[16], Cell::Number(None));
        assert_eq!(cells[21], Cell::Text("NO".into()));
    }

    #[test]
    fn test_missing_category_is_empty() {
        let mut r = row();
        r.categories.truncate(1);
        let cells = layout().cells(&r);
        assert_eq!(cells[12], Cell::Number(None));
        assert_eq!(cells[18], Cell::Bool(false));
    }

    #[test]
    fn test_csv_empty_fields() {
        let mut out = Vec::new();
        layout().write_csv_to(&mut out, &[row()]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("report_date,contract,market_name,open_interest,am_long"));
        let fields: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(fields[8], "2.5");
        assert_eq!(fields[16], "");
        assert_eq!(fields[10], "true");
        assert_eq!(fields[20], "true");
    }

    #[test]
    fn test_json_key_order_and_nulls() {
        let mut out = Vec::new();
        layout().write_json_to(&mut out, &[row()]).unwrap();
        let text = String::from_utf8(out).unwrap();

        let date = text.find("\"report_date\"").unwrap();
        let decision = text.find("\"trade_decision\"").unwrap();
        assert!(date < decision);

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(value[0]["lf_z_score"].is_null());
        assert_eq!(value[0]["am_z_score"], 2.5);
        assert_eq!(value[0]["am_is_extreme_long"], true);
    }

    #[test]
    fn test_csv_non_finite_is_empty() {
        let mut r = row();
        r.categories[0].net_pct_oi = Some(f64::NAN);
        r.categories[0].z_score = Some(f64::INFINITY);
        assert_eq!(Cell::Number(Some(f64::NEG_INFINITY)).to_csv_field(), "");

        let mut out = Vec::new();
        layout().write_csv_to(&mut out, &[r]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let fields: Vec<&str> = text.lines().nth(1).unwrap().split(',').collect();

        assert_eq!(fields[7], "");
        assert_eq!(fields[8], "");
        assert_eq!(fields[9], "95");
        assert!(!text.contains("NaN"));
        assert!(!text.contains("inf"));
    }

    #[test]
    fn test_non_finite_number_is_null() {
        let cell = Cell::Number(Some(f64::NAN));
        assert_eq!(serde_json::to_string(&cell).unwrap(), "null");
    }
}
