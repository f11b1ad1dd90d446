//! Solver data file (`.dat`) writer.
//!
//! Output layout:
//!
//! ```text
//! // --- Sets ---
//! I = { "AAPL", "SPY" };
//!
//! H = 2;
//!
//! D = { "2024-05-31", "2024-06-30" };
//!
//! C = { "ETF", "Stocks" };
//!
//! // --- Parameters ---
//! r = [
//!   [0.012000, 0.011500]
//!   [0.004000, 0.004100]
//! ];
//! ...
//! ```
//!
//! Symbols are sorted, periods chronological, reals printed with six
//! decimals. A few readers are provided to parse the numeric blocks back.

use std::collections::BTreeMap;

use log::warn;

use crate::classify::{AssetClass, MembershipMatrix};
use crate::costs::CostSchedule;
use crate::error::{PrepError, Result};
use crate::estimate::ExpectedReturnTable;
use crate::limits::BoundTable;

/// Incremental builder for the solver's text format.
#[derive(Debug, Default)]
pub struct DatWriter {
    out: String,
}

fn real(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.6}")
    } else {
        warn!("non-finite value {v} written as 0");
        format!("{:.6}", 0.0)
    }
}

impl DatWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn comment(&mut self, text: &str) -> &mut Self {
        self.out.push_str(&format!("// {text}\n"));
        self
    }

    /// `name = { "a", "b" };`
    pub fn set<S: AsRef<str>>(&mut self, name: &str, items: &[S]) -> &mut Self {
        let joined = items
            .iter()
            .map(|s| format!("\"{}\"", s.as_ref()))
            .collect::<Vec<_>>()
            .join(", ");
        self.out.push_str(&format!("{name} = {{ {joined} }};\n\n"));
        self
    }

    /// `name = value;` with the value's own `Display`.
    pub fn value(&mut self, name: &str, value: impl std::fmt::Display) -> &mut Self {
        self.out.push_str(&format!("{name} = {value};\n\n"));
        self
    }

    /// `name = [v, v];`
    pub fn list(&mut self, name: &str, values: &[f64]) -> &mut Self {
        let joined = values.iter().map(|&v| real(v)).collect::<Vec<_>>().join(", ");
        self.out.push_str(&format!("{name} = [{joined}];\n\n"));
        self
    }

    /// One bracketed row per line.
    pub fn matrix(&mut self, name: &str, rows: &[Vec<f64>]) -> &mut Self {
        self.out.push_str(&format!("{name} = [\n"));
        for row in rows {
            let joined = row.iter().map(|&v| real(v)).collect::<Vec<_>>().join(", ");
            self.out.push_str(&format!("  [{joined}]\n"));
        }
        self.out.push_str("];\n\n");
        self
    }

    /// Integer matrix, used for 0/1 membership.
    pub fn binary_matrix(&mut self, name: &str, rows: &[Vec<u8>]) -> &mut Self {
        self.out.push_str(&format!("{name} = [\n"));
        for row in rows {
            let joined = row.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ");
            self.out.push_str(&format!("  [{joined}]\n"));
        }
        self.out.push_str("];\n\n");
        self
    }

    pub fn finish(self) -> String {
        self.out
    }
}

/// Everything the solver needs, already aligned.
#[derive(Debug)]
pub struct SolverInput<'a> {
    pub expected: &'a ExpectedReturnTable,
    /// Symbol -> class for exactly the symbols of `expected`.
    pub classes: &'a BTreeMap<String, AssetClass>,
    pub initial_capital: f64,
    /// Aligned with the membership matrix's class columns.
    pub class_bounds: &'a BoundTable,
    /// Aligned with `expected.symbols`.
    pub asset_bounds: &'a BoundTable,
    pub costs: &'a CostSchedule,
}

impl SolverInput<'_> {
    /// Render the complete `.dat` text, checking that every table lines up.
    pub fn render(&self) -> Result<String> {
        let symbols = &self.expected.symbols;
        let class_symbols: Vec<&String> = self.classes.keys().collect();
        if class_symbols.len() != symbols.len() || class_symbols.iter().zip(symbols).any(|(a, b)| *a != b) {
            return Err(PrepError::shape("classified symbols", symbols.len(), class_symbols.len()));
        }
        let g = MembershipMatrix::from_classes(self.classes);
        if self.class_bounds.len() != g.classes.len() {
            return Err(PrepError::shape("class bounds", g.classes.len(), self.class_bounds.len()));
        }
        if self.asset_bounds.len() != symbols.len() {
            return Err(PrepError::shape("asset bounds", symbols.len(), self.asset_bounds.len()));
        }
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(PrepError::InvalidParameter(format!(
                "initial capital must be positive, got {}",
                self.initial_capital
            )));
        }

        let dates: Vec<String> = self
            .expected
            .periods
            .iter()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .collect();
        let (c_buy, c_sell) = self.costs.rates(self.classes);

        let mut w = DatWriter::new();
        w.comment("--- Sets ---")
            .set("I", symbols)
            .value("H", dates.len())
            .set("D", &dates)
            .set("C", &g.class_labels())
            .comment("--- Parameters ---")
            .matrix("r", &self.expected.values)
            .list("c_buy", &c_buy)
            .list("c_sell", &c_sell)
            .binary_matrix("g", &g.cells)
            .value("W0", self.initial_capital)
            .list("L", &self.class_bounds.lower())
            .list("U", &self.class_bounds.upper())
            .list("X_min", &self.asset_bounds.lower())
            .list("X_max", &self.asset_bounds.upper());
        Ok(w.finish())
    }
}

fn parse_reals(body: &str) -> Option<Vec<f64>> {
    let body = body.trim();
    if body.is_empty() {
        return Some(Vec::new());
    }
    body.split(',').map(|v| v.trim().parse::<f64>().ok()).collect()
}

/// Parse the matrix block `name = [ ... ];`.
pub fn read_matrix(text: &str, name: &str) -> Option<Vec<Vec<f64>>> {
    let header = format!("{name} = [");
    let mut lines = text.lines().skip_while(|l| l.trim_end() != header);
    lines.next()?;
    let mut rows = Vec::new();
    for line in lines {
        let line = line.trim();
        if line == "];" {
            return Some(rows);
        }
        let inner = line.strip_prefix('[')?.strip_suffix(']')?;
        rows.push(parse_reals(inner)?);
    }
    None
}

/// Parse the single-line list `name = [v, v];`.
pub fn read_list(text: &str, name: &str) -> Option<Vec<f64>> {
    let prefix = format!("{name} = [");
    let line = text.lines().find(|l| l.starts_with(&prefix) && l.ends_with("];"))?;
    parse_reals(line.strip_prefix(&prefix)?.strip_suffix("];")?)
}

/// Parse the set `name = { "a", "b" };`.
pub fn read_set(text: &str, name: &str) -> Option<Vec<String>> {
    let prefix = format!("{name} = {{");
    let line = text.lines().find(|l| l.starts_with(&prefix))?;
    let body = line.strip_prefix(&prefix)?.strip_suffix("};")?.trim();
    if body.is_empty() {
        return Some(Vec::new());
    }
    body.split(',')
        .map(|s| s.trim().strip_prefix('"')?.strip_suffix('"').map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::Frequency;
    use crate::limits::Bounds;
    use chrono::NaiveDate;

    fn expected() -> ExpectedReturnTable {
        ExpectedReturnTable {
            frequency: Frequency::Monthly,
            symbols: vec!["AAPL".into(), "SPY".into()],
            periods: vec![
                NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
                NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            ],
            values: vec![vec![0.012, 0.0115], vec![0.004, 0.0041]],
        }
    }

    fn classes() -> BTreeMap<String, AssetClass> {
        let mut m = BTreeMap::new();
        m.insert("AAPL".to_string(), AssetClass::Stocks);
        m.insert("SPY".to_string(), AssetClass::Etf);
        m
    }

    #[test]
    fn set_and_value_format() {
        let mut w = DatWriter::new();
        w.set("I", &["A", "B"]).value("H", 3);
        assert_eq!(w.finish(), "I = { \"A\", \"B\" };\n\nH = 3;\n\n");
    }

    #[test]
    fn matrix_format() {
        let mut w = DatWriter::new();
        w.matrix("r", &[vec![0.1, 0.2], vec![0.3, 0.4]]);
        assert_eq!(
            w.finish(),
            "r = [\n  [0.100000, 0.200000]\n  [0.300000, 0.400000]\n];\n\n"
        );
    }

    #[test]
    fn comment_list_and_binary_matrix_format() {
        let mut w = DatWriter::new();
        w.comment("--- Bounds ---")
            .list("X_max", &[0.5, f64::NAN])
            .binary_matrix("M", &[vec![1, 0], vec![0, 1]]);
        assert_eq!(
            w.finish(),
            "// --- Bounds ---\nX_max = [0.500000, 0.000000];\n\nM = [\n  [1, 0]\n  [0, 1]\n];\n\n"
        );
    }

    #[test]
    fn render_full_file() {
        let exp = expected();
        let cls = classes();
        let c_labels = vec!["ETF".to_string(), "Stocks".to_string()];
        let class_bounds = BoundTable::uniform(&c_labels, Bounds::new(0.0, 0.8).unwrap());
        let asset_bounds = BoundTable::uniform(&exp.symbols, Bounds::new(0.0, 0.5).unwrap());
        let costs = CostSchedule::default();
        let text = SolverInput {
            expected: &exp,
            classes: &cls,
            initial_capital: 100.0,
            class_bounds: &class_bounds,
            asset_bounds: &asset_bounds,
            costs: &costs,
        }
        .render()
        .unwrap();

        assert!(text.starts_with("// --- Sets ---\nI = { \"AAPL\", \"SPY\" };"));
        assert!(text.contains("H = 2;"));
        assert!(text.contains("D = { \"2024-05-31\", \"2024-06-30\" };"));
        assert!(text.contains("C = { \"ETF\", \"Stocks\" };"));
        assert!(text.contains("g = [\n  [0, 1]\n  [1, 0]\n];"));
        assert!(text.contains("W0 = 100;"));
        assert!(text.contains("X_max = [0.500000, 0.500000];"));
        assert_eq!(read_list(&text, "c_buy").unwrap(), vec![0.001, 0.0005]);
        assert_eq!(read_set(&text, "I").unwrap(), vec!["AAPL", "SPY"]);
        assert_eq!(read_matrix(&text, "r").unwrap(), exp.values);
    }

    #[test]
    fn render_rejects_misaligned_class_bounds() {
        let exp = expected();
        let cls = classes();
        let class_bounds = BoundTable::uniform(&["ETF".to_string()], Bounds::unrestricted());
        let asset_bounds = BoundTable::uniform(&exp.symbols, Bounds::unrestricted());
        let costs = CostSchedule::default();
        let err = SolverInput {
            expected: &exp,
            classes: &cls,
            initial_capital: 100.0,
            class_bounds: &class_bounds,
            asset_bounds: &asset_bounds,
            costs: &costs,
        }
        .render()
        .unwrap_err();
        assert_eq!(err, PrepError::shape("class bounds", 2, 1));
    }

    #[test]
    fn empty_matrix_parses() {
        let mut w = DatWriter::new();
        w.matrix("r", &[]);
        let text = w.finish();
        assert_eq!(read_matrix(&text, "r").unwrap(), Vec::<Vec<f64>>::new());
    }

    #[test]
    fn missing_block_is_none() {
        assert!(read_matrix("H = 1;\n", "r").is_none());
        assert!(read_list("H = 1;\n", "L").is_none());
    }
}
