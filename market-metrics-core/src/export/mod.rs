//! Append-only CSV export of per-symbol statistics

use crate::exchanges::{MetricsError, MetricsResult};
use crate::metrics::StatsSnapshot;
use chrono::NaiveDateTime;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::info;

pub const CSV_HEADER: [&str; 10] = [
    "Timestamp",
    "Symbol",
    "Trades",
    "AvgQty",
    "AvgPrice",
    "TotValue",
    "MinPrice",
    "MaxPrice",
    "Buy/Sell",
    "ChangePercent",
];

/// Timestamp layout of the first column
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Appends one row per symbol to a CSV file on every export.
///
/// The file is opened in append mode for each write and never truncated.
#[derive(Debug)]
pub struct CsvExporter {
    path: PathBuf,
}

impl CsvExporter {
    /// Create parent directories and append the header line
    pub fn create(path: impl Into<PathBuf>) -> MetricsResult<Self> {
        let exporter = Self { path: path.into() };

        if let Some(parent) = exporter.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| exporter.io_error(source))?;
        }

        let mut writer = exporter.writer()?;
        writer.write_record(CSV_HEADER)?;
        writer.flush().map_err(|source| exporter.io_error(source))?;

        info!(path = %exporter.path.display(), "CSV export enabled");
        Ok(exporter)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `snapshot` stamped with `timestamp`; returns the rows written
    pub fn export(&self, snapshot: &StatsSnapshot, timestamp: NaiveDateTime) -> MetricsResult<usize> {
        let stamp = timestamp.format(TIMESTAMP_FORMAT).to_string();
        let mut writer = self.writer()?;

        for (symbol, stats) in snapshot {
            writer.write_record([
                stamp.clone(),
                symbol.to_string(),
                stats.trade_count.to_string(),
                format!("{:.2}", stats.average_quantity),
                format!("{:.2}", stats.average_price),
                format!("{:.2}", stats.total_value),
                format!("{:.2}", stats.min_price),
                format!("{:.2}", stats.max_price),
                format!("{:.2}", stats.buy_sell_ratio),
                format!("{:.2}", stats.price_change_percent),
            ])?;
        }

        writer.flush().map_err(|source| self.io_error(source))?;
        Ok(snapshot.len())
    }

    fn writer(&self) -> MetricsResult<csv::Writer<File>> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.io_error(source))?;

        Ok(csv::WriterBuilder::new().has_headers(false).from_writer(file))
    }

    fn io_error(&self, source: std::io::Error) -> MetricsError {
        MetricsError::Export {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchanges::{Side, Symbol, Trade, TradeId};
    use crate::metrics::MetricsCollector;
    use chrono::{Local, NaiveDate};

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_milli_opt(9, 30, 0, 125)
            .unwrap()
    }

    #[test]
    fn test_header_written_once_per_create() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/report/metrics.csv");

        let exporter = CsvExporter::create(&path).unwrap();
        exporter.export(&StatsSnapshot::new(), timestamp()).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "Timestamp,Symbol,Trades,AvgQty,AvgPrice,TotValue,MinPrice,MaxPrice,Buy/Sell,ChangePercent\n"
        );
    }

    #[test]
    fn test_rows_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");
        let collector = MetricsCollector::default();
        for side in [Side::Buy, Side::Sell] {
            let trade = Trade::new(TradeId(1), "NYSE", Symbol::new("IBM"), 100.0, 5, side, Local::now()).unwrap();
            collector.record_trade(&trade);
        }

        let exporter = CsvExporter::create(&path).unwrap();
        assert_eq!(exporter.export(&collector.snapshot_symbol_stats(), timestamp()).unwrap(), 1);
        assert_eq!(exporter.export(&collector.snapshot_symbol_stats(), timestamp()).unwrap(), 1);

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "2024-03-01T09:30:00.125,IBM,2,5.00,100.00,1000.00,100.00,100.00,1.00,0.00"
        );
    }

    #[test]
    fn test_unwritable_path_errors() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened as the export file
        let result = CsvExporter::create(dir.path());
        assert!(matches!(result, Err(MetricsError::Export { .. })));
    }
}
