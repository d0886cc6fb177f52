//! CSV file data adapter.
//!
//! Bar files carry a `timestamp,open,high,low,close,volume` header row;
//! tick files carry `timestamp,price,size`. The header is verified
//! before any row is parsed, so a table with the wrong or reordered
//! columns is rejected up front. Timestamps are ISO-8601, with or
//! without fractional seconds. Malformed rows fail the whole load
//! eagerly; a partially applied series is never returned.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::analysis::{IndicatorTable, COLUMNS};
use crate::domain::bar::{parse_timestamp, Bar, BarSeries, Tick};
use crate::domain::error::EmasweepError;
use crate::ports::data_port::DataPort;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, name: &str) -> PathBuf {
        if Path::new(name).extension().is_some() {
            self.base_path.join(name)
        } else {
            self.base_path.join(format!("{name}.csv"))
        }
    }

    /// Write a computed indicator table next to the input data.
    pub fn export_indicator_table(
        &self,
        name: &str,
        table: &IndicatorTable,
    ) -> Result<PathBuf, EmasweepError> {
        let path = self.csv_path(name);
        let mut writer =
            csv::Writer::from_path(&path).map_err(|e| EmasweepError::DataFormat {
                reason: format!("CSV write error: {e}"),
            })?;
        writer
            .write_record(COLUMNS)
            .map_err(|e| EmasweepError::DataFormat {
                reason: format!("CSV write error: {e}"),
            })?;
        for i in 0..table.len() {
            writer
                .write_record(table.row(i))
                .map_err(|e| EmasweepError::DataFormat {
                    reason: format!("CSV write error: {e}"),
                })?;
        }
        writer.flush()?;
        Ok(path)
    }
}

const BAR_COLUMNS: &[&str] = &["timestamp", "open", "high", "low", "close", "volume"];
const TICK_COLUMNS: &[&str] = &["timestamp", "price", "size"];

fn check_header(record: &csv::StringRecord, expected: &[&str]) -> Result<(), EmasweepError> {
    let actual: Vec<&str> = record.iter().map(str::trim).collect();
    if actual != expected {
        return Err(EmasweepError::DataFormat {
            reason: format!(
                "expected columns {}, got {}",
                expected.join(","),
                actual.join(","),
            ),
        });
    }
    Ok(())
}

fn field<'a>(
    record: &'a csv::StringRecord,
    idx: usize,
    column: &str,
) -> Result<&'a str, EmasweepError> {
    record.get(idx).ok_or_else(|| EmasweepError::DataFormat {
        reason: format!("missing {column} column"),
    })
}

fn numeric(record: &csv::StringRecord, idx: usize, column: &str) -> Result<f64, EmasweepError> {
    field(record, idx, column)?
        .trim()
        .parse()
        .map_err(|e| EmasweepError::DataFormat {
            reason: format!("invalid {column} value: {e}"),
        })
}

impl DataPort for CsvAdapter {
    fn load_bars(&self, name: &str) -> Result<BarSeries, EmasweepError> {
        let path = self.csv_path(name);
        let content = fs::read_to_string(&path).map_err(|e| EmasweepError::DataFormat {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        check_header(
            rdr.headers().map_err(|e| EmasweepError::DataFormat {
                reason: format!("CSV parse error: {e}"),
            })?,
            BAR_COLUMNS,
        )?;
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| EmasweepError::DataFormat {
                reason: format!("CSV parse error: {e}"),
            })?;

            let ts = parse_timestamp(field(&record, 0, "timestamp")?.trim())?;
            bars.push(Bar {
                index: 0, // assigned by the series
                timestamp: ts.and_utc().timestamp(),
                open: numeric(&record, 1, "open")?,
                high: numeric(&record, 2, "high")?,
                low: numeric(&record, 3, "low")?,
                close: numeric(&record, 4, "close")?,
                volume: numeric(&record, 5, "volume")?,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        Ok(BarSeries::from_bars(bars))
    }

    fn load_ticks(&self, name: &str) -> Result<Vec<Tick>, EmasweepError> {
        let path = self.csv_path(name);
        let content = fs::read_to_string(&path).map_err(|e| EmasweepError::DataFormat {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        check_header(
            rdr.headers().map_err(|e| EmasweepError::DataFormat {
                reason: format!("CSV parse error: {e}"),
            })?,
            TICK_COLUMNS,
        )?;
        let mut ticks = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| EmasweepError::DataFormat {
                reason: format!("CSV parse error: {e}"),
            })?;

            ticks.push(Tick::parse(
                field(&record, 0, "timestamp")?.trim(),
                numeric(&record, 1, "price")?,
                numeric(&record, 2, "size")?,
            )?);
        }

        Ok(ticks)
    }
}
