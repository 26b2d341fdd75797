//! Tabular rendering of a finance history
//!
//! One row per snapshot: the date, then one column per profile name in the
//! order names first appear across the history. A profile absent from a
//! snapshot leaves its cell empty.

use std::io::{self, Write};

use clap::ValueEnum;
use finsim_core::FinanceHistory;
use jiff::civil::Date;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Csv,
    /// The full structured history
    Json,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub columns: Vec<String>,
    pub rows: Vec<ReportRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub date: Date,
    /// Aligned with [`Report::columns`]
    pub cells: Vec<Option<String>>,
}

impl Report {
    pub fn from_history(history: &FinanceHistory) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for snapshot in history.snapshots() {
            for name in snapshot.names() {
                if !columns.iter().any(|c| c == name) {
                    columns.push(name.to_string());
                }
            }
        }

        let rows = history
            .snapshots()
            .iter()
            .map(|snapshot| ReportRow {
                date: snapshot.date,
                cells: columns
                    .iter()
                    .map(|name| snapshot.get(name).map(ToString::to_string))
                    .collect(),
            })
            .collect();

        Self { columns, rows }
    }

    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(std::iter::once("date").chain(self.columns.iter().map(String::as_str)))?;
        for row in &self.rows {
            let date = row.date.to_string();
            let cells = row.cells.iter().map(|c| c.as_deref().unwrap_or(""));
            csv.write_record(std::iter::once(date.as_str()).chain(cells))?;
        }
        csv.flush()?;
        Ok(())
    }
}

pub fn write_report<W: io::Write>(
    history: &FinanceHistory,
    format: ReportFormat,
    mut writer: W,
) -> color_eyre::Result<()> {
    match format {
        ReportFormat::Csv => Report::from_history(history).write_csv(writer)?,
        ReportFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, history)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}
