//! Emission of one line per simulated month.
//!
//! The coordinator is the only caller. Formatting lives here so the
//! engine never knows where lines go.

use crate::{error::SimResult, snapshot::Snapshot};
use serde::{Deserialize, Serialize};
use std::{fmt::Write as _, io::Write, str::FromStr};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// `Year 2023, Month  1 - Susceptible: 174996, ...`
    #[default]
    Human,
    /// `months-since-start, v1, v2, ...` for graphing.
    Csv,
    /// One serialized `Snapshot` per line.
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "human" => Ok(Self::Human),
            "csv"   => Ok(Self::Csv),
            "json"  => Ok(Self::Json),
            other => Err(format!("unknown output format '{other}' (expected human, csv or json)")),
        }
    }
}

impl OutputFormat {
    pub fn format(self, snapshot: &Snapshot) -> SimResult<String> {
        let mut line = String::new();
        match self {
            Self::Human => {
                // Month is displayed one-based.
                let _ = write!(line, "Year {:4}, Month {:2} -", snapshot.year, snapshot.month + 1);
                for (i, c) in snapshot.compartments.iter().enumerate() {
                    let sep = if i == 0 { " " } else { ", " };
                    let _ = write!(line, "{sep}{}: {}", c.name, c.value);
                }
            }
            Self::Csv => {
                let _ = write!(line, "{:2}", snapshot.months_elapsed);
                for c in &snapshot.compartments {
                    let _ = write!(line, ", {}", c.value);
                }
            }
            Self::Json => line = serde_json::to_string(snapshot)?,
        }
        Ok(line)
    }

    /// Column header for the CSV variant; `None` for the others.
    pub fn header(self, names: &[&str]) -> Option<String> {
        match self {
            Self::Csv => Some(
                std::iter::once("month")
                    .chain(names.iter().copied())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            Self::Human | Self::Json => None,
        }
    }
}

/// Receives one snapshot per step, in step order.
pub trait StepSink: Send {
    fn record(&mut self, snapshot: &Snapshot) -> SimResult<()>;

    /// Called once after the last step.
    fn finish(&mut self) -> SimResult<()> {
        Ok(())
    }
}

/// Keeps every snapshot in memory.
impl StepSink for Vec<Snapshot> {
    fn record(&mut self, snapshot: &Snapshot) -> SimResult<()> {
        self.push(snapshot.clone());
        Ok(())
    }
}

/// Writes formatted lines to any `Write`, usually stderr.
pub struct LineWriter<W: Write + Send> {
    out:    W,
    format: OutputFormat,
    header: Option<String>,
}

impl<W: Write + Send> LineWriter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self { out, format, header: None }
    }

    /// Print a header line before the first record, when the format has one.
    pub fn with_header(mut self, names: &[&str]) -> Self {
        self.header = self.format.header(names);
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> StepSink for LineWriter<W> {
    fn record(&mut self, snapshot: &Snapshot) -> SimResult<()> {
        if let Some(header) = self.header.take() {
            writeln!(self.out, "{header}")?;
        }
        let line = self.format.format(snapshot)?;
        writeln!(self.out, "{line}")?;
        Ok(())
    }

    fn finish(&mut self) -> SimResult<()> {
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::CompartmentValue;

    fn snapshot() -> Snapshot {
        Snapshot {
            year: 2023,
            month: 0,
            months_elapsed: 0,
            compartments: vec![
                CompartmentValue { name: "Susceptible".into(), value: 174996.0 },
                CompartmentValue { name: "Infected".into(), value: 13.6 },
            ],
        }
    }

    #[test]
    fn human_line_uses_one_based_month() {
        let line = OutputFormat::Human.format(&snapshot()).unwrap();
        assert_eq!(line, "Year 2023, Month  1 - Susceptible: 174996, Infected: 13.6");
    }

    #[test]
    fn csv_line_starts_with_months_elapsed() {
        let line = OutputFormat::Csv.format(&snapshot()).unwrap();
        assert_eq!(line, " 0, 174996, 13.6");
    }

    #[test]
    fn json_line_deserializes_back() {
        let line = OutputFormat::Json.format(&snapshot()).unwrap();
        let back: Snapshot = serde_json::from_str(&line).unwrap();
        assert_eq!(back, snapshot());
    }

    #[test]
    fn line_writer_prints_csv_header_once() {
        let mut writer = LineWriter::new(Vec::new(), OutputFormat::Csv)
            .with_header(&["Susceptible", "Infected"]);
        writer.record(&snapshot()).unwrap();
        writer.record(&snapshot()).unwrap();
        let text = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["month, Susceptible, Infected", " 0, 174996, 13.6", " 0, 174996, 13.6"]);
    }

    #[test]
    fn human_format_has_no_header() {
        assert_eq!(OutputFormat::Human.header(&["A"]), None);
    }
}
