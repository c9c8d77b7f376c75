//! Per-round results and their tab-separated representation.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};

/// Cost and accuracy of one simulated round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    /// Number of trials performed.
    pub trials: usize,
    /// Number of individuals left unresolved or resolved wrongly.
    pub errors: usize,
}

/// Ordered results of a simulation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationResult {
    rounds: Vec<RoundResult>,
}

impl SimulationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, trials: usize, errors: usize) {
        self.rounds.push(RoundResult { trials, errors });
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn rounds(&self) -> &[RoundResult] {
        &self.rounds
    }

    /// Mean number of trials per round (`NaN` without rounds).
    pub fn average_trials(&self) -> f64 {
        mean(self.rounds.iter().map(|r| r.trials))
    }

    /// Mean number of errors per round (`NaN` without rounds).
    pub fn average_errors(&self) -> f64 {
        mean(self.rounds.iter().map(|r| r.errors))
    }

    /// Write the header line, with a leading id column when `with_id` is set.
    pub fn write_header<W: Write>(writer: &mut W, with_id: bool) -> Result<()> {
        if with_id {
            write!(writer, "id\t").context("failed to write header")?;
        }
        writeln!(writer, "errors\ttrials").context("failed to write header")?;
        Ok(())
    }

    /// Write one `[id\t]errors\ttrials` line per round.
    pub fn write_rows<W: Write>(&self, writer: &mut W, id: Option<&str>) -> Result<()> {
        for round in &self.rounds {
            if let Some(id) = id {
                write!(writer, "{id}\t").context("failed to write row")?;
            }
            writeln!(writer, "{}\t{}", round.errors, round.trials).context("failed to write row")?;
        }
        Ok(())
    }
}

fn mean(vals: impl ExactSizeIterator<Item = usize>) -> f64 {
    let n_vals = vals.len();
    vals.sum::<usize>() as f64 / n_vals as f64
}

/// One line of a results table with an id column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub id: String,
    pub round: RoundResult,
}

/// Read a table written with [`SimulationResult::write_header`] (with id)
/// and [`SimulationResult::write_rows`].
pub fn read_rows<R: BufRead>(reader: R) -> Result<Vec<ResultRow>> {
    let mut lines = reader.lines();
    let header = lines
        .next()
        .context("missing header line")?
        .context("failed to read header line")?;
    if header.trim_end() != "id\terrors\ttrials" {
        bail!("unexpected header {header:?}");
    }

    let mut rows = Vec::new();
    for (i_line, line) in lines.enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", i_line + 2))?;
        if line.trim().is_empty() {
            continue;
        }
        let row = parse_row(&line).with_context(|| format!("invalid line {}", i_line + 2))?;
        rows.push(row);
    }
    Ok(rows)
}

fn parse_row(line: &str) -> Result<ResultRow> {
    let mut fields = line.rsplitn(3, '\t');
    let trials = fields.next().context("missing trials field")?;
    let errors = fields.next().context("missing errors field")?;
    let id = fields.next().context("missing id field")?;
    Ok(ResultRow {
        id: id.to_string(),
        round: RoundResult {
            trials: trials.trim().parse().context("failed to parse trials")?,
            errors: errors.trim().parse().context("failed to parse errors")?,
        },
    })
}
