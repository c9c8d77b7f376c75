//! Per-strategy summaries of result tables.

use crate::results::{RoundResult, read_rows};
use crate::stats::{Accumulator, AccumulatorReport};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Per-strategy statistics of trials and errors.
#[derive(Debug, Clone, Default)]
pub struct StrategyStats {
    trials: Accumulator,
    errors: Accumulator,
}

impl StrategyStats {
    pub fn add(&mut self, round: &RoundResult) {
        self.trials.add(round.trials as f64);
        self.errors.add(round.errors as f64);
    }

    pub fn report(&self, id: &str) -> StrategyReport {
        StrategyReport {
            id: id.to_string(),
            trials: self.trials.report(),
            errors: self.errors.report(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyReport {
    pub id: String,
    pub trials: AccumulatorReport,
    pub errors: AccumulatorReport,
}

/// Aggregates result tables by strategy id, in first-seen order.
#[derive(Debug, Default)]
pub struct Analyzer {
    stats: Vec<(String, StrategyStats)>,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: &str, round: &RoundResult) {
        let i_stat = match self.stats.iter().position(|(s_id, _)| s_id == id) {
            Some(i_stat) => i_stat,
            None => {
                self.stats.push((id.to_string(), StrategyStats::default()));
                self.stats.len() - 1
            }
        };
        self.stats[i_stat].1.add(round);
    }

    pub fn add_file<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let reader = BufReader::new(file);

        for row in read_rows(reader).context("failed to read results")? {
            self.add(&row.id, &row.round);
        }
        Ok(())
    }

    pub fn reports(&self) -> Vec<StrategyReport> {
        self.stats
            .iter()
            .map(|(id, stats)| stats.report(id))
            .collect()
    }

    pub fn save_results<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);

        serde_json::to_writer_pretty(&mut writer, &self.reports())
            .context("failed to serialize reports")?;
        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }
}
