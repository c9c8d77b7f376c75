//! Simulation directory driver behind the command line.

use crate::analysis::{Analyzer, StrategyStats};
use crate::config::Config;
use crate::engine::Simulator;
use crate::random::RngSource;
use crate::results::SimulationResult;
use anyhow::{Context, Result};
use glob::glob;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

/// Drives the simulations described by `<sim_dir>/config.toml`.
pub struct Manager {
    sim_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(sim_dir: P) -> Result<Self> {
        let sim_dir = sim_dir.as_ref().to_path_buf();

        let cfg = Config::from_file(sim_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { sim_dir, cfg })
    }

    pub fn cfg(&self) -> &Config {
        &self.cfg
    }

    /// Run every strategy in every scenario and write the rounds to the results file.
    pub fn run_simulation(&self) -> Result<()> {
        let mut rng = match self.cfg.run.seed {
            Some(seed) => RngSource::seeded(seed),
            None => RngSource::from_os_rng()?,
        };

        let file = self.results_file();
        let file = File::create(&file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);
        SimulationResult::write_header(&mut writer, true)?;

        let pop = &self.cfg.population;
        let mut stats_vec = vec![StrategyStats::default(); self.cfg.strategies.len()];

        let n_scens = self.cfg.run.scenarios;
        for i_scen in 0..n_scens {
            let mut sim = Simulator::new(pop.size, pop.false_negative_rate, pop.false_positive_rate)
                .context("failed to construct simulator")?
                .with_negative_rule(self.cfg.run.negative_rule);
            self.cfg
                .priors
                .assign(&mut sim, &self.sim_dir, &mut rng)
                .context("failed to assign priors")?;

            for (strat, stats) in self.cfg.strategies.iter().zip(&mut stats_vec) {
                let results = sim.run(self.cfg.run.rounds, &strat.models, &mut rng);
                results
                    .write_rows(&mut writer, Some(&strat.id))
                    .with_context(|| format!("failed to write results of {:?}", strat.id))?;
                for round in results.rounds() {
                    stats.add(round);
                }
            }

            let progress = 100.0 * (i_scen + 1) as f64 / n_scens as f64;
            log::info!("completed {progress:06.2}%");
        }

        writer.flush().context("failed to flush writer stream")?;

        for (strat, stats) in self.cfg.strategies.iter().zip(&stats_vec) {
            let report = stats.report(&strat.id);
            log::info!(
                "{}: {:.3} trials, {:.3} errors per round",
                report.id,
                report.trials.mean,
                report.errors.mean
            );
        }

        Ok(())
    }

    /// Summarize the results file per strategy.
    pub fn run_analysis(&self) -> Result<()> {
        let mut analyzer = Analyzer::new();
        analyzer
            .add_file(self.results_file())
            .context("failed to add file")?;

        for report in analyzer.reports() {
            log::info!("{report:?}");
        }

        analyzer
            .save_results(self.summary_file())
            .context("failed to save results")?;

        Ok(())
    }

    /// Remove every output file from the simulation directory.
    pub fn clean_sim(&self) -> Result<()> {
        let pattern = self.sim_dir.join("results*.tsv");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let mut files: Vec<_> = glob(pattern)
            .context("failed to glob results files")?
            .filter_map(Result::ok)
            .collect();

        let summary_file = self.summary_file();
        if summary_file.exists() {
            files.push(summary_file);
        }

        for file in files {
            fs::remove_file(&file).with_context(|| format!("failed to remove {file:?}"))?;
            log::info!("removed {file:?}");
        }

        Ok(())
    }

    fn results_file(&self) -> PathBuf {
        self.sim_dir.join("results.tsv")
    }

    fn summary_file(&self) -> PathBuf {
        self.sim_dir.join("summary.json")
    }
}
