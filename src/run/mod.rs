//! The sampling run driver.
//!
//! One run is a single Markov chain: the sampler consumes its burn-in
//! prefix internally, every polygon it yields flows through the
//! classification pipeline, and the aggregator folds the outcome into
//! the census. The chain is strictly sequential; parallelism lives a
//! level up, in the batch orchestrator.

mod aggregate;

pub use aggregate::{write_frequency_table, write_sample_log, ResultAggregator};

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::classify::Resolution;
use crate::external::{Polygon, PolygonSampler, PolygonSink, SamplingWindow};
use crate::models::{FrequencyKey, Result, RunConfig, SampleRecord};
use crate::tables::StickNumberTable;

/// Burn-in prefix of the tsmcmc chain, matching the external sampler's
/// documented default. The driver pads the iteration budget by this
/// amount so the requested number of usable polygons still comes out;
/// the sampler consumes the prefix itself and never yields those
/// polygons.
pub const BURN_IN_ITERATIONS: u64 = 101;

/// Wall-clock accounting for one finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub runtime_secs: f64,
    /// Post-burn-in polygons classified
    pub iterations: u64,
    pub classified: u64,
    pub unclassifiable: u64,
    pub throughput_per_hour: f64,
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct RunOutput {
    pub frequencies: BTreeMap<FrequencyKey, u64>,
    pub records: Vec<SampleRecord>,
    pub summary: RunSummary,
}

/// Adapter between the sampler's polygon callback and the classification
/// pipeline. Counts yielded polygons and feeds every one through
/// resolution into the aggregator; nothing the sampler yields is ever
/// dropped.
struct DriverSink<'a, 'b> {
    resolve: &'a dyn Fn(&Polygon) -> Resolution,
    aggregator: &'a mut ResultAggregator<'b>,
    iteration: u64,
    classified: u64,
    unclassifiable: u64,
    progress: ProgressBar,
}

impl PolygonSink for DriverSink<'_, '_> {
    fn accept(&mut self, polygon: &Polygon) {
        self.iteration += 1;
        let resolution = (self.resolve)(polygon);
        match &resolution {
            Resolution::Resolved(_) => self.classified += 1,
            Resolution::Unclassifiable(_) => self.unclassifiable += 1,
        }
        self.aggregator.record(self.iteration, &resolution, polygon);
        self.progress.inc(1);
    }
}

/// Execute one sampling run to completion.
///
/// Classification failures of individual polygons never abort the run;
/// the only errors surfaced here are the sampler's own.
pub fn run(
    config: &RunConfig,
    sampler: &mut dyn PolygonSampler,
    resolve: impl Fn(&Polygon) -> Resolution,
    sticks: &StickNumberTable,
) -> Result<RunOutput> {
    let started_at = Utc::now();
    let clock = Instant::now();

    info!(
        edges = config.num_edges,
        radius = config.confinement_radius,
        iterations = config.max_iterations,
        seed = config.random_seed,
        "starting sampling run"
    );

    let window = SamplingWindow {
        confinement_radius: config.confinement_radius,
        num_edges: config.num_edges,
        total_iterations: config.max_iterations + BURN_IN_ITERATIONS,
        max_seconds: config.max_seconds,
        seed: config.random_seed,
    };

    let progress = ProgressBar::new(config.max_iterations);
    progress.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-"),
    );

    let mut aggregator = ResultAggregator::new(sticks, config);
    let mut sink = DriverSink {
        resolve: &resolve,
        aggregator: &mut aggregator,
        iteration: 0,
        classified: 0,
        unclassifiable: 0,
        progress,
    };

    sampler.sample(&window, &mut sink)?;

    let iterations = sink.iteration;
    let classified = sink.classified;
    let unclassifiable = sink.unclassifiable;
    sink.progress.finish_and_clear();

    let runtime_secs = clock.elapsed().as_secs_f64();
    let throughput_per_hour = if runtime_secs > 0.0 {
        iterations as f64 * 3600.0 / runtime_secs
    } else {
        0.0
    };

    let (frequencies, records) = aggregator.into_parts();
    let summary = RunSummary {
        started_at,
        runtime_secs,
        iterations,
        classified,
        unclassifiable,
        throughput_per_hour,
    };

    info!(
        iterations = summary.iterations,
        classified = summary.classified,
        unclassifiable = summary.unclassifiable,
        runtime_secs = format!("{:.1}", summary.runtime_secs),
        "run complete"
    );

    Ok(RunOutput {
        frequencies,
        records,
        summary,
    })
}
