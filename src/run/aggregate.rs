//! Result aggregation: the frequency census and the interesting-sample log.
//!
//! Every resolution lands in the frequency table. Only samples worth a
//! second look are logged in full geometry: new stick-number records
//! always, ties and worse-than-known only at higher verbosity, and every
//! unclassifiable polygon regardless of verbosity.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::classify::Resolution;
use crate::external::Polygon;
use crate::models::{
    FrequencyKey, PrimeComponent, RecordTag, Result, RunConfig, SampleRecord, StickgenError,
};
use crate::tables::{StickNumberTable, StickVerdict};

/// Accumulates classification outcomes over one run.
pub struct ResultAggregator<'a> {
    sticks: &'a StickNumberTable,
    config: &'a RunConfig,
    frequencies: BTreeMap<FrequencyKey, u64>,
    records: Vec<SampleRecord>,
}

impl<'a> ResultAggregator<'a> {
    pub fn new(sticks: &'a StickNumberTable, config: &'a RunConfig) -> Self {
        Self {
            sticks,
            config,
            frequencies: BTreeMap::new(),
            records: Vec::new(),
        }
    }

    /// Fold one resolved polygon into the census, logging it when
    /// interesting.
    pub fn record(&mut self, iteration: u64, resolution: &Resolution, polygon: &Polygon) {
        match resolution {
            Resolution::Unclassifiable(candidates) => {
                self.bump(FrequencyKey::Unclassifiable);
                // Unclassifiable polygons are always logged: they are the
                // raw material for improving the pipeline.
                let knot = serde_json::to_string(&candidates.candidates)
                    .unwrap_or_else(|_| "[]".to_string());
                self.log(iteration, RecordTag::Uncl, knot, polygon);
            }
            Resolution::Resolved(identity) => {
                self.bump(FrequencyKey::Identity(identity.clone()));
                match identity.as_prime() {
                    Some(&PrimeComponent::Tabulated { crossings, index }) => {
                        self.record_prime(iteration, identity.encode(), crossings, index, polygon);
                    }
                    Some(_) => {
                        // Cataloged knots (11+ crossings) have no stick
                        // table entry; counted, not logged.
                    }
                    None => {
                        if self.config.verbosity >= 3 {
                            self.log(iteration, RecordTag::Nonprime, identity.encode(), polygon);
                        }
                    }
                }
            }
        }
    }

    fn record_prime(
        &mut self,
        iteration: u64,
        encoded: String,
        crossings: u32,
        index: u32,
        polygon: &Polygon,
    ) {
        let verdict = self
            .sticks
            .compare(crossings, index, self.config.num_edges);
        match verdict {
            StickVerdict::Better => {
                info!(knot = %encoded, edges = self.config.num_edges, "new stick number record");
                self.log(iteration, RecordTag::Best, encoded, polygon);
            }
            StickVerdict::Equal if self.config.verbosity >= 2 => {
                self.log(iteration, RecordTag::Equiv, encoded, polygon);
            }
            StickVerdict::Worse if self.config.verbosity >= 3 => {
                self.log(iteration, RecordTag::Worse, encoded, polygon);
            }
            _ => {}
        }
    }

    fn bump(&mut self, key: FrequencyKey) {
        *self.frequencies.entry(key).or_insert(0) += 1;
    }

    fn log(&mut self, iteration: u64, tag: RecordTag, knot: String, polygon: &Polygon) {
        self.records.push(SampleRecord {
            iteration,
            random_seed: self.config.random_seed,
            is_best: tag,
            knot,
            num_edges: self.config.num_edges,
            confinement_radius: self.config.confinement_radius,
            string_repr: polygon.knotplot_string(),
        });
    }

    pub fn frequencies(&self) -> &BTreeMap<FrequencyKey, u64> {
        &self.frequencies
    }

    pub fn records(&self) -> &[SampleRecord] {
        &self.records
    }

    pub fn into_parts(self) -> (BTreeMap<FrequencyKey, u64>, Vec<SampleRecord>) {
        (self.frequencies, self.records)
    }
}

/// Write the interesting-sample log as JSON lines, one record each.
pub fn write_sample_log(path: &Path, records: &[SampleRecord]) -> Result<()> {
    let file = File::create(path)
        .map_err(|e| StickgenError::io(format!("creating {}", path.display()), e))?;
    let mut writer = BufWriter::new(file);
    for record in records {
        let line = serde_json::to_string(record)
            .map_err(|e| StickgenError::Internal(format!("serializing record: {e}")))?;
        writeln!(writer, "{line}")
            .map_err(|e| StickgenError::io(format!("writing {}", path.display()), e))?;
    }
    writer
        .flush()
        .map_err(|e| StickgenError::io(format!("flushing {}", path.display()), e))
}

/// Write the frequency table as a JSON object keyed by encoded identity.
pub fn write_frequency_table(path: &Path, frequencies: &BTreeMap<FrequencyKey, u64>) -> Result<()> {
    let labeled: BTreeMap<String, u64> = frequencies
        .iter()
        .map(|(key, count)| (key.label(), *count))
        .collect();
    let file = File::create(path)
        .map_err(|e| StickgenError::io(format!("creating {}", path.display()), e))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &labeled)
        .map_err(|e| StickgenError::Internal(format!("serializing frequencies: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CandidateSet, KnotIdentity};

    fn config(verbosity: u8) -> RunConfig {
        RunConfig {
            confinement_radius: 1.01,
            num_edges: 6,
            max_iterations: 100,
            max_seconds: 3600,
            verbosity,
            random_seed: 7,
            log_out: None,
            counts_out: None,
        }
    }

    fn triangle() -> Polygon {
        Polygon::new(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 1.0, 0.0]])
    }

    fn resolved(encoded: &str) -> Resolution {
        Resolution::Resolved(KnotIdentity::decode(encoded).unwrap())
    }

    #[test]
    fn every_resolution_is_counted() {
        let sticks = StickNumberTable::default();
        let cfg = config(0);
        let mut agg = ResultAggregator::new(&sticks, &cfg);
        agg.record(1, &resolved("3_1"), &triangle());
        agg.record(2, &resolved("3_1"), &triangle());
        agg.record(3, &resolved("0_1"), &triangle());
        agg.record(4, &Resolution::Unclassifiable(CandidateSet::default()), &triangle());

        let freq = agg.frequencies();
        assert_eq!(freq.len(), 3);
        assert_eq!(
            freq[&FrequencyKey::Identity(KnotIdentity::decode("3_1").unwrap())],
            2
        );
        assert_eq!(freq[&FrequencyKey::Unclassifiable], 1);
    }

    #[test]
    fn record_beating_the_table_is_always_logged() {
        let sticks = StickNumberTable::default();
        // 9_29's best known stick number is 10; 9 edges beats it.
        let mut cfg = config(0);
        cfg.num_edges = 9;
        let mut agg = ResultAggregator::new(&sticks, &cfg);
        agg.record(1, &resolved("9_29"), &triangle());

        assert_eq!(agg.records().len(), 1);
        assert_eq!(agg.records()[0].is_best, RecordTag::Best);
        assert_eq!(agg.records()[0].knot, "9_29");
        assert_eq!(agg.records()[0].random_seed, 7);
    }

    #[test]
    fn tie_is_logged_only_at_verbosity_two() {
        let sticks = StickNumberTable::default();
        // The trefoil's stick number is 6, matching the run's edge count.
        for (verbosity, expected) in [(1, 0), (2, 1)] {
            let cfg = config(verbosity);
            let mut agg = ResultAggregator::new(&sticks, &cfg);
            agg.record(1, &resolved("3_1"), &triangle());
            assert_eq!(agg.records().len(), expected);
        }
    }

    #[test]
    fn worse_and_nonprime_are_logged_only_at_verbosity_three() {
        let sticks = StickNumberTable::default();
        for (verbosity, expected) in [(2, 0), (3, 2)] {
            let mut cfg = config(verbosity);
            cfg.num_edges = 20;
            let mut agg = ResultAggregator::new(&sticks, &cfg);
            agg.record(1, &resolved("3_1"), &triangle());
            agg.record(2, &resolved("3_1 # 4_1"), &triangle());
            assert_eq!(agg.records().len(), expected);
            if expected == 2 {
                assert_eq!(agg.records()[0].is_best, RecordTag::Worse);
                assert_eq!(agg.records()[1].is_best, RecordTag::Nonprime);
            }
        }
    }

    #[test]
    fn untabulated_prime_is_counted_but_not_logged() {
        let sticks = StickNumberTable::default();
        let cfg = config(3);
        let mut agg = ResultAggregator::new(&sticks, &cfg);
        agg.record(1, &resolved("K11n34"), &triangle());
        assert_eq!(agg.frequencies().len(), 1);
        assert!(agg.records().is_empty());
    }

    #[test]
    fn unclassifiable_is_logged_at_any_verbosity() {
        let sticks = StickNumberTable::default();
        let cfg = config(0);
        let mut agg = ResultAggregator::new(&sticks, &cfg);
        let candidates = CandidateSet::new(vec!["10_22".to_string(), "10_35".to_string()]);
        agg.record(5, &Resolution::Unclassifiable(candidates), &triangle());

        assert_eq!(agg.records().len(), 1);
        assert_eq!(agg.records()[0].is_best, RecordTag::Uncl);
        assert_eq!(agg.records()[0].knot, r#"["10_22","10_35"]"#);
    }

    #[test]
    fn artifacts_round_trip_through_disk() {
        let sticks = StickNumberTable::default();
        let cfg = config(2);
        let mut agg = ResultAggregator::new(&sticks, &cfg);
        agg.record(1, &resolved("3_1"), &triangle());
        agg.record(2, &resolved("0_1"), &triangle());

        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("samples.jsonl");
        let counts_path = dir.path().join("counts.json");
        write_sample_log(&log_path, agg.records()).unwrap();
        write_frequency_table(&counts_path, agg.frequencies()).unwrap();

        let log_text = std::fs::read_to_string(&log_path).unwrap();
        let lines: Vec<&str> = log_text.lines().collect();
        assert_eq!(lines.len(), 1);
        let parsed: SampleRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.knot, "3_1");
        assert_eq!(parsed.is_best, RecordTag::Equiv);

        let counts: BTreeMap<String, u64> =
            serde_json::from_str(&std::fs::read_to_string(&counts_path).unwrap()).unwrap();
        assert_eq!(counts["3_1"], 1);
        assert_eq!(counts["0_1"], 1);
    }
}
