//! Child-process adapters for the external collaborators.
//!
//! The heavy lifting (plCurve's tsmcmc sampler and topology layer, the
//! knot invariant database, a symbolic algebra engine) runs as helper
//! executables. Each adapter speaks a small stdio protocol:
//! polygon geometry travels as tab-separated vertex rows, structured data
//! as single-line JSON.
//!
//! The sampling loop is synchronous by contract (one callback per
//! polygon, no overlap), so these adapters use blocking process IO.

use crate::classify::InvariantQuery;
use crate::models::{CommandSpec, Result, StickgenError};
use std::io::{BufRead, BufReader, Write};
use std::process::{Command, Stdio};
use tracing::debug;

use super::{
    InvariantOracle, Polygon, PolygonSampler, PolygonSink, PrimaryClassifier, PrimaryOutcome,
    PrimeFactor, RawInvariants, SamplingWindow, SymbolicEngine,
};

/// Run a helper tool to completion: write `input` to its stdin, return its
/// stdout. A nonzero exit status is a tool error carrying stderr.
fn run_tool(spec: &CommandSpec, extra_args: &[String], input: &str) -> Result<String> {
    let mut child = Command::new(&spec.program)
        .args(&spec.args)
        .args(extra_args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| StickgenError::io(format!("spawning {}", spec.program), e))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| StickgenError::tool(&spec.program, "stdin unavailable"))?;

    // Write on a separate thread while draining stdout, so neither pipe
    // can fill up and stall the other on a large polygon.
    let payload = input.to_owned();
    let writer = std::thread::spawn(move || stdin.write_all(payload.as_bytes()));

    let output = child
        .wait_with_output()
        .map_err(|e| StickgenError::io(format!("waiting for {}", spec.program), e))?;

    match writer.join() {
        Ok(Ok(())) => {}
        // A tool may close stdin once it has read enough.
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
        Ok(Err(e)) => {
            return Err(StickgenError::io(format!("writing to {}", spec.program), e));
        }
        Err(_) => {
            return Err(StickgenError::tool(&spec.program, "stdin writer panicked"));
        }
    }

    if !output.status.success() {
        return Err(StickgenError::tool(
            &spec.program,
            format!(
                "exit {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        ));
    }

    String::from_utf8(output.stdout)
        .map_err(|_| StickgenError::tool(&spec.program, "stdout is not UTF-8"))
}

/// Parse the classifier's `classify` output.
///
/// Protocol: either the single word `incomplete`, or `factors <n>`
/// followed by `n` lines of `<crossings> <index>`.
fn parse_primary_outcome(output: &str) -> Result<PrimaryOutcome> {
    let mut lines = output.lines().map(str::trim).filter(|l| !l.is_empty());
    let header = lines
        .next()
        .ok_or_else(|| StickgenError::Parse("empty classifier output".to_string()))?;

    if header == "incomplete" {
        return Ok(PrimaryOutcome::Incomplete);
    }

    let count: usize = header
        .strip_prefix("factors ")
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| {
            StickgenError::Parse(format!("bad classifier header: {header:?}"))
        })?;

    let mut factors = Vec::with_capacity(count);
    for _ in 0..count {
        let line = lines.next().ok_or_else(|| {
            StickgenError::Parse(format!("expected {count} factor lines"))
        })?;
        let mut fields = line.split_whitespace();
        let factor = match (fields.next(), fields.next(), fields.next()) {
            (Some(c), Some(i), None) => PrimeFactor {
                crossings: c
                    .parse()
                    .map_err(|_| StickgenError::Parse(format!("bad factor line: {line:?}")))?,
                index: i
                    .parse()
                    .map_err(|_| StickgenError::Parse(format!("bad factor line: {line:?}")))?,
            },
            _ => return Err(StickgenError::Parse(format!("bad factor line: {line:?}"))),
        };
        factors.push(factor);
    }
    Ok(PrimaryOutcome::Resolved(factors))
}

/// Parse the classifier's `homfly` output: `none` when the computation
/// failed, otherwise the polynomial text.
fn parse_homfly_output(output: &str) -> Option<String> {
    let trimmed = output.trim();
    if trimmed == "none" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Candidate identities come back one per line; blank lines are noise.
fn parse_candidates(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Fast classifier driven as a helper executable.
pub struct CommandPrimaryClassifier {
    spec: CommandSpec,
}

impl CommandPrimaryClassifier {
    pub fn new(spec: CommandSpec) -> Self {
        Self { spec }
    }
}

impl PrimaryClassifier for CommandPrimaryClassifier {
    fn classify(&self, polygon: &Polygon, seed: u64) -> Result<PrimaryOutcome> {
        let args = vec!["classify".to_string(), "--seed".to_string(), seed.to_string()];
        let output = run_tool(&self.spec, &args, &polygon.to_tsv())?;
        parse_primary_outcome(&output)
    }

    fn homfly_text(&self, polygon: &Polygon, seed: u64) -> Result<Option<String>> {
        let args = vec!["homfly".to_string(), "--seed".to_string(), seed.to_string()];
        let output = run_tool(&self.spec, &args, &polygon.to_tsv())?;
        Ok(parse_homfly_output(&output))
    }
}

/// Invariant computer / identity database driven as a helper executable.
pub struct CommandInvariantOracle {
    spec: CommandSpec,
}

impl CommandInvariantOracle {
    pub fn new(spec: CommandSpec) -> Self {
        Self { spec }
    }
}

impl InvariantOracle for CommandInvariantOracle {
    fn invariants(&self, polygon: &Polygon) -> Result<RawInvariants> {
        let args = vec!["invariants".to_string()];
        let output = run_tool(&self.spec, &args, &polygon.to_tsv())?;
        serde_json::from_str(output.trim())
            .map_err(|e| StickgenError::Parse(format!("invariants JSON: {e}")))
    }

    fn lookup(&self, query: &InvariantQuery) -> Result<Vec<String>> {
        let payload = serde_json::to_string(query)
            .map_err(|e| StickgenError::Internal(format!("serializing query: {e}")))?;
        let args = vec!["lookup".to_string()];
        let output = run_tool(&self.spec, &args, &payload)?;
        debug!(candidates = output.lines().count(), "oracle lookup");
        Ok(parse_candidates(&output))
    }
}

/// Symbolic algebra engine driven as a helper executable: expression in,
/// convention-adjusted canonical form out.
pub struct CommandSymbolicEngine {
    spec: CommandSpec,
}

impl CommandSymbolicEngine {
    pub fn new(spec: CommandSpec) -> Self {
        Self { spec }
    }
}

impl SymbolicEngine for CommandSymbolicEngine {
    fn homfly_convention(&self, expr: &str) -> Result<String> {
        let output = run_tool(&self.spec, &[], expr)?;
        let trimmed = output.trim();
        if trimmed.is_empty() {
            return Err(StickgenError::tool(
                &self.spec.program,
                "empty polynomial output",
            ));
        }
        Ok(trimmed.to_string())
    }
}

/// Confined equilateral sampler driven as a helper executable. Polygons
/// stream on stdout as vertex rows, one blank line between polygons.
pub struct CommandPolygonSampler {
    spec: CommandSpec,
}

impl CommandPolygonSampler {
    pub fn new(spec: CommandSpec) -> Self {
        Self { spec }
    }
}

impl PolygonSampler for CommandPolygonSampler {
    fn sample(&mut self, window: &SamplingWindow, sink: &mut dyn PolygonSink) -> Result<()> {
        let mut child = Command::new(&self.spec.program)
            .args(&self.spec.args)
            .args([
                "--radius".to_string(),
                window.confinement_radius.to_string(),
                "--edges".to_string(),
                window.num_edges.to_string(),
                "--iterations".to_string(),
                window.total_iterations.to_string(),
                "--max-seconds".to_string(),
                window.max_seconds.to_string(),
                "--seed".to_string(),
                window.seed.to_string(),
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| StickgenError::io(format!("spawning {}", self.spec.program), e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| StickgenError::tool(&self.spec.program, "stdout unavailable"))?;

        let mut block = String::new();
        for line in BufReader::new(stdout).lines() {
            let line = line
                .map_err(|e| StickgenError::io(format!("reading {}", self.spec.program), e))?;
            if line.trim().is_empty() {
                if !block.is_empty() {
                    sink.accept(&Polygon::from_rows(&block)?);
                    block.clear();
                }
            } else {
                block.push_str(&line);
                block.push('\n');
            }
        }
        if !block.is_empty() {
            sink.accept(&Polygon::from_rows(&block)?);
        }

        let status = child
            .wait()
            .map_err(|e| StickgenError::io(format!("waiting for {}", self.spec.program), e))?;
        if !status.success() {
            return Err(StickgenError::tool(
                &self.spec.program,
                format!("exit {:?}", status.code()),
            ));
        }
        Ok(())
    }
}
