//! Configuration models for stickgen.
//!
//! Run and batch parameters arrive on the command line (they change every
//! invocation); the locations of the external helper tools live in a TOML
//! file (they change per deployment). Both are immutable once built.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Parameters for one Monte Carlo sampling run.
///
/// Constructed once from input, owned by the sampler driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Radius of the confining sphere
    pub confinement_radius: f64,

    /// Number of edges of the sampled polygons
    pub num_edges: u32,

    /// Number of polygons to classify, not counting burn-in
    pub max_iterations: u64,

    /// Wall-clock budget in seconds
    pub max_seconds: u64,

    /// Verbosity level for the interesting-sample log (see aggregator)
    pub verbosity: u8,

    /// Seed for the sampler's random source
    pub random_seed: u64,

    /// Sample log output path (stdout summary if absent)
    pub log_out: Option<PathBuf>,

    /// Frequency table output path (stdout summary if absent)
    pub counts_out: Option<PathBuf>,
}

impl RunConfig {
    /// Validate startup parameters. The only fatal errors in the system
    /// are raised here, before any polygon is generated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_edges < 3 {
            return Err(ConfigError::InvalidEdgeCount(self.num_edges));
        }
        if self.confinement_radius <= 0.0 {
            return Err(ConfigError::NonPositiveRadius(self.confinement_radius));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::EmptyRun);
        }
        Ok(())
    }
}

/// Parameters for a batch of independent sampling jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Radius of the confining sphere (shared by all jobs)
    pub confinement_radius: f64,

    /// Number of edges of the sampled polygons (shared by all jobs)
    pub num_edges: u32,

    /// Total number of polygons to generate across all jobs
    pub total_samples: u64,

    /// Number of polygons per job
    pub batch_size: u64,

    /// Wall-clock budget per job in seconds
    pub batch_max_seconds: u64,

    /// Verbosity level passed to each job
    pub verbosity: u8,

    /// Maximum number of concurrently running jobs
    pub max_processes: usize,

    /// Directory for per-job sample logs
    pub log_dir: PathBuf,

    /// Directory for per-job frequency tables
    pub counts_dir: PathBuf,
}

impl BatchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_edges < 3 {
            return Err(ConfigError::InvalidEdgeCount(self.num_edges));
        }
        if self.confinement_radius <= 0.0 {
            return Err(ConfigError::NonPositiveRadius(self.confinement_radius));
        }
        if self.total_samples == 0 || self.batch_size == 0 {
            return Err(ConfigError::EmptyRun);
        }
        if self.max_processes == 0 {
            return Err(ConfigError::NoProcesses);
        }
        Ok(())
    }
}

/// Invocation of one external helper tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Program name or path
    pub program: String,

    /// Fixed leading arguments
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
        }
    }
}

/// Locations of the external collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Confined equilateral polygon sampler
    #[serde(default = "default_sampler")]
    pub sampler: CommandSpec,

    /// Fast knot classifier (also emits HOMFLY text)
    #[serde(default = "default_classifier")]
    pub classifier: CommandSpec,

    /// Invariant computer and identity database lookup
    #[serde(default = "default_oracle")]
    pub oracle: CommandSpec,

    /// Two-variable polynomial parser / substitution engine
    #[serde(default = "default_symbolic")]
    pub symbolic: CommandSpec,
}

fn default_sampler() -> CommandSpec {
    CommandSpec::new("plc-tsmcmc-sample")
}

fn default_classifier() -> CommandSpec {
    CommandSpec::new("plc-classify")
}

fn default_oracle() -> CommandSpec {
    CommandSpec::new("knot-oracle")
}

fn default_symbolic() -> CommandSpec {
    CommandSpec::new("homfly-convert")
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            sampler: default_sampler(),
            classifier: default_classifier(),
            oracle: default_oracle(),
            symbolic: default_symbolic(),
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// External tool locations
    #[serde(default)]
    pub tools: ToolsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_owned(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            source: e,
        })
    }

    /// Load configuration, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &std::path::Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Configuration errors. The only fatal error class in the system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid edge count {0}: a closed polygon needs at least 3 edges")]
    InvalidEdgeCount(u32),

    #[error("Confinement radius must be positive, got {0}")]
    NonPositiveRadius(f64),

    #[error("Nothing to generate: iteration count must be positive")]
    EmptyRun,

    #[error("Batch requires at least one concurrent process")]
    NoProcesses,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_config(num_edges: u32) -> RunConfig {
        RunConfig {
            confinement_radius: 1.01,
            num_edges,
            max_iterations: 100,
            max_seconds: 86_400,
            verbosity: 2,
            random_seed: 7,
            log_out: None,
            counts_out: None,
        }
    }

    #[test]
    fn rejects_degenerate_edge_counts() {
        assert!(matches!(
            run_config(2).validate(),
            Err(ConfigError::InvalidEdgeCount(2))
        ));
        assert!(run_config(6).validate().is_ok());
    }

    #[test]
    fn tools_config_defaults_from_empty_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.tools.classifier.program, "plc-classify");
        assert!(config.tools.classifier.args.is_empty());
    }

    #[test]
    fn tools_config_overrides() {
        let config: Config = toml::from_str(
            r#"
            [tools.oracle]
            program = "python"
            args = ["identify_knot.py"]
            "#,
        )
        .unwrap();
        assert_eq!(config.tools.oracle.program, "python");
        assert_eq!(config.tools.oracle.args, vec!["identify_knot.py"]);
        assert_eq!(config.tools.sampler.program, "plc-tsmcmc-sample");
    }
}
