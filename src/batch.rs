//! Batch orchestration: many independent sampling runs as OS processes.
//!
//! Each job is a fresh invocation of this executable's `run` subcommand
//! with its own random seed, so jobs share nothing and a crashed job
//! costs only its own samples. A semaphore bounds how many run at once;
//! job failures are logged and never cancel the rest of the batch.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::models::{BatchConfig, Result, StickgenError};

/// Split a total sample count into per-job iteration counts. The final
/// job absorbs the remainder, so totals that do not divide evenly still
/// come out exact.
pub fn plan_batches(total_samples: u64, batch_size: u64) -> Vec<u64> {
    let batch_size = batch_size.min(total_samples);
    let mut plan = Vec::new();
    let mut remaining = total_samples;
    while remaining > 0 {
        let this_batch = batch_size.min(remaining);
        plan.push(this_batch);
        remaining -= this_batch;
    }
    plan
}

/// One planned sampling job.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub seed: u64,
    pub samples: u64,
    pub log_out: PathBuf,
    pub counts_out: PathBuf,
}

impl BatchJob {
    /// Plan one job: a fresh seed, and output paths derived from the edge
    /// count and the seed so parallel jobs never collide.
    fn plan(config: &BatchConfig, samples: u64) -> Self {
        let seed = rand::random::<u64>();
        Self {
            seed,
            samples,
            log_out: config
                .log_dir
                .join(format!("{}_{}.jsonl", config.num_edges, seed)),
            counts_out: config
                .counts_dir
                .join(format!("{}_{}.json", config.num_edges, seed)),
        }
    }
}

/// Run a set of jobs with at most `max_concurrent` in flight. Each job
/// failure is reported and swallowed; the batch always runs to the end.
pub async fn run_jobs<J, F, Fut>(jobs: Vec<J>, max_concurrent: usize, launch: F) -> Result<()>
where
    J: Send + 'static,
    F: Fn(J) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<()>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(max_concurrent));
    let launch = Arc::new(launch);

    let mut handles = Vec::with_capacity(jobs.len());
    for (index, job) in jobs.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let launch = Arc::clone(&launch);
        handles.push(tokio::spawn(async move {
            // Closed only on shutdown, which never happens here.
            let _permit = semaphore
                .acquire()
                .await
                .map_err(|e| StickgenError::Internal(format!("semaphore closed: {e}")))?;
            (*launch)(job).await.map_err(|e| {
                warn!(job = index, error = %e, "sampling job failed");
                e
            })
        }));
    }

    let mut failures = 0usize;
    for handle in handles {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => failures += 1,
            Err(e) => {
                warn!(error = %e, "sampling job panicked");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        warn!(failures, "batch finished with failed jobs");
    }
    Ok(())
}

/// Run a full batch: plan the jobs, then launch each as a child process
/// re-invoking `exe run`.
pub async fn run_batch(config: &BatchConfig, exe: &Path, config_path: &Path) -> Result<()> {
    config.validate().map_err(StickgenError::Config)?;

    std::fs::create_dir_all(&config.log_dir)
        .map_err(|e| StickgenError::io(format!("creating {}", config.log_dir.display()), e))?;
    std::fs::create_dir_all(&config.counts_dir)
        .map_err(|e| StickgenError::io(format!("creating {}", config.counts_dir.display()), e))?;

    let jobs: Vec<BatchJob> = plan_batches(config.total_samples, config.batch_size)
        .into_iter()
        .map(|samples| BatchJob::plan(config, samples))
        .collect();

    info!(
        jobs = jobs.len(),
        total_samples = config.total_samples,
        max_processes = config.max_processes,
        "starting batch"
    );

    let exe = exe.to_owned();
    let config_path = config_path.to_owned();
    let shared = config.clone();
    run_jobs(jobs, config.max_processes, move |job: BatchJob| {
        let exe = exe.clone();
        let config_path = config_path.clone();
        let shared = shared.clone();
        async move {
            info!(seed = job.seed, samples = job.samples, "launching job");
            let status = Command::new(&exe)
                .arg("--config")
                .arg(&config_path)
                .arg("run")
                .arg("--confinement-radius")
                .arg(shared.confinement_radius.to_string())
                .arg("--num-edges")
                .arg(shared.num_edges.to_string())
                .arg("--max-iterations")
                .arg(job.samples.to_string())
                .arg("--max-seconds")
                .arg(shared.batch_max_seconds.to_string())
                .arg("--verbosity")
                .arg(shared.verbosity.to_string())
                .arg("--random-seed")
                .arg(job.seed.to_string())
                .arg("--log-out")
                .arg(&job.log_out)
                .arg("--counts-out")
                .arg(&job.counts_out)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .status()
                .await
                .map_err(|e| StickgenError::io(format!("spawning {}", exe.display()), e))?;

            if status.success() {
                info!(seed = job.seed, "job finished");
                Ok(())
            } else {
                Err(StickgenError::tool(
                    exe.display().to_string(),
                    format!("job seed {} exit {:?}", job.seed, status.code()),
                ))
            }
        }
    })
    .await
}
