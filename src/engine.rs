//! Run orchestration.
//!
//! Ties the pipeline together: resolve scope once, decide applicability for
//! every registered adapter, run the applicable ones in phased batches, fold
//! outcomes into the summary, persist artifacts. The engine never aborts
//! mid-run on a failing check; its job is one exhaustive report per
//! invocation.

use crate::adapter::{self, Phase, ToolAdapter};
use crate::aggregate;
use crate::artifact::ArtifactWriter;
use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;
use crate::exec::{CheckOutcome, Scheduler, TimeoutPolicy};
use crate::scope;
use crate::types::RunSummary;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub repo: PathBuf,
    pub quick: bool,
    pub gate: bool,
    pub require_tools: bool,
    pub serial: bool,
    pub timeout: Duration,
    pub timeout_policy: TimeoutPolicy,
    pub output_dir: Option<PathBuf>,
    pub config: Config,
}

impl RunOptions {
    pub fn from_cli(cli: &Cli, config: Config) -> Self {
        let timeout_secs = cli
            .timeout
            .or(config.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Self {
            repo: cli.repo.clone(),
            quick: cli.quick,
            gate: cli.gate,
            require_tools: cli.require_tools || config.require_tools.unwrap_or(false),
            serial: cli.serial,
            timeout: Duration::from_secs(timeout_secs),
            timeout_policy: cli
                .timeout_policy
                .or(config.timeout_policy)
                .unwrap_or_default(),
            output_dir: cli.output_dir.clone(),
            config,
        }
    }
}

/// Run the gate with the built-in adapter registry.
pub fn run(opts: &RunOptions) -> Result<RunSummary> {
    let adapters = adapter::registry();
    run_with_adapters(opts, &adapters)
}

/// Run the gate over an explicit adapter set. Split out so tests can drive
/// the full pipeline without the real tools on PATH.
pub fn run_with_adapters(
    opts: &RunOptions,
    adapters: &[Box<dyn ToolAdapter>],
) -> Result<RunSummary> {
    let started = Instant::now();

    let resolved = scope::resolve(&opts.repo);
    info!(
        mode = resolved.mode.as_str(),
        files = resolved.files.len(),
        "scope resolved"
    );
    // Without --gate the run is whole-repo; the summary still reports how the
    // scope would have resolved.
    let exec_scope = if opts.gate {
        resolved.clone()
    } else {
        resolved.unbounded()
    };

    // Applicability first, execution second: every adapter gets exactly one
    // slot, so none can be silently omitted.
    let mut slots: Vec<Option<CheckOutcome>> = Vec::with_capacity(adapters.len());
    let mut planned: Vec<(usize, &dyn ToolAdapter)> = Vec::new();
    for (index, boxed) in adapters.iter().enumerate() {
        let a = boxed.as_ref();
        match adapter::skip_reason(a, &resolved, opts.quick, opts.gate, &opts.config) {
            Some(reason) => {
                info!(tool = a.name(), reason = reason.as_str(), "skipping");
                slots.push(Some(CheckOutcome::skipped(a.name(), reason)));
            }
            None => {
                slots.push(None);
                planned.push((index, a));
            }
        }
    }

    let scheduler = Scheduler::new(&opts.repo, opts.serial, opts.timeout);
    for phase in [Phase::Analyze, Phase::Test] {
        let batch: Vec<(usize, &dyn ToolAdapter)> = planned
            .iter()
            .filter(|(_, a)| a.phase() == phase)
            .copied()
            .collect();
        if batch.is_empty() {
            continue;
        }
        let checks: Vec<&dyn ToolAdapter> = batch.iter().map(|(_, a)| *a).collect();
        let outcomes = scheduler.run_batch(&exec_scope, &checks);
        for ((index, _), outcome) in batch.iter().zip(outcomes) {
            slots[*index] = Some(outcome);
        }
    }

    let outcomes: Vec<CheckOutcome> = slots
        .into_iter()
        .map(|slot| slot.expect("every adapter produces exactly one outcome"))
        .collect();

    let base = ArtifactWriter::resolve_base(
        &opts.repo,
        opts.output_dir.as_deref(),
        opts.config.output_dir.as_deref(),
    );
    let writer = ArtifactWriter::new(&base);
    let run_dir = match writer.create_run_dir(resolved.mode) {
        Ok(dir) => Some(dir),
        Err(e) => {
            // Artifact trouble degrades; the gate result stands on its own.
            warn!(error = %e, "could not create artifact directory");
            None
        }
    };

    let summary = aggregate::summarize(
        &outcomes,
        resolved.mode,
        opts.require_tools,
        opts.timeout_policy,
        run_dir.as_deref().unwrap_or(&base),
        started.elapsed().as_millis() as u64,
    );

    if let Some(dir) = &run_dir {
        for outcome in &outcomes {
            writer.write_outcome(dir, outcome);
        }
        if let Err(e) = writer.write_summary(dir, &summary) {
            warn!(error = %e, "could not persist summary.json");
        }
    }

    Ok(summary)
}
