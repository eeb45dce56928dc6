//! Quiesce harness binary.
//!
//! Drives worker threads through a gated pipeline and drains the gate mid-round, reporting how
//! many requests were forwarded or rejected and whether each drain reached quiescence in time.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use quiesce_stage::{AdmissionGate, BlockingStage, StageConfig};
use tracing::{info, warn};

mod harness;

/// Harness command line arguments.
#[derive(Parser, Debug)]
#[command(name = "quiesce")]
#[command(about = "Exercise an admission gate with concurrent requests and periodic drains")]
struct Args {
	/// TOML configuration file
	#[arg(short, long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Request threads per round
	#[arg(long, default_value_t = 4)]
	workers: usize,

	/// Requests issued by each worker per round
	#[arg(long, default_value_t = 10)]
	requests: usize,

	/// Load-then-drain rounds
	#[arg(long, default_value_t = 3)]
	rounds: usize,

	/// Simulated handler time per request, in milliseconds
	#[arg(long, default_value_t = 20)]
	work_ms: u64,

	/// Overrides the configured drain bound, in milliseconds
	#[arg(long)]
	max_wait_ms: Option<u64>,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,
}

fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	setup_tracing(args.verbose);

	let config = match &args.config {
		Some(path) => StageConfig::load(path).with_context(|| format!("failed to load config {}", path.display()))?,
		None => StageConfig::default(),
	};

	let mut drain = config.drain_options();
	if let Some(ms) = args.max_wait_ms {
		drain.max_wait = Duration::from_millis(ms);
	}

	let stage = BlockingStage::new(AdmissionGate::new()).with_rejection(config.rejection());
	let plan = harness::Plan {
		workers: args.workers,
		requests: args.requests,
		work: Duration::from_millis(args.work_ms),
	};

	info!(workers = plan.workers, requests = plan.requests, rounds = args.rounds, max_wait = ?drain.max_wait, "starting quiesce");

	let mut timeouts = 0usize;
	for round in 1..=args.rounds {
		let report = harness::run_round(&stage, &plan, &drain)?;
		info!(
			round,
			forwarded = report.forwarded,
			rejected = report.rejected,
			drained = report.drain.is_ok(),
			"round complete"
		);
		if let Err(err) = &report.drain {
			warn!(round, %err, "drain did not reach quiescence");
			timeouts += 1;
		}
	}

	if timeouts > 0 {
		anyhow::bail!("{timeouts} of {} drain(s) timed out", args.rounds);
	}
	Ok(())
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("quiesce=debug,quiesce_gate=debug,quiesce_stage=debug,info")
		} else {
			EnvFilter::new("info")
		}
	});

	tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

#[cfg(test)]
mod tests {
	use clap::CommandFactory;

	use super::*;

	#[test]
	fn args_are_well_formed() {
		Args::command().debug_assert();
	}

	#[test]
	fn parses_overrides() {
		let args = Args::try_parse_from(["quiesce", "--workers", "2", "--max-wait-ms", "150", "-v"]).unwrap();
		assert_eq!(args.workers, 2);
		assert_eq!(args.max_wait_ms, Some(150));
		assert_eq!(args.rounds, 3);
		assert!(args.verbose);
		assert!(args.config.is_none());
	}
}
