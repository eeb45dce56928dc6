use std::thread;
use std::time::Duration;

use anyhow::{Context, anyhow};
use quiesce_stage::{BlockingStage, DrainOptions, DrainTimeout, Rejection};

/// Shape of one load round.
#[derive(Debug, Clone)]
pub struct Plan {
	pub workers: usize,
	pub requests: usize,
	pub work: Duration,
}

/// Result of one simulated request.
#[derive(Debug)]
enum Outcome {
	Forwarded,
	Rejected,
}

impl From<Rejection> for Outcome {
	fn from(rejection: Rejection) -> Self {
		tracing::trace!(status = rejection.status(), body = rejection.body(), "harness.rejected");
		Self::Rejected
	}
}

/// Tally for one round.
#[derive(Debug)]
pub struct RoundReport {
	pub forwarded: usize,
	pub rejected: usize,
	pub drain: Result<(), DrainTimeout>,
}

/// Runs `plan.workers` request threads through `stage` and drains the gate once they are busy.
pub fn run_round(stage: &BlockingStage, plan: &Plan, drain: &DrainOptions) -> anyhow::Result<RoundReport> {
	thread::scope(|scope| {
		let mut workers = Vec::with_capacity(plan.workers);
		for id in 0..plan.workers {
			let handle = thread::Builder::new()
				.name(format!("quiesce-worker-{id}"))
				.spawn_scoped(scope, move || issue_requests(stage, plan))
				.context("failed to spawn worker thread")?;
			workers.push(handle);
		}

		thread::sleep(plan.work / 2);
		tracing::debug!(active = stage.gate().active_count(), "harness.drain");
		let drain = stage.gate().drain_with(drain);

		let mut report = RoundReport {
			forwarded: 0,
			rejected: 0,
			drain,
		};
		for worker in workers {
			let (forwarded, rejected) = worker.join().map_err(|_| anyhow!("worker thread panicked"))?;
			report.forwarded += forwarded;
			report.rejected += rejected;
		}
		Ok(report)
	})
}

fn issue_requests(stage: &BlockingStage, plan: &Plan) -> (usize, usize) {
	let mut forwarded = 0;
	let mut rejected = 0;
	for _ in 0..plan.requests {
		let outcome = stage.handle(|| {
			thread::sleep(plan.work);
			Outcome::Forwarded
		});
		match outcome {
			Outcome::Forwarded => forwarded += 1,
			Outcome::Rejected => rejected += 1,
		}
	}
	(forwarded, rejected)
}

#[cfg(test)]
mod tests {
	use quiesce_stage::AdmissionGate;

	use super::*;

	#[test]
	fn round_accounts_for_every_request() {
		let stage = BlockingStage::new(AdmissionGate::new());
		let plan = Plan {
			workers: 3,
			requests: 5,
			work: Duration::from_millis(2),
		};

		let report = run_round(&stage, &plan, &DrainOptions::new(Duration::from_secs(5)).quiet()).unwrap();

		assert!(report.drain.is_ok());
		assert_eq!(report.forwarded + report.rejected, 15);
		assert_eq!(stage.gate().active_count(), 0);
		assert!(!stage.gate().is_closed());
	}

	#[test]
	fn slow_handlers_time_out_the_drain() {
		let stage = BlockingStage::new(AdmissionGate::new());
		let plan = Plan {
			workers: 1,
			requests: 1,
			work: Duration::from_millis(200),
		};

		let report = run_round(&stage, &plan, &DrainOptions::new(Duration::from_millis(10))).unwrap();

		let err = report.drain.unwrap_err();
		assert_eq!(err.max_wait, Duration::from_millis(10));
		assert_eq!(report.forwarded, 1);
		assert_eq!(stage.gate().active_count(), 0);
	}
}
