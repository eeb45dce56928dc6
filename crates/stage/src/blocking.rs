use quiesce_gate::AdmissionGate;

use crate::Rejection;

/// Admission stage for synchronous, thread-per-request pipelines.
#[derive(Debug, Clone, Default)]
pub struct BlockingStage {
	gate: AdmissionGate,
	rejection: Rejection,
}

impl BlockingStage {
	/// Creates a stage rejecting with [`Rejection::default`] while `gate` is closed.
	pub fn new(gate: AdmissionGate) -> Self {
		Self {
			gate,
			rejection: Rejection::default(),
		}
	}

	/// Replaces the rejection returned while the gate is closed.
	#[must_use]
	pub fn with_rejection(mut self, rejection: Rejection) -> Self {
		self.rejection = rejection;
		self
	}

	/// Returns the shared gate.
	pub fn gate(&self) -> &AdmissionGate {
		&self.gate
	}

	/// Runs `handler` unless the gate is closed, in which case the fixed rejection is returned.
	///
	/// The request stays registered with the gate until this returns or unwinds.
	pub fn handle<R, F>(&self, handler: F) -> R
	where
		F: FnOnce() -> R,
		R: From<Rejection>,
	{
		let in_flight = self.gate.track();
		if in_flight.is_rejected() {
			tracing::debug!(active = self.gate.active_count(), "admission.reject");
			return R::from(self.rejection.clone());
		}
		handler()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::mpsc;
	use std::thread;
	use std::time::Duration;

	use super::*;

	#[derive(Debug, PartialEq, Eq)]
	enum Reply {
		Handled(&'static str),
		Blocked(u16),
	}

	impl From<Rejection> for Reply {
		fn from(rejection: Rejection) -> Self {
			Self::Blocked(rejection.status())
		}
	}

	#[test]
	fn runs_handler_while_open() {
		let stage = BlockingStage::new(AdmissionGate::new());
		let reply = stage.handle(|| {
			assert_eq!(stage.gate().active_count(), 1);
			Reply::Handled("ok")
		});
		assert_eq!(reply, Reply::Handled("ok"));
		assert_eq!(stage.gate().active_count(), 0);
	}

	#[test]
	fn skips_handler_while_closed() {
		let stage = BlockingStage::new(AdmissionGate::new());
		let _busy = stage.gate().track();
		stage.gate().close();

		let reply = stage.handle(|| -> Reply { panic!("handler must not run") });
		assert_eq!(reply, Reply::Blocked(503));
		assert_eq!(stage.gate().active_count(), 1);
	}

	#[test]
	fn panicking_handler_still_leaves() {
		let stage = BlockingStage::new(AdmissionGate::new());
		let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| stage.handle(|| -> Reply { panic!("boom") })));
		assert!(result.is_err());
		assert_eq!(stage.gate().active_count(), 0);
	}

	#[test]
	fn drain_waits_for_running_handler() {
		let stage = BlockingStage::new(AdmissionGate::new());
		let (started_tx, started_rx) = mpsc::channel();
		let (finish_tx, finish_rx) = mpsc::channel::<()>();

		let worker = {
			let stage = stage.clone();
			thread::spawn(move || {
				stage.handle(|| {
					started_tx.send(()).unwrap();
					finish_rx.recv().unwrap();
					Reply::Handled("slow")
				})
			})
		};
		started_rx.recv().unwrap();

		let drainer = {
			let gate = stage.gate().clone();
			thread::spawn(move || gate.drain(Duration::from_secs(5)))
		};
		while !stage.gate().is_closed() {
			thread::yield_now();
		}
		assert_eq!(stage.handle(|| Reply::Handled("late")), Reply::Blocked(503));

		finish_tx.send(()).unwrap();
		assert_eq!(worker.join().unwrap(), Reply::Handled("slow"));
		drainer.join().unwrap().unwrap();
		assert_eq!(stage.handle(|| Reply::Handled("after")), Reply::Handled("after"));
	}
}
