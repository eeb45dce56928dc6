use std::time::{Duration, Instant};

use crate::{AdmissionGate, DrainTimeout};

/// Default bound on how long a drain waits for in-flight requests.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(10);

/// Parameters for [`AdmissionGate::drain_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainOptions {
	/// Upper bound on the wait for quiescence.
	pub max_wait: Duration,
	/// Caller context included in the diagnostic event, e.g. a test name.
	pub label: Option<String>,
	/// Emit a diagnostic event when the drain has to wait.
	pub log_diagnostics: bool,
}

impl Default for DrainOptions {
	fn default() -> Self {
		Self::new(DEFAULT_MAX_WAIT)
	}
}

impl DrainOptions {
	/// Creates options with the given bound, no label and diagnostics enabled.
	pub fn new(max_wait: Duration) -> Self {
		Self {
			max_wait,
			label: None,
			log_diagnostics: true,
		}
	}

	/// Sets the diagnostic label.
	#[must_use]
	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}

	/// Suppresses the diagnostic event.
	#[must_use]
	pub fn quiet(mut self) -> Self {
		self.log_diagnostics = false;
		self
	}
}

/// Reopens the gate when the drain returns, whatever the outcome.
struct ReopenOnDrop<'a>(&'a AdmissionGate);

impl Drop for ReopenOnDrop<'_> {
	fn drop(&mut self) {
		self.0.open();
	}
}

impl AdmissionGate {
	/// Closes the gate, waits up to `max_wait` for in-flight requests to finish, then reopens it.
	///
	/// Equivalent to [`Self::drain_with`] with [`DrainOptions::new`].
	pub fn drain(&self, max_wait: Duration) -> Result<(), DrainTimeout> {
		self.drain_with(&DrainOptions::new(max_wait))
	}

	/// Closes the gate, waits for quiescence, then reopens it.
	///
	/// Returns immediately when nothing is in flight. Otherwise blocks the calling thread until the
	/// gate reopens (the last in-flight request leaving, or an explicit [`Self::open`]) or until
	/// `max_wait` elapses. The gate is open again when this returns, including on timeout:
	/// in-flight requests are never cancelled and new requests are admitted again.
	///
	/// Drains are not serialized against each other; a drain that returns reopens the gate for
	/// every other drain still waiting.
	///
	/// From async code, run this on a blocking thread (e.g. `tokio::task::spawn_blocking`).
	pub fn drain_with(&self, options: &DrainOptions) -> Result<(), DrainTimeout> {
		self.close();
		let _reopen = ReopenOnDrop(self);

		let active = self.active_count();
		if active == 0 {
			return Ok(());
		}

		if options.log_diagnostics {
			tracing::info!(active, label = options.label.as_deref(), "admission.drain.waiting");
		}

		let started = Instant::now();
		let deadline = started.checked_add(options.max_wait);
		let mut signal = self.inner.signal.lock();
		while self.is_closed() && self.active_count() > 0 {
			match deadline {
				Some(deadline) => {
					if self.inner.reopened.wait_until(&mut signal, deadline).timed_out() {
						break;
					}
				}
				None => self.inner.reopened.wait(&mut signal),
			}
		}
		let settled = !self.is_closed() || self.active_count() == 0;
		drop(signal);

		if settled {
			tracing::debug!(elapsed_ms = started.elapsed().as_millis() as u64, "admission.drain.settled");
			return Ok(());
		}

		let active = self.active_count();
		tracing::warn!(
			active,
			max_wait_ms = options.max_wait.as_millis() as u64,
			label = options.label.as_deref(),
			"admission.drain.timeout"
		);
		Err(DrainTimeout {
			max_wait: options.max_wait,
			active,
		})
	}
}
