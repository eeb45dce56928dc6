use crate::AdmissionGate;

/// Scoped in-flight registration for one request.
///
/// Created by [`AdmissionGate::track`]. Dropping the guard calls [`AdmissionGate::leave`], so the
/// count is released on every exit path: normal return, early `?` return, panic unwind, or a
/// future being dropped mid-poll.
#[must_use = "dropping the guard leaves the gate immediately"]
#[derive(Debug)]
pub struct InFlight {
	gate: AdmissionGate,
}

impl InFlight {
	pub(crate) fn new(gate: AdmissionGate) -> Self {
		gate.enter();
		Self { gate }
	}

	/// Returns the gate this request is registered with.
	pub fn gate(&self) -> &AdmissionGate {
		&self.gate
	}

	/// Returns true if the gate was closed at the time of the call.
	///
	/// Shorthand for `self.gate().is_closed()`; the pipeline checks this after registering so a
	/// rejected request is still counted while its rejection is produced.
	pub fn is_rejected(&self) -> bool {
		self.gate.is_closed()
	}
}

impl Drop for InFlight {
	fn drop(&mut self) {
		self.gate.leave();
	}
}
