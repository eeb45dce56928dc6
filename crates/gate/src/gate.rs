use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::{Condvar, Mutex};

use crate::InFlight;

pub(crate) struct GateState {
	pub(crate) active: AtomicUsize,
	pub(crate) closed: AtomicBool,
	/// Serializes transitions to open with the drain wait condition.
	pub(crate) signal: Mutex<()>,
	pub(crate) reopened: Condvar,
}

/// Shared admission gate.
///
/// Cloning is cheap and every clone observes the same state. Construct one gate per server and
/// hand clones to the pipeline stage and to whatever drives [`Self::drain`].
///
/// [`Self::enter`], [`Self::leave`], [`Self::is_closed`], [`Self::close`] and [`Self::open`] never
/// wait on a pending drain. Only [`Self::drain`] blocks.
#[derive(Clone)]
pub struct AdmissionGate {
	pub(crate) inner: Arc<GateState>,
}

impl Default for AdmissionGate {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for AdmissionGate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AdmissionGate")
			.field("active", &self.active_count())
			.field("closed", &self.is_closed())
			.finish()
	}
}

impl AdmissionGate {
	/// Creates an open gate with no requests in flight.
	pub fn new() -> Self {
		Self {
			inner: Arc::new(GateState {
				active: AtomicUsize::new(0),
				closed: AtomicBool::new(false),
				signal: Mutex::new(()),
				reopened: Condvar::new(),
			}),
		}
	}

	/// Registers one in-flight request.
	pub fn enter(&self) {
		self.inner.active.fetch_add(1, Ordering::AcqRel);
	}

	/// Releases one in-flight request registered with [`Self::enter`].
	///
	/// Must be paired 1:1 with `enter`; an unmatched call is logged and leaves the count at zero.
	/// When the count reaches zero the gate reopens, which also releases a pending drain.
	pub fn leave(&self) {
		match self.inner.active.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1)) {
			Ok(1) => self.reopen_if_idle(),
			Ok(_) => {}
			Err(_) => tracing::warn!("admission.leave without matching enter"),
		}
	}

	/// Registers one in-flight request and returns a guard that releases it on drop.
	pub fn track(&self) -> InFlight {
		InFlight::new(self.clone())
	}

	/// Returns the number of requests currently in flight.
	pub fn active_count(&self) -> usize {
		self.inner.active.load(Ordering::Acquire)
	}

	/// Returns true while the gate rejects new requests.
	pub fn is_closed(&self) -> bool {
		self.inner.closed.load(Ordering::Acquire)
	}

	/// Starts rejecting new requests. Requests already admitted are unaffected.
	pub fn close(&self) {
		self.inner.closed.store(true, Ordering::Release);
	}

	/// Reopens after a 1→0 decrement, unless a request entered since.
	///
	/// The count is re-read under the signal mutex: a drain that closed the gate after that entry
	/// must keep waiting for it.
	pub(crate) fn reopen_if_idle(&self) {
		let _signal = self.inner.signal.lock();
		if self.inner.active.load(Ordering::Acquire) != 0 {
			tracing::trace!("admission.reopen.stale");
			return;
		}
		tracing::trace!("admission.reopen");
		self.inner.closed.store(false, Ordering::Release);
		self.inner.reopened.notify_all();
	}

	/// Resumes admitting requests and wakes any pending drain.
	pub fn open(&self) {
		let _signal = self.inner.signal.lock();
		self.inner.closed.store(false, Ordering::Release);
		self.inner.reopened.notify_all();
	}
}
