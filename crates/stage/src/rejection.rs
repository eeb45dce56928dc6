use std::sync::Arc;

/// Fixed response returned while the gate is closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
	body: Arc<str>,
}

impl Default for Rejection {
	fn default() -> Self {
		Self::new(Self::DEFAULT_BODY)
	}
}

impl Rejection {
	/// Service-unavailable status code carried by every rejection.
	pub const STATUS: u16 = 503;

	/// Body used when none is configured.
	pub const DEFAULT_BODY: &'static str = "requests blocked while waiting for in-progress requests to complete";

	/// Creates a rejection with a custom diagnostic body.
	pub fn new(body: impl Into<Arc<str>>) -> Self {
		Self { body: body.into() }
	}

	/// Returns the status code, always [`Self::STATUS`].
	pub const fn status(&self) -> u16 {
		Self::STATUS
	}

	/// Returns the diagnostic body.
	pub fn body(&self) -> &str {
		&self.body
	}
}
