use std::time::Duration;

/// A drain gave up before the in-flight count reached zero.
///
/// The gate has already been reopened by the time this error is returned, so new requests are
/// being admitted again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("gave up waiting {max_wait:?} for {active} in-flight request(s) to complete")]
pub struct DrainTimeout {
	/// The configured bound on the wait.
	pub max_wait: Duration,
	/// In-flight count observed when the wait gave up.
	pub active: usize,
}
