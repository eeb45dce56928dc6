//! Request admission gate.
//!
//! An [`AdmissionGate`] sits in front of a request pipeline and provides:
//! * In-flight tracking via [`AdmissionGate::enter`]/[`AdmissionGate::leave`] or the scoped [`InFlight`] guard
//! * An open/closed signal the pipeline consults with [`AdmissionGate::is_closed`]
//! * [`AdmissionGate::drain`]: close, wait (bounded) for quiescence, then reopen
//!
//! Whenever the in-flight count drops to zero the gate reopens on its own. Closing the gate
//! without a concurrent drain is therefore advisory: the next request to finish reopens it.

#![warn(missing_docs)]

mod drain;
mod error;
mod gate;
mod in_flight;

pub use drain::{DEFAULT_MAX_WAIT, DrainOptions};
pub use error::DrainTimeout;
pub use gate::AdmissionGate;
pub use in_flight::InFlight;
