//! Pipeline stages in front of an [`AdmissionGate`].
//!
//! Every request is registered with the gate before the closed check, then either forwarded
//! to the wrapped handler or answered with a fixed [`Rejection`]. The registration is released
//! on every exit path.
//!
//! * [`AdmissionLayer`]/[`Admission`]: tower middleware for async services
//! * [`BlockingStage`]: the same protocol for thread-per-request pipelines
//! * [`StageConfig`]: TOML configuration for drain options and the rejection body

#![warn(missing_docs)]

mod blocking;
pub mod config;
mod layer;
mod rejection;

pub use blocking::BlockingStage;
pub use config::{ConfigError, StageConfig};
pub use layer::{Admission, AdmissionLayer, ResponseFuture};
pub use quiesce_gate::{AdmissionGate, DrainOptions, DrainTimeout, InFlight};
pub use rejection::Rejection;
