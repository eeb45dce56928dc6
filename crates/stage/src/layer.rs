//! Tower middleware gating an inner service.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use pin_project_lite::pin_project;
use quiesce_gate::{AdmissionGate, InFlight};
use tower_layer::Layer;
use tower_service::Service;

use crate::Rejection;

/// [`Layer`] producing [`Admission`] services that share one gate.
#[derive(Debug, Clone, Default)]
pub struct AdmissionLayer {
	gate: AdmissionGate,
	rejection: Rejection,
}

impl AdmissionLayer {
	/// Creates a layer rejecting with [`Rejection::default`] while `gate` is closed.
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
}

impl<S> Layer<S> for AdmissionLayer {
	type Service = Admission<S>;

	fn layer(&self, inner: S) -> Self::Service {
		Admission::new(inner, self.gate.clone(), self.rejection.clone())
	}
}

/// Forwards requests to the inner service while the gate is open.
///
/// Each call registers with the gate before checking it. A rejected call resolves immediately to
/// `S::Response::from(rejection)`; a forwarded call stays registered until the inner future
/// completes or the response future is dropped.
#[derive(Debug, Clone)]
pub struct Admission<S> {
	inner: S,
	gate: AdmissionGate,
	rejection: Rejection,
}

impl<S> Admission<S> {
	/// Wraps `inner` behind `gate`.
	pub fn new(inner: S, gate: AdmissionGate, rejection: Rejection) -> Self {
		Self { inner, gate, rejection }
	}

	/// Returns the shared gate.
	pub fn gate(&self) -> &AdmissionGate {
		&self.gate
	}

	/// Returns a reference to the inner service.
	pub fn get_ref(&self) -> &S {
		&self.inner
	}

	/// Returns a mutable reference to the inner service.
	pub fn get_mut(&mut self) -> &mut S {
		&mut self.inner
	}

	/// Consumes `self`, returning the inner service.
	pub fn into_inner(self) -> S {
		self.inner
	}
}

impl<S, Request> Service<Request> for Admission<S>
where
	S: Service<Request>,
	S::Response: From<Rejection>,
{
	type Response = S::Response;
	type Error = S::Error;
	type Future = ResponseFuture<S::Future>;

	fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	fn call(&mut self, request: Request) -> Self::Future {
		let in_flight = self.gate.track();
		if in_flight.is_rejected() {
			tracing::debug!(active = self.gate.active_count(), "admission.reject");
			return ResponseFuture::reject(self.rejection.clone(), in_flight);
		}
		ResponseFuture::forward(self.inner.call(request), in_flight)
	}
}

pin_project! {
	/// Response future for [`Admission`].
	pub struct ResponseFuture<F> {
		#[pin]
		kind: Kind<F>,
		in_flight: Option<InFlight>,
	}
}

pin_project! {
	#[project = KindProj]
	enum Kind<F> {
		Forward {
			#[pin]
			fut: F,
		},
		Reject {
			rejection: Option<Rejection>,
		},
	}
}

impl<F> ResponseFuture<F> {
	fn forward(fut: F, in_flight: InFlight) -> Self {
		Self {
			kind: Kind::Forward { fut },
			in_flight: Some(in_flight),
		}
	}

	fn reject(rejection: Rejection, in_flight: InFlight) -> Self {
		Self {
			kind: Kind::Reject {
				rejection: Some(rejection),
			},
			in_flight: Some(in_flight),
		}
	}
}

impl<F, T, E> Future for ResponseFuture<F>
where
	F: Future<Output = Result<T, E>>,
	T: From<Rejection>,
{
	type Output = Result<T, E>;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		let this = self.project();
		let output = match this.kind.project() {
			KindProj::Forward { fut } => ready!(fut.poll(cx)),
			KindProj::Reject { rejection } => Ok(T::from(rejection.take().unwrap_or_default())),
		};
		// Leave before handing the response back so the count reflects completion.
		this.in_flight.take();
		Poll::Ready(output)
	}
}
