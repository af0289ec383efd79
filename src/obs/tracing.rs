// self
use crate::{_prelude::*, obs::OpKind, session::EndReason, store::StoreError};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// A span builder used by session operations.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a new span tagged with the provided operation kind.
	pub fn new(kind: OpKind) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("session_warden.op", op = kind.as_str());

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = kind;

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}

	/// Runs a synchronous operation inside the span.
	pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
		#[cfg(feature = "tracing")]
		{
			self.span.in_scope(f)
		}
		#[cfg(not(feature = "tracing"))]
		{
			f()
		}
	}
}

/// Logs a state-machine transition at debug level.
pub fn record_transition(component: &'static str, transition: &'static str) {
	#[cfg(feature = "tracing")]
	tracing::debug!(component, transition, "session_warden.transition");

	#[cfg(not(feature = "tracing"))]
	let _ = (component, transition);
}

/// Logs a session termination at info level.
pub fn record_session_ended(reason: EndReason) {
	#[cfg(feature = "tracing")]
	tracing::info!(reason = reason.as_str(), "session_warden.session_ended");

	#[cfg(not(feature = "tracing"))]
	let _ = reason;
}

/// Logs a failed refresh at warn level.
pub fn record_refresh_failure(error: &Error) {
	#[cfg(feature = "tracing")]
	tracing::warn!(error = %error, "session_warden.refresh_failed");

	#[cfg(not(feature = "tracing"))]
	let _ = error;
}

/// Logs a persistence failure that was tolerated (the in-memory state already moved on).
pub fn record_storage_failure(error: &StoreError) {
	#[cfg(feature = "tracing")]
	tracing::warn!(error = %error, "session_warden.storage_failed");

	#[cfg(not(feature = "tracing"))]
	let _ = error;
}
