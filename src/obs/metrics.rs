// self
use crate::{obs::RefreshOutcome, session::EndReason};

/// Records a refresh outcome via the global metrics recorder (when enabled).
pub fn record_refresh_outcome(outcome: RefreshOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("session_warden_refresh_total", "outcome" => outcome.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

/// Records a session termination via the global metrics recorder (when enabled).
pub fn record_session_end(reason: EndReason) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("session_warden_session_end_total", "reason" => reason.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = reason;
	}
}
