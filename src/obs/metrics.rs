// self
use crate::obs::{OperationKind, RefreshOutcomeLabel, StatusClass};

/// Records a completed call via the global metrics recorder (when enabled).
pub fn record_call(kind: OperationKind, class: StatusClass) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"storefront_client_call_total",
			"operation" => kind.as_str(),
			"class" => class.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, class);
	}
}

/// Records a refresh-cycle event via the global metrics recorder (when enabled).
pub fn record_refresh(outcome: RefreshOutcomeLabel) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("storefront_client_refresh_total", "outcome" => outcome.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_noop_without_metrics() {
		record_call(OperationKind::Request, StatusClass::Network);
		record_refresh(RefreshOutcomeLabel::Failure);
	}
}
