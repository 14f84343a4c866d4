//! Single-flight coordination for access-token refresh cycles.
//!
//! A [`RefreshCoordinator`] holds the in-flight flag and the queue of waiting requests
//! behind one mutex. The first request to observe an expired token becomes the leader and
//! receives a [`RefreshTicket`]; every request arriving while the ticket is outstanding is
//! queued and resumed, in arrival order, with the outcome the leader settles.

mod metrics;

pub use metrics::RefreshMetrics;

// std
use std::mem;
// crates.io
use futures::channel::oneshot;
// self
use crate::{_prelude::*, auth::TokenSecret, error::AuthFailure};

/// Result shared with every request waiting on a refresh cycle.
pub type RefreshOutcome = Result<TokenSecret, AuthFailure>;

type Continuation = Box<dyn FnOnce(RefreshOutcome) + Send>;

#[derive(Default)]
struct CycleState {
	in_flight: bool,
	queue: VecDeque<Continuation>,
	cycles: u64,
	rejected_cycle: u64,
}

/// Refresh-in-flight flag plus the pending request queue.
///
/// Created once per client and shared by its clones. The queue is only non-empty while a
/// cycle is in flight, and settling a cycle always empties it.
#[derive(Default)]
pub struct RefreshCoordinator {
	state: Mutex<CycleState>,
}
impl RefreshCoordinator {
	/// Creates an idle coordinator.
	pub fn new() -> Self {
		Self::default()
	}

	/// Joins the current cycle, starting one when none is in flight.
	pub fn join(self: &Arc<Self>) -> RefreshRole {
		let mut state = self.state.lock();

		if state.in_flight {
			let (sender, receiver) = oneshot::channel();

			state.queue.push_back(Box::new(move |outcome| {
				// The waiter may have been dropped; its outcome is simply discarded.
				let _ = sender.send(outcome);
			}));

			#[cfg(feature = "tracing")]
			tracing::debug!(pending = state.queue.len(), "Queued request behind refresh cycle.");

			return RefreshRole::Waiter(RefreshWaiter { receiver });
		}

		state.in_flight = true;
		state.cycles += 1;

		#[cfg(feature = "tracing")]
		tracing::debug!(cycle = state.cycles, "Starting refresh cycle.");

		RefreshRole::Leader(RefreshTicket { coordinator: self.clone(), settled: false })
	}

	/// Registers `continuation` on the cycle in flight.
	///
	/// Returns `false`, without running it, when no cycle is in flight.
	pub fn on_settle<F>(&self, continuation: F) -> bool
	where
		F: 'static + Send + FnOnce(RefreshOutcome),
	{
		let mut state = self.state.lock();

		if !state.in_flight {
			return false;
		}

		state.queue.push_back(Box::new(continuation));

		true
	}

	/// Returns `true` while a cycle is in flight.
	pub fn is_refreshing(&self) -> bool {
		self.state.lock().in_flight
	}

	/// Number of requests waiting on the cycle in flight.
	pub fn pending(&self) -> usize {
		self.state.lock().queue.len()
	}

	/// Number of cycles started since creation.
	pub fn cycles(&self) -> u64 {
		self.state.lock().cycles
	}

	/// Claims the terminal rejection of the latest cycle's token.
	///
	/// Returns `true` for the first caller only; requests retried with the same token and
	/// rejected again share one login redirect.
	pub fn claim_rejection(&self) -> bool {
		let mut state = self.state.lock();

		if state.rejected_cycle == state.cycles {
			return false;
		}

		state.rejected_cycle = state.cycles;

		true
	}

	fn settle(&self, outcome: RefreshOutcome) -> usize {
		let drained = {
			let mut state = self.state.lock();

			state.in_flight = false;

			mem::take(&mut state.queue)
		};
		let count = drained.len();

		#[cfg(feature = "tracing")]
		tracing::debug!(resumed = count, success = outcome.is_ok(), "Settled refresh cycle.");

		// Continuations run outside the lock so they may join the next cycle.
		for continuation in drained {
			continuation(outcome.clone());
		}

		count
	}
}
impl Debug for RefreshCoordinator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.state.lock();

		f.debug_struct("RefreshCoordinator")
			.field("in_flight", &state.in_flight)
			.field("pending", &state.queue.len())
			.field("cycles", &state.cycles)
			.finish()
	}
}

/// Role assigned by [`RefreshCoordinator::join`].
#[derive(Debug)]
pub enum RefreshRole {
	/// This request performs the refresh and must settle the ticket.
	Leader(RefreshTicket),
	/// Another request is refreshing; await its outcome.
	Waiter(RefreshWaiter),
}

/// Exclusive right to perform the refresh call for one cycle.
///
/// Dropping the ticket without settling it settles the cycle with a cancellation failure.
#[derive(Debug)]
pub struct RefreshTicket {
	coordinator: Arc<RefreshCoordinator>,
	settled: bool,
}
impl RefreshTicket {
	/// Clears the in-flight flag and resumes every queued request, oldest first.
	///
	/// Returns the number of requests resumed.
	pub fn settle(mut self, outcome: RefreshOutcome) -> usize {
		self.settled = true;

		self.coordinator.settle(outcome)
	}
}
impl Drop for RefreshTicket {
	fn drop(&mut self) {
		if !self.settled {
			self.coordinator.settle(Err(AuthFailure::cancelled()));
		}
	}
}

/// Pending outcome for a request queued behind another request's refresh.
#[derive(Debug)]
pub struct RefreshWaiter {
	receiver: oneshot::Receiver<RefreshOutcome>,
}
impl RefreshWaiter {
	/// Waits for the leader to settle the cycle.
	pub async fn wait(self) -> RefreshOutcome {
		self.receiver.await.unwrap_or_else(|_| Err(AuthFailure::cancelled()))
	}
}
