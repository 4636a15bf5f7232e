//! Single-shot awaiting of signal emissions.

use std::{
	fmt::{self, Debug, Formatter},
	future::Future,
	mem,
	pin::Pin,
	sync::{Arc, Weak},
	task::{Context, Poll, Waker},
};

use parking_lot::Mutex;

use crate::{backend::Backend, connection::ConnectionId, Payload, WaitError};

/// Shared between a [`SignalFuture`] and the one-shot connection that completes it.
///
/// # Logic
///
/// Only [`AwaitState::Pending`] can be left, and only once. Whichever of [`AwaiterSlot::complete`]
/// and [`AwaiterSlot::fail`] comes first wins; later calls are no-ops and drop their argument.
pub(crate) struct AwaiterSlot<A> {
	state: Mutex<AwaitState<A>>,
}

enum AwaitState<A> {
	Pending(Option<Waker>),
	Completed(A),
	Failed,
	/// The payload was handed out by [`AwaiterSlot::poll`].
	Taken,
}

impl<A> AwaiterSlot<A> {
	pub(crate) fn new() -> Self {
		Self {
			state: Mutex::new(AwaitState::Pending(None)),
		}
	}

	pub(crate) fn complete(&self, payload: A) {
		self.settle(AwaitState::Completed(payload));
	}

	/// The stored waker is still woken, so that the waiting task observes [`WaitError::Cancelled`]
	/// instead of hanging. It never sees a payload.
	pub(crate) fn fail(&self) {
		self.settle(AwaitState::Failed);
	}

	fn settle(&self, outcome: AwaitState<A>) {
		let mut state = self.state.lock();
		let AwaitState::Pending(waker) = &mut *state else {
			return;
		};
		let waker = waker.take();
		*state = outcome;
		drop(state);

		if let Some(waker) = waker {
			waker.wake();
		}
	}

	pub(crate) fn is_completed(&self) -> bool {
		!matches!(*self.state.lock(), AwaitState::Pending(_))
	}

	fn poll(&self, waker: &Waker) -> Poll<Result<A, WaitError>> {
		let mut state = self.state.lock();
		match mem::replace(&mut *state, AwaitState::Taken) {
			AwaitState::Pending(mut stored) => {
				if !stored.as_ref().is_some_and(|stored| stored.will_wake(waker)) {
					stored = Some(waker.clone());
				}
				*state = AwaitState::Pending(stored);
				Poll::Pending
			}
			AwaitState::Completed(payload) => Poll::Ready(Ok(payload)),
			AwaitState::Failed => {
				*state = AwaitState::Failed;
				Poll::Ready(Err(WaitError::Cancelled))
			}
			AwaitState::Taken => Poll::Ready(Err(WaitError::Cancelled)),
		}
	}
}

impl<A> Debug for AwaiterSlot<A> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let state = match *self.state.lock() {
			AwaitState::Pending(_) => "pending",
			AwaitState::Completed(_) => "completed",
			AwaitState::Failed => "failed",
			AwaitState::Taken => "taken",
		};
		f.debug_struct("AwaiterSlot").field("state", &state).finish()
	}
}

/// Resolves with the payload of the next emission of a [`Signal`](`crate::Signal`).
///
/// Created by [`Signal::next`](`crate::Signal::next`) or by awaiting `&signal` directly.
///
/// # Logic
///
/// - Resolves to [`Ok`] with the payload of the first delivery after creation.
/// - Resolves to [`Err(WaitError::Cancelled)`](`WaitError::Cancelled`) if the signal's owner is
///   dropped or its subscribers are cleared first, or if it was created while the owner was
///   being torn down.
/// - Resolves to [`Err(WaitError::Unbound)`](`WaitError::Unbound`) on the first poll if the
///   handle wasn't bound.
///
/// Dropping a pending [`SignalFuture`] removes its connection.
#[must_use = "futures do nothing unless polled"]
pub struct SignalFuture<A: Payload> {
	waiting: Waiting<A>,
}

enum Waiting<A: Payload> {
	Unbound,
	Registered {
		slot: Arc<AwaiterSlot<A>>,
		backend: Weak<Backend<A>>,
		connection: ConnectionId,
	},
}

impl<A: Payload> SignalFuture<A> {
	pub(crate) fn unbound() -> Self {
		Self {
			waiting: Waiting::Unbound,
		}
	}

	pub(crate) fn registered(
		slot: Arc<AwaiterSlot<A>>,
		backend: &Arc<Backend<A>>,
		connection: ConnectionId,
	) -> Self {
		Self {
			waiting: Waiting::Registered {
				slot,
				backend: Arc::downgrade(backend),
				connection,
			},
		}
	}

	/// Whether polling would resolve immediately.
	///
	/// This is `true` after a delivery *and* after cancellation.
	#[must_use]
	pub fn is_completed(&self) -> bool {
		match &self.waiting {
			Waiting::Unbound => true,
			Waiting::Registered { slot, backend, .. } => {
				slot.is_completed() || backend.strong_count() == 0
			}
		}
	}
}

impl<A: Payload> Future for SignalFuture<A> {
	type Output = Result<A, WaitError>;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match &self.waiting {
			Waiting::Unbound => Poll::Ready(Err(WaitError::Unbound)),
			Waiting::Registered { slot, backend, .. } => {
				// A backend that is gone can't deliver anymore.
				if backend.strong_count() == 0 {
					slot.fail();
				}
				slot.poll(cx.waker())
			}
		}
	}
}

impl<A: Payload> Drop for SignalFuture<A> {
	fn drop(&mut self) {
		if let Waiting::Registered {
			slot,
			backend,
			connection,
		} = &self.waiting
		{
			if !slot.is_completed() {
				if let Some(backend) = backend.upgrade() {
					backend.disconnect_connection(*connection);
				}
			}
		}
	}
}

impl<A: Payload> Debug for SignalFuture<A> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match &self.waiting {
			Waiting::Unbound => f.debug_tuple("SignalFuture").field(&"unbound").finish(),
			Waiting::Registered { slot, .. } => f.debug_tuple("SignalFuture").field(slot).finish(),
		}
	}
}
