use std::{
	fmt::{self, Debug, Formatter},
	ptr,
	sync::{
		atomic::{AtomicBool, Ordering},
		Arc,
	},
};

use phloem::ConnectFlags;

use crate::awaiter::AwaiterSlot;

/// A shared callback that receives a signal's payload.
///
/// Cloning a [`Callback`] is cheap and yields the *same* subscriber:
/// Equality is identity, which is what [`Signal::disconnect`](`crate::Signal::disconnect`) uses.
pub struct Callback<A>(Arc<dyn Fn(A) + Send + Sync>);

impl<A> Callback<A> {
	/// Wraps `f` as a new, distinct subscriber.
	pub fn new(f: impl 'static + Send + Sync + Fn(A)) -> Self {
		Self(Arc::new(f))
	}

	/// Invokes the callback.
	pub fn call(&self, payload: A) {
		(self.0)(payload);
	}

	/// Whether `self` and `other` are the same subscriber.
	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
	}
}

impl<A> Clone for Callback<A> {
	fn clone(&self) -> Self {
		Self(Arc::clone(&self.0))
	}
}

impl<A> PartialEq for Callback<A> {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other)
	}
}

impl<A> Eq for Callback<A> {}

impl<A> Debug for Callback<A> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Callback")
			.field(&Arc::as_ptr(&self.0).cast::<()>())
			.finish()
	}
}

/// Identifies one connection within a backend, independently of its subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct ConnectionId(pub(crate) u64);

pub(crate) enum Subscriber<A> {
	Callback(Callback<A>),
	Awaiter(Arc<AwaiterSlot<A>>),
}

impl<A> Subscriber<A> {
	fn dispatch(&self, payload: A) {
		match self {
			Subscriber::Callback(callback) => callback.call(payload),
			Subscriber::Awaiter(slot) => slot.complete(payload),
		}
	}

	/// Plain callbacks are simply dropped with their connection.
	fn cancel(&self) {
		match self {
			Subscriber::Callback(_) => (),
			Subscriber::Awaiter(slot) => slot.fail(),
		}
	}

	pub(crate) fn is_callback(&self, callback: &Callback<A>) -> bool {
		matches!(self, Subscriber::Callback(own) if own.ptr_eq(callback))
	}
}

pub(crate) struct Connection<A> {
	pub(crate) id: ConnectionId,
	pub(crate) subscriber: Subscriber<A>,
	flags: ConnectFlags,
	/// Latched before a one-shot connection is delivered to, so that overlapping passes
	/// (re-entrant or from other threads) can't deliver it twice.
	fired: AtomicBool,
}

impl<A> Connection<A> {
	pub(crate) fn new(id: ConnectionId, subscriber: Subscriber<A>, flags: ConnectFlags) -> Self {
		Self {
			id,
			subscriber,
			flags,
			fired: AtomicBool::new(false),
		}
	}

	/// Delivers `payload` unless this is a one-shot connection that already fired.
	pub(crate) fn deliver(&self, payload: A) {
		if self.flags.is_one_shot() && self.fired.swap(true, Ordering::AcqRel) {
			return;
		}
		self.subscriber.dispatch(payload);
	}

	pub(crate) fn cancel(&self) {
		self.subscriber.cancel();
	}

	/// Whether this connection is a one-shot that has fired and should be removed.
	pub(crate) fn is_spent(&self) -> bool {
		self.flags.is_one_shot() && self.fired.load(Ordering::Acquire)
	}
}

impl<A> Debug for Connection<A> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let subscriber = match &self.subscriber {
			Subscriber::Callback(_) => "callback",
			Subscriber::Awaiter(_) => "awaiter",
		};
		f.debug_struct("Connection")
			.field("id", &self.id)
			.field("subscriber", &subscriber)
			.field("flags", &self.flags)
			.field("fired", &self.fired.load(Ordering::Relaxed))
			.finish()
	}
}
