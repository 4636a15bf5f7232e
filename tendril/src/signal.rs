use std::{
	fmt::{self, Debug, Formatter},
	future::IntoFuture,
	sync::{Arc, Weak},
};

use phloem::{ConnectFlags, SignalName};
use tracing::debug;

use crate::{
	awaiter::AwaiterSlot,
	backend::{Backend, FieldIdentity},
	connection::Subscriber,
	Argument, Callback, Payload, SignalFuture, WaitError,
};

/// A typed handle to one signal field of an owner.
///
/// `A` is the payload tuple: `()` for a signal without arguments, `(T0,)` for one argument and
/// so on up to five. See also the aliases [`Signal0`](`crate::Signal0`) through
/// [`Signal5`](`crate::Signal5`).
///
/// Handles observe their backend without keeping it alive. A handle created by [`Default`] or
/// outlived by its owner is *inert*: Every operation on it is a no-op (or reports emptiness),
/// and awaiting it fails with [`WaitError::Unbound`].
///
/// Only [`ConnectFlags::ONE_SHOT`] has an effect on connections made through a handle.
pub struct Signal<A: Payload = ()> {
	backend: Weak<Backend<A>>,
}

impl<A: Payload> Signal<A> {
	pub(crate) fn from_backend(backend: &Arc<Backend<A>>) -> Self {
		Self {
			backend: Arc::downgrade(backend),
		}
	}

	/// Whether this handle is bound to a live backend.
	///
	/// [`Signal::disconnect_all`] doesn't affect this.
	#[must_use]
	pub fn is_valid(&self) -> bool {
		self.backend.strong_count() > 0
	}

	/// The interned host-visible name of this signal, if bound.
	#[must_use]
	pub fn name(&self) -> Option<SignalName> {
		self.field().map(|field| field.name)
	}

	/// The field this handle is bound to, if any.
	#[must_use]
	pub fn field(&self) -> Option<FieldIdentity> {
		self.backend.upgrade().map(|backend| backend.field())
	}

	/// Emits `payload` through the owner's host.
	///
	/// Subscribers run whenever the host delivers, which for immediate hosts is before this
	/// method returns.
	pub fn emit_payload(&self, payload: A) {
		match self.backend.upgrade() {
			Some(backend) => backend.emit(payload),
			None => debug!("emitted through an inert signal handle"),
		}
	}

	/// Connects `callback` (again). Each call adds a separate connection.
	pub fn connect_callback(&self, callback: &Callback<A>, flags: ConnectFlags) {
		match self.backend.upgrade() {
			Some(backend) => {
				backend.connect(Subscriber::Callback(callback.clone()), flags);
			}
			None => debug!(?flags, "connected through an inert signal handle"),
		}
	}

	/// Removes the first connection of `callback`.
	///
	/// **Returns** whether a connection was removed.
	pub fn disconnect(&self, callback: &Callback<A>) -> bool {
		self.backend
			.upgrade()
			.is_some_and(|backend| backend.disconnect(callback))
	}

	/// Removes all connections.
	///
	/// Pending [`SignalFuture`]s resolve to [`WaitError::Cancelled`] and the host bridge is
	/// closed. The handle stays valid and can be connected to again.
	pub fn disconnect_all(&self) {
		if let Some(backend) = self.backend.upgrade() {
			backend.cancel_all();
		}
	}

	/// The number of current connections, including pending awaiters.
	#[must_use]
	pub fn connection_count(&self) -> usize {
		self.backend
			.upgrade()
			.map_or(0, |backend| backend.connection_count())
	}

	/// Whether `callback` is connected at least once.
	#[must_use]
	pub fn is_connected(&self, callback: &Callback<A>) -> bool {
		self.backend
			.upgrade()
			.is_some_and(|backend| backend.is_connected(callback))
	}

	/// Waits for the next emission.
	///
	/// The returned future is registered immediately, so emissions between this call and the
	/// first poll aren't missed.
	///
	/// ```rust
	/// # use tendril::{Signal1, WaitError};
	/// # futures_lite::future::block_on(async {
	/// let inert = Signal1::<i32>::default();
	/// assert_eq!(inert.next().await, Err(WaitError::Unbound));
	/// # });
	/// ```
	pub fn next(&self) -> SignalFuture<A> {
		let Some(backend) = self.backend.upgrade() else {
			debug!("awaited an inert signal handle");
			return SignalFuture::unbound();
		};

		let slot = Arc::new(AwaiterSlot::new());
		let connection = backend.connect(
			Subscriber::Awaiter(Arc::clone(&slot)),
			ConnectFlags::ONE_SHOT,
		);
		SignalFuture::registered(slot, &backend, connection)
	}
}

impl<A: Payload> IntoFuture for &Signal<A> {
	type Output = Result<A, WaitError>;
	type IntoFuture = SignalFuture<A>;

	fn into_future(self) -> Self::IntoFuture {
		self.next()
	}
}

impl<A: Payload> Default for Signal<A> {
	/// An inert handle.
	fn default() -> Self {
		Self {
			backend: Weak::new(),
		}
	}
}

impl<A: Payload> Clone for Signal<A> {
	fn clone(&self) -> Self {
		Self {
			backend: Weak::clone(&self.backend),
		}
	}
}

impl<A: Payload> Debug for Signal<A> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self.field() {
			Some(field) => f.debug_tuple("Signal").field(&field).finish(),
			None => f.debug_tuple("Signal").field(&"inert").finish(),
		}
	}
}

macro_rules! impl_arity {
	($($T:ident $value:ident),*) => {
		impl<$($T: Argument),*> Signal<($($T,)*)> {
			/// Emits the given arguments through the owner's host.
			///
			/// No-op on inert handles.
			pub fn emit(&self, $($value: $T),*) {
				self.emit_payload(($($value,)*));
			}

			/// Connects `f`, whose return value (if any) is discarded.
			///
			/// **Returns** the [`Callback`] that identifies this subscriber for
			/// [`Signal::disconnect`] and [`Signal::is_connected`]. On an inert handle nothing is
			/// connected, but a [`Callback`] is still returned.
			pub fn connect<R>(
				&self,
				f: impl 'static + Send + Sync + Fn($($T),*) -> R,
				flags: ConnectFlags,
			) -> Callback<($($T,)*)> {
				let callback = Callback::new(move |($($value,)*): ($($T,)*)| {
					f($($value),*);
				});
				self.connect_callback(&callback, flags);
				callback
			}
		}
	};
}

impl_arity!();
impl_arity!(T0 a0);
impl_arity!(T0 a0, T1 a1);
impl_arity!(T0 a0, T1 a1, T2 a2);
impl_arity!(T0 a0, T1 a1, T2 a2, T3 a3);
impl_arity!(T0 a0, T1 a1, T2 a2, T3 a3, T4 a4);
