//! The primitives a host object system provides to signal backends.

use std::{
	fmt::{self, Debug, Formatter},
	num::NonZeroU64,
	sync::{Arc, Weak},
};

use bitflags::bitflags;
use thiserror::Error;

use crate::{RawArgs, SignalName};

bitflags! {
	/// Flags for a connection, both in subscriber lists and in host registrations.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct ConnectFlags: u8 {
		/// The connection is removed after its first delivery.
		const ONE_SHOT = 1;
		/// Repeated registrations of the same dispatch target are counted instead of rejected,
		/// and only the matching number of disconnects removes the registration.
		///
		/// Only meaningful towards a [`Host`]. Subscriber lists ignore it.
		const REFERENCE_COUNTED = 1 << 1;
		/// Deliveries are queued by the host instead of running during `emit`.
		const DEFERRED = 1 << 2;
	}
}

impl ConnectFlags {
	/// A persistent connection with immediate delivery.
	pub const DEFAULT: Self = Self::empty();

	/// Whether [`ConnectFlags::ONE_SHOT`] is set.
	#[must_use]
	pub const fn is_one_shot(self) -> bool {
		self.contains(Self::ONE_SHOT)
	}
}

/// Identifies an object (signal owner and emitter) towards a [`Host`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(NonZeroU64);

impl ObjectId {
	/// Wraps a host-native object identifier.
	#[must_use]
	pub const fn from_raw(raw: NonZeroU64) -> Self {
		Self(raw)
	}

	/// The host-native object identifier.
	#[must_use]
	pub const fn get(self) -> NonZeroU64 {
		self.0
	}
}

/// The entry point a [`Host`] calls into when a native signal fires.
pub trait Receiver: Send + Sync {
	/// Delivers `args` to the signal field registered as `field_index`.
	///
	/// Unknown indices **must** be ignored.
	fn deliver(&self, field_index: u32, args: RawArgs);
}

/// A non-owning reference to a [`Receiver`], as registered with a [`Host`].
///
/// Hosts hold only these, so a registration never keeps its receiver alive.
/// Two [`Dispatch`]es are equal iff they point to the same receiver.
#[derive(Clone)]
pub struct Dispatch(Weak<dyn Receiver>);

impl Dispatch {
	/// Creates a [`Dispatch`] pointing to `receiver`.
	#[must_use]
	pub fn new<R: 'static + Receiver>(receiver: &Arc<R>) -> Self {
		let weak: Weak<R> = Arc::downgrade(receiver);
		Self(weak)
	}

	/// Calls [`Receiver::deliver`] if the receiver is still alive.
	///
	/// **Returns** whether the receiver was alive.
	pub fn deliver(&self, field_index: u32, args: RawArgs) -> bool {
		let Some(receiver) = self.0.upgrade() else {
			return false;
		};
		receiver.deliver(field_index, args);
		true
	}

	/// Whether the receiver is still alive.
	#[must_use]
	pub fn is_alive(&self) -> bool {
		self.0.strong_count() > 0
	}
}

impl PartialEq for Dispatch {
	fn eq(&self, other: &Self) -> bool {
		Weak::ptr_eq(&self.0, &other.0)
	}
}

impl Eq for Dispatch {}

impl Debug for Dispatch {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Dispatch")
			.field("receiver", &self.0.as_ptr().cast::<()>())
			.field("alive", &self.is_alive())
			.finish()
	}
}

/// A host object system's native signal primitives.
///
/// # Logic
///
/// A host **may** call [`Receiver::deliver`] synchronously from within [`Host::emit`] or later,
/// but deliveries through the same registration **must not** be reordered. It **must not**
/// deliver from within [`Host::connect`] or [`Host::disconnect`].
///
/// None of these primitives report failure to the caller. Misuse (for example disconnecting a
/// registration that doesn't exist) is a quiescent state as far as backends are concerned, so
/// hosts **should** log it instead.
pub trait Host: Send + Sync {
	/// Registers `dispatch` to receive `signal` as emitted by `target`, addressed as `field_index`.
	fn connect(
		&self,
		signal: SignalName,
		target: ObjectId,
		dispatch: Dispatch,
		field_index: u32,
		flags: ConnectFlags,
	);

	/// Removes (or, for [`ConnectFlags::REFERENCE_COUNTED`], releases once) a registration
	/// made through [`Host::connect`].
	fn disconnect(&self, signal: SignalName, target: ObjectId, dispatch: &Dispatch);

	/// Broadcasts `args` as `signal` from `source` to every registration.
	fn emit(&self, signal: SignalName, source: ObjectId, args: RawArgs);
}

/// Misuse of host registrations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum HostError {
	/// A registration without [`ConnectFlags::REFERENCE_COUNTED`] was made twice.
	#[error("{signal:?} on {target:?} is already connected to this dispatch target")]
	AlreadyConnected {
		/// The signal that was connected.
		signal: SignalName,
		/// The emitting object.
		target: ObjectId,
	},
	/// A registration that doesn't exist was disconnected.
	#[error("{signal:?} on {target:?} is not connected to this dispatch target")]
	NotConnected {
		/// The signal that was disconnected.
		signal: SignalName,
		/// The emitting object.
		target: ObjectId,
	},
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use super::*;

	#[derive(Default)]
	struct Count(AtomicUsize);

	impl Receiver for Count {
		fn deliver(&self, _field_index: u32, _args: RawArgs) {
			self.0.fetch_add(1, Ordering::Relaxed);
		}
	}

	#[test]
	fn default_flags_are_persistent() {
		assert!(!ConnectFlags::DEFAULT.is_one_shot());
		assert!(ConnectFlags::ONE_SHOT.is_one_shot());
		assert!((ConnectFlags::ONE_SHOT | ConnectFlags::DEFERRED).is_one_shot());
		assert_eq!(ConnectFlags::default(), ConnectFlags::DEFAULT);
	}

	#[test]
	fn dispatch_equality_is_identity() {
		let a = Arc::new(Count::default());
		let b = Arc::new(Count::default());
		assert_eq!(Dispatch::new(&a), Dispatch::new(&a));
		assert_ne!(Dispatch::new(&a), Dispatch::new(&b));
	}

	#[test]
	fn dispatch_does_not_keep_receivers_alive() {
		let receiver = Arc::new(Count::default());
		let dispatch = Dispatch::new(&receiver);
		assert!(dispatch.deliver(0, Vec::new()));
		assert_eq!(receiver.0.load(Ordering::Relaxed), 1);

		drop(receiver);
		assert!(!dispatch.is_alive());
		assert!(!dispatch.deliver(0, Vec::new()));
	}
}
