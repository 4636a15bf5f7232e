//! Binding of signal fields to backends.
//!
//! Field discovery is the owner type's business: It lists its signal fields once, as a static
//! [`SignalField`] table in [`SignalFields::SIGNALS`], and hands out its handles by index.
//! [`SignalBindings`] then attaches a backend to each handle that isn't bound yet, and keeps the
//! only strong reference to each backend for as long as the owner lives.

use std::{
	collections::BTreeMap,
	fmt::{self, Debug, Formatter},
	mem,
	ops::{Deref, DerefMut},
	sync::Arc,
};

use parking_lot::Mutex;
use phloem::{Dispatch, Host, NameTable, ObjectId, RawArgs, Receiver};
use tracing::{debug, warn};

use crate::{
	backend::{Backend, ErasedBackend, FieldIdentity},
	case::to_snake_case,
	Payload, Signal,
};

/// One entry of an owner type's static signal field table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignalField {
	/// The declared field name, usually `PascalCase`. See [`to_snake_case`].
	pub name: &'static str,
	/// The field's stable index within its owner.
	pub index: u32,
}

impl SignalField {
	/// Creates a new [`SignalField`].
	#[must_use]
	pub const fn new(name: &'static str, index: u32) -> Self {
		Self { name, index }
	}
}

/// A signal field that can be bound by [`SignalBindings::bind_fields`].
///
/// Implemented by every [`Signal`].
pub trait SignalSlot {
	/// Whether this handle already has a live backend.
	fn is_bound(&self) -> bool;

	/// Replaces this handle with one bound through `bindings`.
	fn bind_to(&mut self, bindings: &SignalBindings, field: SignalField);
}

impl<A: Payload> SignalSlot for Signal<A> {
	fn is_bound(&self) -> bool {
		self.is_valid()
	}

	fn bind_to(&mut self, bindings: &SignalBindings, field: SignalField) {
		*self = bindings.bind(field.name, field.index);
	}
}

/// Data-driven signal field discovery for an owner type.
///
/// # Example
///
/// ```rust
/// use tendril::{Signal0, Signal1, SignalField, SignalFields, SignalSlot};
///
/// #[derive(Default)]
/// struct ButtonSignals {
/// 	pressed: Signal0,
/// 	toggled: Signal1<bool>,
/// }
///
/// impl SignalFields for ButtonSignals {
/// 	const SIGNALS: &'static [SignalField] =
/// 		&[SignalField::new("Pressed", 0), SignalField::new("Toggled", 1)];
///
/// 	fn signal_slot(&mut self, index: u32) -> Option<&mut dyn SignalSlot> {
/// 		match index {
/// 			0 => Some(&mut self.pressed),
/// 			1 => Some(&mut self.toggled),
/// 			_ => None,
/// 		}
/// 	}
/// }
/// ```
pub trait SignalFields {
	/// Every signal field of this type. Indices **must** be unique.
	const SIGNALS: &'static [SignalField];

	/// The handle for the field with the given `index`.
	fn signal_slot(&mut self, index: u32) -> Option<&mut dyn SignalSlot>;
}

/// The shared part of [`SignalBindings`], which is what hosts dispatch to and what backends
/// refer to (weakly) as their owner.
pub(crate) struct OwnerCore {
	object: ObjectId,
	host: Arc<dyn Host>,
	backends: Mutex<BTreeMap<u32, Arc<dyn ErasedBackend>>>,
}

impl OwnerCore {
	pub(crate) fn object(&self) -> ObjectId {
		self.object
	}

	pub(crate) fn host(&self) -> &dyn Host {
		&*self.host
	}

	pub(crate) fn dispatch(this: &Arc<Self>) -> Dispatch {
		Dispatch::new(this)
	}
}

impl Receiver for OwnerCore {
	fn deliver(&self, field_index: u32, args: RawArgs) {
		let backend = self.backends.lock().get(&field_index).cloned();
		match backend {
			Some(backend) => backend.deliver_raw(&args),
			None => debug!(object = ?self.object, field_index, "delivery to an unbound field"),
		}
	}
}

/// The per-owner binding map and host dispatch target.
///
/// An owner keeps one [`SignalBindings`] alongside its signal fields. Dropping it tears all of
/// the owner's signals down: Host bridges are closed, pending awaiters fail with
/// [`WaitError::Cancelled`](`crate::WaitError::Cancelled`) and every handle becomes invalid.
pub struct SignalBindings {
	core: Arc<OwnerCore>,
}

impl SignalBindings {
	/// Creates empty bindings for `object`, which emits through `host`.
	#[must_use]
	pub fn new(host: Arc<dyn Host>, object: ObjectId) -> Self {
		Self {
			core: Arc::new(OwnerCore {
				object,
				host,
				backends: Mutex::new(BTreeMap::new()),
			}),
		}
	}

	/// The owner's host object.
	#[must_use]
	pub fn object(&self) -> ObjectId {
		self.core.object
	}

	/// The owner's host.
	#[must_use]
	pub fn host(&self) -> &Arc<dyn Host> {
		&self.core.host
	}

	/// The dispatch target hosts deliver this owner's signals to.
	#[must_use]
	pub fn dispatch(&self) -> Dispatch {
		OwnerCore::dispatch(&self.core)
	}

	/// Returns a handle to the backend for `field_index`, creating it if necessary.
	///
	/// New backends are named by converting `field_name` with [`to_snake_case`] and interning the
	/// result into the global [`NameTable`]. Binding an index again returns a handle to the
	/// existing backend (and ignores `field_name`). If that backend carries a different payload
	/// type, the returned handle is inert.
	#[must_use]
	pub fn bind<A: Payload>(&self, field_name: &str, field_index: u32) -> Signal<A> {
		let mut backends = self.core.backends.lock();
		if let Some(existing) = backends.get(&field_index) {
			let field = existing.field();
			return match Arc::clone(existing).into_any().downcast::<Backend<A>>() {
				Ok(backend) => Signal::from_backend(&backend),
				Err(_) => {
					warn!(
						?field,
						payload = std::any::type_name::<A>(),
						"signal field is already bound with a different payload type"
					);
					Signal::default()
				}
			};
		}

		let field = FieldIdentity {
			name: NameTable::global().intern(&to_snake_case(field_name)),
			index: field_index,
		};
		let backend = Arc::new(Backend::<A>::new(Arc::downgrade(&self.core), field));
		let signal = Signal::from_backend(&backend);
		backends.insert(field_index, backend);
		debug!(object = ?self.core.object, ?field, field_name, "bound signal field");
		signal
	}

	/// Binds every field of `fields` that isn't bound yet.
	///
	/// Idempotent. **Returns** the number of fields that were newly bound.
	pub fn bind_fields<E: ?Sized + SignalFields>(&self, fields: &mut E) -> usize {
		let mut bound = 0;
		for &field in E::SIGNALS {
			let Some(slot) = fields.signal_slot(field.index) else {
				warn!(?field, "signal field table lists a field without a slot");
				continue;
			};
			if slot.is_bound() {
				continue;
			}
			slot.bind_to(self, field);
			bound += 1;
		}
		bound
	}

	/// Whether a backend exists for `field_index`.
	#[must_use]
	pub fn is_bound(&self, field_index: u32) -> bool {
		self.core.backends.lock().contains_key(&field_index)
	}

	/// The raw delivery entry point, as called by hosts through [`Receiver::deliver`].
	///
	/// Deliveries to unbound indices are ignored.
	pub fn deliver(&self, field_index: u32, args: RawArgs) {
		self.core.deliver(field_index, args);
	}
}

impl Drop for SignalBindings {
	fn drop(&mut self) {
		let backends = mem::take(&mut *self.core.backends.lock());
		for backend in backends.values() {
			backend.retire();
		}
	}
}

impl Debug for SignalBindings {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("SignalBindings")
			.field("object", &self.core.object)
			.field("fields", &self.core.backends.lock().keys().collect::<Vec<_>>())
			.finish_non_exhaustive()
	}
}

/// An owner's signal fields together with their [`SignalBindings`].
///
/// Every field is bound by the time it can be touched, so subscriptions made through
/// [`Deref`] always reach a live backend. Binding opens no host bridge.
pub struct SignalOwner<E: SignalFields> {
	signals: E,
	bindings: SignalBindings,
}

impl<E: SignalFields> SignalOwner<E> {
	/// Wraps `signals` as owned by `object`, which emits through `host`, and binds them.
	pub fn new(host: Arc<dyn Host>, object: ObjectId, mut signals: E) -> Self {
		let bindings = SignalBindings::new(host, object);
		bindings.bind_fields(&mut signals);
		Self { signals, bindings }
	}

	/// The bound signal fields.
	pub fn signals(&self) -> &E {
		&self.signals
	}

	/// The signal fields, mutably.
	///
	/// Fields that were replaced (for example by inert handles) through an earlier call are
	/// bound again first, to their original backends.
	pub fn signals_mut(&mut self) -> &mut E {
		self.bindings.bind_fields(&mut self.signals);
		&mut self.signals
	}

	/// The underlying bindings.
	pub fn bindings(&self) -> &SignalBindings {
		&self.bindings
	}
}

impl<E: SignalFields> Deref for SignalOwner<E> {
	type Target = E;

	fn deref(&self) -> &Self::Target {
		self.signals()
	}
}

impl<E: SignalFields> DerefMut for SignalOwner<E> {
	fn deref_mut(&mut self) -> &mut Self::Target {
		self.signals_mut()
	}
}

impl<E: SignalFields + Debug> Debug for SignalOwner<E> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("SignalOwner")
			.field("signals", &self.signals)
			.field("bindings", &self.bindings)
			.finish()
	}
}
