//! Per-(owner, field) dispatch state.

use std::{
	any::Any,
	fmt::{self, Debug, Formatter},
	mem,
	sync::{Arc, Weak},
};

use parking_lot::Mutex;
use phloem::{ConnectFlags, RawValue, SignalName};
use scopeguard::guard;
use tracing::{debug, trace};

use crate::{
	binding::OwnerCore,
	connection::{Callback, Connection, ConnectionId, Subscriber},
	Payload,
};

/// The stable identity of a signal field, as assigned by field discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldIdentity {
	/// The interned host-visible signal name.
	pub name: SignalName,
	/// The field's index within its owner.
	pub index: u32,
}

/// Holds the subscriber list of one signal field and bridges it to the owner's host.
///
/// # Logic
///
/// The host bridge is open iff there is at least one connection, except while a change of the
/// subscriber list is being reconciled with the host. Reconciliation is serialised by the
/// `bridge` lock, which is held across [`Host::connect`](`phloem::Host::connect`) and
/// [`Host::disconnect`](`phloem::Host::disconnect`) calls, so host registrations stay balanced
/// under concurrent connects and disconnects.
///
/// The state lock is never held while a subscriber or a host primitive runs, so both may call
/// back into the backend. Hosts **must not** deliver from within `connect` or `disconnect`.
///
/// Once retired (by owner teardown), the backend accepts no new connections: Subscribers
/// connected afterwards are cancelled immediately.
pub(crate) struct Backend<A: Payload> {
	owner: Weak<OwnerCore>,
	field: FieldIdentity,
	state: Mutex<BackendState<A>>,
	bridge: Mutex<()>,
}

struct BackendState<A> {
	/// In delivery order.
	connections: Vec<Arc<Connection<A>>>,
	/// Only written while the `bridge` lock is held.
	bridge_open: bool,
	retired: bool,
	next_connection: u64,
}

impl<A: Payload> Backend<A> {
	pub(crate) fn new(owner: Weak<OwnerCore>, field: FieldIdentity) -> Self {
		Self {
			owner,
			field,
			state: Mutex::new(BackendState {
				connections: Vec::new(),
				bridge_open: false,
				retired: false,
				next_connection: 0,
			}),
			bridge: Mutex::new(()),
		}
	}

	pub(crate) fn field(&self) -> FieldIdentity {
		self.field
	}

	pub(crate) fn connect(&self, subscriber: Subscriber<A>, flags: ConnectFlags) -> ConnectionId {
		let mut state = self.state.lock();
		let id = ConnectionId(state.next_connection);
		state.next_connection += 1;
		let connection = Connection::new(id, subscriber, flags);

		if state.retired {
			drop(state);
			debug!(field = ?self.field, "connected to a retired signal");
			connection.cancel();
			return id;
		}

		state.connections.push(Arc::new(connection));
		let open_bridge = !state.bridge_open;
		drop(state);

		if open_bridge {
			self.sync_bridge();
		}
		id
	}

	/// Removes the first connection whose subscriber is `callback`.
	pub(crate) fn disconnect(&self, callback: &Callback<A>) -> bool {
		self.remove_first(|connection| connection.subscriber.is_callback(callback))
	}

	pub(crate) fn disconnect_connection(&self, id: ConnectionId) -> bool {
		self.remove_first(|connection| connection.id == id)
	}

	fn remove_first(&self, predicate: impl Fn(&Connection<A>) -> bool) -> bool {
		let (removed, now_empty) = {
			let mut state = self.state.lock();
			let Some(position) = state
				.connections
				.iter()
				.position(|connection| predicate(connection))
			else {
				return false;
			};
			let removed = state.connections.remove(position);
			(removed, state.connections.is_empty())
		};

		if now_empty {
			self.sync_bridge();
		}
		drop(removed);
		true
	}

	pub(crate) fn connection_count(&self) -> usize {
		self.state.lock().connections.len()
	}

	pub(crate) fn is_connected(&self, callback: &Callback<A>) -> bool {
		self.state
			.lock()
			.connections
			.iter()
			.any(|connection| connection.subscriber.is_callback(callback))
	}

	/// Clears the subscriber list, closing the bridge and failing pending awaiters.
	pub(crate) fn cancel_all(&self) {
		let connections = mem::take(&mut self.state.lock().connections);
		self.sync_bridge();

		debug!(
			field = ?self.field,
			cancelled = connections.len(),
			"cancelled signal connections"
		);
		for connection in connections {
			connection.cancel();
		}
	}

	/// Like [`Backend::cancel_all`], but also refuses all later connections.
	pub(crate) fn retire(&self) {
		self.state.lock().retired = true;
		self.cancel_all();
	}

	/// Asks the owner's host to broadcast `payload`.
	pub(crate) fn emit(&self, payload: A) {
		let Some(owner) = self.owner.upgrade() else {
			debug!(field = ?self.field, "emitted signal without an owner");
			return;
		};
		owner
			.host()
			.emit(self.field.name, owner.object(), payload.into_raw());
	}

	/// Fans a host delivery out to a snapshot of the subscriber list.
	///
	/// Connections made during the pass aren't delivered to. Connections removed during the pass
	/// still are. Fired one-shot connections are removed after the pass, even if a subscriber
	/// panics.
	pub(crate) fn deliver(&self, args: &[RawValue]) {
		let snapshot = self.state.lock().connections.clone();
		if snapshot.is_empty() {
			trace!(field = ?self.field, "delivered to no connections");
			return;
		}
		trace!(field = ?self.field, connections = snapshot.len(), "delivering");

		let payload = A::from_raw(args);
		let _commit = guard((), |()| self.remove_spent());
		for connection in &snapshot {
			connection.deliver(payload.clone());
		}
	}

	fn remove_spent(&self) {
		let now_empty = {
			let mut state = self.state.lock();
			let before = state.connections.len();
			state.connections.retain(|connection| !connection.is_spent());
			before != state.connections.len() && state.connections.is_empty()
		};

		if now_empty {
			self.sync_bridge();
		}
	}

	/// Opens or closes the host bridge until it matches the subscriber list.
	///
	/// The list may change while the host is being called. That is picked up by the next round,
	/// since `bridge_open` is updated under the same state lock the list is re-read under.
	fn sync_bridge(&self) {
		let _bridge = self.bridge.lock();
		let owner = self.owner.upgrade();
		let mut state = self.state.lock();
		loop {
			let wanted = !state.connections.is_empty();
			if wanted == state.bridge_open {
				return;
			}
			let Some(owner) = &owner else {
				// Nothing to bridge to anymore.
				state.bridge_open = false;
				return;
			};
			drop(state);

			let dispatch = OwnerCore::dispatch(owner);
			if wanted {
				debug!(field = ?self.field, object = ?owner.object(), "opening host bridge");
				owner.host().connect(
					self.field.name,
					owner.object(),
					dispatch,
					self.field.index,
					ConnectFlags::REFERENCE_COUNTED,
				);
			} else {
				debug!(field = ?self.field, object = ?owner.object(), "closing host bridge");
				owner
					.host()
					.disconnect(self.field.name, owner.object(), &dispatch);
			}

			state = self.state.lock();
			state.bridge_open = wanted;
		}
	}
}

impl<A: Payload> Debug for Backend<A> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let state = self.state.lock();
		f.debug_struct("Backend")
			.field("field", &self.field)
			.field("connections", &state.connections)
			.field("bridge_open", &state.bridge_open)
			.finish_non_exhaustive()
	}
}

/// Type-erased [`Backend`], as stored per owner.
pub(crate) trait ErasedBackend: Send + Sync {
	fn field(&self) -> FieldIdentity;
	fn deliver_raw(&self, args: &[RawValue]);
	fn retire(&self);
	fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<A: Payload> ErasedBackend for Backend<A> {
	fn field(&self) -> FieldIdentity {
		self.field
	}

	fn deliver_raw(&self, args: &[RawValue]) {
		self.deliver(args);
	}

	fn retire(&self) {
		Backend::retire(self);
	}

	fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
		self
	}
}
