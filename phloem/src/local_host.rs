//! [`LocalHost`], a small in-process [`Host`].

use std::{
	collections::{BTreeMap, VecDeque},
	fmt::{self, Debug, Formatter},
	num::NonZeroU64,
	sync::atomic::{AtomicU64, Ordering},
};

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::{ConnectFlags, Dispatch, Host, HostError, ObjectId, RawArgs, SignalName};

/// When [`LocalHost`] runs deliveries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Delivery {
	/// Deliveries run before [`Host::emit`] returns, unless the registration was made with
	/// [`ConnectFlags::DEFERRED`].
	#[default]
	Immediate,
	/// All deliveries are queued until [`LocalHost::flush`].
	Deferred,
}

/// Runtime configuration for a [`LocalHost`].
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct HostConfig {
	/// When deliveries run.
	pub delivery: Delivery,
}

impl HostConfig {
	/// Sets [`HostConfig::delivery`].
	#[must_use]
	pub fn with_delivery(mut self, delivery: Delivery) -> Self {
		self.delivery = delivery;
		self
	}
}

/// An in-process [`Host`] that keeps registrations in memory.
///
/// # Logic
///
/// Registrations for the same signal and emitter are delivered in registration order.
/// [`ConnectFlags::ONE_SHOT`] registrations are removed as part of the emission that fires them.
/// Registrations whose receiver has been dropped are pruned lazily.
///
/// Deferred deliveries are queued in emission order and run by [`LocalHost::flush`].
///
/// No lock is held while a [`Receiver`](`crate::Receiver`) runs, so receivers may call back into
/// the host freely.
pub struct LocalHost {
	config: HostConfig,
	object_counter: AtomicU64,
	state: Mutex<LocalHostState>,
}

#[derive(Default)]
struct LocalHostState {
	registrations: BTreeMap<(SignalName, ObjectId), Vec<Registration>>,
	queue: VecDeque<Queued>,
}

#[derive(Debug)]
struct Registration {
	dispatch: Dispatch,
	field_index: u32,
	flags: ConnectFlags,
	count: u64,
}

struct Queued {
	dispatch: Dispatch,
	field_index: u32,
	args: RawArgs,
}

impl LocalHost {
	/// Creates a new [`LocalHost`] with the default [`HostConfig`].
	#[must_use]
	pub fn new() -> Self {
		Self::with_config(HostConfig::default())
	}

	/// Creates a new [`LocalHost`] with the given configuration.
	#[must_use]
	pub fn with_config(config: HostConfig) -> Self {
		Self {
			config,
			object_counter: AtomicU64::new(0),
			state: Mutex::new(LocalHostState::default()),
		}
	}

	/// Allocates a fresh [`ObjectId`].
	///
	/// # Panics
	///
	/// Iff the 64-bit id space is exhausted.
	#[must_use]
	pub fn new_object(&self) -> ObjectId {
		let previous = self.object_counter.fetch_add(1, Ordering::Relaxed);
		ObjectId::from_raw(
			previous
				.checked_add(1)
				.and_then(NonZeroU64::new)
				.expect("object ids exhausted"),
		)
	}

	/// Fallible version of [`Host::connect`].
	///
	/// # Errors
	///
	/// [`HostError::AlreadyConnected`] iff `dispatch` is already registered for `signal` on
	/// `target` and neither registration is [reference-counted](`ConnectFlags::REFERENCE_COUNTED`).
	pub fn try_connect(
		&self,
		signal: SignalName,
		target: ObjectId,
		dispatch: Dispatch,
		field_index: u32,
		flags: ConnectFlags,
	) -> Result<(), HostError> {
		let mut state = self.state.lock();
		let registrations = state.registrations.entry((signal, target)).or_default();
		registrations.retain(|registration| registration.dispatch.is_alive());

		if let Some(existing) = registrations
			.iter_mut()
			.find(|registration| registration.dispatch == dispatch)
		{
			if existing.flags.contains(ConnectFlags::REFERENCE_COUNTED)
				&& flags.contains(ConnectFlags::REFERENCE_COUNTED)
			{
				existing.count += 1;
				trace!(?signal, ?target, count = existing.count, "retained host registration");
				return Ok(());
			}
			return Err(HostError::AlreadyConnected { signal, target });
		}

		registrations.push(Registration {
			dispatch,
			field_index,
			flags,
			count: 1,
		});
		debug!(?signal, ?target, field_index, ?flags, "added host registration");
		Ok(())
	}

	/// Fallible version of [`Host::disconnect`].
	///
	/// # Errors
	///
	/// [`HostError::NotConnected`] iff `dispatch` isn't registered for `signal` on `target`.
	pub fn try_disconnect(
		&self,
		signal: SignalName,
		target: ObjectId,
		dispatch: &Dispatch,
	) -> Result<(), HostError> {
		let mut state = self.state.lock();
		let Some(registrations) = state.registrations.get_mut(&(signal, target)) else {
			return Err(HostError::NotConnected { signal, target });
		};
		let Some(position) = registrations
			.iter()
			.position(|registration| &registration.dispatch == dispatch)
		else {
			return Err(HostError::NotConnected { signal, target });
		};

		let registration = &mut registrations[position];
		if registration.count > 1 {
			registration.count -= 1;
			trace!(?signal, ?target, count = registration.count, "released host registration");
		} else {
			registrations.remove(position);
			debug!(?signal, ?target, "removed host registration");
		}

		if registrations.is_empty() {
			state.registrations.remove(&(signal, target));
		}
		Ok(())
	}

	/// The number of live registrations for `signal` on `target`.
	///
	/// A reference-counted registration counts once.
	#[must_use]
	pub fn connection_count(&self, signal: SignalName, target: ObjectId) -> usize {
		self.state
			.lock()
			.registrations
			.get(&(signal, target))
			.map_or(0, |registrations| {
				registrations
					.iter()
					.filter(|registration| registration.dispatch.is_alive())
					.count()
			})
	}

	/// Whether `dispatch` is registered for `signal` on `target`.
	#[must_use]
	pub fn is_connected(&self, signal: SignalName, target: ObjectId, dispatch: &Dispatch) -> bool {
		self.state
			.lock()
			.registrations
			.get(&(signal, target))
			.is_some_and(|registrations| {
				registrations
					.iter()
					.any(|registration| &registration.dispatch == dispatch)
			})
	}

	/// Removes every registration for signals emitted by `object`.
	///
	/// Queued deliveries are not affected.
	pub fn free_object(&self, object: ObjectId) {
		let mut state = self.state.lock();
		let before = state.registrations.len();
		state.registrations.retain(|&(_, target), _| target != object);
		debug!(
			?object,
			removed = before - state.registrations.len(),
			"freed host object"
		);
	}

	/// The number of queued deferred deliveries.
	#[must_use]
	pub fn pending(&self) -> usize {
		self.state.lock().queue.len()
	}

	/// Runs queued deliveries in FIFO order until the queue is empty,
	/// including deliveries queued while flushing.
	///
	/// **Returns** the number of deliveries that reached a live receiver.
	pub fn flush(&self) -> usize {
		let mut delivered = 0;
		loop {
			let Some(Queued {
				dispatch,
				field_index,
				args,
			}) = self.state.lock().queue.pop_front()
			else {
				break;
			};
			if dispatch.deliver(field_index, args) {
				delivered += 1;
			}
		}
		delivered
	}
}

impl Default for LocalHost {
	fn default() -> Self {
		Self::new()
	}
}

impl Debug for LocalHost {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let state = self.state.lock();
		f.debug_struct("LocalHost")
			.field("config", &self.config)
			.field("registrations", &state.registrations)
			.field("pending", &state.queue.len())
			.finish_non_exhaustive()
	}
}

impl Host for LocalHost {
	fn connect(
		&self,
		signal: SignalName,
		target: ObjectId,
		dispatch: Dispatch,
		field_index: u32,
		flags: ConnectFlags,
	) {
		if let Err(error) = self.try_connect(signal, target, dispatch, field_index, flags) {
			warn!(%error, "ignored host connect");
		}
	}

	fn disconnect(&self, signal: SignalName, target: ObjectId, dispatch: &Dispatch) {
		if let Err(error) = self.try_disconnect(signal, target, dispatch) {
			warn!(%error, "ignored host disconnect");
		}
	}

	fn emit(&self, signal: SignalName, source: ObjectId, args: RawArgs) {
		let immediate = {
			let mut state = self.state.lock();
			let Some(registrations) = state.registrations.get_mut(&(signal, source)) else {
				trace!(?signal, ?source, "emitted without registrations");
				return;
			};
			registrations.retain(|registration| registration.dispatch.is_alive());

			let mut immediate = Vec::new();
			let mut deferred = Vec::new();
			for registration in registrations.iter() {
				let target = (registration.dispatch.clone(), registration.field_index);
				if self.config.delivery == Delivery::Deferred
					|| registration.flags.contains(ConnectFlags::DEFERRED)
				{
					deferred.push(target);
				} else {
					immediate.push(target);
				}
			}

			registrations.retain(|registration| !registration.flags.is_one_shot());
			if registrations.is_empty() {
				state.registrations.remove(&(signal, source));
			}

			state
				.queue
				.extend(deferred.into_iter().map(|(dispatch, field_index)| Queued {
					dispatch,
					field_index,
					args: args.clone(),
				}));
			immediate
		};

		trace!(?signal, ?source, receivers = immediate.len(), "emitting");
		for (dispatch, field_index) in immediate {
			dispatch.deliver(field_index, args.clone());
		}
	}
}
