#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]
#![doc = include_str!("../README.md")]
//!
//! # Threading Notes
//!
//! All handles, futures and bindings are [`Send`] and [`Sync`]. Subscribers run on whichever
//! thread the host delivers on, without any of this crate's locks held, so they may connect,
//! disconnect and emit freely, including on the signal that is currently being delivered.

mod awaiter;
mod backend;
mod binding;
mod case;
mod connection;
mod error;
mod payload;
mod signal;

pub use awaiter::SignalFuture;
pub use backend::FieldIdentity;
pub use binding::{SignalBindings, SignalField, SignalFields, SignalOwner, SignalSlot};
pub use case::to_snake_case;
pub use connection::Callback;
pub use error::WaitError;
pub use payload::{Argument, Payload};
pub use signal::Signal;

pub use phloem::{
	raw, ConnectFlags, Dispatch, Host, NameTable, ObjectId, RawArgs, RawValue, Receiver, SignalName,
};

#[cfg(feature = "local_host")]
pub use phloem::local_host;

/// A [`Signal`] without arguments.
pub type Signal0 = Signal<()>;
/// A [`Signal`] with one argument.
pub type Signal1<T0> = Signal<(T0,)>;
/// A [`Signal`] with two arguments.
pub type Signal2<T0, T1> = Signal<(T0, T1)>;
/// A [`Signal`] with three arguments.
pub type Signal3<T0, T1, T2> = Signal<(T0, T1, T2)>;
/// A [`Signal`] with four arguments.
pub type Signal4<T0, T1, T2, T3> = Signal<(T0, T1, T2, T3)>;
/// A [`Signal`] with five arguments.
pub type Signal5<T0, T1, T2, T3, T4> = Signal<(T0, T1, T2, T3, T4)>;
