#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]
#![doc = include_str!("../README.md")]
//!
//! # Threading Notes
//!
//! Everything here is [`Send`] and [`Sync`], but a [`Host`] decides on its own when and on
//! which thread it calls [`Receiver::deliver`]. Implementations **must not** hold their own
//! locks while doing so, since receivers routinely call back into the host.

pub mod host;
#[cfg(feature = "local_host")]
pub mod local_host;
pub mod name_table;
pub mod raw;

pub use host::{ConnectFlags, Dispatch, Host, HostError, ObjectId, Receiver};
pub use name_table::{NameTable, SignalName};
pub use raw::{raw, FetchError, RawArgs, RawValue};
