//! Opaque host-native argument values.
//!
//! Marshalling between host-native values and Rust types is the host's business. Backends only
//! see [`RawValue`]s and recover typed arguments by downcasting.

use std::{any::Any, sync::Arc};

use thiserror::Error;
use tracing::warn;

/// One opaque argument value.
pub type RawValue = Arc<dyn Any + Send + Sync>;

/// An ordered argument vector, as passed through [`Host::emit`](`crate::Host::emit`).
pub type RawArgs = Vec<RawValue>;

/// Wraps `value` as [`RawValue`].
pub fn raw<T: Any + Send + Sync>(value: T) -> RawValue {
	Arc::new(value)
}

/// Why an argument couldn't be recovered from a [`RawArgs`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum FetchError {
	/// The argument vector is shorter than the declared arity.
	#[error("argument {index} is missing")]
	Missing {
		/// Position of the argument.
		index: usize,
	},
	/// The argument is present but holds a different type.
	#[error("argument {index} is not a `{expected}`")]
	Mismatched {
		/// Position of the argument.
		index: usize,
		/// Name of the requested type.
		expected: &'static str,
	},
}

/// Clones the argument at `index` out of `args` as `T`.
///
/// # Errors
///
/// [`FetchError::Missing`] if `args` is too short,
/// [`FetchError::Mismatched`] if the value there isn't a `T`.
pub fn try_fetch<T: Any + Clone>(args: &[RawValue], index: usize) -> Result<T, FetchError> {
	let value = args.get(index).ok_or(FetchError::Missing { index })?;
	value
		.downcast_ref::<T>()
		.cloned()
		.ok_or(FetchError::Mismatched {
			index,
			expected: std::any::type_name::<T>(),
		})
}

/// Like [`try_fetch`], but substitutes `T::default()` for missing or mismatched arguments.
///
/// Hosts are allowed to deliver fewer arguments than a signal declares, so this is not treated
/// as an error. It is logged, though, since it can also mask a host/signal arity mismatch.
pub fn fetch_or_default<T: Any + Clone + Default>(args: &[RawValue], index: usize) -> T {
	try_fetch(args, index).unwrap_or_else(|error| {
		warn!(%error, "substituting default signal argument");
		T::default()
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn present_arguments_are_cloned_out() {
		let args = vec![raw(7_i32), raw(String::from("x"))];
		assert_eq!(try_fetch::<i32>(&args, 0), Ok(7));
		assert_eq!(try_fetch::<String>(&args, 1).as_deref(), Ok("x"));
	}

	#[test]
	fn short_vectors_report_missing() {
		let args = vec![raw(7_i32)];
		assert_eq!(try_fetch::<i32>(&args, 1), Err(FetchError::Missing { index: 1 }));
		assert_eq!(fetch_or_default::<i32>(&args, 1), 0);
	}

	#[test]
	fn wrong_types_report_mismatch() {
		let args = vec![raw(7_u8)];
		assert!(matches!(
			try_fetch::<i32>(&args, 0),
			Err(FetchError::Mismatched { index: 0, .. })
		));
		assert_eq!(fetch_or_default::<String>(&args, 0), "");
	}
}
