//! Conversion between typed signal payloads and [`RawArgs`].

use std::any::Any;

use phloem::{
	raw::{fetch_or_default, raw},
	RawArgs, RawValue,
};

/// A single signal argument type.
///
/// [`Default`] is required because hosts may deliver fewer arguments than a signal declares,
/// in which case the missing trailing arguments are filled with default values.
pub trait Argument: 'static + Any + Send + Sync + Clone + Default {}
impl<T: 'static + Any + Send + Sync + Clone + Default> Argument for T {}

/// A tuple of zero to five [`Argument`]s carried by one emission.
///
/// This is implemented for `()`, `(T0,)`, `(T0, T1)` and so on up to five elements.
pub trait Payload: 'static + Send + Sync + Clone {
	/// The number of arguments.
	const ARITY: usize;

	/// Packs the arguments into an ordered argument vector.
	fn into_raw(self) -> RawArgs;

	/// Unpacks an argument vector, substituting defaults for missing or mistyped arguments.
	fn from_raw(args: &[RawValue]) -> Self;
}

macro_rules! impl_payload {
	($arity:literal; $($T:ident $value:ident $index:literal),*) => {
		impl<$($T: Argument),*> Payload for ($($T,)*) {
			const ARITY: usize = $arity;

			fn into_raw(self) -> RawArgs {
				let ($($value,)*) = self;
				vec![$(raw($value)),*]
			}

			#[allow(unused_variables)]
			fn from_raw(args: &[RawValue]) -> Self {
				($(fetch_or_default::<$T>(args, $index),)*)
			}
		}
	};
}

impl_payload!(0;);
impl_payload!(1; T0 a0 0);
impl_payload!(2; T0 a0 0, T1 a1 1);
impl_payload!(3; T0 a0 0, T1 a1 1, T2 a2 2);
impl_payload!(4; T0 a0 0, T1 a1 1, T2 a2 2, T3 a3 3);
impl_payload!(5; T0 a0 0, T1 a1 1, T2 a2 2, T3 a3 3, T4 a4 4);
