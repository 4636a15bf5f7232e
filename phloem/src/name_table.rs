//! Interning of signal name strings into stable integer identifiers.
//!
//! Entries are never removed. A [`SignalName`] stays valid for as long as the [`NameTable`] that
//! produced it, which for the [global](`NameTable::global`) table is the rest of the process.

use std::{
	collections::BTreeMap,
	fmt::{self, Debug, Formatter},
	sync::Arc,
};

use parking_lot::{const_rwlock, RwLock, RwLockUpgradableReadGuard};

/// An interned signal name.
///
/// Equal strings interned into the same [`NameTable`] always produce equal [`SignalName`]s.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SignalName(u32);

impl SignalName {
	/// Interns `name` into the [global](`NameTable::global`) table.
	#[must_use]
	pub fn intern(name: &str) -> Self {
		NameTable::global().intern(name)
	}

	/// Resolves this name against the [global](`NameTable::global`) table.
	///
	/// Returns [`None`] only for names produced by a different (larger) table.
	#[must_use]
	pub fn resolve(self) -> Option<Arc<str>> {
		NameTable::global().resolve(self)
	}

	/// The position of this name in the table that interned it.
	#[must_use]
	pub const fn index(self) -> u32 {
		self.0
	}
}

impl Debug for SignalName {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("SignalName").field(&self.0).finish()
	}
}

/// An append-only set of unique strings, addressed by insertion index.
///
/// Lookups, including [`NameTable::intern`] of a known name, take a shared lock. Inserts are
/// serialised, and a name that was inserted concurrently by another thread is found again
/// instead of being inserted twice.
pub struct NameTable {
	names: RwLock<Names>,
}

struct Names {
	by_index: Vec<Arc<str>>,
	by_name: BTreeMap<Arc<str>, SignalName>,
}

static GLOBAL_NAME_TABLE: NameTable = NameTable::new();

impl NameTable {
	/// Creates a new empty [`NameTable`].
	///
	/// Most code should use [`NameTable::global`] instead,
	/// since [`SignalName`]s aren't meaningful across tables.
	#[must_use]
	pub const fn new() -> Self {
		Self {
			names: const_rwlock(Names {
				by_index: Vec::new(),
				by_name: BTreeMap::new(),
			}),
		}
	}

	/// The process-wide table used by signal backends.
	#[must_use]
	pub fn global() -> &'static Self {
		&GLOBAL_NAME_TABLE
	}

	/// Returns the [`SignalName`] for `name`, inserting it if necessary.
	///
	/// # Panics
	///
	/// Iff more than [`u32::MAX`] distinct names are interned.
	pub fn intern(&self, name: &str) -> SignalName {
		if let Some(existing) = self.lookup(name) {
			return existing;
		}

		let names = self.names.upgradable_read();
		if let Some(&existing) = names.by_name.get(name) {
			return existing;
		}

		let mut names = RwLockUpgradableReadGuard::upgrade(names);
		let interned = SignalName(
			names
				.by_index
				.len()
				.try_into()
				.expect("too many interned signal names"),
		);
		let name: Arc<str> = name.into();
		names.by_index.push(Arc::clone(&name));
		names.by_name.insert(name, interned);
		interned
	}

	/// Looks up `name` without inserting it.
	#[must_use]
	pub fn lookup(&self, name: &str) -> Option<SignalName> {
		self.names.read().by_name.get(name).copied()
	}

	/// Returns the string interned as `name`, if `name` belongs to this table.
	#[must_use]
	pub fn resolve(&self, name: SignalName) -> Option<Arc<str>> {
		let index = usize::try_from(name.0).ok()?;
		self.names.read().by_index.get(index).cloned()
	}

	/// The number of distinct names interned so far.
	#[must_use]
	pub fn len(&self) -> usize {
		self.names.read().by_index.len()
	}

	/// Whether no names have been interned yet.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl Default for NameTable {
	fn default() -> Self {
		Self::new()
	}
}

impl Debug for NameTable {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_list()
			.entries(self.names.read().by_index.iter())
			.finish()
	}
}
