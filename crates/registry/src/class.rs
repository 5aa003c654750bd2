//! Explicit type tags and the ancestry table used for class-based lookup.
//!
//! Handlers are selected by the class of the object they serve. Classes are
//! identified by [`ClassId`] tags and related through a [`TypeHierarchy`]
//! table listing each class's superclass, the interfaces it implements, and
//! whether it is a proxy wrapper standing in for its superclass.

use rustc_hash::{FxHashMap, FxHashSet};

/// Identifies a class of domain object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(&'static str);

impl ClassId {
	pub const fn new(name: &'static str) -> Self {
		Self(name)
	}

	pub const fn as_str(self) -> &'static str {
		self.0
	}
}

impl std::fmt::Display for ClassId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.0)
	}
}

/// Ancestry declaration for one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassInfo {
	pub id: ClassId,
	pub superclass: Option<ClassId>,
	pub interfaces: &'static [ClassId],
	/// Proxy classes are looked up as their direct superclass.
	pub proxy: bool,
}

impl ClassInfo {
	pub const fn root(id: ClassId) -> Self {
		Self {
			id,
			superclass: None,
			interfaces: &[],
			proxy: false,
		}
	}

	pub const fn extends(id: ClassId, superclass: ClassId) -> Self {
		Self {
			id,
			superclass: Some(superclass),
			interfaces: &[],
			proxy: false,
		}
	}

	pub const fn implements(mut self, interfaces: &'static [ClassId]) -> Self {
		self.interfaces = interfaces;
		self
	}

	pub const fn proxy_of(id: ClassId, target: ClassId) -> Self {
		Self {
			id,
			superclass: Some(target),
			interfaces: &[],
			proxy: true,
		}
	}
}

/// Link-time registration of a [`ClassInfo`].
pub struct ClassReg(pub &'static ClassInfo);
inventory::collect!(ClassReg);

/// Ancestry table answering assignability questions.
///
/// Classes that were never declared only relate to themselves.
#[derive(Debug, Clone, Default)]
pub struct TypeHierarchy {
	classes: FxHashMap<ClassId, ClassInfo>,
}

impl TypeHierarchy {
	pub fn new() -> Self {
		Self::default()
	}

	/// Collects every [`ClassReg`] submitted through [`inventory`].
	pub fn from_inventory() -> Self {
		let mut hierarchy = Self::new();
		for reg in inventory::iter::<ClassReg> {
			hierarchy.insert(*reg.0);
		}
		hierarchy
	}

	/// Adds or replaces a declaration, returning the previous one.
	pub fn insert(&mut self, info: ClassInfo) -> Option<ClassInfo> {
		self.classes.insert(info.id, info)
	}

	pub fn with(mut self, info: ClassInfo) -> Self {
		self.insert(info);
		self
	}

	pub fn get(&self, id: ClassId) -> Option<&ClassInfo> {
		self.classes.get(&id)
	}

	pub fn superclass_of(&self, id: ClassId) -> Option<ClassId> {
		self.classes.get(&id).and_then(|info| info.superclass)
	}

	pub fn is_proxy(&self, id: ClassId) -> bool {
		self.classes.get(&id).is_some_and(|info| info.proxy)
	}

	/// Returns true if a value of class `descendant` can be used where
	/// `ancestor` is expected: the classes are equal, or `ancestor` is reachable
	/// through superclass and interface edges.
	pub fn is_assignable_from(&self, ancestor: ClassId, descendant: ClassId) -> bool {
		if ancestor == descendant {
			return true;
		}

		let mut seen = FxHashSet::default();
		let mut stack = vec![descendant];
		while let Some(id) = stack.pop() {
			if !seen.insert(id) {
				continue;
			}
			let Some(info) = self.classes.get(&id) else {
				continue;
			};
			for &parent in info.superclass.iter().chain(info.interfaces) {
				if parent == ancestor {
					return true;
				}
				stack.push(parent);
			}
		}
		false
	}
}
