//! Parent scripts: shared behavior providers and the per-instance use chain.
//!
//! A provider object may serve as parent script for many objects. Each bound
//! object holds its own chain of [`ParentScriptUse`] nodes, one per level of
//! inheritance, linked through [`ParentScriptUse::super_use`].

use std::cell::Cell;
use std::rc::Rc;

use rustc_hash::FxHashMap as HashMap;

use crate::{DispatchError, ObjectId};

/// A behavior provider shared by every object that uses it.
#[derive(Debug)]
pub struct ParentScript {
	object: Cell<Option<ObjectId>>,
}

impl ParentScript {
	fn new(object: ObjectId) -> Self {
		Self {
			object: Cell::new(Some(object)),
		}
	}

	/// Object whose script provides the handlers. `None` once it is destroyed.
	pub fn object(&self) -> Option<ObjectId> {
		self.object.get()
	}

	fn detach(&self) {
		self.object.set(None);
	}
}

/// One object's binding to one level of parent script.
#[derive(Debug)]
pub struct ParentScriptUse {
	parent: Rc<ParentScript>,
	super_use: Option<Rc<ParentScriptUse>>,
}

impl ParentScriptUse {
	pub fn parent(&self) -> &Rc<ParentScript> {
		&self.parent
	}

	/// Next level up, the parent script of this use's provider.
	pub fn super_use(&self) -> Option<&Rc<ParentScriptUse>> {
		self.super_use.as_ref()
	}
}

/// Bindings from objects to their parent-script providers.
#[derive(Debug, Default)]
pub(crate) struct ParentScripts {
	bindings: HashMap<ObjectId, ObjectId>,
	providers: HashMap<ObjectId, Rc<ParentScript>>,
}

impl ParentScripts {
	pub(crate) fn provider_of(&self, object: ObjectId) -> Option<ObjectId> {
		self.bindings.get(&object).copied()
	}

	pub(crate) fn bound(&self) -> Vec<ObjectId> {
		self.bindings.keys().copied().collect()
	}

	pub(crate) fn bind(&mut self, object: ObjectId, provider: Option<ObjectId>) -> Result<(), DispatchError> {
		let Some(provider) = provider else {
			self.bindings.remove(&object);
			return Ok(());
		};
		let mut cursor = Some(provider);
		while let Some(current) = cursor {
			if current == object {
				return Err(DispatchError::BehaviorCycle { object, provider });
			}
			cursor = self.provider_of(current);
		}
		self.bindings.insert(object, provider);
		Ok(())
	}

	/// Builds a fresh use chain for `object`, `None` if it has no parent script.
	pub(crate) fn use_chain(&mut self, object: ObjectId) -> Option<Rc<ParentScriptUse>> {
		let mut levels = Vec::new();
		let mut cursor = self.provider_of(object);
		while let Some(provider) = cursor {
			if levels.contains(&provider) {
				break;
			}
			levels.push(provider);
			cursor = self.provider_of(provider);
		}
		levels.into_iter().rev().fold(None, |super_use, provider| {
			let parent = Rc::clone(
				self.providers
					.entry(provider)
					.or_insert_with(|| Rc::new(ParentScript::new(provider))),
			);
			Some(Rc::new(ParentScriptUse { parent, super_use }))
		})
	}

	/// Drops every binding of a destroyed object, both its own and those of
	/// objects using it as provider, and unresolves it.
	///
	/// Returns the objects that lost their parent script.
	pub(crate) fn forget(&mut self, object: ObjectId) -> Vec<ObjectId> {
		self.bindings.remove(&object);
		let orphans: Vec<ObjectId> = self
			.bindings
			.iter()
			.filter(|(_, provider)| **provider == object)
			.map(|(user, _)| *user)
			.collect();
		for user in &orphans {
			self.bindings.remove(user);
		}
		if let Some(parent) = self.providers.remove(&object) {
			parent.detach();
		}
		orphans
	}
}
