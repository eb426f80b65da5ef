use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use cardstack_deletion::{DeletionPools, Reclaim, SuspendCookie};
use slab::Slab;

use crate::parent_script::ParentScriptUse;
use crate::{HandlerList, HasHandlers, ScriptError};

/// Generational handle to an object in the [`ObjectStore`].
///
/// A handle outlives its object safely: lookups through a stale handle fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
	index: u32,
	generation: u32,
}

impl fmt::Display for ObjectId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}.{}", self.index, self.generation)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
	Stack,
	Card,
	Group,
	Button,
	Field,
}

impl ObjectKind {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Stack => "stack",
			Self::Card => "card",
			Self::Group => "group",
			Self::Button => "button",
			Self::Field => "field",
		}
	}
}

bitflags! {
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct ObjectFlags: u32 {
		/// Ignores user-interaction messages under the browse tool.
		const DISABLED = 1 << 0;
		/// Receives no messages at all.
		const NO_MESSAGES = 1 << 1;
	}
}

/// Script state of one object. Compiled lazily.
#[derive(Debug, Default)]
pub(crate) struct Script {
	pub(crate) source: Option<String>,
	pub(crate) handlers: Option<Rc<HandlerList>>,
	/// Compilation failed; not retried until the source changes or a forced parse.
	pub(crate) dead: bool,
	pub(crate) error: Option<ScriptError>,
	pub(crate) has_handlers: HasHandlers,
}

#[derive(Debug)]
pub(crate) struct ObjectRecord {
	pub(crate) generation: u32,
	pub(crate) kind: ObjectKind,
	pub(crate) name: String,
	pub(crate) owner: Option<ObjectId>,
	/// Objects this one owns, in creation order.
	pub(crate) children: Vec<ObjectId>,
	pub(crate) flags: ObjectFlags,
	pub(crate) script: Script,
	pub(crate) parent_script: Option<Rc<ParentScriptUse>>,
	/// Nesting of handlers currently executing from this object's script.
	pub(crate) depth: Rc<Cell<u32>>,
}

/// Owns every object and defers their destruction through [`DeletionPools`].
#[derive(Debug, Default)]
pub struct ObjectStore {
	objects: Slab<ObjectRecord>,
	next_generation: u32,
	pools: DeletionPools<ObjectId>,
}

impl ObjectStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub(crate) fn insert(&mut self, kind: ObjectKind, name: String, owner: Option<ObjectId>) -> ObjectId {
		self.next_generation = self.next_generation.wrapping_add(1);
		let generation = self.next_generation;
		let index = self.objects.insert(ObjectRecord {
			generation,
			kind,
			name,
			owner,
			children: Vec::new(),
			flags: ObjectFlags::empty(),
			script: Script::default(),
			parent_script: None,
			depth: Rc::new(Cell::new(0)),
		});
		let id = ObjectId {
			index: u32::try_from(index).unwrap_or(u32::MAX),
			generation,
		};
		if let Some(parent) = owner.and_then(|owner| self.get_mut(owner)) {
			parent.children.push(id);
		}
		self.pools.on_object_created(id);
		tracing::trace!(%id, kind = kind.as_str(), "object.created");
		id
	}

	pub(crate) fn get(&self, id: ObjectId) -> Option<&ObjectRecord> {
		self.objects.get(id.index as usize).filter(|record| record.generation == id.generation)
	}

	pub(crate) fn get_mut(&mut self, id: ObjectId) -> Option<&mut ObjectRecord> {
		self.objects.get_mut(id.index as usize).filter(|record| record.generation == id.generation)
	}

	/// Whether the object still exists, deletion-pending or not.
	pub fn contains(&self, id: ObjectId) -> bool {
		self.get(id).is_some()
	}

	/// Whether the object exists and has not been deleted.
	pub fn is_live(&self, id: ObjectId) -> bool {
		self.contains(id) && !self.pools.is_deleted(id)
	}

	pub fn len(&self) -> usize {
		self.objects.len()
	}

	pub fn is_empty(&self) -> bool {
		self.objects.is_empty()
	}

	pub fn owner(&self, id: ObjectId) -> Option<ObjectId> {
		self.get(id).and_then(|record| record.owner)
	}

	pub fn kind(&self, id: ObjectId) -> Option<ObjectKind> {
		self.get(id).map(|record| record.kind)
	}

	/// Stack the object belongs to, the object itself for stacks.
	pub fn stack_of(&self, id: ObjectId) -> Option<ObjectId> {
		let mut cursor = id;
		loop {
			let record = self.get(cursor)?;
			if record.kind == ObjectKind::Stack {
				return Some(cursor);
			}
			cursor = record.owner?;
		}
	}

	/// Whether the object hangs off a stack and can receive messages.
	pub fn is_attached(&self, id: ObjectId) -> bool {
		self.get(id)
			.is_some_and(|record| record.kind == ObjectKind::Stack || record.owner.is_some_and(|owner| self.contains(owner)))
	}

	/// `button "ok" of card "main" of stack "app"`.
	pub fn long_name(&self, id: ObjectId) -> String {
		let mut parts = Vec::new();
		let mut cursor = Some(id);
		while let Some(current) = cursor {
			let Some(record) = self.get(current) else {
				break;
			};
			parts.push(format!("{} \"{}\"", record.kind.as_str(), record.name));
			cursor = record.owner;
		}
		if parts.is_empty() {
			return format!("object {id}");
		}
		parts.join(" of ")
	}

	/// Objects owned by `id` that have not been destroyed yet.
	pub fn children(&self, id: ObjectId) -> &[ObjectId] {
		self.get(id).map(|record| record.children.as_slice()).unwrap_or_default()
	}

	/// Requests deferred deletion of the object and everything it owns.
	pub fn delete(&mut self, id: ObjectId) -> bool {
		if !self.is_live(id) {
			return false;
		}
		let children = self.children(id).to_vec();
		for child in children {
			self.delete(child);
		}
		self.pools.on_object_deleted(id)
	}

	pub fn suspend_deletion(&mut self, id: ObjectId) -> Option<SuspendCookie> {
		self.pools.suspend_deletion(id)
	}

	pub fn resume_deletion(&mut self, id: ObjectId, cookie: Option<SuspendCookie>) {
		self.pools.resume_deletion(id, cookie);
	}

	pub fn wait_depth(&self) -> usize {
		self.pools.depth()
	}

	pub fn pool_count(&self) -> usize {
		self.pools.pool_count()
	}

	pub fn take_drain_request(&mut self) -> bool {
		self.pools.take_drain_request()
	}

	pub fn freeze_pools(&mut self) {
		self.pools.freeze();
	}

	pub fn thaw_pools(&mut self) {
		self.pools.thaw();
	}

	/// Destroys objects queued on the current pool. Returns their handles.
	pub fn drain(&mut self) -> Vec<ObjectId> {
		let Self { objects, pools, .. } = self;
		let mut reclaimed = Vec::new();
		pools.drain(&mut |r| reclaimed.push(Self::destroy(objects, r)));
		reclaimed
	}

	pub fn enter_wait(&mut self, dispatching: bool) -> Vec<ObjectId> {
		let Self { objects, pools, .. } = self;
		let mut reclaimed = Vec::new();
		pools.enter_wait(dispatching, &mut |r| reclaimed.push(Self::destroy(objects, r)));
		reclaimed
	}

	pub fn leave_wait(&mut self, dispatching: bool) -> Vec<ObjectId> {
		let Self { objects, pools, .. } = self;
		let mut reclaimed = Vec::new();
		pools.leave_wait(dispatching, &mut |r| reclaimed.push(Self::destroy(objects, r)));
		reclaimed
	}

	/// Destroys every pending deletion, then every remaining object.
	pub fn teardown(&mut self) -> Vec<ObjectId> {
		let Self { objects, pools, .. } = self;
		let mut reclaimed = Vec::new();
		pools.teardown(&mut |r| reclaimed.push(Self::destroy(objects, r)));
		let remaining: Vec<ObjectId> = objects
			.iter()
			.map(|(index, record)| ObjectId {
				index: u32::try_from(index).unwrap_or(u32::MAX),
				generation: record.generation,
			})
			.collect();
		for id in remaining {
			objects.remove(id.index as usize);
			pools.on_object_destroyed(id);
			reclaimed.push(id);
		}
		reclaimed
	}

	fn destroy(objects: &mut Slab<ObjectRecord>, reclaim: Reclaim<ObjectId>) -> ObjectId {
		let id = reclaim.key;
		match objects.get(id.index as usize) {
			Some(record) if record.generation == id.generation => {
				let record = objects.remove(id.index as usize);
				if let Some(owner) = record.owner {
					if let Some(parent) = objects.get_mut(owner.index as usize).filter(|parent| parent.generation == owner.generation) {
						parent.children.retain(|child| *child != id);
					}
				}
				tracing::trace!(%id, depth = reclaim.depth, name = %record.name, "object.destroyed");
			}
			_ => tracing::warn!(%id, "object.destroy of unknown object"),
		}
		id
	}
}
