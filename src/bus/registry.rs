use std::any::{
    Any,
    TypeId
};

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::SubscriptionId;
use super::handler::Invoker;

/// A removed entry, kept alive until its owner decides where to drop it.
pub (crate) type Evicted = Box<dyn Any + Send>;

#[derive(Debug, Error)]
#[error("Handler group for {type_name} holds a different payload type")]
pub (crate) struct GroupMismatch {
    pub type_name: &'static str,
}

/// All entries registered for one payload type, in subscription order.
struct HandlerGroup<E> {
    entries: Vec<(SubscriptionId, Invoker<E>)>,
}

trait ErasedGroup: Send + Sync {
    fn remove(&mut self, id: SubscriptionId) -> Option<Evicted>;
    fn len(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<E: 'static> ErasedGroup for HandlerGroup<E> {
    fn remove(&mut self, id: SubscriptionId) -> Option<Evicted> {
        let pos = self.entries.iter().position(|(entry_id, _)| *entry_id == id)?;
        let (_, invoker) = self.entries.remove(pos);
        Some(Box::new(invoker))
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Multi-valued mapping from payload type to handler entries.
///
/// Not synchronized by itself; the bus wraps it in a
/// [`ConcurrencyGuard`](super::guard::ConcurrencyGuard).
pub (crate) struct EventRegistry {
    groups: FxHashMap<TypeId, Box<dyn ErasedGroup>>,
    index: FxHashMap<SubscriptionId, TypeId>,
}

impl EventRegistry {

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            groups: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            index: FxHashMap::default(),
        }
    }

    pub fn insert<E: 'static>(&mut self, id: SubscriptionId, invoker: Invoker<E>) {
        let type_id = TypeId::of::<E>();
        let group = self.groups
            .entry(type_id)
            .or_insert_with(|| Box::new(HandlerGroup::<E> { entries: Vec::new() }) as Box<dyn ErasedGroup>);

        // The group was created for `E` under `TypeId::of::<E>()`.
        if let Some(group) = group.as_any_mut().downcast_mut::<HandlerGroup<E>>() {
            group.entries.push((id, invoker));
            self.index.insert(id, type_id);
        }
    }

    pub fn remove(&mut self, id: SubscriptionId) -> Option<Evicted> {
        let type_id = self.index.remove(&id)?;
        let group = self.groups.get_mut(&type_id)?;
        let evicted = group.remove(id);
        if group.len() == 0 {
            self.groups.remove(&type_id);
        }
        evicted
    }

    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.index.contains_key(&id)
    }

    /// Copies the current entries for `E`. An unknown type yields an empty set.
    pub fn snapshot<E: 'static>(&self) -> Result<Vec<(SubscriptionId, Invoker<E>)>, GroupMismatch> {
        let Some(group) = self.groups.get(&TypeId::of::<E>()) else {
            return Ok(Vec::new());
        };

        group.as_any()
            .downcast_ref::<HandlerGroup<E>>()
            .map(|group| group.entries.clone())
            .ok_or(GroupMismatch { type_name: std::any::type_name::<E>() })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn len_of<E: 'static>(&self) -> usize {
        self.groups
            .get(&TypeId::of::<E>())
            .map_or(0, |group| group.len())
    }

    /// Empties the registry, handing back every group so the caller can drop
    /// them outside its lock.
    pub fn clear(&mut self) -> Vec<Evicted> {
        self.index.clear();
        self.groups
            .drain()
            .map(|(_, group)| Box::new(group) as Evicted)
            .collect()
    }
}
