//! Ordered collections of fetched entities.

use crate::entity::{Entity, Resource};
use crate::identity::Identity;

/// Entities in server order.
#[derive(Debug, Clone)]
pub struct ResultSet<R: Resource> {
    items: Vec<Entity<R>>,
}

impl<R: Resource> ResultSet<R> {
    /// Wraps already-mapped entities.
    #[must_use]
    pub fn new(items: Vec<Entity<R>>) -> Self {
        Self { items }
    }

    /// Entity at `index`.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&Entity<R>> {
        self.items.get(index)
    }

    /// Mutable entity at `index`.
    pub fn at_mut(&mut self, index: usize) -> Option<&mut Entity<R>> {
        self.items.get_mut(index)
    }

    /// First entity.
    #[must_use]
    pub fn first(&self) -> Option<&Entity<R>> {
        self.items.first()
    }

    /// Borrowed slice of every entity.
    #[must_use]
    pub fn to_list(&self) -> &[Entity<R>] {
        &self.items
    }

    /// Consumes the set.
    #[must_use]
    pub fn into_vec(self) -> Vec<Entity<R>> {
        self.items
    }

    /// Identities of every persisted entity, in order.
    #[must_use]
    pub fn collect_ids(&self) -> Vec<Identity> {
        self.items.iter().filter_map(Entity::identity).collect()
    }

    /// Own ids of every persisted entity, in order.
    ///
    /// Nested identities contribute their last component.
    #[must_use]
    pub fn collect_own_ids(&self) -> Vec<u64> {
        self.collect_ids().iter().filter_map(Identity::own_id).collect()
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true when empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Entity<R>> {
        self.items.iter()
    }

    /// Iterates mutably in order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Entity<R>> {
        self.items.iter_mut()
    }
}

impl<R: Resource> Default for ResultSet<R> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<R: Resource> IntoIterator for ResultSet<R> {
    type Item = Entity<R>;
    type IntoIter = std::vec::IntoIter<Entity<R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, R: Resource> IntoIterator for &'a ResultSet<R> {
    type Item = &'a Entity<R>;
    type IntoIter = std::slice::Iter<'a, Entity<R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<R: Resource> FromIterator<Entity<R>> for ResultSet<R> {
    fn from_iter<I: IntoIterator<Item = Entity<R>>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

/// Something that names objects by id in a list filter.
///
/// Lets listing calls take raw ids, a fetched object or a whole result set.
pub trait IdSource {
    /// Ids in order; unsaved objects contribute nothing.
    fn own_ids(&self) -> Vec<u64>;
}

impl IdSource for [u64] {
    fn own_ids(&self) -> Vec<u64> {
        self.to_vec()
    }
}

impl<const N: usize> IdSource for [u64; N] {
    fn own_ids(&self) -> Vec<u64> {
        self.to_vec()
    }
}

impl IdSource for Vec<u64> {
    fn own_ids(&self) -> Vec<u64> {
        self.clone()
    }
}

impl<R: Resource> IdSource for Entity<R> {
    fn own_ids(&self) -> Vec<u64> {
        self.identity().and_then(|id| id.own_id()).into_iter().collect()
    }
}

impl<R: Resource> IdSource for ResultSet<R> {
    fn own_ids(&self) -> Vec<u64> {
        self.collect_own_ids()
    }
}
