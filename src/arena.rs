//! Index-stable storage for network records.
//!
//! Records are only ever appended, never removed: a network releases all of its domains and
//! contractors at once when it is dropped. The index of a record is its identifier, so the arena
//! doubles as a monotonically increasing ID allocator.

use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// Identifier usable as an arena index.
pub trait ArenaId: Copy {
    fn from_index(index: usize) -> Self;
    fn index(self) -> usize;
}

pub struct Arena<I, T> {
    data: Vec<T>,
    _phantom: PhantomData<I>,
}

impl<I, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            _phantom: PhantomData,
        }
    }
}

impl<I, T> Arena<I, T>
where
    I: ArenaId,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of allocated records.
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Identifier the next allocation will receive.
    pub fn next_id(&self) -> I {
        I::from_index(self.data.len())
    }

    /// Allocates a record built from its own identifier.
    pub fn alloc_with(&mut self, f: impl FnOnce(I) -> T) -> I {
        let id = self.next_id();
        self.data.push(f(id));
        id
    }

    pub fn alloc(&mut self, value: T) -> I {
        self.alloc_with(|_| value)
    }

    pub fn contains(&self, id: I) -> bool {
        id.index() < self.data.len()
    }
    pub fn get(&self, id: I) -> Option<&T> {
        self.data.get(id.index())
    }

    /// Identifiers in allocation order.
    pub fn ids(&self) -> impl Iterator<Item = I> + '_ {
        (0..self.data.len()).map(I::from_index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> + '_ {
        self.data.iter().enumerate().map(|(i, x)| (I::from_index(i), x))
    }
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (I, &mut T)> + '_ {
        self.data.iter_mut().enumerate().map(|(i, x)| (I::from_index(i), x))
    }
}

impl<I, T> Index<I> for Arena<I, T>
where
    I: ArenaId,
{
    type Output = T;

    fn index(&self, id: I) -> &Self::Output {
        &self.data[id.index()]
    }
}

impl<I, T> IndexMut<I> for Arena<I, T>
where
    I: ArenaId,
{
    fn index_mut(&mut self, id: I) -> &mut Self::Output {
        &mut self.data[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Copy, Clone, PartialEq)]
    struct Id(usize);

    impl ArenaId for Id {
        fn from_index(index: usize) -> Self {
            Id(index)
        }
        fn index(self) -> usize {
            self.0
        }
    }

    #[test]
    fn test_alloc_is_monotonic() {
        let mut arena = Arena::<Id, &str>::new();
        assert_eq!(arena.alloc("a"), Id(0));
        assert_eq!(arena.alloc("b"), Id(1));
        assert_eq!(arena.next_id(), Id(2));
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_alloc_with_own_id() {
        let mut arena = Arena::<Id, (Id, i32)>::new();
        let id = arena.alloc_with(|id| (id, 42));
        assert_eq!(arena[id], (Id(0), 42));
    }

    #[test]
    fn test_get_and_index_mut() {
        let mut arena = Arena::<Id, i32>::new();
        let id = arena.alloc(10);
        arena[id] += 5;
        assert_eq!(arena.get(id), Some(&15));
        assert_eq!(arena.get(Id(3)), None);
        assert!(!arena.contains(Id(1)));
    }
}
