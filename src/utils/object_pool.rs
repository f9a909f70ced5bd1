use super::handle::HandleLike;
use super::handle_pool::HandlePool;

/// A named object collections. Every time u create or free a handle, a
/// attached instance `T` will be created/ freed.
pub struct ObjectPool<H: HandleLike, T: Sized> {
    handles: HandlePool<H>,
    entries: Vec<Option<T>>,
}

impl<H: HandleLike, T: Sized> Default for ObjectPool<H, T> {
    fn default() -> Self {
        ObjectPool::new()
    }
}

impl<H: HandleLike, T: Sized> ObjectPool<H, T> {
    /// Constructs a new, empty `ObjectPool`.
    pub fn new() -> Self {
        ObjectPool {
            handles: HandlePool::new(),
            entries: Vec::new(),
        }
    }

    /// Creates a `T` and named it with `Handle`.
    pub fn create(&mut self, value: T) -> H {
        let handle = self.handles.create();

        if handle.index() >= self.entries.len() as u32 {
            self.entries.push(Some(value));
        } else {
            self.entries[handle.index() as usize] = Some(value);
        }

        handle
    }

    /// Returns mutable reference to internal value with name `Handle`.
    #[inline]
    pub fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        if self.handles.is_alive(handle) {
            self.entries[handle.index() as usize].as_mut()
        } else {
            None
        }
    }

    /// Returns immutable reference to internal value with name `Handle`.
    #[inline]
    pub fn get(&self, handle: H) -> Option<&T> {
        if self.handles.is_alive(handle) {
            self.entries[handle.index() as usize].as_ref()
        } else {
            None
        }
    }

    #[inline]
    pub fn is_alive(&self, handle: H) -> bool {
        self.handles.is_alive(handle)
    }

    /// Recycles the value with name `Handle`.
    #[inline]
    pub fn free(&mut self, handle: H) -> Option<T> {
        if self.handles.free(handle) {
            self.entries[handle.index() as usize].take()
        } else {
            None
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an iterator over the living handles.
    pub fn handles<'a>(&'a self) -> impl Iterator<Item = H> + 'a {
        self.handles.iter()
    }

    /// Visits every living object mutably.
    pub fn iter_mut<'a>(&'a mut self) -> impl Iterator<Item = (H, &'a mut T)> + 'a {
        let handles = &self.handles;
        self.entries
            .iter_mut()
            .enumerate()
            .filter_map(move |(i, v)| {
                let v = v.as_mut()?;
                Some((handles.handle_at(i)?, v))
            })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::handle::Handle;

    #[test]
    fn create_and_free() {
        let mut pool: ObjectPool<Handle, u32> = ObjectPool::new();
        let a = pool.create(1);
        let b = pool.create(2);
        assert_eq!(pool.get(a), Some(&1));

        *pool.get_mut(b).unwrap() = 5;
        assert_eq!(pool.free(b), Some(5));
        assert_eq!(pool.get(b), None);
        assert_eq!(pool.free(b), None);

        let c = pool.create(7);
        assert_eq!(c.index(), b.index());
        assert_eq!(pool.get(c), Some(&7));
        assert_eq!(pool.len(), 2);

        let all: Vec<_> = pool.iter_mut().map(|(h, v)| (h, *v)).collect();
        assert_eq!(all, vec![(a, 1), (c, 7)]);
    }
}
