//! Storage with stable indices, used to map poller tokens to socket
//! components. Freed slots are handed out again, most recent first.

use std::iter::Enumerate;
use std::marker::PhantomData;
use std::mem;
use std::ops::Index;
use std::slice;

enum Slot<T> {
    // next vacant slot in the free list
    Vacant(Option<usize>),
    Occupied(T),
}

pub struct Slab<T, I = usize> {
    slots: Vec<Slot<T>>,
    len: usize,
    vacant: Option<usize>,
    _index: PhantomData<I>,
}

impl<T, I> Slab<T, I>
where
    I: From<usize> + Into<usize>,
{
    #[inline]
    pub fn new() -> Self {
        Slab {
            slots: Vec::new(),
            len: 0,
            vacant: None,
            _index: PhantomData,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stores `elem` and returns its index.
    pub fn insert(&mut self, elem: T) -> I {
        self.len += 1;
        match self.vacant {
            Some(idx) => {
                if let Slot::Vacant(next) = self.slots[idx] {
                    self.vacant = next;
                }
                self.slots[idx] = Slot::Occupied(elem);
                I::from(idx)
            }
            None => {
                self.slots.push(Slot::Occupied(elem));
                I::from(self.slots.len() - 1)
            }
        }
    }

    pub fn remove(&mut self, idx: I) -> Option<T> {
        let idx = idx.into();
        match self.slots.get(idx) {
            Some(&Slot::Occupied(_)) => {}
            _ => return None,
        }
        let old = mem::replace(&mut self.slots[idx], Slot::Vacant(self.vacant));
        self.vacant = Some(idx);
        self.len -= 1;
        match old {
            Slot::Occupied(elem) => Some(elem),
            Slot::Vacant(_) => None,
        }
    }

    #[inline]
    pub fn contains(&self, idx: I) -> bool {
        self.get(idx).is_some()
    }

    pub fn get(&self, idx: I) -> Option<&T> {
        match self.slots.get(idx.into()) {
            Some(&Slot::Occupied(ref elem)) => Some(elem),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, idx: I) -> Option<&mut T> {
        match self.slots.get_mut(idx.into()) {
            Some(&mut Slot::Occupied(ref mut elem)) => Some(elem),
            _ => None,
        }
    }

    /// Occupied slots in index order.
    #[inline]
    pub fn iter(&self) -> Iter<T, I> {
        Iter {
            slots: self.slots.iter().enumerate(),
            _index: PhantomData,
        }
    }
}

impl<T, I> Default for Slab<T, I>
where
    I: From<usize> + Into<usize>,
{
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T, I> Index<I> for Slab<T, I>
where
    I: From<usize> + Into<usize>,
{
    type Output = T;

    /// Panics if `idx` is vacant.
    #[inline]
    fn index(&self, idx: I) -> &T {
        let i = idx.into();
        match self.slots.get(i) {
            Some(&Slot::Occupied(ref elem)) => elem,
            _ => panic!("no entry at slab index {}", i),
        }
    }
}

pub struct Iter<'a, T: 'a, I> {
    slots: Enumerate<slice::Iter<'a, Slot<T>>>,
    _index: PhantomData<I>,
}

impl<'a, T, I: From<usize>> Iterator for Iter<'a, T, I> {
    type Item = (I, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        for (idx, slot) in &mut self.slots {
            if let Slot::Occupied(ref elem) = *slot {
                return Some((I::from(idx), elem));
            }
        }
        None
    }
}
