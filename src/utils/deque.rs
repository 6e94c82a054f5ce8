use alloc::boxed::Box;

/// Smallest capacity allocated once the deque holds anything
const MIN_CAPACITY: usize = 4;

/// A growable double-ended queue backed by a ring buffer
///
/// Elements are pushed at the back and drained from the front. Unlike a fixed
/// rolling window, a full deque never overwrites: it doubles its capacity and
/// relinearises its contents, so the caller alone decides what leaves. Once
/// fewer than a quarter of the slots are in use it halves again, down to
/// `MIN_CAPACITY`.
#[derive(Debug, Clone)]
pub struct Deque<T> {
    /// The buffer allocated on the heap, `cap` slots long
    buf: Box<[T]>,
    /// The capacity of the deque
    cap: usize,
    /// The index of the front element in the buffer
    front: usize,
    /// The index one past the back element in the buffer
    back: usize,
    /// The current number of elements stored in the deque
    len: usize,
}

impl<T> Default for Deque<T>
where
    T: Default + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deque<T>
where
    T: Default + Clone,
{
    /// Creates an empty `Deque` without allocating
    ///
    /// # Returns
    ///
    /// * `Self` - The `Deque` instance
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty `Deque` with room for `cap` elements before growing
    ///
    /// # Arguments
    ///
    /// * `cap` - The initial capacity of the deque
    ///
    /// # Returns
    ///
    /// * `Self` - The `Deque` instance
    #[inline]
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buf: vec![T::default(); cap].into_boxed_slice(),
            cap,
            front: 0,
            back: 0,
            len: 0,
        }
    }

    /// Returns true if the deque is empty
    ///
    /// # Returns
    ///
    /// * `bool` - True if the deque is empty
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the current number of elements stored in the deque
    ///
    /// # Returns
    ///
    /// * `usize` - The current number of elements stored in the deque
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns the number of elements the deque can hold before growing
    ///
    /// # Returns
    ///
    /// * `usize` - The capacity of the deque
    #[cfg(test)]
    pub const fn capacity(&self) -> usize {
        self.cap
    }

    /// Clears all elements and resets the indices, keeping the allocation
    #[inline]
    pub fn reset(&mut self) -> &mut Self {
        self.buf.fill(T::default());
        self.front = 0;
        self.back = 0;
        self.len = 0;
        self
    }

    /// Moves the elements to the start of a new buffer of `cap` slots
    fn resize(&mut self, cap: usize) {
        debug_assert!(cap >= self.len);
        let mut buf = vec![T::default(); cap].into_boxed_slice();
        for (i, slot) in buf.iter_mut().take(self.len).enumerate() {
            *slot = core::mem::take(&mut self.buf[(self.front + i) % self.cap]);
        }

        self.buf = buf;
        self.cap = cap;
        self.front = 0;
        self.back = self.len;
    }

    /// Pushes a new element to the back of the deque, growing it when full
    ///
    /// # Arguments
    ///
    /// * `value` - The value to push to the back of the deque
    #[inline]
    pub fn push_back(&mut self, value: T) {
        if self.len == self.cap {
            self.resize((self.cap * 2).max(MIN_CAPACITY));
        }

        self.buf[self.back] = value;
        self.back = (self.back + 1) % self.cap;
        self.len += 1;
    }

    /// Pops the element from the front of the deque
    ///
    /// If the deque is empty, returns None
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The element at the front of the deque, if it exists
    #[inline]
    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }

        let value = core::mem::take(&mut self.buf[self.front]);
        self.front = (self.front + 1) % self.cap;
        self.len -= 1;

        if self.cap > MIN_CAPACITY && self.len < self.cap / 4 {
            self.resize((self.cap / 2).max(MIN_CAPACITY));
        }

        Some(value)
    }

    /// Returns a reference to the front element of the deque
    ///
    /// If the deque is empty, returns None
    ///
    /// # Returns
    ///
    /// * `Option<&T>` - A reference to the oldest element, if it exists
    #[inline]
    pub const fn front(&self) -> Option<&T> {
        self.get(0)
    }

    /// Returns a reference to the back element of the deque
    ///
    /// If the deque is empty, returns None
    ///
    /// # Returns
    ///
    /// * `Option<&T>` - A reference to the newest element, if it exists
    #[cfg(test)]
    pub const fn back(&self) -> Option<&T> {
        if self.is_empty() {
            None
        } else {
            self.get(self.len - 1)
        }
    }

    /// Returns a reference to the element at the specified index from the front
    ///
    /// If the index is out of bounds, returns None
    ///
    /// # Arguments
    ///
    /// * `i` - The index of the element to retrieve
    ///
    /// # Returns
    ///
    /// * `Option<&T>` - A reference to the element at the specified index, if it exists
    #[inline]
    pub const fn get(&self, i: usize) -> Option<&T> {
        if i >= self.len {
            None
        } else {
            let idx = (self.front + i) % self.cap;
            Some(&self.buf[idx])
        }
    }

    /// Returns an iterator over the elements, front to back
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        (0..self.len).map(move |i| &self.buf[(self.front + i) % self.cap])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_does_not_allocate() {
        let deque = Deque::<u32>::new();
        assert_eq!(deque.capacity(), 0);
        assert!(deque.is_empty());
        assert_eq!(deque.front(), None);
        assert_eq!(deque.back(), None);
    }

    #[test]
    fn test_push_pop_front() {
        let mut deque = Deque::new();

        deque.push_back(1);
        deque.push_back(2);
        deque.push_back(3);

        assert_eq!(deque.front(), Some(&1));
        assert_eq!(deque.back(), Some(&3));

        assert_eq!(deque.pop_front(), Some(1));
        assert_eq!(deque.pop_front(), Some(2));
        assert_eq!(deque.pop_front(), Some(3));
        assert!(deque.is_empty());
        assert_eq!(deque.pop_front(), None);
    }

    #[test]
    fn test_grows_instead_of_overwriting() {
        let mut deque = Deque::with_capacity(2);
        deque.push_back(10);
        deque.push_back(20);
        deque.push_back(30);

        assert_eq!(deque.len(), 3);
        assert_eq!(deque.capacity(), MIN_CAPACITY);
        assert_eq!(deque.iter().copied().collect::<Vec<_>>(), vec![10, 20, 30]);
    }

    #[test]
    fn test_grow_relinearises_wrapped_contents() {
        let mut deque = Deque::with_capacity(4);
        for i in 0..4 {
            deque.push_back(i);
        }
        deque.pop_front();
        deque.pop_front();
        deque.push_back(4);
        deque.push_back(5);

        // Buffer is full and wrapped, the next push forces a grow
        deque.push_back(6);

        assert_eq!(deque.capacity(), 8);
        assert_eq!(deque.front(), Some(&2));
        assert_eq!(deque.back(), Some(&6));
        assert_eq!(
            deque.iter().copied().collect::<Vec<_>>(),
            vec![2, 3, 4, 5, 6]
        );
    }

    #[test]
    fn test_shrinks_after_draining() {
        let mut deque = Deque::new();
        for i in 0..1_000 {
            deque.push_back(i);
        }
        assert_eq!(deque.capacity(), 1_024);

        for _ in 0..999 {
            deque.pop_front();
        }

        assert_eq!(deque.len(), 1);
        assert_eq!(deque.capacity(), MIN_CAPACITY);
        assert_eq!(deque.front(), Some(&999));
        assert_eq!(deque.back(), Some(&999));

        // Still usable after shrinking
        deque.push_back(1_000);
        assert_eq!(deque.iter().copied().collect::<Vec<_>>(), vec![999, 1_000]);
    }

    #[test]
    fn test_shrink_keeps_wrapped_order() {
        let mut deque = Deque::with_capacity(16);
        for i in 0..14 {
            deque.push_back(i);
        }
        for _ in 0..10 {
            deque.pop_front();
        }
        for i in 14..17 {
            deque.push_back(i);
        }
        for _ in 0..3 {
            deque.pop_front();
        }
        assert_eq!(deque.capacity(), 16);

        // Contents wrap past the end of the buffer when this pop shrinks it
        deque.pop_front();

        assert_eq!(deque.capacity(), 8);
        assert_eq!(deque.iter().copied().collect::<Vec<_>>(), vec![14, 15, 16]);
    }

    #[test]
    fn test_get() {
        let mut deque = Deque::new();
        deque.push_back(5);
        deque.push_back(6);
        deque.push_back(7);

        assert_eq!(deque.get(0), Some(&5));
        assert_eq!(deque.get(1), Some(&6));
        assert_eq!(deque.get(2), Some(&7));
        assert_eq!(deque.get(3), None);
    }

    #[test]
    fn test_reset_keeps_capacity() {
        let mut deque = Deque::new();
        deque.push_back(1);
        deque.push_back(2);
        deque.push_back(3);

        deque.reset();
        assert!(deque.is_empty());
        assert_eq!(deque.front(), None);
        assert_eq!(deque.capacity(), MIN_CAPACITY);

        deque.push_back(42);
        assert_eq!(deque.front(), Some(&42));
        assert_eq!(deque.back(), Some(&42));
    }

    #[test]
    fn test_sliding_many_times_stays_small() {
        let mut deque = Deque::new();
        for i in 0..1_000 {
            deque.push_back(i);
            if deque.len() > 3 {
                deque.pop_front();
            }
        }

        assert_eq!(deque.len(), 3);
        assert_eq!(deque.capacity(), MIN_CAPACITY);
        assert_eq!(deque.front(), Some(&997));
        assert_eq!(deque.back(), Some(&999));
    }
}
