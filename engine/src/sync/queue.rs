use std::collections::VecDeque;

use parking_lot::Mutex;

/// Mutex-wrapped FIFO.
///
/// Serves two roles with identical semantics: the pre-filled work list of
/// page ids drained by indexing workers, and each word's posting list in
/// first-seen document order.
pub struct ThreadSafeQueue<T> {
    items: Mutex<VecDeque<T>>,
}

impl<T> ThreadSafeQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push(&self, value: T) {
        self.items.lock().push_back(value);
    }

    /// Non-blocking pop. An empty queue means no more work; callers never
    /// wait for a refill.
    pub fn try_pop(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    /// Projects the first element `f` maps to `Some`.
    pub fn find_map<R, F>(&self, mut f: F) -> Option<R>
    where
        F: FnMut(&T) -> Option<R>,
    {
        self.items.lock().iter().find_map(|v| f(v))
    }

    /// Applies `apply` to the first element accepted by `matches`, inserting
    /// `create()` first when there is no match. One critical section, so
    /// concurrent upserts for the same logical element never duplicate it and
    /// never drop an update.
    pub fn upsert<M, A, C>(&self, matches: M, apply: A, create: C)
    where
        M: Fn(&T) -> bool,
        A: FnOnce(&mut T),
        C: FnOnce() -> T,
    {
        let mut items = self.items.lock();
        if let Some(v) = items.iter_mut().find(|v| matches(&**v)) {
            apply(v);
            return;
        }
        let mut v = create();
        apply(&mut v);
        items.push_back(v);
    }

    /// Unlinks and returns the first match.
    pub fn remove_where<M>(&self, matches: M) -> Option<T>
    where
        M: Fn(&T) -> bool,
    {
        let mut items = self.items.lock();
        let pos = items.iter().position(|v| matches(v))?;
        items.remove(pos)
    }

    /// Visits every element in queue order; the visitor must not push to or
    /// pop from this queue.
    pub fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(&T),
    {
        for v in self.items.lock().iter() {
            visit(v);
        }
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl<T> Default for ThreadSafeQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
