use std::collections::VecDeque;

/// Fixed-capacity list that evicts the oldest entry when full.
///
/// `push_back` keeps chronological order (oldest at the front);
/// `push_front` keeps most-recent-first order (oldest at the back).
/// Use one insertion end per history.
#[derive(Debug, Clone)]
pub struct BoundedHistory<T> {
    buffer: VecDeque<T>,
    capacity: usize,
    newest_at_front: bool,
}

impl<T> BoundedHistory<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
            newest_at_front: false,
        }
    }

    pub fn push_back(&mut self, item: T) {
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(item);
        self.newest_at_front = false;
    }

    pub fn push_front(&mut self, item: T) {
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_back();
        }
        self.buffer.push_front(item);
        self.newest_at_front = true;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buffer.iter()
    }

    pub fn front(&self) -> Option<&T> {
        self.buffer.front()
    }

    pub fn back(&self) -> Option<&T> {
        self.buffer.back()
    }

    /// Most recently inserted entry, whichever end it went in at.
    pub fn latest(&self) -> Option<&T> {
        if self.newest_at_front {
            self.buffer.front()
        } else {
            self.buffer.back()
        }
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl<T: Clone> BoundedHistory<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.buffer.iter().cloned().collect()
    }
}
