// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Indexed binary min-heap.

/// Capacity below which the queue never shrinks.
const MIN_CAPACITY: usize = 32;

/// A queued value with its priority and current heap position.
#[derive(Debug, Clone, PartialEq)]
pub struct Item<T> {
    pub value: T,
    pub priority: i64,
    index: usize,
}

impl<T> Item<T> {
    /// Position in the heap; valid until the next mutation of the queue.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Min-heap keyed by `i64` priority (lowest first).
///
/// Capacity is tracked explicitly: it doubles when a push finds the queue
/// full, and halves on pop once the population drops below half of it (never
/// below 32).
#[derive(Debug, Clone)]
pub struct PriorityQueue<T> {
    items: Vec<Item<T>>,
    cap: usize,
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::with_capacity(MIN_CAPACITY)
    }
}

impl<T> PriorityQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            items: Vec::with_capacity(cap),
            cap,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Add a value and return its heap index.
    pub fn push(&mut self, value: T, priority: i64) -> usize {
        if self.items.len() == self.cap {
            self.cap *= 2;
            self.items.reserve_exact(self.cap - self.items.len());
        }
        let index = self.items.len();
        self.items.push(Item {
            value,
            priority,
            index,
        });
        self.sift_up(index)
    }

    /// Lowest-priority item without removing it.
    pub fn peek(&self) -> Option<&Item<T>> {
        self.items.first()
    }

    /// Remove and return the lowest-priority item.
    pub fn pop(&mut self) -> Option<Item<T>> {
        let item = self.take(0)?;
        if self.items.len() < self.cap / 2 && self.cap > MIN_CAPACITY {
            self.cap /= 2;
            self.items.shrink_to(self.cap);
        }
        Some(item)
    }

    /// Remove the item at `index`, keeping heap order for the rest.
    pub fn remove(&mut self, index: usize) -> Option<Item<T>> {
        self.take(index)
    }

    /// Change an item's priority in place. Returns its new index.
    pub fn update(&mut self, index: usize, priority: i64) -> Option<usize> {
        let item = self.items.get_mut(index)?;
        item.priority = priority;
        Some(self.fix(index))
    }

    fn take(&mut self, index: usize) -> Option<Item<T>> {
        if index >= self.items.len() {
            return None;
        }
        let last = self.items.len() - 1;
        self.swap(index, last);
        let item = self.items.pop()?;
        if index < self.items.len() {
            self.fix(index);
        }
        Some(item)
    }

    fn fix(&mut self, index: usize) -> usize {
        let moved = self.sift_down(index);
        if moved != index {
            return moved;
        }
        self.sift_up(index)
    }

    fn sift_up(&mut self, mut index: usize) -> usize {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.items[parent].priority <= self.items[index].priority {
                break;
            }
            self.swap(parent, index);
            index = parent;
        }
        index
    }

    fn sift_down(&mut self, mut index: usize) -> usize {
        let len = self.items.len();
        loop {
            let left = 2 * index + 1;
            if left >= len {
                return index;
            }
            let right = left + 1;
            let child = if right < len && self.items[right].priority < self.items[left].priority {
                right
            } else {
                left
            };
            if self.items[index].priority <= self.items[child].priority {
                return index;
            }
            self.swap(index, child);
            index = child;
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.items.swap(a, b);
        self.items[a].index = a;
        self.items[b].index = b;
    }
}
