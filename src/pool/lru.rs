//! Arena-backed intrusive doubly-linked LRU list (`spec.md` §4.H, §9
//! "Intrusive LRU with back-references").
//!
//! The arena owns every node; a [`Handle`] is a generational index into it
//! so a stale handle — one captured before its node was freed and the slot
//! reused — can be told apart from a live one instead of silently
//! aliasing a different entry, the memory-safe replacement for the
//! source's raw list-element pointer.

/// The integer entry id a [`Handle`] currently names the LRU position of.
pub type EntryId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handle {
    slot: usize,
    generation: u32,
}

#[derive(Debug)]
struct Node {
    entry: EntryId,
    prev: Option<usize>,
    next: Option<usize>,
    generation: u32,
    occupied: bool,
}

#[derive(Debug, Default)]
pub struct Lru {
    nodes: Vec<Node>,
    free: Vec<usize>,
    head: Option<usize>, // most-recently-used
    tail: Option<usize>, // least-recently-used
    len: usize,
}

impl Lru {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Push `entry` to the head (MRU position); returns the handle.
    pub fn push_front(&mut self, entry: EntryId) -> Handle {
        let slot = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot].generation += 1;
                self.nodes[slot].entry = entry;
                self.nodes[slot].occupied = true;
                slot
            }
            None => {
                self.nodes.push(Node {
                    entry,
                    prev: None,
                    next: None,
                    generation: 0,
                    occupied: true,
                });
                self.nodes.len() - 1
            }
        };

        self.nodes[slot].prev = None;
        self.nodes[slot].next = self.head;
        if let Some(h) = self.head {
            self.nodes[h].prev = Some(slot);
        }
        self.head = Some(slot);
        if self.tail.is_none() {
            self.tail = Some(slot);
        }
        self.len += 1;

        Handle {
            slot,
            generation: self.nodes[slot].generation,
        }
    }

    fn valid(&self, handle: Handle) -> Option<usize> {
        let node = self.nodes.get(handle.slot)?;
        if node.occupied && node.generation == handle.generation {
            Some(handle.slot)
        } else {
            None
        }
    }

    /// Detach `handle`'s node from the list in O(1), freeing the slot.
    pub fn detach(&mut self, handle: Handle) {
        let Some(slot) = self.valid(handle) else {
            return;
        };
        let (prev, next) = (self.nodes[slot].prev, self.nodes[slot].next);
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }
        self.nodes[slot].occupied = false;
        self.nodes[slot].prev = None;
        self.nodes[slot].next = None;
        self.free.push(slot);
        self.len -= 1;
    }

    /// Move `handle`'s node to the head (MRU) in O(1).
    pub fn move_to_front(&mut self, handle: Handle) {
        if self.head == Some(handle.slot) {
            return;
        }
        let Some(slot) = self.valid(handle) else {
            return;
        };
        let (prev, next) = (self.nodes[slot].prev, self.nodes[slot].next);
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }
        self.nodes[slot].prev = None;
        self.nodes[slot].next = self.head;
        if let Some(h) = self.head {
            self.nodes[h].prev = Some(slot);
        }
        self.head = Some(slot);
    }

    /// Pop the tail (LRU) node, returning its entry id and handle.
    pub fn pop_back(&mut self) -> Option<(EntryId, Handle)> {
        let slot = self.tail?;
        let handle = Handle {
            slot,
            generation: self.nodes[slot].generation,
        };
        let entry = self.nodes[slot].entry;
        self.detach(handle);
        Some((entry, handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_front_and_pop_back_order() {
        let mut lru = Lru::new();
        let _h0 = lru.push_front(0);
        let _h1 = lru.push_front(1);
        let _h2 = lru.push_front(2);
        assert_eq!(lru.len(), 3);
        assert_eq!(lru.pop_back(), Some((0, _h0)));
        assert_eq!(lru.pop_back(), Some((1, _h1)));
        assert_eq!(lru.pop_back(), Some((2, _h2)));
        assert!(lru.is_empty());
    }

    #[test]
    fn move_to_front_reorders() {
        let mut lru = Lru::new();
        let h0 = lru.push_front(0);
        let _h1 = lru.push_front(1);
        let _h2 = lru.push_front(2);
        lru.move_to_front(h0);
        // tail should now be 1, not 0.
        let (entry, _) = lru.pop_back().unwrap();
        assert_eq!(entry, 1);
    }

    #[test]
    fn stale_handle_after_reuse_is_ignored() {
        let mut lru = Lru::new();
        let h0 = lru.push_front(0);
        lru.detach(h0);
        let _h1 = lru.push_front(1);
        // h0's slot was likely recycled for entry 1; operating on the
        // stale handle must not corrupt entry 1's position.
        lru.detach(h0);
        assert_eq!(lru.len(), 1);
    }

    #[test]
    fn detach_middle_node() {
        let mut lru = Lru::new();
        let _h0 = lru.push_front(0);
        let h1 = lru.push_front(1);
        let _h2 = lru.push_front(2);
        lru.detach(h1);
        assert_eq!(lru.len(), 2);
        let (e, _) = lru.pop_back().unwrap();
        assert_eq!(e, 0);
        let (e, _) = lru.pop_back().unwrap();
        assert_eq!(e, 2);
    }
}
