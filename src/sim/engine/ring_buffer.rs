//! Fixed-capacity wrap-around storage of per-step snapshots.

/// Ring buffer holding the last `capacity` pushed values.
///
/// `head` is the next write slot and `tail` the oldest retained entry.
/// One extra slot is allocated so that a full buffer (`capacity` entries)
/// is distinguishable from an empty one (`head == tail`).
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    slots: Vec<Option<T>>,
    head: usize,
    tail: usize,
}

impl<T: Clone> RingBuffer<T> {
    /// Creates an empty buffer. Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Ring buffer capacity must be positive");
        Self {
            slots: vec![None; capacity + 1],
            head: 0,
            tail: 0,
        }
    }

    /// Maximum number of retained entries.
    pub fn capacity(&self) -> usize {
        self.slots.len() - 1
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        (self.head + self.slots.len() - self.tail) % self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Write pointer (next slot to be written).
    pub fn head(&self) -> usize {
        self.head
    }

    /// Index of the oldest retained entry.
    pub fn tail(&self) -> usize {
        self.tail
    }

    /// Writes `value` at `head` and advances it.
    ///
    /// If the write catches up with `tail`, the oldest entry is dropped.
    pub fn push(&mut self, value: T) {
        let n = self.slots.len();
        self.slots[self.head] = Some(value);
        self.head = (self.head + 1) % n;
        if self.head == self.tail {
            self.tail = (self.tail + 1) % n;
        }
    }

    /// Returns the retained entries in chronological order.
    ///
    /// Non-wrapped buffers (`head > tail`) are a single slice `[tail..head]`,
    /// wrapped ones are `[tail..]` followed by `[..head]`.
    pub fn linearize(&self) -> Vec<T> {
        if self.head == self.tail {
            return Vec::new();
        }
        let ordered: Box<dyn Iterator<Item = &Option<T>>> = if self.head > self.tail {
            Box::new(self.slots[self.tail..self.head].iter())
        } else {
            Box::new(
                self.slots[self.tail..]
                    .iter()
                    .chain(self.slots[..self.head].iter()),
            )
        };
        ordered.filter_map(|slot| slot.clone()).collect()
    }

    /// Logically empties the buffer. Allocated slots are reused by later pushes.
    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
    }
}
