/// Hands out dense sublist row indices for one dataset pass
///
/// Passes over different dataset kinds may reuse one allocator as long as
/// they run one after another; each pass resets it when done. It is never
/// shared between threads.
#[derive(Debug, Default)]
pub struct SublistAllocator {
    next: i32,
}

impl SublistAllocator {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Return the next free index
    pub fn allocate(&mut self) -> i32 {
        let index = self.next;
        self.next += 1;
        index
    }

    /// Number of indices handed out so far
    pub fn count(&self) -> usize {
        self.next as usize
    }

    /// Start numbering from 0 again, at the end of a dataset pass
    pub fn reset(&mut self) {
        self.next = 0;
    }
}
