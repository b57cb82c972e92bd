//! Fixed-capacity circular byte queue

/// Circular byte buffer owned by one transport
///
/// A full queue drops further bytes and counts them.
#[derive(Debug, Clone)]
pub struct TxQueue<const N: usize> {
    buf: [u8; N],
    head: usize,
    len: usize,
    dropped: u32,
}

impl<const N: usize> Default for TxQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> TxQueue<N> {
    /// Create an empty queue
    pub const fn new() -> Self {
        Self {
            buf: [0; N],
            head: 0,
            len: 0,
            dropped: 0,
        }
    }

    /// Append a byte; returns false (and counts it) when full
    pub fn push(&mut self, byte: u8) -> bool {
        if self.len == N {
            self.dropped = self.dropped.wrapping_add(1);
            return false;
        }
        let tail = (self.head + self.len) % N;
        self.buf[tail] = byte;
        self.len += 1;
        true
    }

    /// Move up to `out.len()` bytes into `out`, returning the count
    pub fn pop_into(&mut self, out: &mut [u8]) -> usize {
        let count = out.len().min(self.len);
        for slot in out[..count].iter_mut() {
            *slot = self.buf[self.head];
            self.head = (self.head + 1) % N;
        }
        self.len -= count;
        count
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Free space in bytes
    pub fn free(&self) -> usize {
        N - self.len
    }

    /// Count bytes refused before reaching the queue
    pub fn discard(&mut self, count: u32) {
        self.dropped = self.dropped.wrapping_add(count);
    }

    /// Bytes discarded because the queue was full
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order_across_wrap() {
        let mut queue = TxQueue::<4>::new();
        for b in [1, 2, 3] {
            assert!(queue.push(b));
        }
        let mut head = [0u8; 2];
        assert_eq!(queue.pop_into(&mut head), 2);
        assert_eq!(head, [1, 2]);
        for b in [4, 5, 6] {
            assert!(queue.push(b));
        }

        let mut out = [0u8; 8];
        let n = queue.pop_into(&mut out);
        assert_eq!(&out[..n], &[3, 4, 5, 6]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_full_queue_drops_and_counts() {
        let mut queue = TxQueue::<2>::new();
        assert!(queue.push(b'a'));
        assert!(queue.push(b'b'));
        assert!(!queue.push(b'c'));
        assert!(!queue.push(b'd'));

        assert_eq!(queue.dropped(), 2);
        assert_eq!(queue.len(), 2);
        let mut out = [0u8; 1];
        queue.pop_into(&mut out);
        assert_eq!(out, [b'a']);
    }

    #[test]
    fn test_discard_counts_without_queueing() {
        let mut queue = TxQueue::<4>::new();
        queue.push(b'x');
        queue.discard(2);
        assert_eq!(queue.dropped(), 2);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_pop_into_bounded_by_output() {
        let mut queue = TxQueue::<8>::new();
        for b in 0..6 {
            queue.push(b);
        }
        let mut out = [0u8; 4];
        assert_eq!(queue.pop_into(&mut out), 4);
        assert_eq!(out, [0, 1, 2, 3]);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.free(), 6);
    }
}
