//! Double-buffered storage addressed by role.
//!
//! Two long-lived backing stores alternate as source (read) and destination
//! (write) across iterative passes. Swapping flips the roles; nothing is
//! reallocated. The GPU compositor holds its accumulator render targets in a
//! `PingPong`, and the CPU reference compositor holds its pixel buffers in one.

/// Two stores of the same kind, one readable and one writable at a time.
#[derive(Debug, Clone)]
pub struct PingPong<T> {
    stores: [T; 2],
    src: usize,
}

impl<T> PingPong<T> {
    /// `first` starts as the source, `second` as the destination.
    pub fn new(first: T, second: T) -> Self {
        Self {
            stores: [first, second],
            src: 0,
        }
    }

    /// Build both stores with the same constructor.
    pub fn from_fn(mut make: impl FnMut(usize) -> T) -> Self {
        Self::new(make(0), make(1))
    }

    pub fn src(&self) -> &T {
        &self.stores[self.src]
    }

    pub fn src_mut(&mut self) -> &mut T {
        &mut self.stores[self.src]
    }

    pub fn dst(&self) -> &T {
        &self.stores[1 - self.src]
    }

    pub fn dst_mut(&mut self) -> &mut T {
        &mut self.stores[1 - self.src]
    }

    /// Borrow the source for reading and the destination for writing at once.
    pub fn split(&mut self) -> (&T, &mut T) {
        let (a, b) = self.stores.split_at_mut(1);
        if self.src == 0 {
            (&a[0], &mut b[0])
        } else {
            (&b[0], &mut a[0])
        }
    }

    /// Index of the store currently acting as source (0 or 1).
    ///
    /// Lets callers keep per-orientation resources (e.g. bind groups) that
    /// reference both stores.
    pub fn src_index(&self) -> usize {
        self.src
    }

    /// The destination becomes the source and vice versa.
    pub fn swap(&mut self) {
        self.src = 1 - self.src;
    }

    /// Both stores, in construction order.
    pub fn stores(&self) -> &[T; 2] {
        &self.stores
    }

    /// Return to the initial orientation.
    pub fn reset(&mut self) {
        self.src = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_flips_roles() {
        let mut buffers = PingPong::new("a", "b");
        assert_eq!((*buffers.src(), *buffers.dst()), ("a", "b"));
        buffers.swap();
        assert_eq!((*buffers.src(), *buffers.dst()), ("b", "a"));
        assert_eq!(buffers.src_index(), 1);
        buffers.reset();
        assert_eq!(*buffers.src(), "a");
    }

    #[test]
    fn test_split_reads_src_writes_dst() {
        let mut buffers = PingPong::from_fn(|i| vec![i as u8; 4]);
        buffers.swap();
        let (src, dst) = buffers.split();
        dst.copy_from_slice(src);
        assert_eq!(buffers.stores()[0], vec![1u8; 4]);
    }

    #[test]
    fn test_swap_does_not_reallocate() {
        let mut buffers = PingPong::from_fn(|_| vec![0u8; 16]);
        let ptrs = [buffers.src().as_ptr(), buffers.dst().as_ptr()];
        for _ in 0..5 {
            buffers.swap();
        }
        assert_eq!(buffers.src().as_ptr(), ptrs[1]);
        assert_eq!(buffers.dst().as_ptr(), ptrs[0]);
    }
}
