/// Read/write pair of equally sized slices.
///
/// Passes read from the front buffer and write into the back buffer, then
/// `swap` flips their roles so the next pass sees everything the previous
/// one wrote.
#[derive(Debug, Clone, Default)]
pub struct DoubleBuffer<T> {
    front: Vec<T>,
    back: Vec<T>,
}

impl<T: Copy> DoubleBuffer<T> {
    pub fn new() -> Self {
        Self {
            front: Vec::new(),
            back: Vec::new(),
        }
    }

    /// Copy `data` into both buffers, reusing their allocations.
    pub fn load(&mut self, data: &[T]) {
        self.front.clear();
        self.front.extend_from_slice(data);
        self.back.clear();
        self.back.extend_from_slice(data);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.front.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.front.is_empty()
    }

    /// Borrow the buffer the last pass wrote.
    #[inline]
    pub fn front(&self) -> &[T] {
        &self.front
    }

    /// Borrow the read and write halves together.
    #[inline]
    pub fn split(&mut self) -> (&[T], &mut [T]) {
        (&self.front, &mut self.back)
    }

    #[inline]
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.front, &mut self.back);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_exposes_written_values() {
        let mut buffer = DoubleBuffer::new();
        buffer.load(&[1, 2, 3]);

        let (read, write) = buffer.split();
        for (dst, src) in write.iter_mut().zip(read) {
            *dst = src * 10;
        }
        assert_eq!(buffer.front(), &[1, 2, 3]);

        buffer.swap();
        assert_eq!(buffer.front(), &[10, 20, 30]);
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn load_replaces_contents() {
        let mut buffer = DoubleBuffer::new();
        buffer.load(&[1.0, 2.0]);
        buffer.load(&[5.0]);
        assert_eq!(buffer.front(), &[5.0]);
        let (_, write) = buffer.split();
        assert_eq!(write, &[5.0]);
    }
}
