use std::cmp::min;
use std::io::{self, Read, Write};

/// Fixed-capacity circular byte queue sitting between the serial stream and
/// the byte-at-a-time protocol state machines.
///
/// Bytes are pulled from the stream in bulk with [`RingByteBuffer::read_from`]
/// and handed out one by one with [`RingByteBuffer::pop_byte`].
///
/// # Example
///
/// ```rust
/// # use std::io::Write;
/// # use ydlidar::base::RingByteBuffer;
/// let mut buffer = RingByteBuffer::with_capacity(16);
/// buffer.write(&[0xAA, 0x55]).unwrap();
/// assert_eq!(buffer.pop_byte(), Some(0xAA));
/// assert_eq!(buffer.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RingByteBuffer {
    buf: Vec<u8>,
    head: usize,
    size: usize,
}

impl RingByteBuffer {
    /// Creates a new `RingByteBuffer` with the specified capacity.
    ///
    /// # Arguments
    ///
    /// * `capacity` - The maximum number of bytes the buffer can hold. Must be non-zero.
    pub fn with_capacity(capacity: usize) -> RingByteBuffer {
        RingByteBuffer {
            buf: vec![0; capacity.max(1)],
            head: 0,
            size: 0,
        }
    }

    /// Returns the number of bytes currently stored in the buffer.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` if the buffer contains no bytes.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the total capacity of the buffer in bytes.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Returns the amount of free space available in the buffer in bytes.
    pub fn free_space(&self) -> usize {
        self.buf.len() - self.size
    }

    /// Drops every stored byte.
    pub fn clear(&mut self) {
        self.head = 0;
        self.size = 0;
    }

    fn tail(&self) -> usize {
        (self.head + self.size) % self.buf.len()
    }

    /// Removes and returns the oldest byte.
    pub fn pop_byte(&mut self) -> Option<u8> {
        if self.size == 0 {
            return None;
        }
        let byte = self.buf[self.head];
        self.skip_bytes(1);
        Some(byte)
    }

    /// Returns a slice representing the contiguous readable portion of the buffer.
    ///
    /// The slice might not contain all readable data if the data wraps around
    /// the end of the internal buffer.
    pub fn current_read_slice(&self) -> &[u8] {
        let end = min(self.head + self.size, self.buf.len());
        &self.buf[self.head..end]
    }

    /// Removes up to `bytes` bytes from the front, returning how many were removed.
    pub fn skip_bytes(&mut self, bytes: usize) -> usize {
        let skipped = min(self.size, bytes);
        self.head = (self.head + skipped) % self.buf.len();
        self.size -= skipped;
        skipped
    }

    fn current_write_slice(&mut self) -> &mut [u8] {
        let current_end = self.tail();
        let write_buf_end = min(self.buf.len(), current_end + self.free_space());
        &mut self.buf[current_end..write_buf_end]
    }

    fn mark_bytes_as_written(&mut self, bytes: usize) {
        let written = min(self.free_space(), bytes);
        self.size += written;
    }

    fn partial_read_from(&mut self, upstream: &mut impl Read) -> io::Result<usize> {
        if self.current_write_slice().is_empty() {
            return Ok(0);
        }

        match upstream.read(self.current_write_slice()) {
            Ok(read) => {
                self.mark_bytes_as_written(read);
                Ok(read)
            }
            // a serial port with a read timeout, or a non-blocking one, simply has nothing yet
            Err(err)
                if err.kind() == io::ErrorKind::TimedOut
                    || err.kind() == io::ErrorKind::WouldBlock
                    || err.kind() == io::ErrorKind::Interrupted =>
            {
                Ok(0)
            }
            Err(err) => Err(err),
        }
    }

    /// Pulls whatever the upstream source has ready into the free space,
    /// covering the wrap-around with a second read.
    ///
    /// Returns the total number of bytes read.
    pub fn read_from(&mut self, upstream: &mut impl Read) -> io::Result<usize> {
        let read = self.partial_read_from(upstream)?;
        if read == 0 {
            return Ok(0);
        }
        let latter_read = self.partial_read_from(upstream)?;
        Ok(read + latter_read)
    }
}

impl Write for RingByteBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = {
            let current_write_slice = self.current_write_slice();
            let written = min(current_write_slice.len(), buf.len());
            current_write_slice[0..written].clone_from_slice(&buf[0..written]);
            written
        };
        self.mark_bytes_as_written(written);

        let latter_written = {
            let current_write_slice = self.current_write_slice();
            let latter_written = min(current_write_slice.len(), buf.len() - written);
            current_write_slice[0..latter_written]
                .clone_from_slice(&buf[written..written + latter_written]);
            latter_written
        };
        self.mark_bytes_as_written(latter_written);

        Ok(written + latter_written)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::RingByteBuffer;
    use std::io::{self, Read, Write};

    #[test]
    fn pop_in_fifo_order_across_wrap() {
        let mut buffer = RingByteBuffer::with_capacity(4);
        assert_eq!(buffer.write(&[1, 2, 3]).unwrap(), 3);
        assert_eq!(buffer.pop_byte(), Some(1));
        assert_eq!(buffer.pop_byte(), Some(2));

        // tail wraps to the start of the backing vector
        assert_eq!(buffer.write(&[4, 5, 6]).unwrap(), 3);
        assert_eq!(buffer.free_space(), 0);
        assert_eq!(buffer.write(&[7]).unwrap(), 0);

        let drained: Vec<u8> = std::iter::from_fn(|| buffer.pop_byte()).collect();
        assert_eq!(drained, vec![3, 4, 5, 6]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn read_from_fills_both_halves() {
        let mut buffer = RingByteBuffer::with_capacity(6);
        buffer.write(&[0, 0, 0, 0]).unwrap();
        buffer.skip_bytes(4);

        let mut upstream = io::Cursor::new(vec![10, 11, 12, 13, 14, 15, 16]);
        assert_eq!(buffer.read_from(&mut upstream).unwrap(), 6);
        assert_eq!(buffer.len(), 6);
        assert_eq!(buffer.current_read_slice(), &[10, 11]);
        assert_eq!(buffer.pop_byte(), Some(10));
    }

    struct TimingOut;

    impl Read for TimingOut {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::TimedOut, "no data"))
        }
    }

    #[test]
    fn timed_out_reads_yield_nothing() {
        let mut buffer = RingByteBuffer::with_capacity(8);
        assert_eq!(buffer.read_from(&mut TimingOut).unwrap(), 0);
        assert!(buffer.is_empty());
    }

    #[test]
    fn clear_drops_pending_bytes() {
        let mut buffer = RingByteBuffer::with_capacity(8);
        buffer.write(&[1, 2, 3]).unwrap();
        buffer.clear();
        assert_eq!(buffer.pop_byte(), None);
        assert_eq!(buffer.capacity(), 8);
    }
}
