//! Text output buffer with auto-growing capacity.

use std::io;

/// Default allocation size of a fresh [`Writer`].
pub const DEFAULT_ALLOC_SIZE: usize = 512;

/// A byte output buffer that grows automatically as needed.
///
/// Bytes are written at the cursor `x`; everything between `x0` and `x` is
/// the pending output returned by [`Writer::flush`].
///
/// # Example
///
/// ```
/// use ordered_object_buffers::Writer;
///
/// let mut writer = Writer::new();
/// writer.u8(b'{');
/// writer.ascii("\"a\":1");
/// writer.u8(b'}');
/// assert_eq!(writer.flush(), b"{\"a\":1}");
/// ```
pub struct Writer {
    /// The underlying byte buffer.
    pub uint8: Vec<u8>,
    /// Position where last flush happened.
    pub x0: usize,
    /// Current cursor position.
    pub x: usize,
    /// Allocation size when buffer needs to grow.
    alloc_size: usize,
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Writer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Writer")
            .field("pending", &String::from_utf8_lossy(self.as_slice()))
            .field("capacity", &self.capacity())
            .finish()
    }
}

impl Writer {
    /// Creates a new writer with the default allocation size.
    pub fn new() -> Self {
        Self::with_alloc_size(DEFAULT_ALLOC_SIZE)
    }

    /// Creates a new writer with custom allocation size.
    pub fn with_alloc_size(alloc_size: usize) -> Self {
        let alloc_size = alloc_size.max(1);
        Self {
            uint8: vec![0u8; alloc_size],
            x0: 0,
            x: 0,
            alloc_size,
        }
    }

    /// Ensures the buffer has at least `capacity` bytes available.
    pub fn ensure_capacity(&mut self, capacity: usize) {
        let remaining = self.uint8.len() - self.x;
        if remaining < capacity {
            let total = self.uint8.len() - self.x0;
            let required = capacity - remaining;
            let total_required = total + required;
            let new_size = if total_required <= self.alloc_size {
                self.alloc_size
            } else {
                total_required * 2
            };
            self.grow(new_size);
        }
    }

    fn grow(&mut self, new_size: usize) {
        let x0 = self.x0;
        let x = self.x;
        let mut new_buf = vec![0u8; new_size];
        new_buf[..x - x0].copy_from_slice(&self.uint8[x0..x]);
        self.uint8 = new_buf;
        self.x = x - x0;
        self.x0 = 0;
    }

    /// Total bytes the buffer can hold without growing.
    pub fn capacity(&self) -> usize {
        self.uint8.len()
    }

    /// Number of pending (unflushed) bytes.
    pub fn len(&self) -> usize {
        self.x - self.x0
    }

    pub fn is_empty(&self) -> bool {
        self.x == self.x0
    }

    /// Pending bytes, without advancing the flush position.
    pub fn as_slice(&self) -> &[u8] {
        &self.uint8[self.x0..self.x]
    }

    /// Rewinds the cursor to the start of the buffer, discarding any output.
    pub fn clear(&mut self) {
        self.x = 0;
        self.x0 = 0;
    }

    /// Returns the written data and advances the flush position.
    pub fn flush(&mut self) -> Vec<u8> {
        let result = self.uint8[self.x0..self.x].to_vec();
        self.x0 = self.x;
        result
    }

    /// Writes a single byte.
    #[inline]
    pub fn u8(&mut self, val: u8) {
        self.ensure_capacity(1);
        self.uint8[self.x] = val;
        self.x += 1;
    }

    /// Writes two bytes.
    #[inline]
    pub fn u8u8(&mut self, a: u8, b: u8) {
        self.ensure_capacity(2);
        self.uint8[self.x] = a;
        self.uint8[self.x + 1] = b;
        self.x += 2;
    }

    /// Writes a byte slice.
    pub fn buf(&mut self, buf: &[u8]) {
        let length = buf.len();
        self.ensure_capacity(length);
        self.uint8[self.x..self.x + length].copy_from_slice(buf);
        self.x += length;
    }

    /// Writes a UTF-8 string. Returns the number of bytes written.
    pub fn utf8(&mut self, s: &str) -> usize {
        let bytes = s.as_bytes();
        self.buf(bytes);
        bytes.len()
    }

    /// Writes an ASCII string.
    pub fn ascii(&mut self, s: &str) {
        self.utf8(s); // ASCII is a subset of UTF-8
    }
}

/// Lets `std::io` based encoders (serde_json among them) write straight into
/// the buffer.
impl io::Write for Writer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf(buf);
        Ok(buf.len())
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.buf(buf);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
