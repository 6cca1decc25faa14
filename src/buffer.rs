//! Growable byte storage for requests and responses.

use crate::format::Format;

/// A byte buffer whose capacity is always a power of two.
///
/// The whole response is rendered by a single [`put`](Buffer::put): the
/// formatter's upper bound is checked against the capacity once, the
/// storage is replaced if it is too small, and the bytes are written in
/// place. Reading from a socket goes through
/// [`spare_mut`](Buffer::spare_mut) and [`advance`](Buffer::advance).
///
/// # Examples
/// ```
/// use vocab_web::Buffer;
///
/// let mut buf = Buffer::new();
/// buf.put(("HTTP/1.1 ", 200u16, " OK\r\n"));
/// assert_eq!(buf.as_slice(), b"HTTP/1.1 200 OK\r\n");
///
/// buf.append(("content-length: ", 0u8, "\r\n\r\n"));
/// assert_eq!(buf.as_slice(), b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\n\r\n");
/// ```
#[derive(Debug, Clone)]
pub struct Buffer {
    bytes: Box<[u8]>,
    len: usize,
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Buffer {
    pub const DEFAULT_CAPACITY: usize = 4096;

    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Allocates at least `capacity` bytes and never less than
    /// [`DEFAULT_CAPACITY`](Self::DEFAULT_CAPACITY), rounded up to a power of two.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: vec![0; capacity.max(Self::DEFAULT_CAPACITY).next_power_of_two()]
                .into_boxed_slice(),
            len: 0,
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    #[inline(always)]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes[..self.len]
    }

    #[inline(always)]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Replaces the contents with `value` and returns the new length.
    ///
    /// When the bound exceeds the capacity the storage is replaced without
    /// copying, since the old contents are discarded anyway.
    #[inline]
    pub fn put<F: Format>(&mut self, value: F) -> usize {
        let bound = value.max_size();
        if bound > self.capacity() {
            self.grow(bound, false);
        }

        self.len = value.write_to(&mut self.bytes);
        debug_assert!(self.len <= bound, "formatter exceeded its bound");
        self.len
    }

    /// Writes `value` after the current contents and returns the new length.
    #[inline]
    pub fn append<F: Format>(&mut self, value: F) -> usize {
        let bound = value.max_size();
        self.reserve(bound);

        let written = value.write_to(&mut self.bytes[self.len..]);
        debug_assert!(written <= bound, "formatter exceeded its bound");
        self.len += written;
        self.len
    }

    /// Makes room for `additional` bytes past the current length.
    #[inline]
    pub fn reserve(&mut self, additional: usize) {
        let required = self.len + additional;
        if required > self.capacity() {
            self.grow(required, true);
        }
    }

    /// The writable region after the current contents.
    #[inline(always)]
    pub fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[self.len..]
    }

    /// Marks `count` bytes of the spare region as filled.
    ///
    /// # Panics
    /// Panics if `count` exceeds the spare region.
    #[inline(always)]
    #[track_caller]
    pub fn advance(&mut self, count: usize) {
        assert!(
            count <= self.capacity() - self.len,
            "advance past the end of the buffer"
        );
        self.len += count;
    }

    #[cold]
    fn grow(&mut self, required: usize, preserve: bool) {
        let mut bytes = vec![0; required.next_power_of_two()].into_boxed_slice();
        if preserve {
            bytes[..self.len].copy_from_slice(&self.bytes[..self.len]);
        }
        self.bytes = bytes;
    }
}
