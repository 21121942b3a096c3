use super::{WireError, WireResult};

/// A bounded byte range `[begin, end)` into an owning buffer.
///
/// Every parser and encoder in this crate works through a `Window` rather
/// than a raw slice, so that splitting a buffer for a nested layer can
/// never accidentally widen what that layer is allowed to touch. Invariant:
/// `begin <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub begin: usize,
    pub end: usize,
}

impl Window {
    pub fn new(begin: usize, end: usize) -> Self {
        debug_assert!(begin <= end);
        Self { begin, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// Splits this window at `offset` (relative to `begin`) into a prefix
    /// window `[begin, begin+offset)` and a suffix window `[begin+offset,
    /// end)`. Fails if `offset` would run past `end`.
    pub fn split_at(&self, offset: usize) -> WireResult<(Window, Window)> {
        let mid = self.begin.checked_add(offset).ok_or(WireError::ShortBuffer {
            needed: offset,
            available: self.len(),
        })?;
        if mid > self.end {
            return Err(WireError::ShortBuffer {
                needed: offset,
                available: self.len(),
            });
        }
        Ok((Window::new(self.begin, mid), Window::new(mid, self.end)))
    }

    /// Returns the first `len` bytes of this window as a new, shorter
    /// window. Fails if `len` exceeds the window's length.
    pub fn truncate(&self, len: usize) -> WireResult<Window> {
        let (prefix, _) = self.split_at(len)?;
        Ok(prefix)
    }

    /// Returns the sub-window `[begin+offset, begin+offset+len)`.
    pub fn sub(&self, offset: usize, len: usize) -> WireResult<Window> {
        let (_, suffix) = self.split_at(offset)?;
        suffix.truncate(len)
    }

    /// Advances `begin` by `n` bytes, shrinking the window from the front.
    pub fn advance(&self, n: usize) -> WireResult<Window> {
        let (_, suffix) = self.split_at(n)?;
        Ok(suffix)
    }
}
