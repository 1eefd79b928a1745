/// Read-only view over the host's document.
///
/// Offsets are char offsets in `0..=len_chars()`. The engine borrows a view
/// for the duration of a single dispatch call and never retains it.
pub trait TextView {
    fn len_chars(&self) -> usize;

    /// Character at `offset`, or `None` when `offset >= len_chars()`.
    fn char_at(&self, offset: usize) -> Option<char>;

    fn is_valid(&self, offset: usize) -> bool {
        offset <= self.len_chars()
    }

    fn is_empty(&self) -> bool {
        self.len_chars() == 0
    }
}

impl TextView for [char] {
    fn len_chars(&self) -> usize {
        self.len()
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        self.get(offset).copied()
    }
}

impl TextView for Vec<char> {
    fn len_chars(&self) -> usize {
        self.len()
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        self.get(offset).copied()
    }
}

#[cfg(feature = "rope")]
impl TextView for ropey::Rope {
    fn len_chars(&self) -> usize {
        ropey::Rope::len_chars(self)
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        self.get_char(offset)
    }
}

#[cfg(feature = "rope")]
impl TextView for ropey::RopeSlice<'_> {
    fn len_chars(&self) -> usize {
        ropey::RopeSlice::len_chars(self)
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        self.get_char(offset)
    }
}
