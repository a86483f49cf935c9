use std::fmt;

/// Half-open `[first, last)` index range requested from the XML endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageWindow {
    pub first: usize,
    pub last: usize,
}

impl PageWindow {
    pub fn len(&self) -> usize {
        self.last - self.first
    }

    pub fn is_empty(&self) -> bool {
        self.first == self.last
    }
}

impl fmt::Display for PageWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.first, self.last)
    }
}

/// Start of the next window to request.
///
/// The first window `[0, window_size)` comes with the initial page render, so a
/// fresh cursor points at `window_size`. The start only ever moves forward by
/// exactly one window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageCursor {
    window_start: usize,
    window_size: usize,
}

impl PageCursor {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_start: window_size,
            window_size,
        }
    }

    /// `None` unless `window_start` sits on a window boundary and the window
    /// starting there is addressable.
    pub fn starting_at(window_start: usize, window_size: usize) -> Option<Self> {
        if window_size == 0 || window_start % window_size != 0 {
            return None;
        }
        window_start.checked_add(window_size)?;
        Some(Self {
            window_start,
            window_size,
        })
    }

    pub fn window_start(&self) -> usize {
        self.window_start
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// `None` once the next window would run past `usize::MAX`.
    pub fn peek(&self) -> Option<PageWindow> {
        let last = self.window_start.checked_add(self.window_size)?;
        Some(PageWindow {
            first: self.window_start,
            last,
        })
    }

    pub fn advance(&mut self) -> Option<PageWindow> {
        let window = self.peek()?;
        self.window_start = window.last;
        Some(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_cursor_skips_initial_window() {
        let cursor = PageCursor::new(9);
        assert_eq!(cursor.peek(), Some(PageWindow { first: 9, last: 18 }));
    }

    #[test]
    fn advance_moves_by_one_window() {
        let mut cursor = PageCursor::new(24);
        let a = cursor.advance().unwrap();
        let b = cursor.advance().unwrap();
        assert_eq!(b.first - a.first, 24);
        assert_eq!(a.last, a.first + 24);
        assert_eq!(b.last, b.first + 24);
        assert_eq!(cursor.window_start(), 72);
        assert_eq!(cursor.window_start() % cursor.window_size(), 0);
    }

    #[test]
    fn starting_at_requires_boundary() {
        assert!(PageCursor::starting_at(0, 9).is_some());
        assert!(PageCursor::starting_at(18, 9).is_some());
        assert!(PageCursor::starting_at(10, 9).is_none());
        assert!(PageCursor::starting_at(0, 0).is_none());
    }

    #[test]
    fn window_past_usize_max_is_rejected() {
        let last_boundary = (usize::MAX / 9) * 9;
        assert!(PageCursor::starting_at(last_boundary, 9).is_none());
        assert!(PageCursor::starting_at(last_boundary - 9, 9).is_some());

        let mut cursor = PageCursor::new(usize::MAX);
        assert_eq!(cursor.peek(), None);
        assert_eq!(cursor.advance(), None);
        assert_eq!(cursor.window_start(), usize::MAX);
    }
}
