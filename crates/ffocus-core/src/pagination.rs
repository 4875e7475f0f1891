#![forbid(unsafe_code)]

//! Pagination mapper.
//!
//! Translates an absolute index into a `(page, row)` coordinate. The
//! mapping is total: negative indices and zero page sizes are ruled out by
//! the argument types instead of being checked at runtime.

use std::num::NonZeroUsize;

/// A `(page, row-on-page)` coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PagePosition {
    /// Zero-based page number.
    pub page: usize,
    /// Zero-based row within the page.
    pub row: usize,
}

/// Map an absolute index to its page and row.
#[inline]
#[must_use]
pub const fn page_position(index: usize, page_size: NonZeroUsize) -> PagePosition {
    let size = page_size.get();
    PagePosition {
        page: index / size,
        row: index % size,
    }
}

/// Inverse of [`page_position`].
#[inline]
#[must_use]
pub const fn absolute_index(position: PagePosition, page_size: NonZeroUsize) -> usize {
    position.page * page_size.get() + position.row
}

/// Number of pages needed to show `len` records (0 for an empty collection).
#[inline]
#[must_use]
pub const fn page_count(len: usize, page_size: NonZeroUsize) -> usize {
    len.div_ceil(page_size.get())
}

/// The derived cursor that drives the rendering surface.
///
/// Never stored independently: it is always recomputed from the absolute
/// index and the surface's page size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewportCursor<I> {
    /// Target page.
    pub page: usize,
    /// Row within the target page.
    pub row: usize,
    /// Identifier to select.
    pub selected: I,
}

impl<I> ViewportCursor<I> {
    /// Derive the cursor for `selected` sitting at absolute `index`.
    pub fn derive(index: usize, page_size: NonZeroUsize, selected: I) -> Self {
        let PagePosition { page, row } = page_position(index, page_size);
        Self {
            page,
            row,
            selected,
        }
    }

    /// The cursor's page/row coordinate.
    pub fn position(&self) -> PagePosition {
        PagePosition {
            page: self.page,
            row: self.row,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn first_row_of_first_page() {
        assert_eq!(page_position(0, size(10)), PagePosition { page: 0, row: 0 });
    }

    #[test]
    fn page_boundaries() {
        assert_eq!(page_position(9, size(10)), PagePosition { page: 0, row: 9 });
        assert_eq!(page_position(10, size(10)), PagePosition { page: 1, row: 0 });
        assert_eq!(page_position(11, size(10)), PagePosition { page: 1, row: 1 });
    }

    #[test]
    fn page_size_one() {
        assert_eq!(page_position(42, size(1)), PagePosition { page: 42, row: 0 });
    }

    #[test]
    fn inverse_mapping() {
        let pos = page_position(57, size(25));
        assert_eq!(absolute_index(pos, size(25)), 57);
    }

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page_count(0, size(10)), 0);
        assert_eq!(page_count(10, size(10)), 1);
        assert_eq!(page_count(24, size(10)), 3);
        assert_eq!(page_count(25, size(10)), 3);
    }

    #[test]
    fn cursor_derivation() {
        let cursor = ViewportCursor::derive(11, size(10), "b");
        assert_eq!(cursor.page, 1);
        assert_eq!(cursor.row, 1);
        assert_eq!(cursor.selected, "b");
        assert_eq!(cursor.position(), PagePosition { page: 1, row: 1 });
    }
}
