#![forbid(unsafe_code)]

//! The rendering surface seam.
//!
//! The engine never mutates a list view directly. It reads the view's page
//! state and issues fire-and-forget commands through [`ViewSurface`]; the
//! view reports page changes back as an inbound
//! [`Msg::PageChanged`](crate::engine::Msg::PageChanged) message.

use std::num::NonZeroUsize;

/// A paginated, sortable list view as seen by the navigation driver.
///
/// Commands are fire-and-forget. `set_page` is asynchronous relative to
/// `select_row` and `scroll_to`: the view may need to re-render its rows
/// before a scroll is meaningful, and acknowledges with a page-changed
/// event once it has.
pub trait ViewSurface<I> {
    /// The page currently shown.
    fn current_page(&self) -> usize;

    /// Rows per page, or `None` while the view has not been laid out yet.
    fn page_size(&self) -> Option<NonZeroUsize>;

    /// Request a page change.
    fn set_page(&mut self, page: usize);

    /// Select the row holding `id`.
    fn select_row(&mut self, id: &I);

    /// Scroll the row at `row` (within the current page) into view.
    fn scroll_to(&mut self, row: usize);
}

impl<I, S: ViewSurface<I> + ?Sized> ViewSurface<I> for &mut S {
    fn current_page(&self) -> usize {
        (**self).current_page()
    }

    fn page_size(&self) -> Option<NonZeroUsize> {
        (**self).page_size()
    }

    fn set_page(&mut self, page: usize) {
        (**self).set_page(page);
    }

    fn select_row(&mut self, id: &I) {
        (**self).select_row(id);
    }

    fn scroll_to(&mut self, row: usize) {
        (**self).scroll_to(row);
    }
}

/// One outward command, as recorded by test surfaces and trace logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCommand<I> {
    /// `set_page(n)`.
    SetPage(usize),
    /// `select_row(id)`.
    SelectRow(I),
    /// `scroll_to(row)`.
    ScrollTo(usize),
}

impl<I> SurfaceCommand<I> {
    /// Stable name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetPage(_) => "SetPage",
            Self::SelectRow(_) => "SelectRow",
            Self::ScrollTo(_) => "ScrollTo",
        }
    }
}
