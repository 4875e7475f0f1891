#![forbid(unsafe_code)]

//! A [`ViewSurface`] that records every command.
//!
//! [`RecordingSurface`] stands in for a real list view. `set_page` queues an
//! acknowledgment instead of delivering it, so tests decide when (or
//! whether) the page-changed event reaches the engine. With
//! [`AckMode::Drop`] acknowledgments are swallowed entirely, which exercises
//! the driver's timeout path.

use std::collections::VecDeque;
use std::fmt::Debug;
use std::num::NonZeroUsize;

use ffocus_runtime::{SurfaceCommand, ViewSurface};
use serde_json::json;

/// What `set_page` does with its acknowledgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AckMode {
    /// Queue the acknowledgment for [`RecordingSurface::take_acks`].
    #[default]
    Queue,
    /// Change the page but never acknowledge.
    Drop,
}

/// Records commands issued by the engine.
#[derive(Debug, Clone)]
pub struct RecordingSurface<I> {
    page: usize,
    page_size: Option<NonZeroUsize>,
    ack_mode: AckMode,
    acks: VecDeque<usize>,
    commands: Vec<SurfaceCommand<I>>,
    selected: Option<I>,
    scrolled_to: Option<usize>,
}

impl<I: Clone + Debug> RecordingSurface<I> {
    /// A laid-out surface on page 0 with `page_size` rows per page.
    ///
    /// A zero `page_size` models a view that has not been laid out yet.
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 0,
            page_size: NonZeroUsize::new(page_size),
            ack_mode: AckMode::Queue,
            acks: VecDeque::new(),
            commands: Vec::new(),
            selected: None,
            scrolled_to: None,
        }
    }

    /// Start on `page`.
    #[must_use]
    pub fn on_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    /// Set the acknowledgment mode.
    #[must_use]
    pub fn ack_mode(mut self, mode: AckMode) -> Self {
        self.ack_mode = mode;
        self
    }

    /// Lay the view out (or change its page size).
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = NonZeroUsize::new(page_size);
    }

    /// Simulate the user paging elsewhere, without an acknowledgment.
    pub fn jump_to(&mut self, page: usize) {
        self.page = page;
    }

    /// Drain queued page acknowledgments, oldest first.
    pub fn take_acks(&mut self) -> Vec<usize> {
        self.acks.drain(..).collect()
    }

    /// Every command issued so far.
    pub fn commands(&self) -> &[SurfaceCommand<I>] {
        &self.commands
    }

    /// Forget recorded commands.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Last selected id.
    pub fn selected(&self) -> Option<&I> {
        self.selected.as_ref()
    }

    /// Last scroll target.
    pub fn scrolled_to(&self) -> Option<usize> {
        self.scrolled_to
    }

    /// Commands as JSONL, one object per line.
    pub fn to_jsonl(&self) -> String {
        let mut out = String::new();
        for (seq, cmd) in self.commands.iter().enumerate() {
            let line = match cmd {
                SurfaceCommand::SetPage(page) => {
                    json!({"seq": seq, "cmd": cmd.name(), "page": page})
                }
                SurfaceCommand::SelectRow(id) => {
                    json!({"seq": seq, "cmd": cmd.name(), "id": format!("{id:?}")})
                }
                SurfaceCommand::ScrollTo(row) => {
                    json!({"seq": seq, "cmd": cmd.name(), "row": row})
                }
            };
            out.push_str(&line.to_string());
            out.push('\n');
        }
        out
    }
}

impl<I: Clone + Debug> ViewSurface<I> for RecordingSurface<I> {
    fn current_page(&self) -> usize {
        self.page
    }

    fn page_size(&self) -> Option<NonZeroUsize> {
        self.page_size
    }

    fn set_page(&mut self, page: usize) {
        self.commands.push(SurfaceCommand::SetPage(page));
        self.page = page;
        if self.ack_mode == AckMode::Queue {
            self.acks.push_back(page);
        }
    }

    fn select_row(&mut self, id: &I) {
        self.commands.push(SurfaceCommand::SelectRow(id.clone()));
        self.selected = Some(id.clone());
    }

    fn scroll_to(&mut self, row: usize) {
        self.commands.push(SurfaceCommand::ScrollTo(row));
        self.scrolled_to = Some(row);
    }
}
