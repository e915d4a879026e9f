//! Deferred geometry writes.
//!
//! Geometry written while the page layout is still being computed would be
//! overwritten or would force extra reflows. Instead, writes are queued as
//! [`LayoutCommand`] values and applied in one batch: first all layout
//! commands, then all post-layout actions.

use crate::host::Dom;

/// A single geometry write or DOM removal.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutCommand {
    /// Absolute position of an element inside its container.
    SetPosition { target: String, x: f64, y: f64 },
    /// Effective (content box) width.
    SetWidth { target: String, width: f64 },
    /// Effective (content box) height.
    SetHeight { target: String, height: f64 },
    /// Width of one column's cells inside a rendered slice.
    SetColumnWidth {
        slice: String,
        column: usize,
        width: f64,
    },
    SetScrollLeft { target: String, px: f64 },
    SetScrollTop { target: String, px: f64 },
    /// Remove an element from the document.
    Remove { target: String },
}

impl LayoutCommand {
    /// Id of the element the command writes to.
    pub fn target(&self) -> &str {
        match self {
            Self::SetPosition { target, .. }
            | Self::SetWidth { target, .. }
            | Self::SetHeight { target, .. }
            | Self::SetScrollLeft { target, .. }
            | Self::SetScrollTop { target, .. }
            | Self::Remove { target } => target,
            Self::SetColumnWidth { slice, .. } => slice,
        }
    }
}

/// Work to do once every layout command of the batch has been applied.
#[derive(Debug, Clone, PartialEq)]
pub enum PostLayoutAction {
    Dom(LayoutCommand),
    /// Restore and apply the server-requested scroll position of a freshly
    /// laid out table, then enable scroll position propagation.
    InitialScroll { table_id: String },
}

/// Two-pass queue of deferred layout work.
#[derive(Debug, Default)]
pub struct LayoutQueue {
    layout: Vec<LayoutCommand>,
    post_layout: Vec<PostLayoutAction>,
}

impl LayoutQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_layout(&mut self, command: LayoutCommand) {
        self.layout.push(command);
    }

    pub fn add_post_layout(&mut self, action: PostLayoutAction) {
        self.post_layout.push(action);
    }

    pub fn is_empty(&self) -> bool {
        self.layout.is_empty() && self.post_layout.is_empty()
    }

    pub fn pending_layout(&self) -> &[LayoutCommand] {
        &self.layout
    }

    /// Drop queued work for a table being torn down.
    pub fn discard_table(&mut self, table_id: &str) {
        let prefix = format!("{table_id}_");
        self.layout
            .retain(|cmd| !cmd.target().starts_with(&prefix));
        self.post_layout.retain(|action| match action {
            PostLayoutAction::Dom(cmd) => !cmd.target().starts_with(&prefix),
            PostLayoutAction::InitialScroll { table_id: id } => id != table_id,
        });
    }

    /// Apply all layout commands, then all post-layout DOM commands.
    ///
    /// Returns the ids of tables whose initial scroll must run now, in queue order.
    pub fn flush<D: Dom + ?Sized>(&mut self, dom: &mut D) -> Vec<String> {
        let layout = std::mem::take(&mut self.layout);
        let post_layout = std::mem::take(&mut self.post_layout);
        tracing::trace!(
            target: "slicegrid",
            layout = layout.len(),
            post_layout = post_layout.len(),
            "layout pass"
        );
        for command in &layout {
            dom.apply(command);
        }
        let mut initial_scrolls = Vec::new();
        for action in post_layout {
            match action {
                PostLayoutAction::Dom(command) => dom.apply(&command),
                PostLayoutAction::InitialScroll { table_id } => initial_scrolls.push(table_id),
            }
        }
        initial_scrolls
    }
}
