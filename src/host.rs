//! Collaborator traits implemented by the embedding environment.
//!
//! The table core never touches the browser directly. Geometry reads and
//! writes go through [`Dom`], server round trips through [`ServerChannel`],
//! and deferred work through [`FrameScheduler`]. The wasm binding implements
//! all three on top of `web-sys`; tests implement them with recorders.

use crate::layout::LayoutCommand;
use crate::types::ServerCommand;

/// Identifies a server request whose completion the table wants to hear about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestTicket(pub u64);

/// Key under which successive requests are coalesced (last write wins).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LazyRequestId(pub String);

/// Handle of a scheduled animation frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Handle of a scheduled timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// Which of the two scroll managers of a table a frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Vertical,
    Horizontal,
}

/// Step of the scroll mirroring protocol a frame callback drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncStep {
    /// Read the source element and mirror it onto its siblings.
    Apply { source: usize },
    /// Re-attach listeners detached on behalf of `source`.
    Rearm { source: usize },
}

/// Payload handed back to the table when an animation frame fires.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameToken {
    pub table_id: String,
    pub axis: Axis,
    pub step: SyncStep,
}

/// Purpose of a table timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Scrolling settled: re-evaluate which slices to keep and request.
    ScrollSettled,
    /// Fixed columns no longer fit: ask the server for fewer of them.
    FixedColumnReload { amount: usize },
}

/// Payload handed back to the table when a timer fires.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimerToken {
    pub table_id: String,
    pub kind: TimerKind,
}

/// DOM geometry and mutation access.
pub trait Dom {
    fn scroll_top(&self, element: &str) -> f64;
    fn scroll_left(&self, element: &str) -> f64;
    fn set_scroll_top(&mut self, element: &str, px: f64);
    fn set_scroll_left(&mut self, element: &str, px: f64);

    /// Rendered width of an element, `0` if it does not exist.
    fn element_width(&self, element: &str) -> f64;

    /// Width taken by a native vertical scrollbar.
    fn vertical_scrollbar_width(&self) -> f64;

    /// Row height announced by the last rendered row of a slice
    /// (`row-height` attribute), `None` if the attribute is missing.
    fn rendered_row_height(&self, slice_element: &str) -> Option<f64>;

    /// Apply a geometry write or removal.
    fn apply(&mut self, command: &LayoutCommand);

    /// Blur the focused element if it lies inside one of `containers`.
    /// Returns whether something was blurred.
    fn blur_focus_within(&mut self, containers: &[String]) -> bool;
}

/// Server command dispatch.
pub trait ServerChannel {
    /// Send a command; if `ticket` is set, the host reports completion back
    /// to the table with that ticket.
    fn execute(&mut self, command: ServerCommand, ticket: Option<RequestTicket>);

    /// Send a command that replaces any not yet completed command with the same key.
    fn execute_or_update_lazy(&mut self, key: LazyRequestId, command: ServerCommand);
}

/// Animation frame and timer scheduling.
pub trait FrameScheduler {
    fn request_animation_frame(&mut self, token: FrameToken) -> FrameHandle;
    fn cancel_animation_frame(&mut self, handle: FrameHandle);
    fn set_timeout(&mut self, token: TimerToken, delay_ms: u32) -> TimerHandle;
    fn clear_timeout(&mut self, handle: TimerHandle);
}

/// Everything a table session needs from its environment.
pub trait TableHost: Dom + ServerChannel + FrameScheduler {}

impl<T: Dom + ServerChannel + FrameScheduler + ?Sized> TableHost for T {}
