//! Feedback-free mirroring of scroll events between linked elements.
//!
//! Writing a scroll offset onto an element makes that element fire its own
//! scroll event. To keep linked elements from echoing each other, the first
//! element to scroll becomes the source: the others stop listening until the
//! browser has painted the mirrored offsets.
//!
//! ```text
//! Idle --scroll(s)--> Pending(s) --Apply frame--> Applying(s)
//!   ^                   |   ^                         |
//!   |          scroll(s)|   |scroll(s)                | finish_apply
//!   |    (reschedule)   v   |                         v
//!   +----Rearm frame---- Cooldown(s) <----------------+
//! ```

use crate::host::{Axis, FrameHandle, FrameScheduler, FrameToken, SyncStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    /// An apply frame for `source` is scheduled.
    Pending { source: usize },
    /// Offsets of `source` are being mirrored.
    Applying { source: usize },
    /// Mirrored offsets are waiting for a repaint before listeners re-arm.
    Cooldown { source: usize },
}

/// Listener state of a group of linked scroll elements.
#[derive(Debug)]
pub struct ListenerSync {
    table_id: String,
    axis: Axis,
    attached: Vec<bool>,
    phase: SyncPhase,
    frame: Option<FrameHandle>,
}

impl ListenerSync {
    pub fn new(table_id: &str, axis: Axis, sources: usize) -> Self {
        Self {
            table_id: table_id.to_string(),
            axis,
            attached: vec![true; sources],
            phase: SyncPhase::Idle,
            frame: None,
        }
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn is_attached(&self, source: usize) -> bool {
        self.attached.get(source).copied().unwrap_or(false)
    }

    fn token(&self, step: SyncStep) -> FrameToken {
        FrameToken {
            table_id: self.table_id.clone(),
            axis: self.axis,
            step,
        }
    }

    fn schedule<S: FrameScheduler + ?Sized>(&mut self, scheduler: &mut S, step: SyncStep) {
        if let Some(handle) = self.frame.take() {
            scheduler.cancel_animation_frame(handle);
        }
        self.frame = Some(scheduler.request_animation_frame(self.token(step)));
    }

    fn detach_others(&mut self, source: usize) {
        for (index, attached) in self.attached.iter_mut().enumerate() {
            *attached = index == source;
        }
    }

    /// A scroll event fired on `source`.
    ///
    /// Returns whether the event was accepted. Events of detached elements
    /// are echoes of mirrored writes and are dropped.
    pub fn on_scroll<S: FrameScheduler + ?Sized>(&mut self, scheduler: &mut S, source: usize) -> bool {
        if !self.is_attached(source) {
            tracing::trace!(target: "slicegrid", axis = ?self.axis, source, "scroll echo ignored");
            return false;
        }
        match self.phase {
            SyncPhase::Idle => self.detach_others(source),
            SyncPhase::Pending { source: current } | SyncPhase::Cooldown { source: current }
                if current == source => {}
            SyncPhase::Applying { .. } | SyncPhase::Pending { .. } | SyncPhase::Cooldown { .. } => {
                return false;
            }
        }
        self.phase = SyncPhase::Pending { source };
        self.schedule(scheduler, SyncStep::Apply { source });
        tracing::trace!(target: "slicegrid", axis = ?self.axis, source, "scroll pending");
        true
    }

    /// An apply frame fired. Returns the source to mirror, `None` if the frame is stale.
    pub fn begin_apply(&mut self, source: usize) -> Option<usize> {
        match self.phase {
            SyncPhase::Pending { source: current } if current == source => {
                self.frame = None;
                self.phase = SyncPhase::Applying { source };
                Some(source)
            }
            _ => None,
        }
    }

    /// Mirroring is done; re-arm the other listeners after the next repaint.
    pub fn finish_apply<S: FrameScheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if let SyncPhase::Applying { source } = self.phase {
            self.phase = SyncPhase::Cooldown { source };
            self.schedule(scheduler, SyncStep::Rearm { source });
        }
    }

    /// A re-arm frame fired.
    pub fn rearm(&mut self, source: usize) {
        if self.phase == (SyncPhase::Cooldown { source }) {
            self.frame = None;
            self.attached.fill(true);
            self.phase = SyncPhase::Idle;
            tracing::trace!(target: "slicegrid", axis = ?self.axis, source, "listeners re-armed");
        }
    }

    /// Drop any scheduled frame and return to idle.
    pub fn cancel<S: FrameScheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if let Some(handle) = self.frame.take() {
            scheduler.cancel_animation_frame(handle);
        }
        self.attached.fill(true);
        self.phase = SyncPhase::Idle;
    }
}
