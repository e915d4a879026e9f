//! The tables of one page, keyed by control id.

use std::collections::HashMap;

use crate::error::{Result, SliceGridError};
use crate::host::{
    Dom, FrameScheduler, FrameToken, RequestTicket, TableHost, TimerHandle, TimerKind, TimerToken,
};
use crate::layout::LayoutQueue;
use crate::types::{ClientDisplayData, ServerCommand};

use super::columns::{ColumnReorder, Part};
use super::{Sizing, TableGeometry, TableInit, TableSession};

/// Delay before a fixed column reload is sent, so a burst of layouts only sends one.
const FIXED_COLUMN_RELOAD_DELAY_MS: u32 = 100;

/// What a layout request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutOutcome {
    Created,
    Resized,
    /// The fixed columns do not fit; the server was asked to render fewer.
    ReloadRequested { fixed_column_amount: usize },
}

/// All live tables plus the layout queue they share.
///
/// Events for tables that are gone (a timer firing after teardown) are
/// logged and ignored; server updates for unknown tables are desync errors.
#[derive(Debug, Default)]
pub struct TableRegistry {
    sessions: HashMap<String, TableSession>,
    layout: LayoutQueue,
    reload_timers: HashMap<String, TimerHandle>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, session: TableSession) {
        let table_id = session.table_id().to_string();
        tracing::debug!(target: "slicegrid", table = %table_id, "table registered");
        self.sessions.insert(table_id, session);
    }

    pub fn unregister(&mut self, table_id: &str) -> Option<TableSession> {
        let removed = self.sessions.remove(table_id);
        if removed.is_some() {
            tracing::debug!(target: "slicegrid", table = table_id, "table unregistered");
        }
        removed
    }

    pub fn get(&self, table_id: &str) -> Option<&TableSession> {
        self.sessions.get(table_id)
    }

    pub fn get_mut(&mut self, table_id: &str) -> Option<&mut TableSession> {
        self.sessions.get_mut(table_id)
    }

    pub fn contains(&self, table_id: &str) -> bool {
        self.sessions.contains_key(table_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn layout_queue(&self) -> &LayoutQueue {
        &self.layout
    }

    fn session_or_desync(&mut self, table_id: &str) -> Result<&mut TableSession> {
        self.sessions
            .get_mut(table_id)
            .ok_or_else(|| SliceGridError::UnknownTable {
                table_id: table_id.to_string(),
            })
    }

    /// Lay out a rendered table: create its session the first time,
    /// resize it afterwards. Nothing is written to the DOM before
    /// [`run_layout`](Self::run_layout).
    pub fn layout_table<H: TableHost + ?Sized>(
        &mut self,
        host: &mut H,
        init: &TableInit,
    ) -> Result<LayoutOutcome> {
        init.validate()?;
        let geometry = match TableGeometry::compute(init, &init.policy()) {
            Sizing::Layout(geometry) => geometry,
            Sizing::Reload {
                fixed_column_amount,
            } => {
                self.schedule_reload(host, &init.control_id, fixed_column_amount);
                return Ok(LayoutOutcome::ReloadRequested {
                    fixed_column_amount,
                });
            }
        };

        if let Some(session) = self.sessions.get_mut(&init.control_id) {
            session.relayout(host, &mut self.layout, init, geometry)?;
            return Ok(LayoutOutcome::Resized);
        }
        let session = TableSession::create(init, geometry, &*host, &mut self.layout)?;
        self.register(session);
        Ok(LayoutOutcome::Created)
    }

    fn schedule_reload<S: FrameScheduler + ?Sized>(
        &mut self,
        scheduler: &mut S,
        table_id: &str,
        amount: usize,
    ) {
        if let Some(previous) = self.reload_timers.remove(table_id) {
            scheduler.clear_timeout(previous);
        }
        tracing::debug!(target: "slicegrid", table = table_id, amount, "fixed columns do not fit");
        let handle = scheduler.set_timeout(
            TimerToken {
                table_id: table_id.to_string(),
                kind: TimerKind::FixedColumnReload { amount },
            },
            FIXED_COLUMN_RELOAD_DELAY_MS,
        );
        self.reload_timers.insert(table_id.to_string(), handle);
    }

    /// Apply queued layout commands, then run the initial scroll of tables
    /// created since the last pass.
    pub fn run_layout<H: TableHost + ?Sized>(&mut self, host: &mut H) -> Result<()> {
        for table_id in self.layout.flush(host) {
            match self.sessions.get_mut(&table_id) {
                Some(session) => session.initial_scroll(host)?,
                None => {
                    tracing::warn!(target: "slicegrid", table = %table_id, "initial scroll for removed table");
                }
            }
        }
        Ok(())
    }

    pub fn insert_slice<D: Dom + ?Sized>(
        &mut self,
        dom: &mut D,
        table_id: &str,
        viewport_id: &str,
        slice_id: &str,
        row_count: u32,
    ) -> Result<()> {
        self.session_or_desync(table_id)?
            .insert_slice(dom, viewport_id, slice_id, row_count)
    }

    pub fn update_page_row_count<D: Dom + ?Sized>(
        &mut self,
        dom: &mut D,
        table_id: &str,
        viewport_id: &str,
        slice_id: &str,
        row_count: u32,
    ) -> Result<()> {
        self.session_or_desync(table_id)?
            .update_page_row_count(dom, viewport_id, slice_id, row_count)
    }

    pub fn update_column_width<H: TableHost + ?Sized>(
        &mut self,
        host: &mut H,
        table_id: &str,
        viewport_id: &str,
        column: usize,
        width: f64,
        update_server: bool,
    ) -> Result<()> {
        self.session_or_desync(table_id)?
            .update_column_width(host, viewport_id, column, width, update_server)
    }

    pub fn reorder_columns<H: TableHost + ?Sized>(
        &mut self,
        host: &mut H,
        table_id: &str,
        from: usize,
        insert_before: usize,
        drop_part: Part,
    ) -> Result<ColumnReorder> {
        self.session_or_desync(table_id)?
            .reorder_columns(host, from, insert_before, drop_part)
    }

    /// Show a pane the server asks for after the table was laid out.
    pub fn scroll_to_requested_position<H: TableHost + ?Sized>(
        &mut self,
        host: &mut H,
        table_id: &str,
        data: Option<ClientDisplayData>,
    ) {
        let Some(session) = self.sessions.get_mut(table_id) else {
            tracing::warn!(target: "slicegrid", table = table_id, "scroll request for unknown table");
            return;
        };
        session.set_client_display_data(data);
        session.scroll_to_requested_position(host);
    }

    pub fn request_completed<D: Dom + ?Sized>(&mut self, dom: &mut D, table_id: &str, ticket: RequestTicket) {
        match self.sessions.get_mut(table_id) {
            Some(session) => session.request_completed(dom, ticket),
            None => tracing::warn!(target: "slicegrid", table = table_id, "request completed for removed table"),
        }
    }

    /// A native scroll event. Returns whether a table took it.
    pub fn on_scroll<H: TableHost + ?Sized>(&mut self, host: &mut H, table_id: &str, element: &str) -> bool {
        match self.sessions.get_mut(table_id) {
            Some(session) => session.on_scroll(host, element),
            None => false,
        }
    }

    pub fn on_wheel<H: TableHost + ?Sized>(&mut self, host: &mut H, table_id: &str, delta_y: f64) -> bool {
        match self.sessions.get_mut(table_id) {
            Some(session) => session.on_wheel(host, delta_y),
            None => false,
        }
    }

    pub fn on_frame<H: TableHost + ?Sized>(&mut self, host: &mut H, token: &FrameToken) -> Result<()> {
        match self.sessions.get_mut(&token.table_id) {
            Some(session) => session.on_frame(host, token),
            None => {
                tracing::warn!(target: "slicegrid", table = %token.table_id, "frame for removed table");
                Ok(())
            }
        }
    }

    pub fn on_timer<H: TableHost + ?Sized>(&mut self, host: &mut H, token: &TimerToken) {
        match token.kind {
            TimerKind::FixedColumnReload { amount } => {
                self.reload_timers.remove(&token.table_id);
                host.execute(
                    ServerCommand::UpdateFixedColumnAmount {
                        control_id: token.table_id.clone(),
                        fixed_column_amount: amount,
                    },
                    None,
                );
            }
            TimerKind::ScrollSettled => match self.sessions.get_mut(&token.table_id) {
                Some(session) => session.on_settled(host),
                None => {
                    tracing::warn!(target: "slicegrid", table = %token.table_id, "settle timer for removed table");
                }
            },
        }
    }

    /// The table's DOM is gone: release its frames and timers and forget it.
    pub fn remove_table<S: FrameScheduler + ?Sized>(&mut self, scheduler: &mut S, table_id: &str) {
        if let Some(mut session) = self.unregister(table_id) {
            session.teardown(scheduler);
        }
        if let Some(handle) = self.reload_timers.remove(table_id) {
            scheduler.clear_timeout(handle);
        }
        self.layout.discard_table(table_id);
    }

    pub fn table_ids(&self) -> impl Iterator<Item = &str> {
        self.sessions.keys().map(String::as_str)
    }
}
