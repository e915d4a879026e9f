//! Outgoing server request queue with lazy coalescing.
//!
//! [`RequestQueue`] is the reference [`ServerChannel`]: commands are queued
//! until the host pops them for sending. Commands sent through
//! [`ServerChannel::execute_or_update_lazy`] are coalesced per key:
//!
//! - while still queued, a newer command replaces the queued one in place;
//! - while in flight, the newest command is parked and sent once the
//!   in-flight one completes.
//!
//! So at most one request per key is in flight and the last value wins.

use std::collections::{HashMap, VecDeque};

use crate::host::{LazyRequestId, RequestTicket, ServerChannel};
use crate::types::ServerCommand;

/// A command ready to be sent to the server.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingRequest {
    pub command: ServerCommand,
    /// Completion must be reported to the table with this ticket.
    pub ticket: Option<RequestTicket>,
    /// Completion must be reported to the queue with this key.
    pub lazy_key: Option<LazyRequestId>,
}

#[derive(Debug, Default)]
pub struct RequestQueue {
    queued: VecDeque<OutgoingRequest>,
    /// Lazy keys awaiting completion, with the control they belong to.
    in_flight: HashMap<LazyRequestId, String>,
    parked: HashMap<LazyRequestId, ServerCommand>,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests waiting to be sent.
    pub fn len(&self) -> usize {
        self.queued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    /// Take the next request to send. Lazy requests are marked in flight.
    pub fn pop(&mut self) -> Option<OutgoingRequest> {
        let request = self.queued.pop_front()?;
        if let Some(key) = &request.lazy_key {
            self.in_flight
                .insert(key.clone(), request.command.control_id().to_string());
        }
        Some(request)
    }

    /// Take every request currently ready to send.
    pub fn drain(&mut self) -> Vec<OutgoingRequest> {
        std::iter::from_fn(|| self.pop()).collect()
    }

    /// Report completion of a lazy request; a parked successor gets queued.
    pub fn complete_lazy(&mut self, key: &LazyRequestId) {
        self.in_flight.remove(key);
        if let Some(command) = self.parked.remove(key) {
            self.queued.push_back(OutgoingRequest {
                command,
                ticket: None,
                lazy_key: Some(key.clone()),
            });
        }
    }

    /// Forget everything addressed to one table.
    pub fn discard_control(&mut self, control_id: &str) {
        self.queued
            .retain(|request| request.command.control_id() != control_id);
        self.parked
            .retain(|_, command| command.control_id() != control_id);
        self.in_flight.retain(|_, owner| owner.as_str() != control_id);
    }

    /// Number of lazy requests sent but not yet completed.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }
}

impl ServerChannel for RequestQueue {
    fn execute(&mut self, command: ServerCommand, ticket: Option<RequestTicket>) {
        tracing::trace!(target: "slicegrid", command = command.name(), "queue request");
        self.queued.push_back(OutgoingRequest {
            command,
            ticket,
            lazy_key: None,
        });
    }

    fn execute_or_update_lazy(&mut self, key: LazyRequestId, command: ServerCommand) {
        if let Some(queued) = self
            .queued
            .iter_mut()
            .find(|request| request.lazy_key.as_ref() == Some(&key))
        {
            queued.command = command;
            return;
        }
        if self.in_flight.contains_key(&key) {
            self.parked.insert(key, command);
            return;
        }
        self.queued.push_back(OutgoingRequest {
            command,
            ticket: None,
            lazy_key: Some(key),
        });
    }
}
