//! In-process endpoint and group bookkeeping.
//!
//! Each attached endpoint owns an unbounded outbound queue. Whoever drives
//! the real connection (the WebSocket handler, or a test) holds the
//! receiving half and forwards frames to the wire.

use std::collections::{HashMap, HashSet};

use tokio::sync::mpsc;

use crate::{Broadcaster, ConnectionId, GroupId, TransportError};

/// Receiving half of an endpoint's outbound queue.
pub type Outbound = mpsc::UnboundedReceiver<Vec<u8>>;

/// Tracks attached endpoints and the groups they belong to.
#[derive(Debug, Default)]
pub struct Hub {
    endpoints: HashMap<ConnectionId, mpsc::UnboundedSender<Vec<u8>>>,
    groups: HashMap<GroupId, HashSet<ConnectionId>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an endpoint and returns its outbound queue.
    ///
    /// Attaching an id that is already attached replaces the old queue;
    /// the previous receiver sees its channel close.
    pub fn attach(&mut self, endpoint: ConnectionId) -> Outbound {
        let (tx, rx) = mpsc::unbounded_channel();
        if self.endpoints.insert(endpoint, tx).is_some() {
            tracing::warn!(%endpoint, "endpoint re-attached, old queue dropped");
        }
        tracing::debug!(%endpoint, "endpoint attached");
        rx
    }

    /// Unregisters an endpoint and removes it from every group.
    ///
    /// Dropping the sender closes the outbound queue, which ends the
    /// writer side of the connection. Returns `false` if it was unknown.
    pub fn detach(&mut self, endpoint: ConnectionId) -> bool {
        let known = self.endpoints.remove(&endpoint).is_some();
        self.groups.retain(|_, members| {
            members.remove(&endpoint);
            !members.is_empty()
        });
        if known {
            tracing::debug!(%endpoint, "endpoint detached");
        }
        known
    }

    /// Returns `true` if the endpoint is attached.
    pub fn is_attached(&self, endpoint: ConnectionId) -> bool {
        self.endpoints.contains_key(&endpoint)
    }

    /// Returns the endpoints currently in `group`, sorted by id.
    pub fn group_members(&self, group: &GroupId) -> Vec<ConnectionId> {
        let mut members: Vec<ConnectionId> = self
            .groups
            .get(group)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default();
        members.sort();
        members
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }
}

impl Broadcaster for Hub {
    fn send_to(
        &self,
        endpoint: ConnectionId,
        data: &[u8],
    ) -> Result<(), TransportError> {
        let sender = self
            .endpoints
            .get(&endpoint)
            .ok_or(TransportError::UnknownEndpoint(endpoint))?;
        sender.send(data.to_vec()).map_err(|_| {
            TransportError::ConnectionClosed(endpoint.to_string())
        })
    }

    fn send_to_group(&self, group: &GroupId, data: &[u8]) -> usize {
        let Some(members) = self.groups.get(group) else {
            return 0;
        };

        let mut delivered = 0;
        for endpoint in members {
            match self.send_to(*endpoint, data) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(%group, %endpoint, error = %e, "group delivery dropped");
                }
            }
        }
        delivered
    }

    fn join_group(&mut self, endpoint: ConnectionId, group: GroupId) {
        self.groups.entry(group).or_default().insert(endpoint);
    }

    fn leave_group(&mut self, endpoint: ConnectionId, group: &GroupId) {
        if let Some(members) = self.groups.get_mut(group) {
            members.remove(&endpoint);
            if members.is_empty() {
                self.groups.remove(group);
            }
        }
    }
}
