use crate::models::gateway::ServerEvent;
use crate::models::identities::IdentityRef;
use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(tag = "type", content = "key", rename_all = "snake_case")]
pub enum StreamName {
    /// Private channel holding every connection of one identity
    User(IdentityRef),
    /// Channel of the connections that joined a conversation
    Conversation(Uuid),
}

impl Display for StreamName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamName::User(identity) => write!(f, "user:{identity}"),
            StreamName::Conversation(conversation_id) => {
                write!(f, "conversation:{conversation_id}")
            }
        }
    }
}

/// Events a connection may have queued before it is considered stalled.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

pub type EventSender = mpsc::Sender<ServerEvent>;
pub type EventReceiver = mpsc::Receiver<ServerEvent>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::channel(OUTBOUND_QUEUE_CAPACITY)
}

enum Enqueued {
    Accepted,
    Closed,
    Overflowed,
}

fn enqueue(entry: &ConnectionEntry, event: ServerEvent) -> Enqueued {
    match entry.sender.try_send(event) {
        Ok(()) => Enqueued::Accepted,
        Err(TrySendError::Closed(_)) => Enqueued::Closed,
        Err(TrySendError::Full(_)) => Enqueued::Overflowed,
    }
}

struct ConnectionEntry {
    identity: Option<IdentityRef>,
    sender: EventSender,
    streams: HashSet<StreamName>,
}

#[derive(Default)]
struct Streams {
    connections: HashMap<Uuid, ConnectionEntry>,
    members: HashMap<StreamName, HashSet<Uuid>>,
}

impl Streams {
    fn remove_member(&mut self, stream_name: &StreamName, connection_id: Uuid) {
        if let Some(members) = self.members.get_mut(stream_name) {
            members.remove(&connection_id);
            if members.is_empty() {
                self.members.remove(stream_name);
            }
        }
    }
}

pub struct RemovedConnection {
    pub identity: Option<IdentityRef>,
    pub streams: Vec<StreamName>,
}

/// Routing table from channels to live connections of this process.
/// Locks are never held across an await.
pub struct ConnectionRegistry {
    instance_id: Uuid,
    inner: RwLock<Streams>,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4(),
            inner: RwLock::new(Streams::default()),
        }
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    fn read(&self) -> RwLockReadGuard<'_, Streams> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Streams> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(&self, connection_id: Uuid, sender: EventSender) {
        let entry = ConnectionEntry {
            identity: None,
            sender,
            streams: HashSet::new(),
        };
        self.write().connections.insert(connection_id, entry);
    }

    pub fn bind_identity(&self, connection_id: Uuid, identity: IdentityRef) -> bool {
        match self.write().connections.get_mut(&connection_id) {
            Some(entry) => {
                entry.identity = Some(identity);
                true
            }
            None => false,
        }
    }

    pub fn identity(&self, connection_id: Uuid) -> Option<IdentityRef> {
        self.read()
            .connections
            .get(&connection_id)
            .and_then(|entry| entry.identity.clone())
    }

    /// Returns false if the connection is unknown or already joined.
    pub fn join(&self, connection_id: Uuid, stream_name: StreamName) -> bool {
        let mut streams = self.write();
        let Some(entry) = streams.connections.get_mut(&connection_id) else {
            return false;
        };
        if !entry.streams.insert(stream_name.clone()) {
            return false;
        }
        streams
            .members
            .entry(stream_name)
            .or_default()
            .insert(connection_id)
    }

    pub fn leave(&self, connection_id: Uuid, stream_name: &StreamName) -> bool {
        let mut streams = self.write();
        let removed = streams
            .connections
            .get_mut(&connection_id)
            .is_some_and(|entry| entry.streams.remove(stream_name));
        if removed {
            streams.remove_member(stream_name, connection_id);
        }
        removed
    }

    pub fn is_joined(&self, connection_id: Uuid, stream_name: &StreamName) -> bool {
        self.read()
            .members
            .get(stream_name)
            .is_some_and(|members| members.contains(&connection_id))
    }

    /// Drops the connection and all of its channel memberships.
    pub fn unregister(&self, connection_id: Uuid) -> Option<RemovedConnection> {
        let mut streams = self.write();
        let entry = streams.connections.remove(&connection_id)?;
        for stream_name in &entry.streams {
            streams.remove_member(stream_name, connection_id);
        }
        Some(RemovedConnection {
            identity: entry.identity,
            streams: entry.streams.into_iter().collect(),
        })
    }

    /// Enqueues `event` for one connection. A connection whose queue is
    /// full is unregistered, which closes its socket once the writer sees
    /// the queue end.
    pub fn send(&self, connection_id: Uuid, event: ServerEvent) -> bool {
        let enqueued = match self.read().connections.get(&connection_id) {
            Some(entry) => enqueue(entry, event),
            None => return false,
        };
        match enqueued {
            Enqueued::Accepted => true,
            Enqueued::Closed => false,
            Enqueued::Overflowed => {
                self.evict(&[connection_id]);
                false
            }
        }
    }

    /// Enqueues `event` for every member of the stream. Returns how many
    /// connections accepted it. Members with a full queue are unregistered.
    pub fn broadcast(
        &self,
        stream_name: &StreamName,
        event: &ServerEvent,
        excluded_connection_ids: &[Uuid],
    ) -> usize {
        let mut delivered = 0;
        let mut overflowed = vec![];
        {
            let streams = self.read();
            let Some(members) = streams.members.get(stream_name) else {
                return 0;
            };
            for connection_id in members {
                if excluded_connection_ids.contains(connection_id) {
                    continue;
                }
                let Some(entry) = streams.connections.get(connection_id) else {
                    continue;
                };
                match enqueue(entry, event.clone()) {
                    Enqueued::Accepted => delivered += 1,
                    Enqueued::Closed => {}
                    Enqueued::Overflowed => overflowed.push(*connection_id),
                }
            }
        }
        if !overflowed.is_empty() {
            self.evict(&overflowed);
        }
        delivered
    }

    fn evict(&self, connection_ids: &[Uuid]) {
        for connection_id in connection_ids {
            if self.unregister(*connection_id).is_some() {
                warn!(connection_id = %connection_id, "Outbound queue full, dropping connection");
            }
        }
    }

    pub fn member_count(&self, stream_name: &StreamName) -> usize {
        self.read()
            .members
            .get(stream_name)
            .map_or(0, |members| members.len())
    }

    pub fn connection_count(&self) -> usize {
        self.read().connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connect(registry: &ConnectionRegistry) -> (Uuid, EventReceiver) {
        let connection_id = Uuid::new_v4();
        let (tx, rx) = event_channel();
        registry.register(connection_id, tx);
        (connection_id, rx)
    }

    fn error_event(code: &str) -> ServerEvent {
        ServerEvent::Error {
            code: code.to_owned(),
            message: String::new(),
        }
    }

    #[test]
    fn broadcast_reaches_members_only() {
        let registry = ConnectionRegistry::new();
        let stream = StreamName::Conversation(Uuid::new_v4());
        let (a, mut rx_a) = connect(&registry);
        let (_b, mut rx_b) = connect(&registry);
        assert!(registry.join(a, stream.clone()));

        assert_eq!(registry.broadcast(&stream, &error_event("x"), &[]), 1);
        assert_eq!(rx_a.try_recv().unwrap(), error_event("x"));
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn broadcast_skips_excluded_connections() {
        let registry = ConnectionRegistry::new();
        let stream = StreamName::User(IdentityRef::customer("c-1"));
        let (a, mut rx_a) = connect(&registry);
        let (b, mut rx_b) = connect(&registry);
        registry.join(a, stream.clone());
        registry.join(b, stream.clone());

        assert_eq!(registry.broadcast(&stream, &error_event("x"), &[a]), 1);
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn joining_twice_is_a_no_op() {
        let registry = ConnectionRegistry::new();
        let stream = StreamName::Conversation(Uuid::new_v4());
        let (a, _rx) = connect(&registry);
        assert!(registry.join(a, stream.clone()));
        assert!(!registry.join(a, stream.clone()));
        assert_eq!(registry.member_count(&stream), 1);
    }

    #[test]
    fn unregister_clears_every_membership() {
        let registry = ConnectionRegistry::new();
        let private = StreamName::User(IdentityRef::seller("s-1"));
        let conversation = StreamName::Conversation(Uuid::new_v4());
        let (a, _rx) = connect(&registry);
        registry.bind_identity(a, IdentityRef::seller("s-1"));
        registry.join(a, private.clone());
        registry.join(a, conversation.clone());

        let removed = registry.unregister(a).unwrap();
        assert_eq!(removed.identity, Some(IdentityRef::seller("s-1")));
        assert_eq!(removed.streams.len(), 2);
        assert_eq!(registry.member_count(&private), 0);
        assert_eq!(registry.member_count(&conversation), 0);
        assert_eq!(registry.connection_count(), 0);
        assert!(registry.unregister(a).is_none());
    }

    #[test]
    fn leave_removes_single_membership() {
        let registry = ConnectionRegistry::new();
        let conversation = StreamName::Conversation(Uuid::new_v4());
        let (a, _rx) = connect(&registry);
        registry.join(a, conversation.clone());
        assert!(registry.leave(a, &conversation));
        assert!(!registry.is_joined(a, &conversation));
        assert!(!registry.leave(a, &conversation));
    }

    #[test]
    fn events_keep_publish_order_per_connection() {
        let registry = ConnectionRegistry::new();
        let stream = StreamName::Conversation(Uuid::new_v4());
        let (a, mut rx) = connect(&registry);
        registry.join(a, stream.clone());
        for code in ["1", "2", "3"] {
            registry.broadcast(&stream, &error_event(code), &[]);
        }
        for code in ["1", "2", "3"] {
            assert_eq!(rx.try_recv().unwrap(), error_event(code));
        }
    }

    #[test]
    fn stalled_connection_is_dropped_when_its_queue_fills() {
        let registry = ConnectionRegistry::new();
        let stream = StreamName::Conversation(Uuid::new_v4());
        let (a, mut rx_a) = connect(&registry);
        let (stalled, mut rx_stalled) = {
            let connection_id = Uuid::new_v4();
            let (tx, rx) = mpsc::channel(2);
            registry.register(connection_id, tx);
            (connection_id, rx)
        };
        registry.join(a, stream.clone());
        registry.join(stalled, stream.clone());

        assert_eq!(registry.broadcast(&stream, &error_event("1"), &[]), 2);
        assert_eq!(registry.broadcast(&stream, &error_event("2"), &[]), 2);
        assert_eq!(registry.broadcast(&stream, &error_event("3"), &[]), 1);

        assert_eq!(registry.connection_count(), 1);
        assert!(!registry.is_joined(stalled, &stream));
        assert_eq!(registry.member_count(&stream), 1);
        // what was queued is still drained, then the queue ends
        assert_eq!(rx_stalled.try_recv().unwrap(), error_event("1"));
        assert_eq!(rx_stalled.try_recv().unwrap(), error_event("2"));
        assert!(matches!(
            rx_stalled.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
        for code in ["1", "2", "3"] {
            assert_eq!(rx_a.try_recv().unwrap(), error_event(code));
        }
        assert!(!registry.send(stalled, error_event("4")));
    }
}
