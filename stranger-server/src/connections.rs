use std::{
    sync::Arc,
    thread::{self, JoinHandle},
};

use dashmap::DashMap;
use log::debug;
use stranger_core::{Delivery, EventReceiver, SessionId};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::serialized::{ServerEvent, ToSerialized};

pub type Outgoing = UnboundedReceiver<ServerEvent>;

/// Routes engine deliveries to the sockets they are addressed to.
#[derive(Debug)]
pub struct Connections {
    senders: DashMap<SessionId, UnboundedSender<ServerEvent>>,
    legacy_system_messages: bool,
}

impl Connections {
    pub fn new(legacy_system_messages: bool) -> Arc<Self> {
        Arc::new(Self {
            senders: Default::default(),
            legacy_system_messages,
        })
    }

    /// Registers a socket, returning the frames that should be written to it.
    pub fn register(&self, session_id: SessionId) -> Outgoing {
        let (sender, receiver) = unbounded_channel();
        self.senders.insert(session_id, sender);

        receiver
    }

    pub fn unregister(&self, session_id: SessionId) {
        self.senders.remove(&session_id);
    }

    /// Sends a frame to a single socket. Frames for closed sockets are dropped.
    pub fn send(&self, session_id: SessionId, event: ServerEvent) {
        match self.senders.get(&session_id) {
            Some(sender) => {
                sender.send(event).ok();
            }
            None => debug!("Dropped {:?} for closed session {}", event, session_id),
        }
    }

    pub fn deliver(&self, delivery: Delivery) {
        for frame in delivery.event.to_serialized(self.legacy_system_messages) {
            self.send(delivery.to, frame);
        }
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }

    /// Drains engine events on a dedicated thread until the engine is dropped.
    pub fn spawn_dispatcher(self: &Arc<Self>, events: EventReceiver) -> JoinHandle<()> {
        let connections = self.clone();

        thread::spawn(move || {
            while let Ok(delivery) = events.recv() {
                connections.deliver(delivery)
            }
        })
    }
}
