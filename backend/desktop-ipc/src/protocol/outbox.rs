use super::messages::ServerToClientMessage;

use log::warn;

use std::collections::VecDeque;

/// Maximum number of undelivered backend → UI messages kept in memory.
pub const DESKTOP_EVENT_QUEUE_CAPACITY: usize = 100;

/// Server-side buffer of messages waiting to be streamed to the desktop
/// over SSE. Bounded; the oldest entry is evicted on overflow.
#[derive(Debug)]
pub struct ServerEventOutbox {
    capacity: usize,
    queue: VecDeque<ServerToClientMessage>,
}

impl Default for ServerEventOutbox {
    fn default() -> Self {
        Self::with_capacity(DESKTOP_EVENT_QUEUE_CAPACITY)
    }
}

impl ServerEventOutbox {
    /// A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            queue: VecDeque::with_capacity(capacity),
        }
    }

    /// Enqueues a message, returning the evicted one if the buffer was full.
    pub fn push(&mut self, message: ServerToClientMessage) -> Option<ServerToClientMessage> {
        let evicted = if self.queue.len() >= self.capacity {
            self.queue.pop_front()
        } else {
            None
        };

        if let Some(dropped) = &evicted {
            warn!("Desktop event outbox full, dropping message {}", dropped.id());
        }

        self.queue.push_back(message);
        evicted
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn drain(&mut self) -> Vec<ServerToClientMessage> {
        self.queue.drain(..).collect()
    }

    /// Renders every queued message as one `data: <json>\n\n` frame and
    /// empties the buffer. On an encoding failure nothing is removed.
    pub fn drain_sse(&mut self) -> Result<String, serde_json::Error> {
        let body = to_sse_body(self.queue.iter())?;
        self.queue.clear();
        Ok(body)
    }
}

pub fn to_sse_body<'a>(
    messages: impl IntoIterator<Item = &'a ServerToClientMessage>,
) -> Result<String, serde_json::Error> {
    let mut body = String::new();
    for message in messages {
        body.push_str("data: ");
        body.push_str(&serde_json::to_string(message)?);
        body.push_str("\n\n");
    }
    Ok(body)
}
