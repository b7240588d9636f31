use serde::Serialize;
use std::fmt;

/// Identifies one accepted connection for the lifetime of the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ClientId(u64);

impl ClientId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// The id after this one; ids are never reused
    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Something that happened during a tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    NewConnection(ClientId),
    Disconnected(ClientId),
    /// A line typed by a player: first word (lower-cased) and the rest
    Command {
        id: ClientId,
        verb: String,
        argument: String,
    },
}

impl Event {
    /// Build a command event from a raw input line
    ///
    /// Returns `None` for lines that are empty once trimmed.
    pub fn command(id: ClientId, line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (verb, argument) = line.split_once(' ').unwrap_or((line, ""));
        Some(Event::Command {
            id,
            verb: verb.to_lowercase(),
            argument: argument.to_string(),
        })
    }
}

/// Double-buffered event list
///
/// Events are pushed to `pending` while a tick runs. [`EventQueue::advance`]
/// replaces `visible` with them; queries only ever read `visible`.
#[derive(Debug, Default)]
pub struct EventQueue {
    pending: Vec<Event>,
    visible: Vec<Event>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.pending.push(event);
    }

    /// End the tick: pending becomes visible, the previous visible list is dropped
    pub fn advance(&mut self) {
        self.visible = std::mem::take(&mut self.pending);
    }

    pub fn visible(&self) -> &[Event] {
        &self.visible
    }

    pub fn new_players(&self) -> Vec<ClientId> {
        self.visible
            .iter()
            .filter_map(|event| match event {
                Event::NewConnection(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn disconnected_players(&self) -> Vec<ClientId> {
        self.visible
            .iter()
            .filter_map(|event| match event {
                Event::Disconnected(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn commands(&self) -> Vec<(ClientId, String, String)> {
        self.visible
            .iter()
            .filter_map(|event| match event {
                Event::Command { id, verb, argument } => {
                    Some((*id, verb.clone(), argument.clone()))
                }
                _ => None,
            })
            .collect()
    }
}
