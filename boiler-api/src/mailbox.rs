//! The mailbox abstraction: an ordered multiset of tagged messages.
//!
//! A tick hands the controller one `Mailbox` to read (the inbound
//! messages the plant sent) and one to write (the outbound messages
//! the controller emits). The two operations the detector and
//! orchestrator actually need are `extract_unique`, which enforces
//! "at most one message of this kind per tick", and
//! `extract_indexed`, which does the same for the per-pump /
//! per-controller message families. Both report a
//! [`crate::Error::ProtocolError`] rather than panicking when the
//! plant violates the multiplicity rule -- the orchestrator turns
//! that into an emergency stop.

use crate::error::{Error, Result};
use crate::message::Message;

/// An ordered multiset of [`Message`]s.
#[derive(Debug, Clone, Default)]
pub struct Mailbox {
    messages: Vec<Message>,
}

impl Mailbox {
    pub fn new() -> Self {
        Mailbox {
            messages: Vec::new(),
        }
    }

    /// Appends a message. Used both by the plant harness, to build an
    /// inbound mailbox, and by the orchestrator, to build the
    /// outbound one.
    pub fn send(&mut self, msg: Message) {
        self.messages.push(msg);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Extracts the single value matched by `matches` out of this
    /// tick's messages.
    ///
    /// Returns `Ok(None)` if no message matched, `Ok(Some(v))` if
    /// exactly one did, and `Err(ProtocolError)` if two or more
    /// matched -- the plant is only ever supposed to send one reading
    /// of a given kind per tick.
    pub fn extract_unique<T>(
        &self,
        mut matches: impl FnMut(&Message) -> Option<T>,
    ) -> Result<Option<T>> {
        let mut found = None;

        for msg in &self.messages {
            if let Some(v) = matches(msg) {
                if found.is_some() {
                    return Err(Error::ProtocolError(
                        "duplicate message of a unique kind".into(),
                    ));
                }
                found = Some(v);
            }
        }
        Ok(found)
    }

    /// Extracts a family of `count` indexed messages (one per pump,
    /// one per pump controller, ...).
    ///
    /// `matches` returns `Some((index, value))` for messages in the
    /// family. An out-of-range index or a repeated index is a
    /// protocol error; a missing index simply leaves that slot `None`
    /// so the caller can decide whether that is fatal.
    pub fn extract_indexed<T>(
        &self,
        count: usize,
        mut matches: impl FnMut(&Message) -> Option<(usize, T)>,
    ) -> Result<Vec<Option<T>>> {
        let mut slots: Vec<Option<T>> = (0..count).map(|_| None).collect();

        for msg in &self.messages {
            if let Some((idx, v)) = matches(msg) {
                if idx >= count {
                    return Err(Error::ProtocolError(format!(
                        "index {} out of range (expected < {})",
                        idx, count
                    )));
                }
                if slots[idx].is_some() {
                    return Err(Error::ProtocolError(format!(
                        "duplicate message for index {}",
                        idx
                    )));
                }
                slots[idx] = Some(v);
            }
        }
        Ok(slots)
    }

    /// Extracts every value matching `matches`, with no multiplicity
    /// constraint. Used for handshake messages (ACKs, REPAIREDs),
    /// which may legitimately arrive zero or more at a time.
    pub fn extract_all<T>(
        &self,
        mut matches: impl FnMut(&Message) -> Option<T>,
    ) -> Vec<T> {
        self.messages.iter().filter_map(|m| matches(m)).collect()
    }
}

impl FromIterator<Message> for Mailbox {
    fn from_iter<I: IntoIterator<Item = Message>>(iter: I) -> Self {
        Mailbox {
            messages: iter.into_iter().collect(),
        }
    }
}
